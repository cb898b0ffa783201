/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! `AssumeRole` over HTTP
//!
//! [`StsClient`] builds the RPC-style request, asks an injected [`SignString`] for the signature
//! and dispatches it through an injected `tower` service. Connection management, TLS and retries
//! belong to that service.

use super::{AssumeRole, AssumeRoleRequest, AssumeRoleResponse, BoxError, InvokeError};
use crate::config::RamRoleArnConfig;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use credential_types::time::{SharedTimeSource, TimeSource};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use ring::hmac;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tower::{Service, ServiceExt};

const DEFAULT_ENDPOINT: &str = "sts.aliyuncs.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const API_VERSION: &str = "2015-04-01";

/// RFC 3986 unreserved characters are the only ones left unescaped
const RPC_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, RPC_ENCODE_SET).to_string()
}

/// Computes request signatures
///
/// Implementations return the base64 encoded HMAC-SHA1 of `string_to_sign` keyed with `key`.
/// [`HmacSha1`] is the stock implementation; closures can stand in for it, e.g. to delegate to
/// a hardware key store.
pub trait SignString: Send + Sync {
    fn sign(&self, string_to_sign: &str, key: &str) -> Result<String, BoxError>;
}

impl<F> SignString for F
where
    F: Fn(&str, &str) -> Result<String, BoxError> + Send + Sync,
{
    fn sign(&self, string_to_sign: &str, key: &str) -> Result<String, BoxError> {
        (self)(string_to_sign, key)
    }
}

/// [`SignString`] computing HMAC-SHA1 with `ring`, the algorithm STS expects for
/// `SignatureMethod=HMAC-SHA1`
#[derive(Clone, Copy, Debug, Default)]
pub struct HmacSha1;

impl SignString for HmacSha1 {
    fn sign(&self, string_to_sign: &str, key: &str) -> Result<String, BoxError> {
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
        let tag = hmac::sign(&key, string_to_sign.as_bytes());
        Ok(base64::encode(tag.as_ref()))
    }
}

/// Error body returned by STS alongside non-2xx statuses
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorResponse {
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// [`AssumeRole`] implementation that calls the STS endpoint
///
/// # Example
/// ```rust
/// use bytes::Bytes;
/// use credential_providers::assume_role::client::{HmacSha1, StsClient};
/// use credential_providers::assume_role::BoxError;
///
/// # async fn docs() {
/// let transport = tower::service_fn(|_request: http::Request<Bytes>| async {
///     // send the request with the HTTP client of your choice
///     Ok::<_, BoxError>(http::Response::new(Bytes::new()))
/// });
/// let client = StsClient::builder().region_id("cn-shanghai").build(transport, HmacSha1);
/// # }
/// ```
#[derive(Clone)]
pub struct StsClient<S> {
    service: S,
    signer: Arc<dyn SignString>,
    endpoint: String,
    timeout: Duration,
    time_source: SharedTimeSource,
}

impl<S> Debug for StsClient<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StsClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StsClient<()> {
    pub fn builder() -> Builder {
        Builder::default()
    }
}

/// Builder for [`StsClient`]
#[derive(Debug, Default)]
pub struct Builder {
    region_id: Option<String>,
    endpoint: Option<String>,
    timeout: Option<Duration>,
    time_source: Option<SharedTimeSource>,
}

impl Builder {
    /// Take the region and timeout from a `ram_role_arn` config when it sets them
    pub fn configure(mut self, config: &RamRoleArnConfig) -> Self {
        if let Some(region_id) = &config.region_id {
            self.region_id = Some(region_id.clone());
        }
        if let Some(timeout) = config.timeout() {
            self.timeout = Some(timeout);
        }
        self
    }

    /// Use the regional endpoint `sts.{region_id}.aliyuncs.com`
    pub fn region_id(mut self, region_id: impl Into<String>) -> Self {
        self.region_id = Some(region_id.into());
        self
    }

    /// Override the endpoint host entirely. Takes precedence over `region_id`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// (Optional) Timeout for the whole call. Defaults to 5 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// (Optional) Clock used for the request `Timestamp`
    pub fn time_source(mut self, time_source: impl TimeSource + 'static) -> Self {
        self.time_source = Some(SharedTimeSource::new(time_source));
        self
    }

    pub fn build<S>(self, service: S, signer: impl SignString + 'static) -> StsClient<S> {
        let endpoint = match (self.endpoint, self.region_id) {
            (Some(endpoint), _) => endpoint,
            (None, Some(region_id)) => format!("sts.{}.aliyuncs.com", region_id),
            (None, None) => DEFAULT_ENDPOINT.to_string(),
        };
        StsClient {
            service,
            signer: Arc::new(signer),
            endpoint,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            time_source: self.time_source.unwrap_or_default(),
        }
    }
}

impl<S> StsClient<S> {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn signed_request(&self, request: &AssumeRoleRequest) -> Result<http::Request<Bytes>, InvokeError> {
        let timestamp: DateTime<Utc> = self.time_source.now().into();
        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("Action", "AssumeRole".to_string());
        params.insert("Format", "JSON".to_string());
        params.insert("Version", API_VERSION.to_string());
        params.insert("AccessKeyId", request.access_key_id().to_string());
        params.insert("SignatureMethod", "HMAC-SHA1".to_string());
        params.insert("SignatureVersion", "1.0".to_string());
        params.insert(
            "SignatureNonce",
            format!("{:016x}{:016x}", fastrand::u64(..), fastrand::u64(..)),
        );
        params.insert(
            "Timestamp",
            timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        params.extend(request.parameters());

        let canonical_query = canonical_query(&params);
        let string_to_sign = string_to_sign(&canonical_query);
        let signature = self
            .signer
            .sign(&string_to_sign, &format!("{}&", request.access_key_secret()))
            .map_err(InvokeError::Signing)?;
        let uri = format!(
            "https://{}/?{}&Signature={}",
            self.endpoint,
            canonical_query,
            percent_encode(&signature)
        );
        http::Request::builder()
            .method(http::Method::GET)
            .uri(uri)
            .body(Bytes::new())
            .map_err(|err| InvokeError::Transport(err.into()))
    }
}

/// Sorted `key=value` pairs joined by `&`, with keys and values percent-encoded
fn canonical_query(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn string_to_sign(canonical_query: &str) -> String {
    format!("GET&{}&{}", percent_encode("/"), percent_encode(canonical_query))
}

fn parse_response(response: http::Response<Bytes>) -> Result<AssumeRoleResponse, InvokeError> {
    let status = response.status();
    let body = response.into_body();
    if status.is_success() {
        return serde_json::from_slice(&body)
            .map_err(|err| InvokeError::MalformedResponse(err.to_string().into()));
    }
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap_or_default();
    Err(InvokeError::Service {
        status: status.as_u16(),
        code: error.code,
        message: error.message,
        request_id: error.request_id,
    })
}

impl<S> StsClient<S>
where
    S: Service<http::Request<Bytes>, Response = http::Response<Bytes>> + Clone + Send + Sync + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
{
    async fn send(&self, request: AssumeRoleRequest) -> Result<AssumeRoleResponse, InvokeError> {
        let http_request = self.signed_request(&request)?;
        tracing::debug!(endpoint = %self.endpoint, role_arn = %request.role_arn(), "sending AssumeRole request");
        let response = tokio::time::timeout(self.timeout, self.service.clone().oneshot(http_request))
            .await
            .map_err(|_| InvokeError::TimedOut(self.timeout))?
            .map_err(|err| InvokeError::Transport(err.into()))?;
        parse_response(response)
    }
}

impl<S> AssumeRole for StsClient<S>
where
    S: Service<http::Request<Bytes>, Response = http::Response<Bytes>> + Clone + Send + Sync + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
{
    fn assume_role(&self, request: AssumeRoleRequest) -> super::future::AssumeRole<'_> {
        Box::pin(self.send(request))
    }
}
