/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! The STS `AssumeRole` operation
//!
//! [`AssumeRole`] is the seam between credential caching and the network: the
//! [`RamRoleArnCredential`](crate::ram_role_arn::RamRoleArnCredential) only ever talks to an
//! `Arc<dyn AssumeRole>`. [`StsClient`](client::StsClient) implements it over HTTP, and tests
//! substitute [`assume_role_fn`].

use crate::config::ValidatedRamRoleArnConfig;
use chrono::DateTime;
use serde::Deserialize;
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub mod client;

pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvokeError {
    #[error("failed to dispatch AssumeRole request: {0}")]
    Transport(#[source] BoxError),
    #[error("failed to sign AssumeRole request: {0}")]
    Signing(#[source] BoxError),
    #[error("AssumeRole failed with status {status} ({code}): {message} (request id: {request_id})")]
    Service {
        status: u16,
        code: String,
        message: String,
        request_id: String,
    },
    #[error("AssumeRole request timed out after {0:?}")]
    TimedOut(Duration),
    #[error("malformed AssumeRole response: {0}")]
    MalformedResponse(Cow<'static, str>),
}

/// Parameters of a single `AssumeRole` call
///
/// Besides the operation parameters, the request carries the long-lived key pair the invoker signs
/// it with.
#[derive(Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    role_arn: String,
    role_session_name: String,
    policy: Option<String>,
    duration_seconds: u64,
    access_key_id: String,
    access_key_secret: String,
}

impl Debug for AssumeRoleRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumeRoleRequest")
            .field("role_arn", &self.role_arn)
            .field("role_session_name", &self.role_session_name)
            .field("policy", &self.policy)
            .field("duration_seconds", &self.duration_seconds)
            .field("access_key_id", &self.access_key_id)
            .finish()
    }
}

impl From<&ValidatedRamRoleArnConfig> for AssumeRoleRequest {
    fn from(config: &ValidatedRamRoleArnConfig) -> Self {
        AssumeRoleRequest {
            role_arn: config.role_arn.clone(),
            role_session_name: config.role_session_name.clone(),
            policy: config.policy.clone(),
            duration_seconds: config.duration_seconds,
            access_key_id: config.access_key_id.clone(),
            access_key_secret: config.access_key_secret.clone(),
        }
    }
}

impl AssumeRoleRequest {
    pub fn role_arn(&self) -> &str {
        &self.role_arn
    }

    pub fn role_session_name(&self) -> &str {
        &self.role_session_name
    }

    pub fn policy(&self) -> Option<&str> {
        self.policy.as_deref()
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn access_key_secret(&self) -> &str {
        &self.access_key_secret
    }

    /// Operation parameters as sent on the wire; `Policy` is omitted when unset
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("RoleArn", self.role_arn.clone()),
            ("RoleSessionName", self.role_session_name.clone()),
            ("DurationSeconds", self.duration_seconds.to_string()),
        ];
        if let Some(policy) = &self.policy {
            params.push(("Policy", policy.clone()));
        }
        params
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleResponse {
    pub request_id: String,
    pub credentials: AssumedCredentials,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumedCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: String,
    pub expiration: Expiration,
}

impl Debug for AssumedCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Expiration of assumed credentials: an RFC 3339 timestamp such as `2015-04-09T11:52:19Z`,
/// or seconds since the Unix epoch
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Expiration {
    EpochSeconds(u64),
    Timestamp(String),
}

fn from_epoch_seconds(secs: u64) -> Result<SystemTime, InvokeError> {
    UNIX_EPOCH
        .checked_add(Duration::from_secs(secs))
        .ok_or_else(|| {
            InvokeError::MalformedResponse(
                format!("Expiration `{}` is out of range", secs).into(),
            )
        })
}

impl Expiration {
    pub fn to_system_time(&self) -> Result<SystemTime, InvokeError> {
        match self {
            Expiration::EpochSeconds(secs) => from_epoch_seconds(*secs),
            Expiration::Timestamp(ts) => {
                if let Ok(secs) = ts.parse::<u64>() {
                    return from_epoch_seconds(secs);
                }
                let parsed = DateTime::parse_from_rfc3339(ts).map_err(|err| {
                    InvokeError::MalformedResponse(
                        format!("invalid Expiration `{}`: {}", ts, err).into(),
                    )
                })?;
                Ok(SystemTime::from(parsed))
            }
        }
    }
}

impl From<SystemTime> for Expiration {
    fn from(time: SystemTime) -> Self {
        let utc: DateTime<chrono::Utc> = time.into();
        Expiration::Timestamp(utc.format("%Y-%m-%dT%H:%M:%SZ").to_string())
    }
}

pub mod future {
    use super::{AssumeRoleResponse, InvokeError};
    use std::future::Future;
    use std::pin::Pin;

    pub type AssumeRole<'a> =
        Pin<Box<dyn Future<Output = Result<AssumeRoleResponse, InvokeError>> + Send + 'a>>;
}

/// Performs the `AssumeRole` remote call
///
/// Implementations own transport, signing, timeouts and retries. Failures are returned to the
/// caller unchanged.
pub trait AssumeRole: Send + Sync {
    fn assume_role(&self, request: AssumeRoleRequest) -> future::AssumeRole<'_>;
}

impl<T> AssumeRole for Arc<T>
where
    T: AssumeRole + ?Sized,
{
    fn assume_role(&self, request: AssumeRoleRequest) -> future::AssumeRole<'_> {
        T::assume_role(self, request)
    }
}

/// An [`AssumeRole`] implemented by a closure.
///
/// See [`assume_role_fn`] for more details.
#[derive(Copy, Clone)]
pub struct AssumeRoleFn<F> {
    f: F,
}

impl<F, Fut> AssumeRole for AssumeRoleFn<F>
where
    F: Fn(AssumeRoleRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<AssumeRoleResponse, InvokeError>> + Send + 'static,
{
    fn assume_role(&self, request: AssumeRoleRequest) -> future::AssumeRole<'_> {
        Box::pin((self.f)(request))
    }
}

/// Returns a new [`AssumeRoleFn`] with the given closure.
///
/// # Example
///
/// ```
/// use credential_providers::assume_role::{
///     assume_role_fn, AssumeRoleResponse, AssumedCredentials,
/// };
/// use std::time::{Duration, SystemTime};
///
/// assume_role_fn(|_request| async move {
///     // A call to STS would go here
///     Ok(AssumeRoleResponse {
///         request_id: "request-id".to_string(),
///         credentials: AssumedCredentials {
///             access_key_id: "akid".to_string(),
///             access_key_secret: "secret".to_string(),
///             security_token: "token".to_string(),
///             expiration: (SystemTime::now() + Duration::from_secs(3600)).into(),
///         },
///     })
/// });
/// ```
pub fn assume_role_fn<F, Fut>(f: F) -> AssumeRoleFn<F>
where
    F: Fn(AssumeRoleRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<AssumeRoleResponse, InvokeError>> + Send + 'static,
{
    AssumeRoleFn { f }
}

#[cfg(test)]
mod test {
    use super::{AssumeRoleRequest, AssumeRoleResponse, Expiration, InvokeError};
    use crate::config::RamRoleArnConfig;
    use std::time::{Duration, UNIX_EPOCH};

    fn config(policy: Option<&str>, session: Option<&str>) -> RamRoleArnConfig {
        RamRoleArnConfig {
            role_arn: Some("roleArn".into()),
            access_key_id: Some("accessKeyId".into()),
            access_key_secret: Some("accessKeySecret".into()),
            policy: policy.map(Into::into),
            role_session_name: session.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn request_carries_policy() {
        let validated = config(Some("policy"), Some("session")).validate().unwrap();
        let request = AssumeRoleRequest::from(&validated);
        assert_eq!(request.policy(), Some("policy"));
        assert_eq!(
            request.parameters(),
            vec![
                ("RoleArn", "roleArn".to_string()),
                ("RoleSessionName", "session".to_string()),
                ("DurationSeconds", "3600".to_string()),
                ("Policy", "policy".to_string()),
            ]
        );
        assert_eq!(request.access_key_id(), "accessKeyId");
        assert_eq!(request.access_key_secret(), "accessKeySecret");
    }

    #[test]
    fn request_omits_unset_policy_and_defaults_session_name() {
        let validated = config(None, None).validate().unwrap();
        let request = AssumeRoleRequest::from(&validated);
        assert_eq!(request.policy(), None);
        assert_eq!(request.role_session_name(), "credentials-rust");
        assert!(request.parameters().iter().all(|(k, _)| *k != "Policy"));
    }

    #[test]
    fn request_debug_redacts_secret() {
        let validated = config(None, None).validate().unwrap();
        let debugged = format!("{:?}", AssumeRoleRequest::from(&validated));
        assert!(!debugged.contains("accessKeySecret"));
    }

    #[test]
    fn parse_response() {
        let response: AssumeRoleResponse = serde_json::from_str(
            r#"{
                "RequestId": "76C9056D-0E40-4ED9-A82E-D69B30E733C8",
                "AssumedRoleUser": {
                    "AssumedRoleId": "344584339364951186:alice",
                    "Arn": "acs:ram::123456789012****:role/adminrole/alice"
                },
                "Credentials": {
                    "AccessKeySecret": "AccessKeySecret",
                    "AccessKeyId": "AccessKeyId",
                    "Expiration": "2015-04-09T11:52:19Z",
                    "SecurityToken": "SecurityToken"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(response.request_id, "76C9056D-0E40-4ED9-A82E-D69B30E733C8");
        assert_eq!(response.credentials.access_key_id, "AccessKeyId");
        assert_eq!(
            response.credentials.expiration.to_system_time().unwrap(),
            UNIX_EPOCH + Duration::from_secs(1428580339)
        );
    }

    #[test]
    fn expiration_formats() {
        let at = UNIX_EPOCH + Duration::from_secs(1428580339);
        assert_eq!(
            Expiration::EpochSeconds(1428580339).to_system_time().unwrap(),
            at
        );
        assert_eq!(
            Expiration::Timestamp("1428580339".into())
                .to_system_time()
                .unwrap(),
            at
        );
        assert_eq!(
            Expiration::Timestamp("2015-04-09T19:52:19+08:00".into())
                .to_system_time()
                .unwrap(),
            at
        );
        assert_eq!(
            Expiration::from(at),
            Expiration::Timestamp("2015-04-09T11:52:19Z".into())
        );
        assert!(matches!(
            Expiration::Timestamp("tomorrow".into()).to_system_time(),
            Err(InvokeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn out_of_range_epoch_seconds_are_malformed() {
        assert!(matches!(
            Expiration::EpochSeconds(u64::MAX).to_system_time(),
            Err(InvokeError::MalformedResponse(_))
        ));
        assert!(matches!(
            Expiration::Timestamp(u64::MAX.to_string()).to_system_time(),
            Err(InvokeError::MalformedResponse(_))
        ));
    }
}
