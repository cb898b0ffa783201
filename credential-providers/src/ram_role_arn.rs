/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! Session credentials obtained by assuming a RAM role

use crate::assume_role::{AssumeRole, AssumeRoleRequest, AssumeRoleResponse};
use crate::config::{ConfigError, RamRoleArnConfig, ValidatedRamRoleArnConfig};
use credential_types::provider::{self, future, Credential, CredentialType, CredentialsError};
use credential_types::time::{SharedTimeSource, TimeSource};
use credential_types::Credentials;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::Instrument;

mod cache;

use cache::{SessionCache, SessionCredential, DEFAULT_REFRESH_BUFFER};

const PROVIDER_NAME: &str = "RamRoleArn";

/// `RamRoleArnCredential` implements [`Credential`] by assuming a RAM role with a long-lived
/// access key pair and caching the session credentials STS returns.
///
/// Accessors refresh the session once no more than 5% of its lifetime is left, so callers are never
/// handed credentials that are about to expire. Concurrent accessors share a single in-flight
/// `AssumeRole` call. A failed refresh leaves the previous session in the cache and the next
/// accessor call tries again.
///
/// # Example
/// ```rust
/// use credential_providers::assume_role::{assume_role_fn, AssumeRoleResponse, AssumedCredentials};
/// use credential_providers::config::RamRoleArnConfig;
/// use credential_providers::ram_role_arn::RamRoleArnCredential;
/// use credential_types::Credential;
/// use std::time::{Duration, SystemTime};
///
/// # async fn docs() {
/// let config: RamRoleArnConfig = serde_json::from_str(r#"{
///     "type": "ram_role_arn",
///     "roleArn": "acs:ram::123456789012:role/example",
///     "accessKeyId": "akid",
///     "accessKeySecret": "secret"
/// }"#).unwrap();
/// let sts = assume_role_fn(|_request| async {
///     Ok(AssumeRoleResponse {
///         request_id: "request-id".to_string(),
///         credentials: AssumedCredentials {
///             access_key_id: "STS.akid".to_string(),
///             access_key_secret: "secret".to_string(),
///             security_token: "token".to_string(),
///             expiration: (SystemTime::now() + Duration::from_secs(3600)).into(),
///         },
///     })
/// });
/// let credential = RamRoleArnCredential::new(&config, sts).expect("valid config");
/// assert_eq!(credential.access_key_id().await.unwrap(), "STS.akid");
/// # }
/// ```
pub struct RamRoleArnCredential {
    config: ValidatedRamRoleArnConfig,
    assume_role: Arc<dyn AssumeRole>,
    time_source: SharedTimeSource,
    cache: SessionCache,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl Debug for RamRoleArnCredential {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RamRoleArnCredential")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}

impl RamRoleArnCredential {
    /// Validates `config` and creates a credential with an empty cache
    ///
    /// No request is made until an accessor is called.
    pub fn new(
        config: &RamRoleArnConfig,
        assume_role: impl AssumeRole + 'static,
    ) -> Result<Self, ConfigError> {
        Self::builder().build(config, assume_role)
    }

    /// Returns a new `Builder` that can be used to construct the `RamRoleArnCredential`.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Whether an accessor called at `now` would refresh the credentials
    pub fn need_update_credential_at(&self, now: SystemTime) -> bool {
        self.cache.is_stale(now)
    }

    /// Drops the cached session so the next accessor call refreshes it
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// ARN of the role this credential assumes
    pub fn role_arn(&self) -> &str {
        self.config.role_arn()
    }

    async fn load(&self) -> provider::Result {
        if let Some(credentials) = self.cache.fresh(self.time_source.now()) {
            tracing::trace!("using cached session credentials");
            return Ok(credentials);
        }
        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited for the lock
        if let Some(credentials) = self.cache.fresh(self.time_source.now()) {
            return Ok(credentials);
        }
        self.refresh()
            .instrument(tracing::info_span!(
                "refresh_credentials",
                provider = PROVIDER_NAME,
                role_arn = %self.role_arn()
            ))
            .await
    }

    async fn refresh(&self) -> provider::Result {
        let request = AssumeRoleRequest::from(&self.config);
        let response = match self.assume_role.assume_role(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "failed to assume role");
                return Err(CredentialsError::ProviderError(err.into()));
            }
        };
        let session = self.session_from_response(response)?;
        let credentials = session.credentials().clone();
        self.cache.set(session);
        Ok(credentials)
    }

    fn session_from_response(
        &self,
        response: AssumeRoleResponse,
    ) -> Result<SessionCredential, CredentialsError> {
        let issued_at = self.time_source.now();
        let assumed = response.credentials;
        let expiration = assumed.expiration.to_system_time().map_err(|err| {
            tracing::warn!(error = %err, request_id = %response.request_id, "unusable AssumeRole response");
            CredentialsError::ProviderError(err.into())
        })?;
        tracing::info!(
            request_id = %response.request_id,
            expiration = ?assumed.expiration,
            "assumed role"
        );
        let credentials = Credentials::new(
            assumed.access_key_id,
            assumed.access_key_secret,
            Some(assumed.security_token),
            Some(expiration),
            PROVIDER_NAME,
        );
        Ok(SessionCredential::new(credentials, issued_at, expiration))
    }
}

impl Credential for RamRoleArnCredential {
    fn credentials(&self) -> future::ProvideCredentials<'_> {
        future::ProvideCredentials::new(self.load())
    }

    fn credential_type(&self) -> CredentialType {
        CredentialType::RamRoleArn
    }

    fn need_update_credential(&self) -> bool {
        self.need_update_credential_at(self.time_source.now())
    }
}

/// Builder for [`RamRoleArnCredential`]
#[derive(Debug, Default)]
pub struct Builder {
    time_source: Option<SharedTimeSource>,
    refresh_buffer: Option<f64>,
}

impl Builder {
    /// (Optional) Clock used to decide when the session must be refreshed
    pub fn time_source(mut self, time_source: impl TimeSource + 'static) -> Self {
        self.time_source = Some(SharedTimeSource::new(time_source));
        self
    }

    /// (Optional) Fraction of the session lifetime that must remain for cached credentials to be
    /// used. Must be in `[0, 1)`. Defaults to `0.05`: sessions are refreshed once 95% of their
    /// lifetime has elapsed.
    pub fn refresh_buffer(mut self, fraction: f64) -> Self {
        self.refresh_buffer = Some(fraction);
        self
    }

    /// Validates `config` and creates the [`RamRoleArnCredential`].
    pub fn build(
        self,
        config: &RamRoleArnConfig,
        assume_role: impl AssumeRole + 'static,
    ) -> Result<RamRoleArnCredential, ConfigError> {
        let config = config.validate()?;
        let refresh_buffer = self.refresh_buffer.unwrap_or(DEFAULT_REFRESH_BUFFER);
        if !(0.0..1.0).contains(&refresh_buffer) {
            return Err(ConfigError::InvalidRefreshBuffer(refresh_buffer));
        }
        Ok(RamRoleArnCredential {
            config,
            assume_role: Arc::new(assume_role),
            time_source: self.time_source.unwrap_or_default(),
            cache: SessionCache::new(refresh_buffer),
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }
}
