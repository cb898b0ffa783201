/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! Configuration accepted by each credential kind
//!
//! Every config deserializes from the camelCase object callers already use to describe
//! credentials, e.g.:
//! ```json
//! {
//!     "type": "ram_role_arn",
//!     "roleArn": "acs:ram::123456789012:role/example",
//!     "accessKeyId": "akid",
//!     "accessKeySecret": "secret"
//! }
//! ```
//! All fields are optional at the type level; each kind validates what it requires when the
//! credential is constructed, before any network activity.

use credential_types::CredentialType;
use serde::Deserialize;
use std::fmt::{self, Debug, Formatter};
use std::time::Duration;
use thiserror::Error;

/// Session name sent to STS when the config does not name one
pub const DEFAULT_ROLE_SESSION_NAME: &str = "credentials-rust";

/// Requested session lifetime when the config does not set `durationSeconds`
pub const DEFAULT_DURATION_SECONDS: u64 = 3600;

/// Shortest session STS will issue
pub const MIN_DURATION_SECONDS: u64 = 900;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Missing required {field} option in config for {kind}")]
    MissingField {
        field: &'static str,
        kind: CredentialType,
    },
    #[error("Invalid type option {found:?} in config, expected {expected}")]
    InvalidType {
        expected: CredentialType,
        found: String,
    },
    #[error(
        "durationSeconds must be at least {} in config for {kind}, got {found}",
        MIN_DURATION_SECONDS
    )]
    InvalidDuration { kind: CredentialType, found: u64 },
    #[error("refresh buffer must be a fraction in [0, 1), got {0}")]
    InvalidRefreshBuffer(f64),
}

fn check_type(found: Option<&str>, expected: CredentialType) -> Result<(), ConfigError> {
    match found {
        Some(found) if found != expected.as_str() => Err(ConfigError::InvalidType {
            expected,
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}

fn require(
    value: Option<&str>,
    field: &'static str,
    kind: CredentialType,
) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ConfigError::MissingField { field, kind }),
    }
}

/// Options for the `ram_role_arn` credential kind
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RamRoleArnConfig {
    #[serde(rename = "type")]
    pub credential_type: Option<String>,
    pub role_arn: Option<String>,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub role_session_name: Option<String>,
    /// JSON policy document further restricting the assumed session
    pub policy: Option<String>,
    pub duration_seconds: Option<u64>,
    /// Region of the STS endpoint; the global endpoint is used when unset
    pub region_id: Option<String>,
    /// Timeout for the assume-role call, in milliseconds
    pub timeout: Option<u64>,
}

impl Debug for RamRoleArnConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RamRoleArnConfig")
            .field("credential_type", &self.credential_type)
            .field("role_arn", &self.role_arn)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &self.access_key_secret.as_ref().map(|_| "** redacted **"))
            .field("role_session_name", &self.role_session_name)
            .field("policy", &self.policy)
            .field("duration_seconds", &self.duration_seconds)
            .field("region_id", &self.region_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RamRoleArnConfig {
    /// Returns the validated settings, or an error naming the first missing required option
    ///
    /// Required options are checked in the order `roleArn`, `accessKeyId`, `accessKeySecret`.
    pub fn validate(&self) -> Result<ValidatedRamRoleArnConfig, ConfigError> {
        let kind = CredentialType::RamRoleArn;
        check_type(self.credential_type.as_deref(), kind)?;
        let role_arn = require(self.role_arn.as_deref(), "roleArn", kind)?;
        let access_key_id = require(self.access_key_id.as_deref(), "accessKeyId", kind)?;
        let access_key_secret =
            require(self.access_key_secret.as_deref(), "accessKeySecret", kind)?;
        let duration_seconds = self.duration_seconds.unwrap_or(DEFAULT_DURATION_SECONDS);
        if duration_seconds < MIN_DURATION_SECONDS {
            return Err(ConfigError::InvalidDuration {
                kind,
                found: duration_seconds,
            });
        }
        Ok(ValidatedRamRoleArnConfig {
            role_arn,
            access_key_id,
            access_key_secret,
            role_session_name: self
                .role_session_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE_SESSION_NAME.to_string()),
            policy: self.policy.clone().filter(|policy| !policy.is_empty()),
            duration_seconds,
        })
    }

    /// The configured call timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }
}

/// `ram_role_arn` settings with every required option present and defaults applied
#[derive(Clone)]
pub struct ValidatedRamRoleArnConfig {
    pub(crate) role_arn: String,
    pub(crate) access_key_id: String,
    pub(crate) access_key_secret: String,
    pub(crate) role_session_name: String,
    pub(crate) policy: Option<String>,
    pub(crate) duration_seconds: u64,
}

impl Debug for ValidatedRamRoleArnConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedRamRoleArnConfig")
            .field("role_arn", &self.role_arn)
            .field("access_key_id", &self.access_key_id)
            .field("role_session_name", &self.role_session_name)
            .field("policy", &self.policy)
            .field("duration_seconds", &self.duration_seconds)
            .finish()
    }
}

impl ValidatedRamRoleArnConfig {
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
}

/// Options for the `access_key` credential kind
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyConfig {
    #[serde(rename = "type")]
    pub credential_type: Option<String>,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
}

impl Debug for AccessKeyConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKeyConfig")
            .field("credential_type", &self.credential_type)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &self.access_key_secret.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

impl AccessKeyConfig {
    pub(crate) fn validate(&self) -> Result<(String, String), ConfigError> {
        let kind = CredentialType::AccessKey;
        check_type(self.credential_type.as_deref(), kind)?;
        Ok((
            require(self.access_key_id.as_deref(), "accessKeyId", kind)?,
            require(self.access_key_secret.as_deref(), "accessKeySecret", kind)?,
        ))
    }
}

/// Options for the `sts` credential kind
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StsConfig {
    #[serde(rename = "type")]
    pub credential_type: Option<String>,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub security_token: Option<String>,
}

impl Debug for StsConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StsConfig")
            .field("credential_type", &self.credential_type)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &self.access_key_secret.as_ref().map(|_| "** redacted **"))
            .field("security_token", &self.security_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

impl StsConfig {
    pub(crate) fn validate(&self) -> Result<(String, String, String), ConfigError> {
        let kind = CredentialType::Sts;
        check_type(self.credential_type.as_deref(), kind)?;
        Ok((
            require(self.access_key_id.as_deref(), "accessKeyId", kind)?,
            require(self.access_key_secret.as_deref(), "accessKeySecret", kind)?,
            require(self.security_token.as_deref(), "securityToken", kind)?,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::{ConfigError, RamRoleArnConfig, DEFAULT_ROLE_SESSION_NAME};
    use credential_types::CredentialType;

    fn ram_role_arn() -> RamRoleArnConfig {
        RamRoleArnConfig {
            credential_type: Some("ram_role_arn".into()),
            role_arn: Some("roleArn".into()),
            access_key_id: Some("accessKeyId".into()),
            access_key_secret: Some("accessKeySecret".into()),
            ..Default::default()
        }
    }

    #[test]
    fn deserializes_camel_case_options() {
        let config: RamRoleArnConfig = serde_json::from_str(
            r#"{
                "type": "ram_role_arn",
                "roleArn": "acs:ram::123:role/test",
                "accessKeyId": "akid",
                "accessKeySecret": "secret",
                "roleSessionName": "session",
                "policy": "{\"Statement\": []}",
                "durationSeconds": 1800,
                "regionId": "cn-shanghai",
                "timeout": 2000
            }"#,
        )
        .unwrap();
        let validated = config.validate().unwrap();
        assert_eq!(validated.role_arn(), "acs:ram::123:role/test");
        assert_eq!(validated.role_session_name(), "session");
        assert_eq!(validated.policy(), Some("{\"Statement\": []}"));
        assert_eq!(validated.duration_seconds(), 1800);
        assert_eq!(config.region_id.as_deref(), Some("cn-shanghai"));
        assert_eq!(config.timeout(), Some(std::time::Duration::from_secs(2)));
    }

    #[test]
    fn applies_defaults() {
        let validated = ram_role_arn().validate().unwrap();
        assert_eq!(validated.role_session_name(), DEFAULT_ROLE_SESSION_NAME);
        assert_eq!(validated.policy(), None);
        assert_eq!(validated.duration_seconds(), 3600);
    }

    #[test]
    fn missing_fields_are_named() {
        let cases: [(&'static str, fn(&mut RamRoleArnConfig)); 3] = [
            ("roleArn", |c| c.role_arn = None),
            ("accessKeyId", |c| c.access_key_id = None),
            ("accessKeySecret", |c| c.access_key_secret = Some(String::new())),
        ];
        for (field, strip) in cases {
            let mut config = ram_role_arn();
            strip(&mut config);
            let err = config.validate().unwrap_err();
            assert_eq!(
                err,
                ConfigError::MissingField {
                    field,
                    kind: CredentialType::RamRoleArn
                }
            );
            assert_eq!(
                err.to_string(),
                format!("Missing required {} option in config for ram_role_arn", field)
            );
        }
    }

    #[test]
    fn wrong_type_is_rejected() {
        let config = RamRoleArnConfig {
            credential_type: Some("access_key".into()),
            ..ram_role_arn()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::InvalidType {
                expected: CredentialType::RamRoleArn,
                found: "access_key".into()
            }
        );
    }

    #[test]
    fn short_sessions_are_rejected() {
        let config = RamRoleArnConfig {
            duration_seconds: Some(899),
            ..ram_role_arn()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration { found: 899, .. })
        ));
    }

    #[test]
    fn debug_impl_redacts_secret() {
        let debugged = format!("{:?}", ram_role_arn());
        assert!(!debugged.contains("\"accessKeySecret\""));
        assert!(debugged.contains("** redacted **"));
    }
}
