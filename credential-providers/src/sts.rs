/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! Static STS token credentials

use crate::config::{ConfigError, StsConfig};
use credential_types::provider::{future, Credential, CredentialType};
use credential_types::Credentials;

const PROVIDER_NAME: &str = "Sts";

/// An STS token the caller obtained elsewhere
///
/// The token is used as given; it is never refreshed.
#[derive(Debug, Clone)]
pub struct StsCredential {
    credentials: Credentials,
}

impl StsCredential {
    pub fn new(config: &StsConfig) -> Result<Self, ConfigError> {
        let (access_key_id, access_key_secret, security_token) = config.validate()?;
        Ok(StsCredential {
            credentials: Credentials::new(
                access_key_id,
                access_key_secret,
                Some(security_token),
                None,
                PROVIDER_NAME,
            ),
        })
    }
}

impl Credential for StsCredential {
    fn credentials(&self) -> future::ProvideCredentials<'_> {
        future::ProvideCredentials::ready(Ok(self.credentials.clone()))
    }

    fn credential_type(&self) -> CredentialType {
        CredentialType::Sts
    }

    fn need_update_credential(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod test {
    use super::StsCredential;
    use crate::config::StsConfig;
    use credential_types::{Credential, CredentialType};

    fn config() -> StsConfig {
        StsConfig {
            credential_type: Some("sts".into()),
            access_key_id: Some("STS.akid".into()),
            access_key_secret: Some("secret".into()),
            security_token: Some("token".into()),
        }
    }

    #[tokio::test]
    async fn static_token() {
        let credential = StsCredential::new(&config()).unwrap();
        assert_eq!(credential.access_key_id().await.unwrap(), "STS.akid");
        assert_eq!(
            credential.security_token().await.unwrap().as_deref(),
            Some("token")
        );
        assert_eq!(credential.credential_type().as_str(), "sts");
        assert!(!credential.need_update_credential());
    }

    #[test]
    fn missing_token() {
        let config = StsConfig {
            security_token: None,
            ..config()
        };
        assert_eq!(
            StsCredential::new(&config).unwrap_err().to_string(),
            "Missing required securityToken option in config for sts"
        );
    }
}
