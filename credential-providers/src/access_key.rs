/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! Long-lived access key credentials

use crate::config::{AccessKeyConfig, ConfigError};
use credential_types::provider::{future, Credential, CredentialType};
use credential_types::Credentials;

const PROVIDER_NAME: &str = "AccessKey";

/// A long-lived access key pair
///
/// The keys never expire, so accessors always resolve immediately and there is no security token.
#[derive(Debug, Clone)]
pub struct AccessKeyCredential {
    credentials: Credentials,
}

impl AccessKeyCredential {
    pub fn new(config: &AccessKeyConfig) -> Result<Self, ConfigError> {
        let (access_key_id, access_key_secret) = config.validate()?;
        Ok(AccessKeyCredential {
            credentials: Credentials::new(
                access_key_id,
                access_key_secret,
                None,
                None,
                PROVIDER_NAME,
            ),
        })
    }
}

impl Credential for AccessKeyCredential {
    fn credentials(&self) -> future::ProvideCredentials<'_> {
        future::ProvideCredentials::ready(Ok(self.credentials.clone()))
    }

    fn credential_type(&self) -> CredentialType {
        CredentialType::AccessKey
    }

    fn need_update_credential(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod test {
    use super::AccessKeyCredential;
    use crate::config::AccessKeyConfig;
    use credential_types::{Credential, CredentialType};

    #[tokio::test]
    async fn static_keys() {
        let config: AccessKeyConfig = serde_json::from_str(
            r#"{"type": "access_key", "accessKeyId": "akid", "accessKeySecret": "secret"}"#,
        )
        .unwrap();
        let credential = AccessKeyCredential::new(&config).unwrap();
        assert_eq!(credential.access_key_id().await.unwrap(), "akid");
        assert_eq!(credential.access_key_secret().await.unwrap(), "secret");
        assert_eq!(credential.security_token().await.unwrap(), None);
        assert_eq!(credential.credential_type(), CredentialType::AccessKey);
        assert!(!credential.need_update_credential());
    }

    #[test]
    fn missing_secret() {
        let config = AccessKeyConfig {
            access_key_id: Some("akid".into()),
            ..Default::default()
        };
        assert_eq!(
            AccessKeyCredential::new(&config).unwrap_err().to_string(),
            "Missing required accessKeySecret option in config for access_key"
        );
    }
}
