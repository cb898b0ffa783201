/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Alibaba Cloud Credentials
///
/// An opaque struct representing credentials that may be used to sign requests.
///
/// Credentials are cloned out of caches on every read, so the fields are held behind an `Arc`.
/// A `Credentials` value is never mutated: a refresh produces a new value that replaces the old one
/// wholesale.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials(Arc<Inner>);

#[derive(Clone, Eq, PartialEq)]
struct Inner {
    access_key_id: String,
    access_key_secret: String,
    security_token: Option<String>,

    /// Credential Expiry
    ///
    /// A timepoint at which the credentials should no longer be used because they have expired.
    /// Long-lived access keys never expire and leave this as `None`.
    expires_after: Option<SystemTime>,

    provider_name: &'static str,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut creds = f.debug_struct("Credentials");
        creds
            .field("provider_name", &self.0.provider_name)
            .field("access_key_id", &self.0.access_key_id);
        if let Some(expiry) = self.expiry() {
            match expiry.duration_since(UNIX_EPOCH) {
                Ok(since_epoch) => creds.field("expires_after", &since_epoch.as_secs()),
                Err(_) => creds.field("expires_after", &expiry),
            };
        }
        creds.finish()
    }
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        security_token: Option<String>,
        expires_after: Option<SystemTime>,
        provider_name: &'static str,
    ) -> Self {
        Credentials(Arc::new(Inner {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            security_token,
            expires_after,
            provider_name,
        }))
    }

    pub fn access_key_id(&self) -> &str {
        &self.0.access_key_id
    }

    pub fn access_key_secret(&self) -> &str {
        &self.0.access_key_secret
    }

    pub fn security_token(&self) -> Option<&str> {
        self.0.security_token.as_deref()
    }

    pub fn expiry(&self) -> Option<SystemTime> {
        self.0.expires_after
    }

    /// Name of the credential kind that produced these credentials
    pub fn provider_name(&self) -> &'static str {
        self.0.provider_name
    }
}

#[cfg(test)]
mod test {
    use crate::Credentials;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn debug_impl_redacts_secrets() {
        let creds = Credentials::new(
            "akid",
            "very-secret",
            Some("very-secret-token".into()),
            Some(UNIX_EPOCH + Duration::from_secs(1234567890)),
            "debug tester",
        );
        let debugged = format!("{:?}", creds);
        assert_eq!(
            debugged,
            r#"Credentials { provider_name: "debug tester", access_key_id: "akid", expires_after: 1234567890 }"#
        );
        assert!(!debugged.contains("very-secret"));
    }

    #[test]
    fn long_lived_keys_never_expire() {
        let creds = Credentials::new("akid", "secret", None, None, "AccessKey");
        assert_eq!(creds.expiry(), None);
        assert_eq!(creds.security_token(), None);
        assert_eq!(creds.provider_name(), "AccessKey");
    }
}
