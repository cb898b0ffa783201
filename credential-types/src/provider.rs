/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::Credentials;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Failure to produce credentials
///
/// Configuration problems are reported when a credential is constructed, so only a failed
/// refresh can surface here.
#[derive(Debug)]
#[non_exhaustive]
pub enum CredentialsError {
    /// Refreshing the credentials failed, e.g. STS rejected the call, timed out, or returned a
    /// response that could not be used. The cause is available through [`Error::source`].
    ProviderError(Box<dyn Error + Send + Sync + 'static>),
}

impl Display for CredentialsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CredentialsError::ProviderError(err) => {
                write!(f, "failed to refresh credentials: {}", err)
            }
        }
    }
}

impl Error for CredentialsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CredentialsError::ProviderError(e) => Some(e.as_ref() as _),
        }
    }
}

pub type Result = std::result::Result<Credentials, CredentialsError>;

/// Tag identifying how a [`Credential`] obtains its keys
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum CredentialType {
    /// A long-lived access key pair
    AccessKey,
    /// A static STS token triple
    Sts,
    /// Session credentials obtained by assuming a RAM role
    RamRoleArn,
}

impl CredentialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::AccessKey => "access_key",
            CredentialType::Sts => "sts",
            CredentialType::RamRoleArn => "ram_role_arn",
        }
    }
}

impl Display for CredentialType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod future {
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

    enum Inner<'a> {
        Now(Option<super::Result>),
        Later(BoxFuture<'a, super::Result>),
    }

    /// Future returned by [`Credential::credentials`](super::Credential::credentials)
    ///
    /// Static credential kinds resolve immediately without allocating.
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct ProvideCredentials<'a>(Inner<'a>);

    impl<'a> ProvideCredentials<'a> {
        pub fn new(future: impl Future<Output = super::Result> + Send + 'a) -> Self {
            ProvideCredentials(Inner::Later(Box::pin(future)))
        }

        pub fn ready(credentials: super::Result) -> Self {
            ProvideCredentials(Inner::Now(Some(credentials)))
        }
    }

    impl Future for ProvideCredentials<'_> {
        type Output = super::Result;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            match &mut self.0 {
                Inner::Now(value) => Poll::Ready(
                    value
                        .take()
                        .expect("cannot be called after it returned `Poll::Ready`"),
                ),
                Inner::Later(future) => future.as_mut().poll(cx),
            }
        }
    }
}

/// Capability set shared by every credential kind
///
/// Accessors may suspend: a kind backed by expiring session credentials refreshes them before
/// returning a value. Callers that need more than one field should prefer [`credentials`] so that
/// every field comes from the same snapshot.
///
/// [`credentials`]: Credential::credentials
pub trait Credential: Send + Sync {
    /// Returns a consistent snapshot of the current credentials, refreshing them first if needed
    fn credentials(&self) -> future::ProvideCredentials<'_>;

    /// The tag identifying this credential kind
    fn credential_type(&self) -> CredentialType;

    /// Whether the next accessor call will have to refresh the credentials
    fn need_update_credential(&self) -> bool;

    fn access_key_id(&self) -> future::BoxFuture<'_, std::result::Result<String, CredentialsError>> {
        Box::pin(async move {
            let credentials = self.credentials().await?;
            Ok(credentials.access_key_id().to_string())
        })
    }

    fn access_key_secret(
        &self,
    ) -> future::BoxFuture<'_, std::result::Result<String, CredentialsError>> {
        Box::pin(async move {
            let credentials = self.credentials().await?;
            Ok(credentials.access_key_secret().to_string())
        })
    }

    /// Long-lived access keys carry no security token and resolve to `None`
    fn security_token(
        &self,
    ) -> future::BoxFuture<'_, std::result::Result<Option<String>, CredentialsError>> {
        Box::pin(async move {
            let credentials = self.credentials().await?;
            Ok(credentials.security_token().map(|token| token.to_string()))
        })
    }
}

impl<T> Credential for Arc<T>
where
    T: Credential + ?Sized,
{
    fn credentials(&self) -> future::ProvideCredentials<'_> {
        T::credentials(self)
    }

    fn credential_type(&self) -> CredentialType {
        T::credential_type(self)
    }

    fn need_update_credential(&self) -> bool {
        T::need_update_credential(self)
    }

    fn access_key_id(&self) -> future::BoxFuture<'_, std::result::Result<String, CredentialsError>> {
        T::access_key_id(self)
    }

    fn access_key_secret(
        &self,
    ) -> future::BoxFuture<'_, std::result::Result<String, CredentialsError>> {
        T::access_key_secret(self)
    }

    fn security_token(
        &self,
    ) -> future::BoxFuture<'_, std::result::Result<Option<String>, CredentialsError>> {
        T::security_token(self)
    }
}
