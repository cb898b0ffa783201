/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! Alibaba Cloud Credentials
//!
//! This crate contains the types shared by every credential kind:
//! - [`Credentials`]: an immutable snapshot of an access key pair, an optional security token
//!   and an optional expiration.
//! - [`Credential`](provider::Credential): the capability set every credential kind implements.
//! - [`TimeSource`](time::TimeSource): an injectable clock used to decide when cached credentials
//!   must be refreshed.
//!
//! ## Implementing your own credential kind
//! Credential kinds that load credentials asynchronously should define an inherent `async fn`
//! and return it from the trait implementation:
//! ```rust
//! use credential_types::provider::{self, future, Credential, CredentialType};
//! use credential_types::Credentials;
//!
//! #[derive(Debug)]
//! struct SubprocessCredential;
//!
//! impl SubprocessCredential {
//!     async fn load_credentials(&self) -> provider::Result {
//!         // implementation elided...
//!         Ok(Credentials::new("akid", "secret", None, None, "Subprocess"))
//!     }
//! }
//!
//! impl Credential for SubprocessCredential {
//!     fn credentials(&self) -> future::ProvideCredentials<'_> {
//!         future::ProvideCredentials::new(self.load_credentials())
//!     }
//!
//!     fn credential_type(&self) -> CredentialType {
//!         CredentialType::AccessKey
//!     }
//!
//!     fn need_update_credential(&self) -> bool {
//!         false
//!     }
//! }
//! ```

pub mod credentials;
pub mod provider;
pub mod time;

pub use credentials::Credentials;
pub use provider::{Credential, CredentialType, CredentialsError};
