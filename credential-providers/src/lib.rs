/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! Alibaba Cloud credential providers
//!
//! Each credential kind is a distinct type implementing [`Credential`](credential_types::Credential):
//! - [`AccessKeyCredential`](access_key::AccessKeyCredential): a long-lived access key pair
//! - [`StsCredential`](sts::StsCredential): a static STS token
//! - [`RamRoleArnCredential`](ram_role_arn::RamRoleArnCredential): session credentials obtained by
//!   assuming a RAM role, cached and refreshed before they expire
//!
//! `RamRoleArnCredential` reaches STS through an [`AssumeRole`](assume_role::AssumeRole)
//! implementation. [`StsClient`](assume_role::client::StsClient) is provided for HTTP; tests and
//! callers with their own SDK can plug in any other implementation.

pub mod access_key;
pub mod assume_role;
pub mod config;
pub mod ram_role_arn;
pub mod sts;

pub use config::ConfigError;
