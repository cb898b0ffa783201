/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use credential_types::Credentials;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

/// Fraction of a session's lifetime left when it starts being refreshed
pub(crate) const DEFAULT_REFRESH_BUFFER: f64 = 0.05;

/// Session credentials together with the window they are valid for
#[derive(Clone, Debug)]
pub(crate) struct SessionCredential {
    credentials: Credentials,
    issued_at: SystemTime,
    expiration: SystemTime,
}

impl SessionCredential {
    pub(crate) fn new(credentials: Credentials, issued_at: SystemTime, expiration: SystemTime) -> Self {
        SessionCredential {
            credentials,
            issued_at,
            expiration,
        }
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Stale once no more than `refresh_buffer` of the lifetime is left, or once expired
    pub(crate) fn is_stale(&self, now: SystemTime, refresh_buffer: f64) -> bool {
        let remaining = match self.expiration.duration_since(now) {
            Ok(remaining) => remaining,
            Err(_) => return true,
        };
        let lifetime = match self.expiration.duration_since(self.issued_at) {
            Ok(lifetime) if !lifetime.is_zero() => lifetime,
            _ => return true,
        };
        remaining <= lifetime.mul_f64(refresh_buffer)
    }
}

/// Holds the most recent session credential
///
/// The lock is only held to clone or replace the whole value, never across an await or any code
/// that can panic, so readers can't observe a partially written credential.
#[derive(Debug)]
pub(crate) struct SessionCache {
    value: RwLock<Option<SessionCredential>>,
    refresh_buffer: f64,
}

impl SessionCache {
    /// `refresh_buffer` must be in `[0, 1)`
    pub(crate) fn new(refresh_buffer: f64) -> Self {
        SessionCache {
            value: RwLock::new(None),
            refresh_buffer,
        }
    }

    pub(crate) fn get(&self) -> Option<SessionCredential> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set(&self, session: SessionCredential) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub(crate) fn clear(&self) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns the cached credentials if they don't need a refresh yet
    pub(crate) fn fresh(&self, now: SystemTime) -> Option<Credentials> {
        self.get()
            .filter(|session| !session.is_stale(now, self.refresh_buffer))
            .map(|session| session.credentials)
    }

    pub(crate) fn is_stale(&self, now: SystemTime) -> bool {
        self.fresh(now).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionCache, SessionCredential, DEFAULT_REFRESH_BUFFER};
    use credential_types::Credentials;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn epoch_secs(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    /// Issued at 1000, valid for an hour
    fn session() -> SessionCredential {
        let credentials = Credentials::new(
            "akid",
            "secret",
            Some("token".into()),
            Some(epoch_secs(4600)),
            "test",
        );
        SessionCredential::new(credentials, epoch_secs(1000), epoch_secs(4600))
    }

    #[test]
    fn staleness_threshold() {
        let session = session();
        assert!(!session.is_stale(epoch_secs(1000), DEFAULT_REFRESH_BUFFER));
        // 50% elapsed
        assert!(!session.is_stale(epoch_secs(2800), DEFAULT_REFRESH_BUFFER));
        // 94% elapsed
        assert!(!session.is_stale(epoch_secs(1000 + 3384), DEFAULT_REFRESH_BUFFER));
        // 96% elapsed
        assert!(session.is_stale(epoch_secs(1000 + 3456), DEFAULT_REFRESH_BUFFER));
        assert!(session.is_stale(epoch_secs(4600), DEFAULT_REFRESH_BUFFER));
        assert!(session.is_stale(epoch_secs(9000), DEFAULT_REFRESH_BUFFER));
    }

    #[test]
    fn buffer_is_configurable() {
        let session = session();
        assert!(session.is_stale(epoch_secs(2800), 0.5));
        assert!(!session.is_stale(epoch_secs(4599), 0.0));
        assert!(session.is_stale(epoch_secs(4600), 0.0));
    }

    #[test]
    fn expiration_before_issuance_is_stale() {
        let credentials = Credentials::new("akid", "secret", None, None, "test");
        let session = SessionCredential::new(credentials, epoch_secs(5000), epoch_secs(4600));
        assert!(session.is_stale(epoch_secs(4000), DEFAULT_REFRESH_BUFFER));
    }

    #[test]
    fn empty_and_cleared_caches_are_stale() {
        let cache = SessionCache::new(DEFAULT_REFRESH_BUFFER);
        assert!(cache.is_stale(epoch_secs(1000)));
        assert!(cache.get().is_none());

        cache.set(session());
        assert!(!cache.is_stale(epoch_secs(1000)));
        assert_eq!(
            cache.fresh(epoch_secs(1000)).unwrap().access_key_id(),
            "akid"
        );

        cache.clear();
        assert!(cache.is_stale(epoch_secs(1000)));
    }

    #[test]
    fn stale_sessions_stay_cached() {
        let cache = SessionCache::new(DEFAULT_REFRESH_BUFFER);
        cache.set(session());
        assert!(cache.is_stale(epoch_secs(4500)));
        assert!(cache.fresh(epoch_secs(4500)).is_none());
        assert!(cache.get().is_some());
    }
}
