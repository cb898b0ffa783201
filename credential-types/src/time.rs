/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Time sources used to decide when cached credentials must be refreshed

use std::fmt::Debug;
use std::sync::Arc;
use std::time::SystemTime;

/// Trait with a `now()` function returning the current time
pub trait TimeSource: Debug + Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Time source that delegates to [`SystemTime::now`]
#[non_exhaustive]
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Cloneable handle to a [`TimeSource`]
#[derive(Debug, Clone)]
pub struct SharedTimeSource(Arc<dyn TimeSource>);

impl SharedTimeSource {
    pub fn new(source: impl TimeSource + 'static) -> Self {
        SharedTimeSource(Arc::new(source))
    }
}

impl Default for SharedTimeSource {
    fn default() -> Self {
        SharedTimeSource::new(SystemTimeSource)
    }
}

impl TimeSource for SharedTimeSource {
    fn now(&self) -> SystemTime {
        self.0.now()
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use manual::ManualTimeSource;

#[cfg(any(test, feature = "test-util"))]
mod manual {
    use super::TimeSource;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, SystemTime};

    /// Time source that can be manually moved for tests
    ///
    /// Clones share the same clock, so a test can keep one handle and give the other to the code
    /// under test.
    #[derive(Clone, Debug)]
    pub struct ManualTimeSource {
        now: Arc<Mutex<SystemTime>>,
    }

    impl ManualTimeSource {
        pub fn new(start_time: SystemTime) -> Self {
            ManualTimeSource {
                now: Arc::new(Mutex::new(start_time)),
            }
        }

        pub fn set_time(&self, time: SystemTime) {
            *self.now.lock().unwrap() = time;
        }

        pub fn advance(&self, delta: Duration) {
            *self.now.lock().unwrap() += delta;
        }
    }

    impl TimeSource for ManualTimeSource {
        fn now(&self) -> SystemTime {
            *self.now.lock().unwrap()
        }
    }
}
