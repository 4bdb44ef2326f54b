//! Fetch throttling
//!
//! Remembers when each remote was last fetched so that several dependencies
//! pointing at the same repository, or two commands run back to back, do
//! not hit the network again within the throttle window. State lives only
//! as long as the process.

use crate::project::normalize_url;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default throttle window
pub const DEFAULT_FETCH_WINDOW: Duration = Duration::from_secs(60);

/// Last successful fetch time per remote location
#[derive(Debug)]
pub struct FetchThrottle {
    window: Duration,
    fetched: Mutex<HashMap<String, Instant>>,
}

impl FetchThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            fetched: Mutex::new(HashMap::new()),
        }
    }

    /// True if `location` was fetched less than one window before `now`
    pub fn should_skip_fetch(&self, location: &str, now: Instant) -> bool {
        let key = normalize_url(location);
        let fetched = self.fetched.lock().unwrap_or_else(PoisonError::into_inner);

        match fetched.get(&key) {
            Some(&at) if now.saturating_duration_since(at) < self.window => {
                debug!("Skipping fetch of {}: fetched {:?} ago", key, now.saturating_duration_since(at));
                true
            }
            _ => false,
        }
    }

    /// Note a successful fetch of `location` at `now`
    pub fn record_fetch(&self, location: &str, now: Instant) {
        let key = normalize_url(location);
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, now);
    }

    /// Forget all fetch times
    pub fn clear(&self) {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for FetchThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_WINDOW)
    }
}
