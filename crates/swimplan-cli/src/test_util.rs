//! Helpers for tests that touch process-wide state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that read or write environment variables.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sets variables and restores their previous values on drop.
///
/// Hold [`lock_env`] for as long as this is alive.
pub struct ScopedEnv {
    saved: HashMap<String, Option<String>>,
}

impl ScopedEnv {
    pub fn new() -> Self {
        Self {
            saved: HashMap::new(),
        }
    }

    fn remember(&mut self, key: &str) {
        self.saved
            .entry(key.to_string())
            .or_insert_with(|| std::env::var(key).ok());
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.remember(key);
        unsafe { std::env::set_var(key, value) };
    }

    pub fn remove(&mut self, key: &str) {
        self.remember(key);
        unsafe { std::env::remove_var(key) };
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain() {
            match value {
                Some(v) => unsafe { std::env::set_var(&key, v) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}
