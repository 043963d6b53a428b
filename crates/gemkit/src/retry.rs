//! Retry logic with exponential backoff for transient install failures.
//!
//! Retrying belongs to the install collaborator, not to the reconciler:
//! wrap a backend in [`RetryingBackend`] to retry installs that fail with a
//! retryable error (network, locked package database). Installed-state
//! queries are never retried.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{PackageManager, RetryConfig, SystemPackage};
use log::warn;
use std::thread;

/// Callback trait for retry progress notifications.
pub trait RetryCallback: Send + Sync {
    /// Called when an operation is being retried.
    ///
    /// # Arguments
    /// * `attempt` - Attempt that just failed (1-indexed)
    /// * `max_attempts` - Maximum number of attempts
    /// * `error` - The error that triggered the retry
    /// * `delay_secs` - Seconds until next attempt
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_secs: u64);
}

/// Callback that logs a warning for every retry.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_secs: u64) {
        warn!("Attempt {attempt}/{max_attempts} failed: {error}. Retrying in {delay_secs}s...");
    }
}

/// Execute an operation with retry logic.
///
/// Retries the operation if it returns a retryable error, using exponential
/// backoff between attempts. Non-retryable errors are returned immediately.
pub fn with_retry<T, F>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() || attempt + 1 >= max_attempts {
                    return Err(e);
                }

                let delay = config.delay_for_attempt(attempt);
                if let Some(cb) = callback {
                    cb.on_retry(attempt + 1, max_attempts, &e, delay.as_secs());
                }

                thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

/// Backend decorator that retries failed installs.
pub struct RetryingBackend<B> {
    inner: B,
    config: RetryConfig,
    callback: Box<dyn RetryCallback>,
}

impl<B: Backend> RetryingBackend<B> {
    /// Wrap `inner`, logging each retry.
    pub fn new(inner: B, config: RetryConfig) -> Self {
        Self {
            inner,
            config,
            callback: Box::new(LogCallback),
        }
    }

    /// Replace the retry callback.
    pub fn with_callback(mut self, callback: Box<dyn RetryCallback>) -> Self {
        self.callback = callback;
        self
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: Backend> Backend for RetryingBackend<B> {
    fn manager(&self) -> PackageManager {
        self.inner.manager()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn is_installed(&self, package: &SystemPackage) -> Result<bool> {
        self.inner.is_installed(package)
    }

    fn install(&self, package: &SystemPackage) -> Result<()> {
        with_retry(&self.config, Some(self.callback.as_ref()), || {
            self.inner.install(package)
        })
    }
}
