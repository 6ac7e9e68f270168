use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::errors::{Error, Result};
use crate::scm;

/// A single point in time bounding every remote call of one run.
///
/// Expiry stops the caller from waiting; the provider may still complete the call it was serving.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Await a provider call, failing with `Timeout` if the deadline passes first
    pub async fn run<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = scm::Result<T>>,
    {
        match tokio::time::timeout_at(self.at, call).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Timeout {
                operation: operation.to_string(),
            }),
        }
    }
}
