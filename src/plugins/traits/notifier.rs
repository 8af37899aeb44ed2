use async_trait::async_trait;

use crate::utils::error::Result;

/// Delivers a human-readable alert message somewhere a person will see it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}
