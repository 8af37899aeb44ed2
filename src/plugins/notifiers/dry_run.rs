use async_trait::async_trait;

use crate::plugins::traits::AlertSink;
use crate::utils::error::Result;

/// Logs alerts instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct DryRunAlertSink;

#[async_trait]
impl AlertSink for DryRunAlertSink {
    async fn send(&self, message: &str) -> Result<()> {
        tracing::info!("[DRY RUN] alert: {}", message);
        Ok(())
    }
}
