// Alert sink implementations
pub mod discord;
pub mod dry_run;

pub use discord::DiscordWebhookAlertSink;
pub use dry_run::DryRunAlertSink;

use std::sync::Arc;

use crate::config::AlertsConfig;
use crate::plugins::traits::AlertSink;
use crate::utils::error::Result;

/// Pick the sink for this process: dry-run when asked or when no webhook is
/// configured, Discord otherwise.
pub fn build_alert_sink(config: &AlertsConfig, dry_run: bool) -> Result<Arc<dyn AlertSink>> {
    match config.discord_webhook.as_deref().filter(|url| !url.trim().is_empty()) {
        Some(webhook) if !dry_run => Ok(Arc::new(DiscordWebhookAlertSink::new(
            webhook,
            config.discord_username.clone(),
        )?)),
        Some(_) => Ok(Arc::new(DryRunAlertSink)),
        None => {
            if !dry_run {
                tracing::warn!("No Discord webhook configured; alerts will only be logged");
            }
            Ok(Arc::new(DryRunAlertSink))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_sink_never_fails() {
        let sink = build_alert_sink(&AlertsConfig::default(), true).unwrap();
        assert!(sink.send("test").await.is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_flag_overrides_webhook() {
        let config = AlertsConfig {
            discord_webhook: Some("http://127.0.0.1:9/unreachable".to_string()),
            discord_username: None,
        };
        let sink = build_alert_sink(&config, true).unwrap();
        assert!(sink.send("test").await.is_ok());
    }
}
