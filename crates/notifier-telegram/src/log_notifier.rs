use anyhow::Result;
use async_trait::async_trait;
use oi_alert_core::Notifier;

/// Writes alerts to the log instead of sending them. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, message: &str) -> Result<()> {
        tracing::info!("Dry run, alert not sent:\n{}", message);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
