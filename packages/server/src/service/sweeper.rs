use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::UsuarioService;

/// Run [`UsuarioService::sweep_orphans`] every `sweep_interval`.
///
/// The first tick fires one full interval after spawning; the startup sweep is
/// run separately by the caller.
pub fn spawn_sweep_task(
    service: Arc<UsuarioService>,
    sweep_interval: Duration,
    grace: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + sweep_interval;
        let mut interval = tokio::time::interval_at(start, sweep_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match service.sweep_orphans(grace).await {
                Ok(report) => {
                    if !report.removed.is_empty() || report.staging_purged > 0 {
                        info!(
                            scanned = report.scanned,
                            removed = report.removed.len(),
                            skipped_recent = report.skipped_recent,
                            staging_purged = report.staging_purged,
                            "Swept orphaned images"
                        );
                    }
                }
                Err(e) => error!(error = %e, "Orphan sweep failed"),
            }
        }
    })
}
