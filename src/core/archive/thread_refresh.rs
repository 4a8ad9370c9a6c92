// Daily sweep that keeps threads in the game categories from auto-archiving.
//
// Bumping a thread's auto-archive duration to a week and straight back to
// three days resets the platform's inactivity countdown.

use super::archive_models::{SweepReport, ThreadRefreshConfig, ONE_WEEK_MINUTES, THREE_DAYS_MINUTES};
use super::archive_platform::ThreadSweepPlatform;
use crate::core::ports::PlatformError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// How often the sweep runs.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

pub struct ThreadRefreshService<P: ThreadSweepPlatform> {
    platform: Arc<P>,
    config: ThreadRefreshConfig,
}

impl<P: ThreadSweepPlatform> ThreadRefreshService<P> {
    pub fn new(platform: Arc<P>, config: ThreadRefreshConfig) -> Self {
        Self { platform, config }
    }

    /// Refresh every active thread under the configured categories.
    ///
    /// A thread that fails is logged and skipped. Only failing to list the
    /// active threads at all aborts the sweep.
    pub async fn sweep(&self) -> Result<SweepReport, PlatformError> {
        let mut channels = HashSet::new();
        for category_id in &self.config.category_ids {
            match self.platform.category_channels(*category_id).await {
                Ok(found) => channels.extend(
                    found
                        .into_iter()
                        .map(|c| c.id)
                        .filter(|id| !self.config.excluded_channel_ids.contains(id)),
                ),
                Err(err) => {
                    tracing::warn!(category_id, error = %err, "Failed to list category channels");
                }
            }
        }

        let mut report = SweepReport::default();
        for active in self.platform.active_threads().await? {
            if !channels.contains(&active.parent_id) {
                continue;
            }

            match self.refresh(active.thread.id).await {
                Ok(()) => report.refreshed += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        thread = %active.thread.name,
                        channel_id = active.parent_id,
                        error = %err,
                        "Failed to update thread"
                    );
                }
            }
        }

        Ok(report)
    }

    async fn refresh(&self, thread_id: u64) -> Result<(), PlatformError> {
        self.platform
            .set_auto_archive(thread_id, ONE_WEEK_MINUTES)
            .await?;
        self.platform
            .set_auto_archive(thread_id, THREE_DAYS_MINUTES)
            .await
    }
}
