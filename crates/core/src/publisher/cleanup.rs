//! Post-upload cleanup and age-based sweeps of the download directory.

use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::journal::JournalEvent;
use crate::metrics;
use crate::retry::UNLOCK_RETRY;
use crate::tracker::{has_extension, DownloadMetadata, VIDEO_EXTENSIONS};

use super::Publisher;

/// The upload client can keep handles on the file briefly after a post.
const PRE_DELETE_DELAY: Duration = Duration::from_secs(2);

impl Publisher {
    /// Delete a posted media file, its metadata sidecar and a same-stem
    /// thumbnail if present. Thumbnail failures are non-fatal; media or
    /// sidecar failures make the overall result false without raising.
    pub async fn cleanup(&self, path: &Path) -> bool {
        let media_file = path.to_path_buf();
        let metadata_file = DownloadMetadata::sidecar_path(path);
        let thumbnail_file = path.with_extension("jpg");

        tokio::time::sleep(PRE_DELETE_DELAY).await;

        let mut success = true;

        if safe_delete(&media_file).await {
            info!("Cleaned up media file: {}", media_file.display());
        } else {
            success = false;
            metrics::CLEANUP_FAILURES_TOTAL
                .with_label_values(&["media"])
                .inc();
            self.emit_cleanup_failure(&media_file).await;
        }

        if safe_delete(&metadata_file).await {
            info!("Cleaned up metadata file: {}", metadata_file.display());
        } else {
            success = false;
            metrics::CLEANUP_FAILURES_TOTAL
                .with_label_values(&["metadata"])
                .inc();
            self.emit_cleanup_failure(&metadata_file).await;
        }

        if safe_delete(&thumbnail_file).await {
            info!("Cleaned up thumbnail file: {}", thumbnail_file.display());
        } else {
            info!(
                "Thumbnail may not exist or is locked: {}",
                thumbnail_file.display()
            );
            metrics::CLEANUP_FAILURES_TOTAL
                .with_label_values(&["thumbnail"])
                .inc();
        }

        success
    }

    /// Remove downloaded media (and sidecars) older than `max_age_days`,
    /// regardless of posting status, and stamp the sweep in the ledger.
    pub async fn sweep_old(&self, dir: &Path, max_age_days: u64) -> usize {
        if !dir.exists() {
            return 0;
        }

        let cutoff = SystemTime::now() - Duration::from_secs(max_age_days * 24 * 60 * 60);
        let mut removed = 0usize;

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not scan {} for old files: {}", dir.display(), e);
                return 0;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !has_extension(&path, VIDEO_EXTENSIONS) {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!("Could not stat {}: {}", path.display(), e);
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }

            let sidecar = DownloadMetadata::sidecar_path(&path);
            if let Err(e) = tokio::fs::remove_file(&sidecar).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Could not remove sidecar {}: {}", sidecar.display(), e);
                }
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    info!("Swept old file: {}", path.display());
                }
                Err(e) => warn!("Could not remove old file {}: {}", path.display(), e),
            }
        }

        if let Err(e) = self.tracker().record_cleanup() {
            warn!("Could not stamp sweep in ledger: {}", e);
        }
        if let Some(journal) = self.journal() {
            journal
                .emit(JournalEvent::SweepCompleted { removed })
                .await;
        }

        info!("Sweep complete: removed {} old files", removed);
        removed
    }

    async fn emit_cleanup_failure(&self, path: &Path) {
        if let Some(journal) = self.journal() {
            journal
                .emit(JournalEvent::CleanupFailed {
                    file: path.display().to_string(),
                    reason: "could not delete".to_string(),
                })
                .await;
        }
    }
}

/// Delete a file, retrying busy/locked conditions on the unlock schedule.
/// A missing file counts as success.
pub(crate) async fn safe_delete(path: &Path) -> bool {
    delete_with_retry(path, |p| std::fs::remove_file(p)).await
}

async fn delete_with_retry(path: &Path, remove: impl Fn(&Path) -> std::io::Result<()>) -> bool {
    if !path.exists() {
        return true;
    }

    for attempt in 1..=UNLOCK_RETRY.max_attempts {
        match remove(path) {
            Ok(()) => return true,
            Err(e) if e.kind() == ErrorKind::NotFound => return true,
            Err(e) if is_lock_error(&e) => {
                if !UNLOCK_RETRY.attempts_remain(attempt) {
                    warn!(
                        "Failed to delete {} after {} attempts",
                        path.display(),
                        UNLOCK_RETRY.max_attempts
                    );
                    return false;
                }
                let delay = UNLOCK_RETRY.delay_for(attempt);
                info!(
                    "File locked, waiting {}s before retry {}/{}",
                    delay.as_secs(),
                    attempt + 1,
                    UNLOCK_RETRY.max_attempts
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!("Error deleting {}: {}", path.display(), e);
                return false;
            }
        }
    }

    false
}

fn is_lock_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::PermissionDenied | ErrorKind::WouldBlock | ErrorKind::ResourceBusy
    ) || e.raw_os_error() == Some(16) // EBUSY
}
