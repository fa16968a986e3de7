//! JSON flat-file tracker implementation.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::types::{
    has_extension, ContentTracker, DownloadLedger, MediaKind, PostedLog, PostedRecord,
    TrackerError, VIDEO_EXTENSIONS,
};

/// Maximum ids retained in the download ledger (oldest evicted first).
const LEDGER_CAP: usize = 1000;

/// Posts within this window make a file ineligible for re-posting.
const RECENT_POST_WINDOW_DAYS: i64 = 7;

struct TrackerState {
    posted: PostedLog,
    ledger: DownloadLedger,
    /// Mirror of `ledger.media_ids` for O(1) membership checks.
    ledger_index: HashSet<String>,
}

/// Flat-file tracker backed by two JSON documents.
///
/// All mutation happens under one mutex so each read-modify-write of the
/// documents is serialized within the process.
pub struct JsonContentTracker {
    posted_path: PathBuf,
    ledger_path: PathBuf,
    downloads_dir: PathBuf,
    state: Mutex<TrackerState>,
}

impl JsonContentTracker {
    pub fn new(
        posted_path: impl Into<PathBuf>,
        ledger_path: impl Into<PathBuf>,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        let posted_path = posted_path.into();
        let ledger_path = ledger_path.into();

        let posted: PostedLog = load_document(&posted_path);
        let ledger: DownloadLedger = load_document(&ledger_path);
        let ledger_index = ledger.media_ids.iter().cloned().collect();

        Self {
            posted_path,
            ledger_path,
            downloads_dir: downloads_dir.into(),
            state: Mutex::new(TrackerState {
                posted,
                ledger,
                ledger_index,
            }),
        }
    }

    fn persist_posted(&self, state: &TrackerState) -> Result<(), TrackerError> {
        write_document(&self.posted_path, &state.posted)
    }

    fn persist_ledger(&self, state: &TrackerState) -> Result<(), TrackerError> {
        write_document(&self.ledger_path, &state.ledger)
    }

    /// Append an id to the ledger if absent, evicting past the cap.
    /// Returns true if the ledger changed.
    fn append_to_ledger(state: &mut TrackerState, media_id: &str) -> bool {
        if state.ledger_index.contains(media_id) {
            return false;
        }
        state.ledger.media_ids.push(media_id.to_string());
        state.ledger_index.insert(media_id.to_string());
        while state.ledger.media_ids.len() > LEDGER_CAP {
            let evicted = state.ledger.media_ids.remove(0);
            state.ledger_index.remove(&evicted);
        }
        true
    }

    /// A filesystem or history hit promotes the id into the fast-path set.
    fn backfill(&self, state: &mut TrackerState, media_id: &str) {
        if Self::append_to_ledger(state, media_id) {
            if let Err(e) = self.persist_ledger(state) {
                warn!("Failed to persist back-filled ledger: {}", e);
            }
        }
    }

    /// File names in the download directory. A missing directory is an empty
    /// listing, not an error.
    fn list_downloads(&self) -> std::io::Result<Vec<String>> {
        if !self.downloads_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.downloads_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    /// File names of videos posted within the recency window. Unparsable
    /// timestamps count as recent so the bias stays away from re-posting.
    fn recently_posted_names(posted: &PostedLog) -> HashSet<String> {
        let cutoff = Utc::now() - Duration::days(RECENT_POST_WINDOW_DAYS);
        posted
            .videos
            .iter()
            .filter(|r| r.posted_at_utc().map_or(true, |at| at > cutoff))
            .filter_map(|r| {
                Path::new(&r.file)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .collect()
    }
}

impl ContentTracker for JsonContentTracker {
    fn is_already_downloaded(&self, media_id: &str) -> bool {
        let mut state = self.state.lock().unwrap();

        // Layer 1: ledger membership (indexed fast path)
        if state.ledger_index.contains(media_id) {
            debug!("Media {} already tracked in ledger", media_id);
            return true;
        }

        // The remaining layers only run on an index miss.
        let listing = match self.list_downloads() {
            Ok(listing) => listing,
            Err(e) => {
                warn!(
                    "Could not scan {} while checking {}: {}",
                    self.downloads_dir.display(),
                    media_id,
                    e
                );
                return false;
            }
        };

        // Layer 2: a media file on disk carries the id in its name
        let media_file_hit = listing
            .iter()
            .any(|name| has_extension(Path::new(name), VIDEO_EXTENSIONS) && name.contains(media_id));
        if media_file_hit {
            info!("Media {} already on disk", media_id);
            self.backfill(&mut state, media_id);
            return true;
        }

        // Layer 3: a metadata sidecar carries the id
        let sidecar_hit = listing
            .iter()
            .any(|name| name.ends_with(".json") && name.contains(media_id));
        if sidecar_hit {
            info!("Media {} has a metadata sidecar on disk", media_id);
            self.backfill(&mut state, media_id);
            return true;
        }

        // Layer 4: the id appears in a posted record's path
        let posted_hit = state
            .posted
            .videos
            .iter()
            .any(|record| record.file.contains(media_id));
        if posted_hit {
            info!("Media {} was already posted", media_id);
            self.backfill(&mut state, media_id);
            return true;
        }

        // Layer 5: broad scan over every file stem in the directory
        let stem_hit = listing.iter().any(|name| {
            Path::new(name)
                .file_stem()
                .map(|s| s.to_string_lossy().contains(media_id))
                .unwrap_or(false)
        });
        if stem_hit {
            info!("Media {} matched an existing file stem", media_id);
            self.backfill(&mut state, media_id);
            return true;
        }

        debug!("Media {} is new", media_id);
        false
    }

    fn track_download(&self, media_id: &str) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap();
        if Self::append_to_ledger(&mut state, media_id) {
            self.persist_ledger(&state)?;
            info!("Tracked downloaded media: {}", media_id);
        } else {
            debug!("Media {} already tracked", media_id);
        }
        Ok(())
    }

    fn record_posted(&self, kind: MediaKind, record: PostedRecord) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap();
        match kind {
            MediaKind::Images => state.posted.images.push(record),
            MediaKind::Videos => state.posted.videos.push(record),
        }
        self.persist_posted(&state)
    }

    fn filter_unposted(&self, candidates: &[PathBuf]) -> Vec<PathBuf> {
        let state = self.state.lock().unwrap();
        let recent = Self::recently_posted_names(&state.posted);

        let unposted: Vec<PathBuf> = candidates
            .iter()
            .filter(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if recent.contains(&name) {
                    info!("Skipping recently posted file: {}", name);
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        info!(
            "{} of {} candidate files have not been posted recently",
            unposted.len(),
            candidates.len()
        );
        unposted
    }

    fn record_cleanup(&self) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap();
        state.ledger.last_cleanup = Some(Utc::now());
        self.persist_ledger(&state)
    }

    fn posted_counts(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.posted.images.len(), state.posted.videos.len())
    }

    fn ledger_len(&self) -> usize {
        self.state.lock().unwrap().ledger.media_ids.len()
    }
}

/// Whole-document load. Missing or malformed documents come up empty.
fn load_document<T: DeserializeOwned + Default>(path: &Path) -> T {
    match fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "Malformed tracking document {}, starting empty: {}",
                    path.display(),
                    e
                );
                T::default()
            }
        },
        Err(_) => T::default(),
    }
}

/// Whole-document write.
fn write_document<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), TrackerError> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)?;
    Ok(())
}
