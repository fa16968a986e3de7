use serde::Serialize;
use thiserror::Error;

/// Errors from the routine runner.
#[derive(Debug, Error)]
pub enum RoutineError {
    /// A pass was requested while another one was still running.
    #[error("a posting pass is already in progress")]
    RunInProgress,
}

/// Outcome of one posting pass.
#[derive(Debug, Clone, Serialize)]
pub struct RoutineReport {
    pub run_id: String,
    /// How many posts the pass aimed for.
    pub quota: u32,
    /// How many posts went out.
    pub posted: u32,
    pub duration_ms: u64,
}

/// Service status snapshot for the API.
#[derive(Debug, Clone, Serialize)]
pub struct RoutineStatus {
    pub run_in_progress: bool,
    pub dry_run: bool,
    pub posted_images: usize,
    pub posted_videos: usize,
    pub ledger_len: usize,
    pub downloads_available: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serialization() {
        let report = RoutineReport {
            run_id: "r-1".to_string(),
            quota: 2,
            posted: 1,
            duration_ms: 1234,
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"posted\":1"));
        assert!(json.contains("\"quota\":2"));
    }

    #[test]
    fn test_error_display() {
        let err = RoutineError::RunInProgress;
        assert_eq!(err.to_string(), "a posting pass is already in progress");
    }
}
