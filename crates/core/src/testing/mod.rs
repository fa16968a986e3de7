//! Mock implementations for testing.
//!
//! These mocks let tests drive the routine, fetcher and publisher without a
//! gateway or an LLM endpoint.

mod mock_llm;
mod mock_platform;

pub use mock_llm::MockLlm;
pub use mock_platform::{MockFailure, MockPlatform, RecordedUpload, UploadKind};

/// A byte payload that passes download validation: big enough and carrying
/// an `ftyp` marker within the first kilobyte.
pub fn valid_video_bytes() -> Vec<u8> {
    let mut bytes = vec![0u8; 64 * 1024];
    bytes[4..8].copy_from_slice(b"ftyp");
    bytes
}
