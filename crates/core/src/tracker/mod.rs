//! Content tracking: which media has been downloaded and which has been
//! posted.
//!
//! The tracker is the sole owner and writer of the two JSON documents
//! (posted log and download ledger); every other component queries through
//! it. Reads that fail (missing file, malformed JSON) load as empty state so
//! a broken document can never block a posting pass.

mod json_store;
mod types;

pub use json_store::JsonContentTracker;
pub use types::*;
