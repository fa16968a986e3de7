//! Run journal: a lightweight event log backing the recent-activity API.
//!
//! Components emit [`JournalEvent`]s through a cheaply-cloneable
//! [`JournalHandle`]; a background [`JournalWriter`] drains the channel into
//! a [`JournalStore`]. The default store is an in-memory ring buffer.

mod events;
mod handle;
mod store;
mod writer;

pub use events::JournalEvent;
pub use handle::{JournalEnvelope, JournalHandle};
pub use store::{JournalRecord, JournalStore, MemoryJournalStore};
pub use writer::{create_journal, JournalWriter};
