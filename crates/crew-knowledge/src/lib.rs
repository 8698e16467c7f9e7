//! Shared retrieval knowledge store for crew-rs
//!
//! Crews exchange findings through this store: every succeeded task writes a
//! timestamped, categorized entry, and later tasks retrieve prior findings by
//! asset, category, and free-text similarity. Entries are never mutated in
//! place - updates supersede by timestamp - and staleness is enforced both at
//! query time and by a soft-deleting retention sweep.

pub mod entry;
pub mod persist;
pub mod retention;
pub mod store;

pub use entry::{EntryId, KnowledgeEntry, KnowledgeEntryBuilder};
pub use retention::RetentionPolicy;
pub use store::{KnowledgeStore, QueryFilter};
