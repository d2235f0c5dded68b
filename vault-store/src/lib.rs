//! Career content store.
//!
//! A hierarchical Vault -> Section -> Entry -> Item model over pluggable
//! key-addressed storage, with two codecs (whole-vault JSON snapshots and
//! preamble+body notes) and an in-memory inverted index for tag, free-text,
//! and date-range retrieval. The index is a derived cache: it is maintained
//! on every write and rebuilt by rescanning storage on a cold start.
//!
//! Single-process by design. Reads may race; writers to the same vault must
//! be serialized by the embedding application.

pub mod config;
pub mod errors;
pub mod index;
pub mod models;
pub mod notes;
pub mod storage;
pub mod vault;

pub use errors::{StoreError, StoreResult};
pub use index::InvertedIndex;
pub use models::{
    DateRange, DateWindow, Entry, EntryMetadata, Item, Metric, MetricKind, Profile, Section,
    SectionType, Vault, VaultMetadata,
};
pub use notes::{Note, NoteHit, NoteKind, NoteMetadata, NotePreamble, NoteQuery, NoteStore};
pub use storage::{FsStorage, MemoryStorage, StorageProvider};
pub use vault::{
    EntryPatch, ItemDraft, ItemPatch, QueryMatch, SectionPatch, SectionRef, VaultQuery,
    VaultStore, WriteOptions,
};
