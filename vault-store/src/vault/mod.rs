//! Hierarchy management: the vault cache, CRUD across all four levels,
//! query evaluation, and the ownership filter.

pub mod query;
pub mod store;

pub use query::{QueryMatch, SectionRef, VaultQuery};
pub use store::{
    EntryPatch, ItemDraft, ItemPatch, SectionPatch, VaultStore, WriteOptions,
};
