//! Typed domain entities: Vault, Section, Entry, Item.

pub mod dates;
pub mod entry;
pub mod ids;
pub mod item;
pub mod section;
pub mod vault;

pub use dates::{DateRange, DateWindow, FAR_FUTURE};
pub use entry::{Entry, EntryMetadata};
pub use ids::generate_id;
pub use item::{Item, Metric, MetricKind};
pub use section::{Section, SectionType};
pub use vault::{Profile, Vault, VaultMetadata};
