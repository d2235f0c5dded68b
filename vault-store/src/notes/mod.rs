//! Preamble+body notes: the lower-level persistence surface for free-text
//! career content.

pub mod preamble;
pub mod store;

pub use store::{NoteHit, NoteQuery, NoteStore};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use crate::models::DateRange;

/// What a note captures.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NoteKind {
    #[default]
    General,
    Experience,
    Education,
    Skill,
    Project,
    Achievement,
}

/// Structured career metadata carried in a note's preamble.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteMetadata {
    pub date_range: Option<DateRange>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub proficiency: Option<String>,
    pub notes: Option<String>,
    /// Extension fields, carried as pre-serialized documents so they survive
    /// round trips without the writer understanding their shape.
    pub custom: BTreeMap<String, serde_json::Value>,
}

impl NoteMetadata {
    pub fn is_empty(&self) -> bool {
        self.date_range.is_none()
            && self.location.is_none()
            && self.company.is_none()
            && self.proficiency.is_none()
            && self.notes.is_none()
            && self.custom.is_empty()
    }
}

/// The structured head of a note.
#[derive(Debug, Clone, PartialEq)]
pub struct NotePreamble {
    pub kind: NoteKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
    pub metadata: Option<NoteMetadata>,
}

impl NotePreamble {
    pub fn new(kind: NoteKind) -> Self {
        let now = Utc::now();
        Self {
            kind,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            parent_id: None,
            child_ids: Vec::new(),
            metadata: None,
        }
    }
}

impl Default for NotePreamble {
    fn default() -> Self {
        Self::new(NoteKind::General)
    }
}

/// A free-text body plus its structured preamble.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub preamble: NotePreamble,
    pub body: String,
}

impl Note {
    pub fn new(kind: NoteKind, body: impl Into<String>) -> Self {
        Self {
            preamble: NotePreamble::new(kind),
            body: body.into(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.preamble.tags = tags;
        self
    }

    pub fn with_metadata(mut self, metadata: NoteMetadata) -> Self {
        self.preamble.metadata = Some(metadata);
        self
    }
}
