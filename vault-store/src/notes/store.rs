//! Note persistence surface over a storage provider plus the shared index.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use super::{preamble, Note, NoteKind};
use crate::config::defaults;
use crate::errors::{StoreError, StoreResult};
use crate::index::InvertedIndex;
use crate::storage::{join_path, walk_files, StorageProvider};

/// Slugify a title for use as a filename (e.g. "Platform Migration" -> "platform-migration").
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("-")
}

/// Derive a stable relative note path from an optional subdirectory and title.
pub fn note_path(subdir: Option<&str>, title: &str) -> String {
    let filename = format!("{}.md", slugify(title));
    match subdir {
        Some(dir) => join_path(dir, &filename),
        None => filename,
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
    /// AND semantics: every listed tag must be present.
    pub tags: Option<Vec<String>>,
    /// OR semantics across whitespace-split words.
    pub text: Option<String>,
    pub kind: Option<NoteKind>,
}

#[derive(Debug, Clone)]
pub struct NoteHit {
    /// Path relative to the note store root.
    pub path: String,
    pub note: Note,
}

pub struct NoteStore {
    provider: Arc<dyn StorageProvider>,
    index: Arc<InvertedIndex>,
    root: String,
}

impl NoteStore {
    pub fn new(provider: Arc<dyn StorageProvider>, index: Arc<InvertedIndex>) -> Self {
        Self::with_root(provider, index, defaults::NOTES_DIR)
    }

    pub fn with_root(
        provider: Arc<dyn StorageProvider>,
        index: Arc<InvertedIndex>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            index,
            root: root.into().trim_end_matches('/').to_string(),
        }
    }

    fn full(&self, rel_path: &str) -> String {
        join_path(&self.root, rel_path)
    }

    fn rel(&self, full_path: &str) -> String {
        full_path
            .strip_prefix(&format!("{}/", self.root))
            .unwrap_or(full_path)
            .to_string()
    }

    /// Create a new note. Existing notes are never overwritten.
    pub fn create_note(&self, rel_path: &str, note: &Note) -> StoreResult<()> {
        let full = self.full(rel_path);
        if self.provider.exists(&full)? {
            return Err(StoreError::invalid(format!("note already exists: {rel_path}")));
        }
        self.write_indexed(&full, note)
    }

    /// Replace an existing note, preserving its creation timestamp.
    pub fn update_note(&self, rel_path: &str, note: &Note) -> StoreResult<()> {
        let existing = self.read_note(rel_path)?;
        let mut updated = note.clone();
        updated.preamble.created_at = existing.preamble.created_at;
        updated.preamble.updated_at = Utc::now();
        self.write_indexed(&self.full(rel_path), &updated)
    }

    pub fn read_note(&self, rel_path: &str) -> StoreResult<Note> {
        let full = self.full(rel_path);
        let bytes = self.provider.read(&full)?;
        let text = String::from_utf8(bytes).map_err(|e| StoreError::decode(&full, e))?;
        Ok(preamble::decode(&text))
    }

    pub fn delete_note(&self, rel_path: &str) -> StoreResult<()> {
        let full = self.full(rel_path);
        if !self.provider.exists(&full)? {
            return Err(StoreError::not_found(rel_path));
        }
        self.provider.delete(&full)?;
        self.index.remove(&full);
        Ok(())
    }

    /// All note paths under the store root, relative, sorted.
    pub fn list_notes(&self) -> StoreResult<Vec<String>> {
        Ok(walk_files(self.provider.as_ref(), &self.root)?
            .into_iter()
            .map(|p| self.rel(&p))
            .collect())
    }

    /// Tag/text/kind query. Index candidates are re-verified against the
    /// decoded notes; undecodable files are skipped and logged.
    pub fn query_notes(&self, query: &NoteQuery) -> StoreResult<Vec<NoteHit>> {
        if self.index.is_empty() {
            self.index.rebuild(self.provider.as_ref())?;
        }

        let candidates = self
            .index
            .candidates(query.tags.as_deref(), query.text.as_deref());

        let mut paths: Vec<String> = match candidates {
            Some(set) => {
                let prefix = format!("{}/", self.root);
                set.into_iter().filter(|p| p.starts_with(&prefix)).collect()
            }
            None => walk_files(self.provider.as_ref(), &self.root)?,
        };
        paths.sort();

        let mut hits = Vec::new();
        for full in paths {
            let rel = self.rel(&full);
            let note = match self.read_note(&rel) {
                Ok(note) => note,
                Err(e) => {
                    log::warn!("[NOTES] Skipping unreadable note {}: {}", full, e);
                    continue;
                }
            };
            if note_matches(&note, query) {
                hits.push(NoteHit { path: rel, note });
            }
        }
        Ok(hits)
    }

    /// Unique tags with usage counts, most used first, then by name.
    pub fn tag_counts(&self) -> StoreResult<Vec<(String, usize)>> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for rel in self.list_notes()? {
            let note = match self.read_note(&rel) {
                Ok(note) => note,
                Err(e) => {
                    log::warn!("[NOTES] Skipping unreadable note {}: {}", rel, e);
                    continue;
                }
            };
            for tag in note.preamble.tags {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }
        let mut tags: Vec<(String, usize)> = counts.into_iter().collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(tags)
    }

    fn write_indexed(&self, full_path: &str, note: &Note) -> StoreResult<()> {
        let encoded = preamble::encode(note);
        self.provider.write(full_path, encoded.as_bytes())?;
        self.index
            .insert(full_path, note.preamble.tags.iter(), &note.body);
        Ok(())
    }
}

/// Re-verify every requested predicate against the decoded note.
fn note_matches(note: &Note, query: &NoteQuery) -> bool {
    if let Some(kind) = query.kind {
        if note.preamble.kind != kind {
            return false;
        }
    }
    if let Some(tags) = &query.tags {
        if !tags.iter().all(|t| note.preamble.tags.contains(t)) {
            return false;
        }
    }
    if let Some(text) = &query.text {
        let body_words: std::collections::HashSet<String> = note
            .body
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        let matched = text
            .split_whitespace()
            .any(|w| body_words.contains(&w.to_lowercase()));
        if !matched {
            return false;
        }
    }
    true
}
