//! Process-wide in-memory inverted index.
//!
//! Two facet maps, tag -> paths and lowercase word -> paths. The index is a
//! derived, disposable cache: there is no persisted index file, and an empty
//! index is always recoverable by rescanning durable storage.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::config::defaults;
use crate::errors::StoreResult;
use crate::models::Vault;
use crate::notes::preamble;
use crate::storage::{walk_files, StorageProvider};

#[derive(Default)]
pub struct InvertedIndex {
    tags: DashMap<String, HashSet<String>>,
    words: DashMap<String, HashSet<String>>,
}

/// Lowercase whitespace tokenization; words shorter than the indexing
/// threshold are dropped to bound index size and avoid trivial matches.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= defaults::MIN_INDEX_WORD_LEN)
        .collect()
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.words.is_empty()
    }

    /// Drop every facet. The next query rebuilds from storage.
    pub fn clear(&self) {
        self.tags.clear();
        self.words.clear();
    }

    /// Index a path under freshly derived facets. The path is first removed
    /// from every set it currently appears in, so it can never stay indexed
    /// under stale facets.
    pub fn insert<'a, I>(&self, path: &str, tags: I, text: &str)
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.remove(path);
        for tag in tags {
            self.tags
                .entry(tag.clone())
                .or_insert_with(HashSet::new)
                .insert(path.to_string());
        }
        for word in tokenize(text) {
            self.words
                .entry(word)
                .or_insert_with(HashSet::new)
                .insert(path.to_string());
        }
    }

    pub fn remove(&self, path: &str) {
        self.tags.retain(|_, paths| {
            paths.remove(path);
            !paths.is_empty()
        });
        self.words.retain(|_, paths| {
            paths.remove(path);
            !paths.is_empty()
        });
    }

    /// Paths carrying every listed tag (AND semantics).
    pub fn paths_with_all_tags(&self, tags: &[String]) -> HashSet<String> {
        let mut result: Option<HashSet<String>> = None;
        for tag in tags {
            let paths = self
                .tags
                .get(tag)
                .map(|entry| entry.value().clone())
                .unwrap_or_default();
            result = Some(match result {
                None => paths,
                Some(acc) => acc.intersection(&paths).cloned().collect(),
            });
            if result.as_ref().is_some_and(HashSet::is_empty) {
                break;
            }
        }
        result.unwrap_or_default()
    }

    /// Paths matching any word of the text (OR semantics).
    pub fn paths_matching_text(&self, text: &str) -> HashSet<String> {
        let mut result = HashSet::new();
        for word in text.split_whitespace().map(str::to_lowercase) {
            if let Some(entry) = self.words.get(&word) {
                result.extend(entry.value().iter().cloned());
            }
        }
        result
    }

    /// Combined candidate set for a query: tag intersection ANDed with the
    /// text word union. `None` means no facet filter was supplied and the
    /// caller must enumerate known paths itself.
    pub fn candidates(
        &self,
        tags: Option<&[String]>,
        text: Option<&str>,
    ) -> Option<HashSet<String>> {
        let tag_set = match tags {
            Some(ts) if !ts.is_empty() => Some(self.paths_with_all_tags(ts)),
            _ => None,
        };
        // empty intersection short-circuits; no further work
        if tag_set.as_ref().is_some_and(HashSet::is_empty) {
            return Some(HashSet::new());
        }
        let text_set = match text {
            Some(t) if !t.trim().is_empty() => Some(self.paths_matching_text(t)),
            _ => None,
        };
        match (tag_set, text_set) {
            (Some(tags), Some(words)) => Some(tags.intersection(&words).cloned().collect()),
            (Some(tags), None) => Some(tags),
            (None, Some(words)) => Some(words),
            (None, None) => None,
        }
    }

    /// Cold-start recovery: rescan storage from the root, indexing every
    /// snapshot and note that decodes. Undecodable files are skipped and
    /// logged, never fatal to the scan.
    pub fn rebuild(&self, provider: &dyn StorageProvider) -> StoreResult<usize> {
        let mut count = 0usize;
        for path in walk_files(provider, "")? {
            let bytes = match provider.read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("[INDEX] Skipping unreadable file {}: {}", path, e);
                    continue;
                }
            };
            if path.ends_with(".json") {
                match Vault::from_snapshot(&bytes) {
                    Ok(vault) => {
                        let tags = vault.collect_tags();
                        self.insert(&path, tags.iter(), &vault.search_text());
                        count += 1;
                    }
                    Err(e) => log::warn!("[INDEX] Skipping undecodable snapshot {}: {}", path, e),
                }
            } else {
                match String::from_utf8(bytes) {
                    Ok(text) => {
                        let note = preamble::decode(&text);
                        self.insert(&path, note.preamble.tags.iter(), &note.body);
                        count += 1;
                    }
                    Err(e) => log::warn!("[INDEX] Skipping non-text file {}: {}", path, e),
                }
            }
        }
        log::info!("[INDEX] Indexed {} stored files", count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tokenize_drops_short_words() {
        let words = tokenize("Go is a Systems Language");
        assert!(words.contains("systems"));
        assert!(words.contains("language"));
        assert!(!words.contains("go"));
        assert!(!words.contains("is"));
        assert!(!words.contains("a"));
    }

    #[test]
    fn test_insert_and_tag_intersection() {
        let index = InvertedIndex::new();
        index.insert("n/a.md", &tags(&["skill", "python"]), "");
        index.insert("n/b.md", &tags(&["skill", "java"]), "");

        let both = index.paths_with_all_tags(&tags(&["skill"]));
        assert_eq!(both.len(), 2);

        let python = index.paths_with_all_tags(&tags(&["skill", "python"]));
        assert_eq!(python.len(), 1);
        assert!(python.contains("n/a.md"));

        let none = index.paths_with_all_tags(&tags(&["skill", "rust"]));
        assert!(none.is_empty());
    }

    #[test]
    fn test_reinsert_clears_stale_facets() {
        let index = InvertedIndex::new();
        index.insert("n/a.md", &tags(&["python"]), "built parsers");
        index.insert("n/a.md", &tags(&["java"]), "wrote services");

        assert!(index.paths_with_all_tags(&tags(&["python"])).is_empty());
        assert!(index.paths_matching_text("parsers").is_empty());
        assert!(index.paths_with_all_tags(&tags(&["java"])).contains("n/a.md"));
        assert!(index.paths_matching_text("services").contains("n/a.md"));
    }

    #[test]
    fn test_remove_drops_path_everywhere() {
        let index = InvertedIndex::new();
        index.insert("n/a.md", &tags(&["skill"]), "kernel tuning");
        index.remove("n/a.md");
        assert!(index.is_empty());
    }

    #[test]
    fn test_word_union_is_case_insensitive() {
        let index = InvertedIndex::new();
        index.insert("n/a.md", &tags(&[]), "Distributed Systems");
        let hits = index.paths_matching_text("SYSTEMS compilers");
        assert!(hits.contains("n/a.md"));
    }

    #[test]
    fn test_candidates_combination() {
        let index = InvertedIndex::new();
        index.insert("n/a.md", &tags(&["skill"]), "python parsers");
        index.insert("n/b.md", &tags(&["skill"]), "java services");

        assert!(index.candidates(None, None).is_none());

        let tagged = index.candidates(Some(&tags(&["skill"])), None).unwrap();
        assert_eq!(tagged.len(), 2);

        let combined = index
            .candidates(Some(&tags(&["skill"])), Some("parsers"))
            .unwrap();
        assert_eq!(combined.len(), 1);
        assert!(combined.contains("n/a.md"));

        let missing_tag = index.candidates(Some(&tags(&["ghost"])), Some("parsers"));
        assert!(missing_tag.unwrap().is_empty());
    }

    #[test]
    fn test_rebuild_skips_undecodable_files() {
        let _ = env_logger::builder().is_test(true).try_init();
        let storage = MemoryStorage::new();
        storage.write("vaults/broken.json", b"{ not json").unwrap();
        storage
            .write("notes/a.md", b"---\ntype: general\ntags: [skill]\n---\n\nRust systems work")
            .unwrap();

        let index = InvertedIndex::new();
        let count = index.rebuild(&storage).unwrap();
        assert_eq!(count, 1);
        assert!(index.paths_with_all_tags(&tags(&["skill"])).contains("notes/a.md"));
    }
}
