//! Query filters over a vault's sections and entries.
//!
//! The inverted index only nominates candidates; every predicate is
//! re-verified against the fully decoded entities before a match is
//! returned, guarding against index/storage drift from partial failures.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{DateWindow, Entry, Section, SectionType};

#[derive(Debug, Clone, Default)]
pub struct VaultQuery {
    /// Restrict matches to these section types.
    pub section_types: Option<Vec<SectionType>>,
    /// AND semantics: every listed tag must be present on the candidate.
    pub tags: Option<Vec<String>>,
    /// Overlap semantics; an entry without dates never satisfies this.
    pub date_range: Option<DateWindow>,
    /// OR semantics across whitespace-split words.
    pub text: Option<String>,
    /// Carry item bodies in results.
    pub include_items: bool,
}

/// Owning-section context returned alongside each matched entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRef {
    pub id: String,
    pub section_type: SectionType,
    pub label: String,
}

impl From<&Section> for SectionRef {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id.clone(),
            section_type: section.section_type,
            label: section.label.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub vault_id: String,
    pub section: SectionRef,
    pub entry: Entry,
}

/// Verify every requested predicate against a decoded entry.
pub(crate) fn entry_matches(section: &Section, entry: &Entry, query: &VaultQuery) -> bool {
    if let Some(types) = &query.section_types {
        if !types.contains(&section.section_type) {
            return false;
        }
    }
    if let Some(tags) = &query.tags {
        if !tags.is_empty() {
            let entry_tags = entry.collect_tags();
            if !tags.iter().all(|t| entry_tags.contains(t)) {
                return false;
            }
        }
    }
    if let Some(window) = &query.date_range {
        match entry.metadata.date_range() {
            Some(range) => {
                if !range.overlaps(window) {
                    return false;
                }
            }
            None => return false,
        }
    }
    if let Some(text) = &query.text {
        if !text.trim().is_empty() {
            let words: HashSet<String> = entry
                .search_text()
                .split_whitespace()
                .map(|w| w.to_lowercase())
                .collect();
            let matched = text
                .split_whitespace()
                .any(|w| words.contains(&w.to_lowercase()));
            if !matched {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, EntryMetadata, Item};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn experience_section() -> (Section, Entry) {
        let section = Section::new("vault-1-x", SectionType::Experience, "Experience", 0);
        let mut entry = Entry::new(
            &section.id,
            EntryMetadata::Experience {
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                location: None,
                date_range: Some(DateRange::ongoing(d(2020, 1, 1))),
                summary: None,
            },
            0,
        );
        entry
            .items
            .push(Item::new(&entry.id, "Shipped v1", 0).with_tags(vec!["shipped".to_string()]));
        (section, entry)
    }

    #[test]
    fn test_tag_filter_reaches_item_tags() {
        let (section, entry) = experience_section();
        let query = VaultQuery {
            tags: Some(vec!["shipped".to_string()]),
            ..Default::default()
        };
        assert!(entry_matches(&section, &entry, &query));

        let query = VaultQuery {
            tags: Some(vec!["shipped".to_string(), "ghost".to_string()]),
            ..Default::default()
        };
        assert!(!entry_matches(&section, &entry, &query));
    }

    #[test]
    fn test_section_type_filter() {
        let (section, entry) = experience_section();
        let query = VaultQuery {
            section_types: Some(vec![SectionType::Education]),
            ..Default::default()
        };
        assert!(!entry_matches(&section, &entry, &query));
    }

    #[test]
    fn test_open_ended_entry_matches_future_window() {
        let (section, entry) = experience_section();
        let query = VaultQuery {
            date_range: Some(DateWindow::since(d(2023, 1, 1))),
            ..Default::default()
        };
        assert!(entry_matches(&section, &entry, &query));
    }

    #[test]
    fn test_dateless_entry_fails_date_filter() {
        let section = Section::new("vault-1-x", SectionType::Summary, "Summary", 0);
        let entry = Entry::new(
            &section.id,
            EntryMetadata::Summary {
                headline: Some("Staff engineer".to_string()),
            },
            0,
        );
        let query = VaultQuery {
            date_range: Some(DateWindow::since(d(2023, 1, 1))),
            ..Default::default()
        };
        assert!(!entry_matches(&section, &entry, &query));
    }

    #[test]
    fn test_text_or_semantics_over_items_and_metadata() {
        let (section, entry) = experience_section();
        let query = VaultQuery {
            text: Some("acme ghostword".to_string()),
            ..Default::default()
        };
        assert!(entry_matches(&section, &entry, &query));

        let query = VaultQuery {
            text: Some("ghostword".to_string()),
            ..Default::default()
        };
        assert!(!entry_matches(&section, &entry, &query));
    }
}
