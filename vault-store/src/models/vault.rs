//! The root aggregate: one person's full career content tree.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::generate_id;
use super::item::Item;
use super::section::{Section, SectionType};

/// Contact and identity fields shown at the top of a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
}

impl Profile {
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: String,
    pub version: u64,
    pub profile: Profile,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub metadata: VaultMetadata,
}

impl Vault {
    pub fn new(profile: Profile, owner_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id("vault"),
            version: 0,
            profile,
            sections: Vec::new(),
            metadata: VaultMetadata {
                created_at: now,
                updated_at: now,
                source_file: None,
                parse_confidence: None,
                owner_id,
            },
        }
    }

    /// Whole-vault structured snapshot. Decoding is strict: missing required
    /// fields fail.
    pub fn to_snapshot(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_snapshot(bytes: &[u8]) -> serde_json::Result<Vault> {
        serde_json::from_slice(bytes)
    }

    pub fn find_section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    pub fn find_section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }

    pub fn next_section_order(&self) -> i32 {
        self.sections
            .iter()
            .map(|s| s.display_order)
            .max()
            .map_or(0, |n| n + 1)
    }

    pub fn sections_sorted(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.display_order);
        sections
    }

    pub fn sections_of_type(&self, section_type: SectionType) -> Vec<&Section> {
        self.sections_sorted()
            .into_iter()
            .filter(|s| s.section_type == section_type)
            .collect()
    }

    /// Every entry tag and item tag anywhere in the tree.
    pub fn collect_tags(&self) -> HashSet<String> {
        let mut tags = HashSet::new();
        for section in &self.sections {
            for entry in &section.entries {
                tags.extend(entry.collect_tags());
            }
        }
        tags
    }

    /// Searchable text of every entry in the tree.
    pub fn search_text(&self) -> String {
        let mut text = String::new();
        for section in &self.sections {
            for entry in &section.entries {
                text.push_str(&entry.search_text());
                text.push(' ');
            }
        }
        text
    }

    pub fn all_items(&self) -> Vec<&Item> {
        let mut items = Vec::new();
        for section in self.sections_sorted() {
            for entry in section.entries_sorted() {
                items.extend(entry.items_sorted());
            }
        }
        items
    }
}
