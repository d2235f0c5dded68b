//! Typed groupings of entries within a vault.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use super::entry::Entry;
use super::ids::generate_id;

/// Section type. Immutable after creation; it determines which metadata
/// variant the section's entries may carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SectionType {
    Experience,
    Education,
    Skills,
    Certifications,
    Projects,
    Publications,
    Awards,
    Volunteer,
    Languages,
    Summary,
}

impl SectionType {
    /// Metadata discriminator entries of this section must carry.
    pub fn entry_kind(&self) -> &'static str {
        match self {
            SectionType::Experience => "experience",
            SectionType::Education => "education",
            SectionType::Skills => "skills-group",
            SectionType::Certifications => "certification",
            SectionType::Projects => "project",
            SectionType::Publications => "publication",
            SectionType::Awards => "award",
            SectionType::Volunteer => "volunteer",
            SectionType::Languages => "language",
            SectionType::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub vault_id: String,
    pub section_type: SectionType,
    pub label: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
    pub display_order: i32,
}

impl Section {
    pub fn new(
        vault_id: &str,
        section_type: SectionType,
        label: impl Into<String>,
        display_order: i32,
    ) -> Self {
        Self {
            id: generate_id("section"),
            vault_id: vault_id.to_string(),
            section_type,
            label: label.into(),
            entries: Vec::new(),
            display_order,
        }
    }

    pub fn find_entry(&self, entry_id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == entry_id)
    }

    pub fn find_entry_mut(&mut self, entry_id: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == entry_id)
    }

    pub fn next_entry_order(&self) -> i32 {
        self.entries
            .iter()
            .map(|e| e.display_order)
            .max()
            .map_or(0, |n| n + 1)
    }

    pub fn entries_sorted(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.display_order);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_type_serde_and_strum_agree() {
        let json = serde_json::to_string(&SectionType::Certifications).unwrap();
        assert_eq!(json, "\"certifications\"");
        assert_eq!(SectionType::Skills.as_ref(), "skills");
        assert_eq!("volunteer".parse::<SectionType>().unwrap(), SectionType::Volunteer);
    }

    #[test]
    fn test_next_entry_order_increments() {
        let mut section = Section::new("vault-1-x", SectionType::Experience, "Experience", 0);
        assert_eq!(section.next_entry_order(), 0);
        let metadata = super::super::entry::EntryMetadata::Experience {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: None,
            date_range: None,
            summary: None,
        };
        section.entries.push(Entry::new(&section.id, metadata, 4));
        assert_eq!(section.next_entry_order(), 5);
    }
}
