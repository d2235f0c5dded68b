//! Section entries: one job, one degree, one project.
//!
//! The metadata union is a closed set of variants keyed by the `kind`
//! discriminator; every site interpreting metadata matches exhaustively so a
//! new variant cannot be silently ignored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::dates::DateRange;
use super::ids::generate_id;
use super::item::Item;
use super::section::SectionType;
use crate::errors::StoreResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EntryMetadata {
    Experience {
        title: String,
        company: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_range: Option<DateRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
    Education {
        institution: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        degree: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_range: Option<DateRange>,
    },
    Project {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_range: Option<DateRange>,
    },
    Certification {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issuer: Option<String>,
        /// Issue date as start; expiry, when any, as end.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_range: Option<DateRange>,
    },
    Publication {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        venue: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_range: Option<DateRange>,
    },
    Award {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issuer: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_range: Option<DateRange>,
    },
    Volunteer {
        organization: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_range: Option<DateRange>,
    },
    Language {
        language: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        proficiency: Option<String>,
    },
    SkillsGroup {
        name: String,
    },
    Summary {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headline: Option<String>,
    },
}

impl EntryMetadata {
    /// The serde `kind` discriminator of this variant.
    pub fn kind_str(&self) -> &'static str {
        match self {
            EntryMetadata::Experience { .. } => "experience",
            EntryMetadata::Education { .. } => "education",
            EntryMetadata::Project { .. } => "project",
            EntryMetadata::Certification { .. } => "certification",
            EntryMetadata::Publication { .. } => "publication",
            EntryMetadata::Award { .. } => "award",
            EntryMetadata::Volunteer { .. } => "volunteer",
            EntryMetadata::Language { .. } => "language",
            EntryMetadata::SkillsGroup { .. } => "skills-group",
            EntryMetadata::Summary { .. } => "summary",
        }
    }

    /// An entry may only live in a section whose type matches its discriminator.
    pub fn matches_section(&self, section_type: SectionType) -> bool {
        self.kind_str() == section_type.entry_kind()
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        match self {
            EntryMetadata::Experience { date_range, .. }
            | EntryMetadata::Education { date_range, .. }
            | EntryMetadata::Project { date_range, .. }
            | EntryMetadata::Certification { date_range, .. }
            | EntryMetadata::Publication { date_range, .. }
            | EntryMetadata::Award { date_range, .. }
            | EntryMetadata::Volunteer { date_range, .. } => date_range.as_ref(),
            EntryMetadata::Language { .. }
            | EntryMetadata::SkillsGroup { .. }
            | EntryMetadata::Summary { .. } => None,
        }
    }

    pub fn validate(&self) -> StoreResult<()> {
        if let Some(range) = self.date_range() {
            range.validate()?;
        }
        Ok(())
    }

    /// Display fields that take part in free-text matching.
    pub fn display_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        match self {
            EntryMetadata::Experience {
                title,
                company,
                location,
                summary,
                ..
            } => {
                parts.push(title);
                parts.push(company);
                parts.extend(location.as_deref());
                parts.extend(summary.as_deref());
            }
            EntryMetadata::Education {
                institution,
                degree,
                field,
                ..
            } => {
                parts.push(institution);
                parts.extend(degree.as_deref());
                parts.extend(field.as_deref());
            }
            EntryMetadata::Project {
                name, description, ..
            } => {
                parts.push(name);
                parts.extend(description.as_deref());
            }
            EntryMetadata::Certification { name, issuer, .. } => {
                parts.push(name);
                parts.extend(issuer.as_deref());
            }
            EntryMetadata::Publication { title, venue, .. } => {
                parts.push(title);
                parts.extend(venue.as_deref());
            }
            EntryMetadata::Award { title, issuer, .. } => {
                parts.push(title);
                parts.extend(issuer.as_deref());
            }
            EntryMetadata::Volunteer {
                organization, role, ..
            } => {
                parts.push(organization);
                parts.extend(role.as_deref());
            }
            EntryMetadata::Language {
                language,
                proficiency,
            } => {
                parts.push(language);
                parts.extend(proficiency.as_deref());
            }
            EntryMetadata::SkillsGroup { name } => parts.push(name),
            EntryMetadata::Summary { headline } => parts.extend(headline.as_deref()),
        }
        parts.join(" ")
    }
}

/// One entity within a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub section_id: String,
    pub metadata: EntryMetadata,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub display_order: i32,
}

impl Entry {
    pub fn new(section_id: &str, metadata: EntryMetadata, display_order: i32) -> Self {
        Self {
            id: generate_id("entry"),
            section_id: section_id.to_string(),
            metadata,
            items: Vec::new(),
            tags: Vec::new(),
            display_order,
        }
    }

    pub fn find_item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    pub fn next_item_order(&self) -> i32 {
        self.items
            .iter()
            .map(|i| i.display_order)
            .max()
            .map_or(0, |n| n + 1)
    }

    pub fn items_sorted(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.iter().collect();
        items.sort_by_key(|i| i.display_order);
        items
    }

    /// Own tags plus every item's tags.
    pub fn collect_tags(&self) -> HashSet<String> {
        let mut tags: HashSet<String> = self.tags.iter().cloned().collect();
        for item in &self.items {
            tags.extend(item.tags.iter().cloned());
        }
        tags
    }

    /// Metadata display fields plus every item's content.
    pub fn search_text(&self) -> String {
        let mut text = self.metadata.display_text();
        for item in &self.items {
            text.push(' ');
            text.push_str(&item.content);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn experience() -> EntryMetadata {
        EntryMetadata::Experience {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: None,
            date_range: Some(DateRange::ongoing(
                NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            )),
            summary: None,
        }
    }

    #[test]
    fn test_discriminator_matches_section() {
        assert!(experience().matches_section(SectionType::Experience));
        assert!(!experience().matches_section(SectionType::Education));
        let skills = EntryMetadata::SkillsGroup {
            name: "Backend".to_string(),
        };
        assert!(skills.matches_section(SectionType::Skills));
    }

    #[test]
    fn test_kind_discriminator_in_json() {
        let json = serde_json::to_string(&experience()).unwrap();
        assert!(json.contains("\"kind\":\"experience\""));

        let skills = EntryMetadata::SkillsGroup {
            name: "Backend".to_string(),
        };
        let json = serde_json::to_string(&skills).unwrap();
        assert!(json.contains("\"kind\":\"skills-group\""));
    }

    #[test]
    fn test_collect_tags_includes_items() {
        let mut entry = Entry::new("section-1-x", experience(), 0);
        entry.tags.push("backend".to_string());
        entry.items.push(
            Item::new(&entry.id, "Shipped v1", 0).with_tags(vec!["shipped".to_string()]),
        );

        let tags = entry.collect_tags();
        assert!(tags.contains("backend"));
        assert!(tags.contains("shipped"));
    }

    #[test]
    fn test_search_text_covers_metadata_and_items() {
        let mut entry = Entry::new("section-1-x", experience(), 0);
        entry.items.push(Item::new(&entry.id, "Shipped v1", 0));
        let text = entry.search_text();
        assert!(text.contains("Acme"));
        assert!(text.contains("Shipped v1"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let bad = EntryMetadata::Experience {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: None,
            date_range: Some(DateRange {
                start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                end: Some(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
            }),
            summary: None,
        };
        assert!(bad.validate().is_err());
    }
}
