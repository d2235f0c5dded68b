//! Leaf content units: one bullet point or skill entry.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use super::ids::generate_id;

/// What a quantified metric measures.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricKind {
    Percentage,
    Currency,
    Count,
    Time,
}

/// Quantified-impact annotation on an item ("cut latency 40%").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub kind: MetricKind,
    pub value: f64,
}

/// One bullet point or skill entry. Items never own further children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub entry_id: String,
    pub content: String,
    pub display_order: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
}

impl Item {
    pub fn new(entry_id: &str, content: impl Into<String>, display_order: i32) -> Self {
        Self {
            id: generate_id("item"),
            entry_id: entry_id.to_string(),
            content: content.into(),
            display_order,
            tags: Vec::new(),
            metric: None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }
}
