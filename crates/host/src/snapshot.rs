//! Serializable export of a composed document.

use crate::document::MemoryDocument;
use crate::model::{Container, Graphic, Note, Page, Spread, StoryItem, Table};
use galley_types::{ContainerId, StoryId};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
    pub id: StoryId,
    pub containers: Vec<ContainerId>,
    pub overflows: bool,
    pub tail: Option<ContainerId>,
    pub text: String,
    pub items: Vec<StoryItem>,
}

/// Everything needed to inspect or diff a finished document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub pages: Vec<Page>,
    pub spreads: Vec<Spread>,
    pub containers: Vec<Container>,
    pub stories: Vec<StorySummary>,
    pub graphics: Vec<Graphic>,
    pub tables: Vec<Table>,
    pub notes: Vec<Note>,
}

impl DocumentSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl MemoryDocument {
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            pages: self.pages().cloned().collect(),
            spreads: self.spreads.values().cloned().collect(),
            containers: self.containers.values().cloned().collect(),
            stories: self
                .stories
                .values()
                .map(|s| StorySummary {
                    id: s.id,
                    containers: s.containers.clone(),
                    overflows: s.overflows,
                    tail: s.tail,
                    text: self.story_text(s.id),
                    items: s.items.clone(),
                })
                .collect(),
            graphics: self.graphics.values().cloned().collect(),
            tables: self.tables.values().cloned().collect(),
            notes: self.notes.values().cloned().collect(),
        }
    }
}
