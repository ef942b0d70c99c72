use serde::{Deserialize, Serialize};

use crate::entity::{Chapter, Character, Location, Outline, ProjectMeta, StyleGuideEntry, TimelineEvent, WorldbuildingDoc};

/// Everything known about one project at a point in time
///
/// Used to seed stores and to build prompt context. Every table is optional
/// in the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSnapshot {
    pub project: ProjectMeta,
    pub characters: Vec<Character>,
    pub locations: Vec<Location>,
    pub timeline: Vec<TimelineEvent>,
    pub chapters: Vec<Chapter>,
    pub worldbuilding: Vec<WorldbuildingDoc>,
    pub style_guide: Vec<StyleGuideEntry>,
    pub outline: Option<Outline>,
}

impl ProjectSnapshot {
    /// Parse a snapshot from its JSON form
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let mut snapshot: Self = serde_json::from_str(raw)?;
        snapshot.chapters.sort_by_key(|chapter| chapter.order);
        Ok(snapshot)
    }
}
