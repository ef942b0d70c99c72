use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Project-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMeta {
    /// Working title
    pub title: String,
    /// Author or pen name
    pub author: Option<String>,
    /// Genre (e.g. "literary fantasy")
    pub genre: Option<String>,
    /// Short synopsis of the whole work
    pub synopsis: Option<String>,
    /// Narrative point of view (e.g. "close third")
    pub point_of_view: Option<String>,
    /// Narrative tense (e.g. "past")
    pub tense: Option<String>,
    /// Target length in words
    pub target_word_count: Option<u32>,
}

// -- Characters --

/// A character in the story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backstory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Fields for a new character
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CharacterDraft {
    /// Character name
    #[schemars(length(min = 1))]
    pub name: String,
    /// Story role (e.g. "protagonist", "mentor")
    #[serde(default)]
    pub role: Option<String>,
    /// Physical description and personality
    #[serde(default)]
    pub description: Option<String>,
    /// History before the story begins
    #[serde(default)]
    pub backstory: Option<String>,
    /// What the character wants
    #[serde(default)]
    pub goals: Option<String>,
    /// Free-form author notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for a character; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CharacterPatch {
    /// New name
    #[schemars(length(min = 1))]
    pub name: Option<String>,
    /// New story role
    pub role: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New backstory
    pub backstory: Option<String>,
    /// New goals
    pub goals: Option<String>,
    /// New notes
    pub notes: Option<String>,
}

impl Character {
    /// Materialize a draft under the given id
    pub fn from_draft(id: String, draft: CharacterDraft) -> Self {
        Self {
            id,
            name: draft.name,
            role: draft.role,
            description: draft.description,
            backstory: draft.backstory,
            goals: draft.goals,
            notes: draft.notes,
        }
    }
}

impl CharacterPatch {
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.role.is_none()
            && self.description.is_none()
            && self.backstory.is_none()
            && self.goals.is_none()
            && self.notes.is_none()
    }

    pub fn apply(self, character: &mut Character) {
        if let Some(name) = self.name {
            character.name = name;
        }
        merge(&mut character.role, self.role);
        merge(&mut character.description, self.description);
        merge(&mut character.backstory, self.backstory);
        merge(&mut character.goals, self.goals);
        merge(&mut character.notes, self.notes);
    }
}

// -- Locations --

/// A place in the story world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Fields for a new location
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LocationDraft {
    /// Location name
    #[schemars(length(min = 1))]
    pub name: String,
    /// Kind of place (e.g. "city", "tavern", "planet")
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// What the place looks and feels like
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form author notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for a location; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LocationPatch {
    /// New name
    #[schemars(length(min = 1))]
    pub name: Option<String>,
    /// New kind of place
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New notes
    pub notes: Option<String>,
}

impl Location {
    pub fn from_draft(id: String, draft: LocationDraft) -> Self {
        Self {
            id,
            name: draft.name,
            kind: draft.kind,
            description: draft.description,
            notes: draft.notes,
        }
    }
}

impl LocationPatch {
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.description.is_none() && self.notes.is_none()
    }

    pub fn apply(self, location: &mut Location) {
        if let Some(name) = self.name {
            location.name = name;
        }
        merge(&mut location.kind, self.kind);
        merge(&mut location.description, self.description);
        merge(&mut location.notes, self.notes);
    }
}

// -- Timeline --

/// A dated event on the story timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub title: String,
    /// In-world date, free-form ("Year 312, late spring")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub character_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

/// Fields for a new timeline event
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEventDraft {
    /// Short event title
    #[schemars(length(min = 1))]
    pub title: String,
    /// In-world date, free-form
    #[serde(default)]
    pub date: Option<String>,
    /// What happens
    #[serde(default)]
    pub description: Option<String>,
    /// Ids of characters involved
    #[serde(default)]
    pub character_ids: Vec<String>,
    /// Id of the location where it happens
    #[serde(default)]
    pub location_id: Option<String>,
}

/// Partial update for a timeline event; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TimelineEventPatch {
    /// New title
    #[schemars(length(min = 1))]
    pub title: Option<String>,
    /// New in-world date
    pub date: Option<String>,
    /// New description
    pub description: Option<String>,
    /// Replacement list of involved character ids
    pub character_ids: Option<Vec<String>>,
    /// New location id
    pub location_id: Option<String>,
}

impl TimelineEvent {
    pub fn from_draft(id: String, draft: TimelineEventDraft) -> Self {
        Self {
            id,
            title: draft.title,
            date: draft.date,
            description: draft.description,
            character_ids: draft.character_ids,
            location_id: draft.location_id,
        }
    }
}

impl TimelineEventPatch {
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.character_ids.is_none()
            && self.location_id.is_none()
    }

    pub fn apply(self, event: &mut TimelineEvent) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(character_ids) = self.character_ids {
            event.character_ids = character_ids;
        }
        merge(&mut event.date, self.date);
        merge(&mut event.description, self.description);
        merge(&mut event.location_id, self.location_id);
    }
}

// -- Chapters --

/// A manuscript chapter
///
/// `content` is plain text; paragraphs are separated by line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    /// Position in the manuscript, starting at 1
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Drafting status (e.g. "draft", "revised")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Fields for a new chapter; it is appended after the last chapter
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ChapterDraft {
    /// Chapter title
    #[schemars(length(min = 1))]
    pub title: String,
    /// One-paragraph summary of the chapter
    #[serde(default)]
    pub summary: Option<String>,
    /// Drafting status
    #[serde(default)]
    pub status: Option<String>,
    /// Initial chapter text
    #[serde(default)]
    pub content: Option<String>,
}

/// Partial update for a chapter; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ChapterPatch {
    /// New title
    #[schemars(length(min = 1))]
    pub title: Option<String>,
    /// New summary
    pub summary: Option<String>,
    /// New drafting status
    pub status: Option<String>,
    /// Replacement chapter text
    pub content: Option<String>,
}

impl Chapter {
    pub fn from_draft(id: String, order: u32, draft: ChapterDraft) -> Self {
        Self {
            id,
            title: draft.title,
            order,
            summary: draft.summary,
            status: draft.status,
            content: draft.content.unwrap_or_default(),
        }
    }
}

impl ChapterPatch {
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.summary.is_none() && self.status.is_none() && self.content.is_none()
    }

    pub fn apply(self, chapter: &mut Chapter) {
        if let Some(title) = self.title {
            chapter.title = title;
        }
        if let Some(content) = self.content {
            chapter.content = content;
        }
        merge(&mut chapter.summary, self.summary);
        merge(&mut chapter.status, self.status);
    }
}

// -- Reference material --

/// A worldbuilding document; documents form a tree through `parent_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldbuildingDoc {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// A style guide rule or note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleGuideEntry {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Outline grid: one row per planned beat, one cell per column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Outline {
    pub columns: Vec<String>,
    pub rows: Vec<OutlineRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineRow {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<String>,
    pub cells: Vec<String>,
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_patch_only_touches_given_fields() {
        let mut character = Character::from_draft(
            "c1".to_owned(),
            CharacterDraft {
                name: "Mara".to_owned(),
                role: Some("protagonist".to_owned()),
                ..CharacterDraft::default()
            },
        );

        let patch = CharacterPatch {
            goals: Some("find her brother".to_owned()),
            ..CharacterPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut character);

        assert_eq!(character.name, "Mara");
        assert_eq!(character.role.as_deref(), Some("protagonist"));
        assert_eq!(character.goals.as_deref(), Some("find her brother"));
    }

    #[test]
    fn empty_patches_report_empty() {
        assert!(CharacterPatch::default().is_empty());
        assert!(LocationPatch::default().is_empty());
        assert!(TimelineEventPatch::default().is_empty());
        assert!(ChapterPatch::default().is_empty());
    }

    #[test]
    fn chapter_patch_replaces_content() {
        let mut chapter = Chapter::from_draft(
            "ch1".to_owned(),
            1,
            ChapterDraft {
                title: "Arrival".to_owned(),
                ..ChapterDraft::default()
            },
        );
        assert_eq!(chapter.content, "");

        ChapterPatch {
            content: Some("It rained.".to_owned()),
            ..ChapterPatch::default()
        }
        .apply(&mut chapter);

        assert_eq!(chapter.content, "It rained.");
        assert_eq!(chapter.title, "Arrival");
    }

    #[test]
    fn location_kind_serializes_as_type() {
        let location = Location::from_draft(
            "l1".to_owned(),
            LocationDraft {
                name: "Harbor".to_owned(),
                kind: Some("port".to_owned()),
                ..LocationDraft::default()
            },
        );
        let value = serde_json::to_value(&location).unwrap();
        assert_eq!(value["type"], "port");
        assert!(value.get("description").is_none());
    }
}
