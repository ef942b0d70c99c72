//! Data access seam between the tools and the application's storage

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use quill_core::{
    Chapter, ChapterDraft, ChapterPatch, Character, CharacterDraft, CharacterPatch, Location, LocationDraft,
    LocationPatch, Outline, ProjectMeta, StyleGuideEntry, TimelineEvent, TimelineEventDraft, TimelineEventPatch,
    WorldbuildingDoc,
};

pub use memory::InMemoryStore;

/// Storage the tools read and write
///
/// Lookups resolve to `Ok(None)` when the id does not exist; errors are
/// reserved for storage failures. Updates return the entity after the patch,
/// or `None` for an unknown id. Lists come back in display order (chapters by
/// `order`).
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn project(&self) -> anyhow::Result<ProjectMeta>;
    async fn outline(&self) -> anyhow::Result<Option<Outline>>;

    async fn list_characters(&self) -> anyhow::Result<Vec<Character>>;
    async fn character(&self, id: &str) -> anyhow::Result<Option<Character>>;
    async fn create_character(&self, draft: CharacterDraft) -> anyhow::Result<Character>;
    async fn update_character(&self, id: &str, patch: CharacterPatch) -> anyhow::Result<Option<Character>>;

    async fn list_locations(&self) -> anyhow::Result<Vec<Location>>;
    async fn location(&self, id: &str) -> anyhow::Result<Option<Location>>;
    async fn create_location(&self, draft: LocationDraft) -> anyhow::Result<Location>;
    async fn update_location(&self, id: &str, patch: LocationPatch) -> anyhow::Result<Option<Location>>;

    async fn list_timeline_events(&self) -> anyhow::Result<Vec<TimelineEvent>>;
    async fn timeline_event(&self, id: &str) -> anyhow::Result<Option<TimelineEvent>>;
    async fn create_timeline_event(&self, draft: TimelineEventDraft) -> anyhow::Result<TimelineEvent>;
    async fn update_timeline_event(
        &self,
        id: &str,
        patch: TimelineEventPatch,
    ) -> anyhow::Result<Option<TimelineEvent>>;

    async fn list_chapters(&self) -> anyhow::Result<Vec<Chapter>>;
    async fn chapter(&self, id: &str) -> anyhow::Result<Option<Chapter>>;
    /// Append a chapter after the current last one
    async fn create_chapter(&self, draft: ChapterDraft) -> anyhow::Result<Chapter>;
    async fn update_chapter(&self, id: &str, patch: ChapterPatch) -> anyhow::Result<Option<Chapter>>;

    async fn list_worldbuilding_docs(&self) -> anyhow::Result<Vec<WorldbuildingDoc>>;
    async fn worldbuilding_doc(&self, id: &str) -> anyhow::Result<Option<WorldbuildingDoc>>;

    async fn list_style_guide_entries(&self) -> anyhow::Result<Vec<StyleGuideEntry>>;
    async fn style_guide_entry(&self, id: &str) -> anyhow::Result<Option<StyleGuideEntry>>;
}

/// Per-call environment handed to every tool
#[derive(Clone)]
pub struct ToolContext {
    pub store: Arc<dyn ProjectStore>,
}

impl ToolContext {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}
