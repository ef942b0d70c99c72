use async_trait::async_trait;
use quill_core::{
    Chapter, ChapterDraft, ChapterPatch, Character, CharacterDraft, CharacterPatch, Location, LocationDraft,
    LocationPatch, Outline, ProjectMeta, ProjectSnapshot, StyleGuideEntry, TimelineEvent, TimelineEventDraft,
    TimelineEventPatch, WorldbuildingDoc,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ProjectStore;

/// [`ProjectStore`] over an in-memory [`ProjectSnapshot`]
///
/// New entities get random UUID ids.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<ProjectSnapshot>,
}

impl InMemoryStore {
    pub fn new(mut snapshot: ProjectSnapshot) -> Self {
        snapshot.chapters.sort_by_key(|chapter| chapter.order);
        Self {
            data: RwLock::new(snapshot),
        }
    }

    /// Copy of the current contents
    pub async fn snapshot(&self) -> ProjectSnapshot {
        self.data.read().await.clone()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn find<T: Clone>(items: &[T], id: &str, key: impl Fn(&T) -> &str) -> Option<T> {
    items.iter().find(|item| key(item) == id).cloned()
}

fn patch<T: Clone>(items: &mut [T], id: &str, key: impl Fn(&T) -> &str, apply: impl FnOnce(&mut T)) -> Option<T> {
    let item = items.iter_mut().find(|item| key(item) == id)?;
    apply(item);
    Some(item.clone())
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn project(&self) -> anyhow::Result<ProjectMeta> {
        Ok(self.data.read().await.project.clone())
    }

    async fn outline(&self) -> anyhow::Result<Option<Outline>> {
        Ok(self.data.read().await.outline.clone())
    }

    // -- Characters --

    async fn list_characters(&self) -> anyhow::Result<Vec<Character>> {
        Ok(self.data.read().await.characters.clone())
    }

    async fn character(&self, id: &str) -> anyhow::Result<Option<Character>> {
        Ok(find(&self.data.read().await.characters, id, |c| c.id.as_str()))
    }

    async fn create_character(&self, draft: CharacterDraft) -> anyhow::Result<Character> {
        let character = Character::from_draft(new_id(), draft);
        self.data.write().await.characters.push(character.clone());
        Ok(character)
    }

    async fn update_character(&self, id: &str, changes: CharacterPatch) -> anyhow::Result<Option<Character>> {
        let mut data = self.data.write().await;
        Ok(patch(&mut data.characters, id, |c| c.id.as_str(), |c| changes.apply(c)))
    }

    // -- Locations --

    async fn list_locations(&self) -> anyhow::Result<Vec<Location>> {
        Ok(self.data.read().await.locations.clone())
    }

    async fn location(&self, id: &str) -> anyhow::Result<Option<Location>> {
        Ok(find(&self.data.read().await.locations, id, |l| l.id.as_str()))
    }

    async fn create_location(&self, draft: LocationDraft) -> anyhow::Result<Location> {
        let location = Location::from_draft(new_id(), draft);
        self.data.write().await.locations.push(location.clone());
        Ok(location)
    }

    async fn update_location(&self, id: &str, changes: LocationPatch) -> anyhow::Result<Option<Location>> {
        let mut data = self.data.write().await;
        Ok(patch(&mut data.locations, id, |l| l.id.as_str(), |l| changes.apply(l)))
    }

    // -- Timeline --

    async fn list_timeline_events(&self) -> anyhow::Result<Vec<TimelineEvent>> {
        Ok(self.data.read().await.timeline.clone())
    }

    async fn timeline_event(&self, id: &str) -> anyhow::Result<Option<TimelineEvent>> {
        Ok(find(&self.data.read().await.timeline, id, |e| e.id.as_str()))
    }

    async fn create_timeline_event(&self, draft: TimelineEventDraft) -> anyhow::Result<TimelineEvent> {
        let event = TimelineEvent::from_draft(new_id(), draft);
        self.data.write().await.timeline.push(event.clone());
        Ok(event)
    }

    async fn update_timeline_event(
        &self,
        id: &str,
        changes: TimelineEventPatch,
    ) -> anyhow::Result<Option<TimelineEvent>> {
        let mut data = self.data.write().await;
        Ok(patch(&mut data.timeline, id, |e| e.id.as_str(), |e| changes.apply(e)))
    }

    // -- Chapters --

    async fn list_chapters(&self) -> anyhow::Result<Vec<Chapter>> {
        Ok(self.data.read().await.chapters.clone())
    }

    async fn chapter(&self, id: &str) -> anyhow::Result<Option<Chapter>> {
        Ok(find(&self.data.read().await.chapters, id, |c| c.id.as_str()))
    }

    async fn create_chapter(&self, draft: ChapterDraft) -> anyhow::Result<Chapter> {
        let mut data = self.data.write().await;
        let order = data.chapters.iter().map(|c| c.order).max().unwrap_or(0) + 1;
        let chapter = Chapter::from_draft(new_id(), order, draft);
        data.chapters.push(chapter.clone());
        Ok(chapter)
    }

    async fn update_chapter(&self, id: &str, changes: ChapterPatch) -> anyhow::Result<Option<Chapter>> {
        let mut data = self.data.write().await;
        Ok(patch(&mut data.chapters, id, |c| c.id.as_str(), |c| changes.apply(c)))
    }

    // -- Reference material --

    async fn list_worldbuilding_docs(&self) -> anyhow::Result<Vec<WorldbuildingDoc>> {
        Ok(self.data.read().await.worldbuilding.clone())
    }

    async fn worldbuilding_doc(&self, id: &str) -> anyhow::Result<Option<WorldbuildingDoc>> {
        Ok(find(&self.data.read().await.worldbuilding, id, |d| d.id.as_str()))
    }

    async fn list_style_guide_entries(&self) -> anyhow::Result<Vec<StyleGuideEntry>> {
        Ok(self.data.read().await.style_guide.clone())
    }

    async fn style_guide_entry(&self, id: &str) -> anyhow::Result<Option<StyleGuideEntry>> {
        Ok(find(&self.data.read().await.style_guide, id, |e| e.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chapters_append_after_last() {
        let snapshot = ProjectSnapshot::from_json(
            r#"{"chapters": [{"id": "b", "title": "Two", "order": 5}, {"id": "a", "title": "One", "order": 2}]}"#,
        )
        .unwrap();
        let store = InMemoryStore::new(snapshot);

        let created = store
            .create_chapter(ChapterDraft {
                title: "Three".to_owned(),
                ..ChapterDraft::default()
            })
            .await
            .unwrap();

        assert_eq!(created.order, 6);
        let ids: Vec<_> = store.list_chapters().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids[..2], ["a", "b"]);
        assert_eq!(ids[2], created.id);
    }

    #[tokio::test]
    async fn unknown_ids_resolve_to_none() {
        let store = InMemoryStore::default();

        assert!(store.character("missing").await.unwrap().is_none());
        assert!(
            store
                .update_location("missing", LocationPatch::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn updates_are_visible_to_reads() {
        let store = InMemoryStore::default();
        let created = store
            .create_character(CharacterDraft {
                name: "Mara".to_owned(),
                ..CharacterDraft::default()
            })
            .await
            .unwrap();

        store
            .update_character(
                &created.id,
                CharacterPatch {
                    role: Some("smuggler".to_owned()),
                    ..CharacterPatch::default()
                },
            )
            .await
            .unwrap();

        let read = store.character(&created.id).await.unwrap().unwrap();
        assert_eq!(read.role.as_deref(), Some("smuggler"));
        assert_eq!(store.snapshot().await.characters.len(), 1);
    }
}
