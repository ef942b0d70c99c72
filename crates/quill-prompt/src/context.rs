use quill_core::{
    Chapter, Character, Location, Outline, ProjectMeta, ProjectSnapshot, StyleGuideEntry, TimelineEvent,
    WorldbuildingDoc,
};

/// Project data available to a prompt
///
/// Borrowed so callers can assemble it from whatever storage they hold.
#[derive(Debug, Clone, Copy)]
pub struct ContextBundle<'a> {
    pub project: &'a ProjectMeta,
    pub characters: &'a [Character],
    pub locations: &'a [Location],
    pub style_guide: &'a [StyleGuideEntry],
    pub timeline: &'a [TimelineEvent],
    pub worldbuilding: &'a [WorldbuildingDoc],
    pub outline: Option<&'a Outline>,
    pub chapters: &'a [Chapter],
}

impl<'a> From<&'a ProjectSnapshot> for ContextBundle<'a> {
    fn from(snapshot: &'a ProjectSnapshot) -> Self {
        Self {
            project: &snapshot.project,
            characters: &snapshot.characters,
            locations: &snapshot.locations,
            style_guide: &snapshot.style_guide,
            timeline: &snapshot.timeline,
            worldbuilding: &snapshot.worldbuilding,
            outline: snapshot.outline.as_ref(),
            chapters: &snapshot.chapters,
        }
    }
}

/// How much of the bundle goes into the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextScope {
    /// Everything
    Full,
    /// Metadata and style guide; the model fetches the rest through tools
    Minimal,
}
