//! Built-in tool catalog
//!
//! Read-only tools (list, get, read, search) run without approval; every tool
//! that creates or changes stored data requires it.

mod chapters;
mod characters;
mod locations;
mod project;
mod reading;
mod reference;
mod search;
mod timeline;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::ToolError;
use crate::registry::ToolRegistry;

/// Arguments naming one entity
#[derive(Debug, Deserialize, JsonSchema)]
pub struct IdParams {
    /// Id of the entity, as returned by the matching list tool
    #[schemars(length(min = 1))]
    pub id: String,
}

/// Arguments for tools that take none
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

pub(crate) fn register_builtin(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry
        .register(project::GetProjectInfo)?
        .register(project::GetOutline)?
        .register(characters::ListCharacters)?
        .register(characters::GetCharacter)?
        .register(characters::CreateCharacter)?
        .register(characters::UpdateCharacter)?
        .register(locations::ListLocations)?
        .register(locations::GetLocation)?
        .register(locations::CreateLocation)?
        .register(locations::UpdateLocation)?
        .register(timeline::ListTimelineEvents)?
        .register(timeline::GetTimelineEvent)?
        .register(timeline::CreateTimelineEvent)?
        .register(timeline::UpdateTimelineEvent)?
        .register(chapters::ListChapters)?
        .register(chapters::GetChapter)?
        .register(chapters::CreateChapter)?
        .register(chapters::UpdateChapter)?
        .register(chapters::ReadChapter)?
        .register(reading::ReadChapterRange)?
        .register(reading::SearchInChapter)?
        .register(reading::GetChapterStructure)?
        .register(reference::ListWorldbuildingDocs)?
        .register(reference::GetWorldbuildingDoc)?
        .register(reference::ListStyleGuideEntries)?
        .register(reference::GetStyleGuideEntry)?
        .register(search::SearchProject)?;

    Ok(())
}

/// Noun with its count ("1 entry", "3 entries", "2 matches")
fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        return format!("1 {noun}");
    }
    if let Some(stem) = noun.strip_suffix("ry") {
        format!("{n} {stem}ries")
    } else if noun.ends_with("ch") || noun.ends_with('s') {
        format!("{n} {noun}es")
    } else {
        format!("{n} {noun}s")
    }
}
