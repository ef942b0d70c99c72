use async_trait::async_trait;
use quill_core::text::snippet;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::count;
use super::reading::keyword_pattern;
use crate::registry::Tool;
use crate::result::ToolResult;
use crate::store::ToolContext;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 50;
/// Characters of context on each side of a snippet
pub const SNIPPET_CONTEXT_CHARS: usize = 60;

/// Entity tables covered by project search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Character,
    Location,
    TimelineEvent,
    Chapter,
    Worldbuilding,
    StyleGuide,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchProjectParams {
    /// Text to look for, matched case-insensitively
    #[schemars(length(min = 1))]
    pub query: String,
    /// Only search these entity types (default: all)
    pub entity_types: Option<Vec<EntityType>>,
    /// Results per page (default 20)
    #[schemars(range(min = 1, max = 50))]
    pub limit: Option<usize>,
    /// Results to skip, for paging
    pub offset: Option<usize>,
}

/// One matching field of one entity
#[derive(Debug, Clone, Serialize)]
struct SearchHit {
    entity_type: EntityType,
    id: String,
    title: String,
    field: &'static str,
    snippet: String,
}

struct Collector<'a> {
    pattern: &'a Regex,
    hits: Vec<SearchHit>,
}

impl Collector<'_> {
    /// Record the first match in each field
    fn scan(&mut self, entity_type: EntityType, id: &str, title: &str, fields: &[(&'static str, Option<&str>)]) {
        for &(field, text) in fields {
            let Some(text) = text else {
                continue;
            };
            if let Some(found) = self.pattern.find(text) {
                self.hits.push(SearchHit {
                    entity_type,
                    id: id.to_owned(),
                    title: title.to_owned(),
                    field,
                    snippet: snippet(text, found.start(), found.end(), SNIPPET_CONTEXT_CHARS),
                });
            }
        }
    }
}

pub struct SearchProject;

#[async_trait]
impl Tool for SearchProject {
    type Params = SearchProjectParams;

    const ID: &'static str = "search_project";
    const NAME: &'static str = "Search project";
    const DESCRIPTION: &'static str = "Search characters, locations, timeline events, chapters, worldbuilding and \
        the style guide for a word or phrase. Returns entity type, id, matched field and a snippet per hit, paged \
        with limit (max 50) and offset. Use it to find where something is mentioned before reading details.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: SearchProjectParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        if params.query.trim().is_empty() {
            return Ok(ToolResult::failure("query must not be blank"));
        }
        let pattern = keyword_pattern(&params.query)?;
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);
        let wants = |kind: EntityType| params.entity_types.as_ref().is_none_or(|types| types.contains(&kind));

        let store = &context.store;
        let (characters, locations, events, chapters, docs, style_guide) = tokio::try_join!(
            store.list_characters(),
            store.list_locations(),
            store.list_timeline_events(),
            store.list_chapters(),
            store.list_worldbuilding_docs(),
            store.list_style_guide_entries(),
        )?;

        let mut collector = Collector {
            pattern: &pattern,
            hits: Vec::new(),
        };

        if wants(EntityType::Character) {
            for c in &characters {
                collector.scan(
                    EntityType::Character,
                    &c.id,
                    &c.name,
                    &[
                        ("name", Some(c.name.as_str())),
                        ("role", c.role.as_deref()),
                        ("description", c.description.as_deref()),
                        ("backstory", c.backstory.as_deref()),
                        ("goals", c.goals.as_deref()),
                        ("notes", c.notes.as_deref()),
                    ],
                );
            }
        }
        if wants(EntityType::Location) {
            for l in &locations {
                collector.scan(
                    EntityType::Location,
                    &l.id,
                    &l.name,
                    &[
                        ("name", Some(l.name.as_str())),
                        ("type", l.kind.as_deref()),
                        ("description", l.description.as_deref()),
                        ("notes", l.notes.as_deref()),
                    ],
                );
            }
        }
        if wants(EntityType::TimelineEvent) {
            for e in &events {
                collector.scan(
                    EntityType::TimelineEvent,
                    &e.id,
                    &e.title,
                    &[
                        ("title", Some(e.title.as_str())),
                        ("date", e.date.as_deref()),
                        ("description", e.description.as_deref()),
                    ],
                );
            }
        }
        if wants(EntityType::Chapter) {
            for c in &chapters {
                collector.scan(
                    EntityType::Chapter,
                    &c.id,
                    &c.title,
                    &[
                        ("title", Some(c.title.as_str())),
                        ("summary", c.summary.as_deref()),
                        ("content", Some(c.content.as_str())),
                    ],
                );
            }
        }
        if wants(EntityType::Worldbuilding) {
            for d in &docs {
                collector.scan(
                    EntityType::Worldbuilding,
                    &d.id,
                    &d.title,
                    &[("title", Some(d.title.as_str())), ("content", Some(d.content.as_str()))],
                );
            }
        }
        if wants(EntityType::StyleGuide) {
            for e in &style_guide {
                collector.scan(
                    EntityType::StyleGuide,
                    &e.id,
                    &e.title,
                    &[
                        ("title", Some(e.title.as_str())),
                        ("category", e.category.as_deref()),
                        ("content", Some(e.content.as_str())),
                    ],
                );
            }
        }

        let total = collector.hits.len();
        let page: Vec<SearchHit> = collector.hits.into_iter().skip(offset).take(limit).collect();
        let has_more = offset.saturating_add(page.len()) < total;

        tracing::debug!(tool = Self::ID, total, returned = page.len(), "project search finished");

        Ok(ToolResult::ok(
            format!("{} for \"{}\"", count(total, "result"), params.query),
            json!({
                "total": total,
                "offset": offset,
                "limit": limit,
                "has_more": has_more,
                "results": page,
            }),
        ))
    }
}
