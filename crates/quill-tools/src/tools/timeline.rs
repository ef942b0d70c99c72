use async_trait::async_trait;
use quill_core::{TimelineEventDraft, TimelineEventPatch};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::{IdParams, NoParams, count};
use crate::registry::Tool;
use crate::result::ToolResult;
use crate::store::ToolContext;

pub struct ListTimelineEvents;

#[async_trait]
impl Tool for ListTimelineEvents {
    type Params = NoParams;

    const ID: &'static str = "list_timeline_events";
    const NAME: &'static str = "List timeline events";
    const DESCRIPTION: &'static str = "List every timeline event with id, title and in-world date.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, _params: NoParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let events = context.store.list_timeline_events().await?;
        let items: Vec<_> = events
            .iter()
            .map(|e| json!({"id": e.id, "title": e.title, "date": e.date}))
            .collect();

        Ok(ToolResult::ok(
            format!("Found {}", count(items.len(), "timeline event")),
            json!({ "events": items }),
        ))
    }
}

pub struct GetTimelineEvent;

#[async_trait]
impl Tool for GetTimelineEvent {
    type Params = IdParams;

    const ID: &'static str = "get_timeline_event";
    const NAME: &'static str = "Get timeline event";
    const DESCRIPTION: &'static str =
        "Get a timeline event with its description, involved character ids and location id.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: IdParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(event) = context.store.timeline_event(&params.id).await? else {
            return Ok(ToolResult::not_found("timeline event", &params.id));
        };

        Ok(ToolResult::ok(event.title.clone(), serde_json::to_value(&event)?))
    }
}

pub struct CreateTimelineEvent;

#[async_trait]
impl Tool for CreateTimelineEvent {
    type Params = TimelineEventDraft;

    const ID: &'static str = "create_timeline_event";
    const NAME: &'static str = "Create timeline event";
    const DESCRIPTION: &'static str = "Add an event to the story timeline. Only the title is required.";
    const REQUIRES_APPROVAL: bool = true;

    async fn execute(&self, params: TimelineEventDraft, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let event = context.store.create_timeline_event(params).await?;
        tracing::info!(tool = Self::ID, id = %event.id, "timeline event created");

        Ok(ToolResult::ok(
            format!("Created timeline event {}", event.title),
            serde_json::to_value(&event)?,
        ))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateTimelineEventParams {
    /// Id of the event to update
    #[schemars(length(min = 1))]
    pub id: String,
    #[serde(flatten)]
    pub patch: TimelineEventPatch,
}

pub struct UpdateTimelineEvent;

#[async_trait]
impl Tool for UpdateTimelineEvent {
    type Params = UpdateTimelineEventParams;

    const ID: &'static str = "update_timeline_event";
    const NAME: &'static str = "Update timeline event";
    const DESCRIPTION: &'static str = "Change some fields of an existing timeline event. Fields that are not given \
        keep their current value; character_ids replaces the whole list.";
    const REQUIRES_APPROVAL: bool = true;

    async fn execute(&self, params: UpdateTimelineEventParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        if params.patch.is_empty() {
            return Ok(ToolResult::failure("no fields to update"));
        }
        let Some(event) = context.store.update_timeline_event(&params.id, params.patch).await? else {
            return Ok(ToolResult::not_found("timeline event", &params.id));
        };
        tracing::info!(tool = Self::ID, id = %event.id, "timeline event updated");

        Ok(ToolResult::ok(
            format!("Updated timeline event {}", event.title),
            serde_json::to_value(&event)?,
        ))
    }
}
