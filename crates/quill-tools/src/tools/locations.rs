use async_trait::async_trait;
use quill_core::{LocationDraft, LocationPatch};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::{IdParams, NoParams, count};
use crate::registry::Tool;
use crate::result::ToolResult;
use crate::store::ToolContext;

pub struct ListLocations;

#[async_trait]
impl Tool for ListLocations {
    type Params = NoParams;

    const ID: &'static str = "list_locations";
    const NAME: &'static str = "List locations";
    const DESCRIPTION: &'static str = "List every location with id, name and type.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, _params: NoParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let locations = context.store.list_locations().await?;
        let items: Vec<_> = locations
            .iter()
            .map(|l| json!({"id": l.id, "name": l.name, "type": l.kind}))
            .collect();

        Ok(ToolResult::ok(
            format!("Found {}", count(items.len(), "location")),
            json!({ "locations": items }),
        ))
    }
}

pub struct GetLocation;

#[async_trait]
impl Tool for GetLocation {
    type Params = IdParams;

    const ID: &'static str = "get_location";
    const NAME: &'static str = "Get location";
    const DESCRIPTION: &'static str = "Get a location's full description and notes.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: IdParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(location) = context.store.location(&params.id).await? else {
            return Ok(ToolResult::not_found("location", &params.id));
        };

        Ok(ToolResult::ok(location.name.clone(), serde_json::to_value(&location)?))
    }
}

pub struct CreateLocation;

#[async_trait]
impl Tool for CreateLocation {
    type Params = LocationDraft;

    const ID: &'static str = "create_location";
    const NAME: &'static str = "Create location";
    const DESCRIPTION: &'static str = "Create a new location. Only the name is required.";
    const REQUIRES_APPROVAL: bool = true;

    async fn execute(&self, params: LocationDraft, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let location = context.store.create_location(params).await?;
        tracing::info!(tool = Self::ID, id = %location.id, "location created");

        Ok(ToolResult::ok(
            format!("Created location {}", location.name),
            serde_json::to_value(&location)?,
        ))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateLocationParams {
    /// Id of the location to update
    #[schemars(length(min = 1))]
    pub id: String,
    #[serde(flatten)]
    pub patch: LocationPatch,
}

pub struct UpdateLocation;

#[async_trait]
impl Tool for UpdateLocation {
    type Params = UpdateLocationParams;

    const ID: &'static str = "update_location";
    const NAME: &'static str = "Update location";
    const DESCRIPTION: &'static str =
        "Change some fields of an existing location. Fields that are not given keep their current value.";
    const REQUIRES_APPROVAL: bool = true;

    async fn execute(&self, params: UpdateLocationParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        if params.patch.is_empty() {
            return Ok(ToolResult::failure("no fields to update"));
        }
        let Some(location) = context.store.update_location(&params.id, params.patch).await? else {
            return Ok(ToolResult::not_found("location", &params.id));
        };
        tracing::info!(tool = Self::ID, id = %location.id, "location updated");

        Ok(ToolResult::ok(
            format!("Updated location {}", location.name),
            serde_json::to_value(&location)?,
        ))
    }
}
