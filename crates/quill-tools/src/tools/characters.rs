use async_trait::async_trait;
use quill_core::{CharacterDraft, CharacterPatch};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::{IdParams, NoParams, count};
use crate::registry::Tool;
use crate::result::ToolResult;
use crate::store::ToolContext;

pub struct ListCharacters;

#[async_trait]
impl Tool for ListCharacters {
    type Params = NoParams;

    const ID: &'static str = "list_characters";
    const NAME: &'static str = "List characters";
    const DESCRIPTION: &'static str =
        "List every character with id, name and role. Use get_character for full profiles.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, _params: NoParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let characters = context.store.list_characters().await?;
        let items: Vec<_> = characters
            .iter()
            .map(|c| json!({"id": c.id, "name": c.name, "role": c.role}))
            .collect();

        Ok(ToolResult::ok(
            format!("Found {}", count(items.len(), "character")),
            json!({ "characters": items }),
        ))
    }
}

pub struct GetCharacter;

#[async_trait]
impl Tool for GetCharacter {
    type Params = IdParams;

    const ID: &'static str = "get_character";
    const NAME: &'static str = "Get character";
    const DESCRIPTION: &'static str =
        "Get a character's full profile: role, description, backstory, goals and notes.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: IdParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(character) = context.store.character(&params.id).await? else {
            return Ok(ToolResult::not_found("character", &params.id));
        };

        Ok(ToolResult::ok(character.name.clone(), serde_json::to_value(&character)?))
    }
}

pub struct CreateCharacter;

#[async_trait]
impl Tool for CreateCharacter {
    type Params = CharacterDraft;

    const ID: &'static str = "create_character";
    const NAME: &'static str = "Create character";
    const DESCRIPTION: &'static str = "Create a new character. Only the name is required.";
    const REQUIRES_APPROVAL: bool = true;

    async fn execute(&self, params: CharacterDraft, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let character = context.store.create_character(params).await?;
        tracing::info!(tool = Self::ID, id = %character.id, "character created");

        Ok(ToolResult::ok(
            format!("Created character {}", character.name),
            serde_json::to_value(&character)?,
        ))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCharacterParams {
    /// Id of the character to update
    #[schemars(length(min = 1))]
    pub id: String,
    #[serde(flatten)]
    pub patch: CharacterPatch,
}

pub struct UpdateCharacter;

#[async_trait]
impl Tool for UpdateCharacter {
    type Params = UpdateCharacterParams;

    const ID: &'static str = "update_character";
    const NAME: &'static str = "Update character";
    const DESCRIPTION: &'static str =
        "Change some fields of an existing character. Fields that are not given keep their current value.";
    const REQUIRES_APPROVAL: bool = true;

    async fn execute(&self, params: UpdateCharacterParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        if params.patch.is_empty() {
            return Ok(ToolResult::failure("no fields to update"));
        }
        let Some(character) = context.store.update_character(&params.id, params.patch).await? else {
            return Ok(ToolResult::not_found("character", &params.id));
        };
        tracing::info!(tool = Self::ID, id = %character.id, "character updated");

        Ok(ToolResult::ok(
            format!("Updated character {}", character.name),
            serde_json::to_value(&character)?,
        ))
    }
}
