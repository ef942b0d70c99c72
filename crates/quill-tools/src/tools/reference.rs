use async_trait::async_trait;
use serde_json::json;

use super::{IdParams, NoParams, count};
use crate::registry::Tool;
use crate::result::ToolResult;
use crate::store::ToolContext;

// -- Worldbuilding --

pub struct ListWorldbuildingDocs;

#[async_trait]
impl Tool for ListWorldbuildingDocs {
    type Params = NoParams;

    const ID: &'static str = "list_worldbuilding_docs";
    const NAME: &'static str = "List worldbuilding documents";
    const DESCRIPTION: &'static str =
        "List worldbuilding documents with id, title and parent id (documents nest under a parent).";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, _params: NoParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let docs = context.store.list_worldbuilding_docs().await?;
        let items: Vec<_> = docs
            .iter()
            .map(|d| json!({"id": d.id, "title": d.title, "parent_id": d.parent_id}))
            .collect();

        Ok(ToolResult::ok(
            format!("Found {}", count(items.len(), "worldbuilding document")),
            json!({ "documents": items }),
        ))
    }
}

pub struct GetWorldbuildingDoc;

#[async_trait]
impl Tool for GetWorldbuildingDoc {
    type Params = IdParams;

    const ID: &'static str = "get_worldbuilding_doc";
    const NAME: &'static str = "Get worldbuilding document";
    const DESCRIPTION: &'static str = "Get the full content of a worldbuilding document.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: IdParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(doc) = context.store.worldbuilding_doc(&params.id).await? else {
            return Ok(ToolResult::not_found("worldbuilding document", &params.id));
        };

        Ok(ToolResult::ok(doc.title.clone(), serde_json::to_value(&doc)?))
    }
}

// -- Style guide --

pub struct ListStyleGuideEntries;

#[async_trait]
impl Tool for ListStyleGuideEntries {
    type Params = NoParams;

    const ID: &'static str = "list_style_guide_entries";
    const NAME: &'static str = "List style guide entries";
    const DESCRIPTION: &'static str = "List style guide entries with id, title and category.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, _params: NoParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let entries = context.store.list_style_guide_entries().await?;
        let items: Vec<_> = entries
            .iter()
            .map(|e| json!({"id": e.id, "title": e.title, "category": e.category}))
            .collect();

        Ok(ToolResult::ok(
            format!("Found {}", count(items.len(), "style guide entry")),
            json!({ "entries": items }),
        ))
    }
}

pub struct GetStyleGuideEntry;

#[async_trait]
impl Tool for GetStyleGuideEntry {
    type Params = IdParams;

    const ID: &'static str = "get_style_guide_entry";
    const NAME: &'static str = "Get style guide entry";
    const DESCRIPTION: &'static str = "Get the full text of a style guide entry.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: IdParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(entry) = context.store.style_guide_entry(&params.id).await? else {
            return Ok(ToolResult::not_found("style guide entry", &params.id));
        };

        Ok(ToolResult::ok(entry.title.clone(), serde_json::to_value(&entry)?))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::tools::testing::fixture;

    #[tokio::test]
    async fn worldbuilding_list_and_get() {
        let (registry, context, _) = fixture();

        let list = registry.execute("list_worldbuilding_docs", json!({}), &context).await;
        assert_eq!(list.message, "Found 2 worldbuilding documents");
        assert_eq!(list.data.unwrap()["documents"][1]["parent_id"], "w1");

        let doc = registry.execute("get_worldbuilding_doc", json!({"id": "w2"}), &context).await;
        assert_eq!(doc.data.unwrap()["content"], "Circles of salt.");

        let missing = registry.execute("get_worldbuilding_doc", json!({"id": "w9"}), &context).await;
        assert_eq!(missing.message, "worldbuilding document not found: w9");
    }

    #[tokio::test]
    async fn style_guide_list_and_get() {
        let (registry, context, _) = fixture();

        let list = registry.execute("list_style_guide_entries", json!({}), &context).await;
        assert_eq!(list.message, "Found 1 style guide entry");
        assert_eq!(list.data.unwrap()["entries"][0]["category"], "grammar");

        let entry = registry.execute("get_style_guide_entry", json!({"id": "s1"}), &context).await;
        assert_eq!(entry.data.unwrap()["content"], "Past tense throughout.");
    }
}
