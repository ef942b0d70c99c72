use async_trait::async_trait;
use quill_core::text::word_count;
use serde_json::json;

use super::NoParams;
use crate::registry::Tool;
use crate::result::ToolResult;
use crate::store::ToolContext;

pub struct GetProjectInfo;

#[async_trait]
impl Tool for GetProjectInfo {
    type Params = NoParams;

    const ID: &'static str = "get_project_info";
    const NAME: &'static str = "Get project info";
    const DESCRIPTION: &'static str = "Get the project's title, author, genre, synopsis, point of view, tense and \
        target length, with chapter and word totals.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, _params: NoParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let (project, chapters) = tokio::try_join!(context.store.project(), context.store.list_chapters())?;
        let total_words: usize = chapters.iter().map(|c| word_count(&c.content)).sum();

        let mut data = serde_json::to_value(&project)?;
        data["chapter_count"] = json!(chapters.len());
        data["total_words"] = json!(total_words);

        Ok(ToolResult::ok(format!("Project \"{}\"", project.title), data))
    }
}

pub struct GetOutline;

#[async_trait]
impl Tool for GetOutline {
    type Params = NoParams;

    const ID: &'static str = "get_outline";
    const NAME: &'static str = "Get outline";
    const DESCRIPTION: &'static str = "Get the story outline grid: column names and one row per planned beat with \
        its cell text and linked chapter id.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, _params: NoParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(outline) = context.store.outline().await? else {
            return Ok(ToolResult::failure("the project has no outline"));
        };

        Ok(ToolResult::ok(
            format!("Outline with {}", super::count(outline.rows.len(), "row")),
            serde_json::to_value(&outline)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::tools::testing::fixture;

    #[tokio::test]
    async fn project_info_includes_totals() {
        let (registry, context, _) = fixture();

        let result = registry.execute("get_project_info", json!({}), &context).await;
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["title"], "The Salt Road");
        assert_eq!(data["chapter_count"], 2);
        assert_eq!(data["total_words"], 24);
    }

    #[tokio::test]
    async fn outline_rows_are_returned() {
        let (registry, context, _) = fixture();

        let result = registry.execute("get_outline", json!({}), &context).await;
        assert_eq!(result.message, "Outline with 1 row");
        assert_eq!(result.data.unwrap()["rows"][0]["chapter_id"], "ch1");
    }
}
