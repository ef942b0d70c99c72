use async_trait::async_trait;
use quill_core::text::{paragraphs, word_count};
use quill_core::{ChapterDraft, ChapterPatch};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::{IdParams, NoParams, count};
use crate::registry::Tool;
use crate::result::ToolResult;
use crate::store::ToolContext;

pub struct ListChapters;

#[async_trait]
impl Tool for ListChapters {
    type Params = NoParams;

    const ID: &'static str = "list_chapters";
    const NAME: &'static str = "List chapters";
    const DESCRIPTION: &'static str = "List chapters in manuscript order with id, title, order, status and word count.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, _params: NoParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let chapters = context.store.list_chapters().await?;
        let items: Vec<_> = chapters
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "title": c.title,
                    "order": c.order,
                    "status": c.status,
                    "word_count": word_count(&c.content),
                })
            })
            .collect();

        Ok(ToolResult::ok(
            format!("Found {}", count(items.len(), "chapter")),
            json!({ "chapters": items }),
        ))
    }
}

pub struct GetChapter;

#[async_trait]
impl Tool for GetChapter {
    type Params = IdParams;

    const ID: &'static str = "get_chapter";
    const NAME: &'static str = "Get chapter";
    const DESCRIPTION: &'static str = "Get a chapter's metadata and summary with word and paragraph counts, without \
        its text. Use read_chapter, read_chapter_range or search_in_chapter for the text.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: IdParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(chapter) = context.store.chapter(&params.id).await? else {
            return Ok(ToolResult::not_found("chapter", &params.id));
        };

        Ok(ToolResult::ok(
            chapter.title.clone(),
            json!({
                "id": chapter.id,
                "title": chapter.title,
                "order": chapter.order,
                "status": chapter.status,
                "summary": chapter.summary,
                "word_count": word_count(&chapter.content),
                "paragraph_count": paragraphs(&chapter.content).len(),
            }),
        ))
    }
}

pub struct ReadChapter;

#[async_trait]
impl Tool for ReadChapter {
    type Params = IdParams;

    const ID: &'static str = "read_chapter";
    const NAME: &'static str = "Read chapter";
    const DESCRIPTION: &'static str = "Read a chapter's full text. For long chapters prefer get_chapter_structure \
        and read_chapter_range.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: IdParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(chapter) = context.store.chapter(&params.id).await? else {
            return Ok(ToolResult::not_found("chapter", &params.id));
        };

        Ok(ToolResult::ok(
            format!("{} ({} words)", chapter.title, word_count(&chapter.content)),
            json!({
                "id": chapter.id,
                "title": chapter.title,
                "content": chapter.content,
            }),
        ))
    }
}

pub struct CreateChapter;

#[async_trait]
impl Tool for CreateChapter {
    type Params = ChapterDraft;

    const ID: &'static str = "create_chapter";
    const NAME: &'static str = "Create chapter";
    const DESCRIPTION: &'static str =
        "Append a new chapter after the last one. Only the title is required.";
    const REQUIRES_APPROVAL: bool = true;

    async fn execute(&self, params: ChapterDraft, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let chapter = context.store.create_chapter(params).await?;
        tracing::info!(tool = Self::ID, id = %chapter.id, order = chapter.order, "chapter created");

        Ok(ToolResult::ok(
            format!("Created chapter {} \"{}\"", chapter.order, chapter.title),
            json!({"id": chapter.id, "title": chapter.title, "order": chapter.order}),
        ))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateChapterParams {
    /// Id of the chapter to update
    #[schemars(length(min = 1))]
    pub id: String,
    #[serde(flatten)]
    pub patch: ChapterPatch,
}

pub struct UpdateChapter;

#[async_trait]
impl Tool for UpdateChapter {
    type Params = UpdateChapterParams;

    const ID: &'static str = "update_chapter";
    const NAME: &'static str = "Update chapter";
    const DESCRIPTION: &'static str = "Change some fields of an existing chapter. Fields that are not given keep \
        their current value; content replaces the whole chapter text.";
    const REQUIRES_APPROVAL: bool = true;

    async fn execute(&self, params: UpdateChapterParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        if params.patch.is_empty() {
            return Ok(ToolResult::failure("no fields to update"));
        }
        let Some(chapter) = context.store.update_chapter(&params.id, params.patch).await? else {
            return Ok(ToolResult::not_found("chapter", &params.id));
        };
        tracing::info!(tool = Self::ID, id = %chapter.id, "chapter updated");

        Ok(ToolResult::ok(
            format!("Updated chapter \"{}\"", chapter.title),
            json!({
                "id": chapter.id,
                "title": chapter.title,
                "status": chapter.status,
                "word_count": word_count(&chapter.content),
            }),
        ))
    }
}
