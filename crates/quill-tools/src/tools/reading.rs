//! Tools that let the model work through a long chapter in pieces
//!
//! Paragraphs are numbered from 1 over the non-blank lines of the chapter, the
//! same numbering in every tool here, so results can be chained.

use std::sync::OnceLock;

use async_trait::async_trait;
use quill_core::text::{clip, paragraphs, snippet, word_count};
use regex::{Regex, RegexBuilder};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::IdParams;
use crate::registry::Tool;
use crate::result::ToolResult;
use crate::store::ToolContext;

/// Most paragraphs one range read returns
pub const MAX_RANGE_PARAGRAPHS: usize = 50;
pub const DEFAULT_CONTEXT_CHARS: usize = 100;
pub const MAX_CONTEXT_CHARS: usize = 500;
/// Most hits one chapter search returns
pub const MAX_CHAPTER_HITS: usize = 20;
pub const PREVIEW_CHARS: usize = 80;

// -- Range reads --

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadChapterRangeParams {
    /// Id of the chapter
    #[schemars(length(min = 1))]
    pub id: String,
    /// First paragraph to return, counting from 1
    #[schemars(range(min = 1))]
    pub start: usize,
    /// Last paragraph to return, inclusive; defaults to the widest allowed window
    #[schemars(range(min = 1))]
    pub end: Option<usize>,
}

pub struct ReadChapterRange;

#[async_trait]
impl Tool for ReadChapterRange {
    type Params = ReadChapterRangeParams;

    const ID: &'static str = "read_chapter_range";
    const NAME: &'static str = "Read chapter range";
    const DESCRIPTION: &'static str = "Read paragraphs start..=end of a chapter (numbered from 1). At most 50 \
        paragraphs are returned per call; out-of-range numbers are clamped to the chapter.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: ReadChapterRangeParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(chapter) = context.store.chapter(&params.id).await? else {
            return Ok(ToolResult::not_found("chapter", &params.id));
        };
        let all = paragraphs(&chapter.content);
        let total = all.len();

        if total == 0 {
            return Ok(ToolResult::ok(
                format!("\"{}\" has no text", chapter.title),
                json!({"id": chapter.id, "total_paragraphs": 0, "paragraphs": []}),
            ));
        }

        let (start, end) = clamp_range(params.start, params.end, total);
        let items: Vec<Value> = (start..=end)
            .map(|n| json!({"paragraph": n, "text": all[n - 1]}))
            .collect();

        Ok(ToolResult::ok(
            format!("Paragraphs {start}-{end} of {total} in \"{}\"", chapter.title),
            json!({
                "id": chapter.id,
                "start": start,
                "end": end,
                "total_paragraphs": total,
                "has_more": end < total,
                "paragraphs": items,
            }),
        ))
    }
}

/// Clamp a 1-based inclusive range to `1..=total` and the window limit
fn clamp_range(start: usize, end: Option<usize>, total: usize) -> (usize, usize) {
    let start = start.clamp(1, total);
    let window_end = start + MAX_RANGE_PARAGRAPHS - 1;
    let end = end.unwrap_or(window_end).clamp(start, window_end).min(total);
    (start, end)
}

// -- Keyword search --

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchInChapterParams {
    /// Id of the chapter
    #[schemars(length(min = 1))]
    pub id: String,
    /// Text to look for, matched case-insensitively
    #[schemars(length(min = 1))]
    pub query: String,
    /// Characters of surrounding text on each side of a hit (default 100)
    #[schemars(range(max = 500))]
    pub context_chars: Option<usize>,
}

pub struct SearchInChapter;

#[async_trait]
impl Tool for SearchInChapter {
    type Params = SearchInChapterParams;

    const ID: &'static str = "search_in_chapter";
    const NAME: &'static str = "Search in chapter";
    const DESCRIPTION: &'static str = "Find a word or phrase in one chapter. Returns the paragraph number and \
        surrounding text of each hit (first 20 hits).";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: SearchInChapterParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(chapter) = context.store.chapter(&params.id).await? else {
            return Ok(ToolResult::not_found("chapter", &params.id));
        };
        if params.query.trim().is_empty() {
            return Ok(ToolResult::failure("query must not be blank"));
        }
        let pattern = keyword_pattern(&params.query)?;
        let context_chars = params
            .context_chars
            .unwrap_or(DEFAULT_CONTEXT_CHARS)
            .min(MAX_CONTEXT_CHARS);

        let mut total = 0;
        let mut hits = Vec::new();
        for (index, paragraph) in paragraphs(&chapter.content).into_iter().enumerate() {
            for found in pattern.find_iter(paragraph) {
                total += 1;
                if hits.len() < MAX_CHAPTER_HITS {
                    hits.push(json!({
                        "paragraph": index + 1,
                        "snippet": snippet(paragraph, found.start(), found.end(), context_chars),
                    }));
                }
            }
        }

        Ok(ToolResult::ok(
            format!("{} for \"{}\" in \"{}\"", super::count(total, "match"), params.query, chapter.title),
            json!({
                "id": chapter.id,
                "total_matches": total,
                "truncated": total > hits.len(),
                "hits": hits,
            }),
        ))
    }
}

/// Case-insensitive literal matcher for a user query
pub(crate) fn keyword_pattern(query: &str) -> anyhow::Result<Regex> {
    Ok(RegexBuilder::new(&regex::escape(query.trim()))
        .case_insensitive(true)
        .build()?)
}

// -- Scene structure --

fn scene_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?:[*#~•]\s*)+|-{3,}|(?:-\s+){2,}-|§)$").expect("scene break pattern is valid")
    })
}

/// Whether a paragraph is a scene-break marker (`***`, `* * *`, `#`, `---`, `~~~`, `§`)
pub fn is_scene_break(paragraph: &str) -> bool {
    scene_break().is_match(paragraph.trim())
}

pub struct GetChapterStructure;

#[async_trait]
impl Tool for GetChapterStructure {
    type Params = IdParams;

    const ID: &'static str = "get_chapter_structure";
    const NAME: &'static str = "Get chapter structure";
    const DESCRIPTION: &'static str = "Split a chapter into scenes at scene-break markers. Returns each scene's \
        paragraph span, word count and opening preview, for use with read_chapter_range.";
    const REQUIRES_APPROVAL: bool = false;

    async fn execute(&self, params: IdParams, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let Some(chapter) = context.store.chapter(&params.id).await? else {
            return Ok(ToolResult::not_found("chapter", &params.id));
        };
        let all = paragraphs(&chapter.content);

        let mut scenes = Vec::new();
        let mut current: Option<usize> = None;
        for (index, paragraph) in all.iter().enumerate() {
            if is_scene_break(paragraph) {
                if let Some(start) = current.take() {
                    scenes.push(scene_summary(scenes.len() + 1, &all, start, index - 1));
                }
            } else if current.is_none() {
                current = Some(index);
            }
        }
        if let Some(start) = current {
            scenes.push(scene_summary(scenes.len() + 1, &all, start, all.len() - 1));
        }

        Ok(ToolResult::ok(
            format!("\"{}\" has {}", chapter.title, super::count(scenes.len(), "scene")),
            json!({
                "id": chapter.id,
                "total_paragraphs": all.len(),
                "scenes": scenes,
            }),
        ))
    }
}

/// Scene over zero-based paragraph indices `first..=last`, reported 1-based
fn scene_summary(number: usize, all: &[&str], first: usize, last: usize) -> Value {
    let words: usize = all[first..=last].iter().map(|p| word_count(p)).sum();
    json!({
        "scene": number,
        "start_paragraph": first + 1,
        "end_paragraph": last + 1,
        "word_count": words,
        "preview": clip(all[first], PREVIEW_CHARS),
    })
}
