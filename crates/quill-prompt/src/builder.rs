use quill_llm::{CacheHint, Content, ContentPart, Message, Role};

use crate::context::{ContextBundle, ContextScope};
use crate::serialize::{escape_attr, serialize_context};
use crate::tasks::task_instructions;

/// System preamble used when the caller supplies none
pub const DEFAULT_PREAMBLE: &str = "You are Quill, a writing assistant working inside an author's novel project. \
     Respect the author's voice, established facts and style guide. Never invent facts that contradict the \
     project context.";

/// Synthetic assistant reply closing each context block
pub const ACKNOWLEDGEMENT: &str = "Understood.";

/// Document the author is currently editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentDocument {
    pub title: String,
    pub content: String,
}

/// Text appended to a recent genuine user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInstructions {
    pub text: String,
    /// 0 targets the newest user turn, 1 the one before it, and so on
    pub depth: usize,
}

/// Optional inputs to [`build_messages`]
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Replaces [`DEFAULT_PREAMBLE`]
    pub system_preamble: Option<String>,
    /// Replaces the task catalog instructions
    pub task_prompt: Option<String>,
    /// Seeds the assistant's reply
    pub prefill: Option<String>,
    /// Image URLs attached to the new turn
    pub images: Vec<String>,
    /// Whether the model can fetch project data through tools
    pub tools_enabled: bool,
    /// Excerpt the user is asking about
    pub selected_text: Option<String>,
    pub current_document: Option<CurrentDocument>,
    pub post_instructions: Option<PostInstructions>,
}

/// Assemble the ordered message list for one model call
///
/// Layout: system message, cache-hinted project context with its
/// acknowledgement, optional current document with its acknowledgement,
/// history, the new user turn, then an optional prefill. Only history and the
/// new turn count as genuine user messages when placing post instructions.
pub fn build_messages(
    task_id: &str,
    user_text: &str,
    context: &ContextBundle<'_>,
    history: &[Message],
    options: &BuildOptions,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 7);

    let preamble = options.system_preamble.as_deref().unwrap_or(DEFAULT_PREAMBLE);
    let task = options
        .task_prompt
        .as_deref()
        .unwrap_or_else(|| task_instructions(task_id));
    messages.push(Message::system(format!("{preamble}\n\n<task>\n{task}\n</task>")));

    let scope = if options.tools_enabled {
        ContextScope::Minimal
    } else {
        ContextScope::Full
    };
    messages.push(Message::user(vec![ContentPart::cached_text(serialize_context(context, scope))]));
    messages.push(Message::assistant(ACKNOWLEDGEMENT));

    if let Some(document) = &options.current_document {
        let block = format!(
            "<current-document title=\"{}\">\n{}\n</current-document>",
            escape_attr(&document.title),
            document.content
        );
        messages.push(Message::user(vec![ContentPart::cached_text(block)]));
        messages.push(Message::assistant(ACKNOWLEDGEMENT));
    }

    let genuine_start = messages.len();
    messages.extend_from_slice(history);
    if options.tools_enabled
        && let Some(last) = messages[genuine_start..].last_mut()
    {
        mark_last_text_cached(last);
    }

    if let Some(turn) = new_turn(user_text, options) {
        messages.push(turn);
    }

    if let Some(post) = options.post_instructions.as_ref().filter(|p| !p.text.trim().is_empty()) {
        inject_post_instructions(&mut messages[genuine_start..], post);
    }

    if let Some(prefill) = options.prefill.as_deref().filter(|p| !p.is_empty()) {
        messages.push(Message::assistant(prefill));
    }

    messages
}

/// The user's new turn, or `None` when there is nothing to send
fn new_turn(user_text: &str, options: &BuildOptions) -> Option<Message> {
    let text = match options.selected_text.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(selected) => format!("<selected-text>\n{selected}\n</selected-text>\n\n{user_text}"),
        None => user_text.to_owned(),
    };

    if options.images.is_empty() {
        return (!text.is_empty()).then(|| Message::user(text));
    }

    let mut parts = Vec::with_capacity(options.images.len() + 1);
    if !text.is_empty() {
        parts.push(ContentPart::text(text));
    }
    parts.extend(options.images.iter().map(|url| ContentPart::image(url.as_str())));
    Some(Message::user(parts))
}

/// Cache-hint the final non-empty text of a message
fn mark_last_text_cached(message: &mut Message) {
    match &mut message.content {
        Content::Text(text) if !text.is_empty() => {
            message.content = Content::Parts(vec![ContentPart::cached_text(std::mem::take(text))]);
        }
        Content::Text(_) => {}
        Content::Parts(parts) => {
            let last_text = parts.iter_mut().rev().find_map(|part| match part {
                ContentPart::Text { text, cache_hint } if !text.is_empty() => Some(cache_hint),
                _ => None,
            });
            if let Some(cache_hint) = last_text {
                *cache_hint = Some(CacheHint::Ephemeral);
            }
        }
    }
}

/// Append instructions to the `depth`-th newest user message
///
/// Depth beyond the oldest user message clamps to the oldest.
fn inject_post_instructions(genuine: &mut [Message], post: &PostInstructions) {
    let user_turns: Vec<usize> = genuine
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role == Role::User)
        .map(|(i, _)| i)
        .collect();

    let Some(&target) = user_turns.iter().rev().nth(post.depth).or_else(|| user_turns.first()) else {
        tracing::debug!("no user message to receive post instructions");
        return;
    };

    let message = &mut genuine[target];
    match &mut message.content {
        Content::Text(text) if text.is_empty() => text.push_str(&post.text),
        Content::Text(text) => {
            text.push_str("\n\n");
            text.push_str(&post.text);
        }
        Content::Parts(parts) => parts.push(ContentPart::text(post.text.clone())),
    }
}

#[cfg(test)]
mod tests {
    use quill_core::{ProjectMeta, ProjectSnapshot};

    use super::*;

    fn snapshot() -> ProjectSnapshot {
        ProjectSnapshot {
            project: ProjectMeta {
                title: "The Salt Road".to_owned(),
                ..ProjectMeta::default()
            },
            ..ProjectSnapshot::default()
        }
    }

    fn build(user_text: &str, history: &[Message], options: &BuildOptions) -> Vec<Message> {
        let snapshot = snapshot();
        build_messages("continue", user_text, &ContextBundle::from(&snapshot), history, options)
    }

    fn text_of(message: &Message) -> String {
        message.content.as_text()
    }

    #[test]
    fn basic_layout() {
        let messages = build("Go on.", &[], &BuildOptions::default());

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(text_of(&messages[0]).starts_with(DEFAULT_PREAMBLE));
        assert!(text_of(&messages[0]).contains("<task>\nContinue the story"));

        let Content::Parts(parts) = &messages[1].content else {
            panic!("context should be parts");
        };
        assert_eq!(parts[0].cache_hint(), Some(CacheHint::Ephemeral));
        assert!(text_of(&messages[1]).contains("<project title=\"The Salt Road\" />"));

        assert_eq!(messages[2], Message::assistant(ACKNOWLEDGEMENT));
        assert_eq!(messages[3], Message::user("Go on."));
    }

    #[test]
    fn unknown_task_and_overrides() {
        let snapshot = snapshot();
        let options = BuildOptions {
            system_preamble: Some("Custom preamble.".to_owned()),
            ..BuildOptions::default()
        };
        let messages = build_messages("translate", "hi", &ContextBundle::from(&snapshot), &[], &options);
        assert_eq!(
            text_of(&messages[0]),
            "Custom preamble.\n\n<task>\nFollow the user's instructions.\n</task>"
        );

        let options = BuildOptions {
            task_prompt: Some("Only list names.".to_owned()),
            ..BuildOptions::default()
        };
        let messages = build_messages("continue", "hi", &ContextBundle::from(&snapshot), &[], &options);
        assert!(text_of(&messages[0]).ends_with("<task>\nOnly list names.\n</task>"));
    }

    #[test]
    fn current_document_adds_second_context_pair() {
        let options = BuildOptions {
            current_document: Some(CurrentDocument {
                title: "Chapter \"One\"".to_owned(),
                content: "The tide was out.".to_owned(),
            }),
            ..BuildOptions::default()
        };
        let messages = build("Next?", &[], &options);

        assert_eq!(messages.len(), 6);
        assert_eq!(
            text_of(&messages[3]),
            "<current-document title=\"Chapter &quot;One&quot;\">\nThe tide was out.\n</current-document>"
        );
        assert_eq!(messages[3].content, Content::Parts(vec![ContentPart::cached_text(text_of(&messages[3]))]));
        assert_eq!(messages[4], Message::assistant(ACKNOWLEDGEMENT));
    }

    #[test]
    fn selected_text_and_images() {
        let options = BuildOptions {
            selected_text: Some("She ran.".to_owned()),
            images: vec!["https://example.com/map.png".to_owned()],
            ..BuildOptions::default()
        };
        let messages = build("Make it tense.", &[], &options);

        assert_eq!(
            messages.last().unwrap().content,
            Content::Parts(vec![
                ContentPart::text("<selected-text>\nShe ran.\n</selected-text>\n\nMake it tense."),
                ContentPart::image("https://example.com/map.png"),
            ])
        );
    }

    #[test]
    fn tool_mode_uses_minimal_context_and_caches_history_tail() {
        let snapshot: ProjectSnapshot = serde_json::from_value(serde_json::json!({
            "project": {"title": "The Salt Road"},
            "characters": [{"id": "c1", "name": "Mara"}]
        }))
        .unwrap();
        let history = vec![Message::user("Who is Mara?"), Message::assistant("Let me check.")];
        let options = BuildOptions {
            tools_enabled: true,
            ..BuildOptions::default()
        };
        let messages = build_messages("chat", "", &ContextBundle::from(&snapshot), &history, &options);

        assert!(!text_of(&messages[1]).contains("Mara"));
        assert_eq!(messages.len(), 5);
        assert_eq!(
            messages[4].content,
            Content::Parts(vec![ContentPart::cached_text("Let me check.")])
        );
    }

    #[test]
    fn history_cache_hint_targets_last_text_part() {
        let history = vec![Message::user(vec![
            ContentPart::text("Look at this"),
            ContentPart::image("data:image/png;base64,AAAA"),
        ])];
        let options = BuildOptions {
            tools_enabled: true,
            ..BuildOptions::default()
        };
        let messages = build("", &history, &options);

        let Content::Parts(parts) = &messages.last().unwrap().content else {
            panic!("history should stay multi-part");
        };
        assert_eq!(parts[0].cache_hint(), Some(CacheHint::Ephemeral));
        assert_eq!(parts[1].cache_hint(), None);
    }

    #[test]
    fn post_instructions_skip_synthetic_messages() {
        let post = |depth| BuildOptions {
            current_document: Some(CurrentDocument {
                title: "Ch 1".to_owned(),
                content: "Text".to_owned(),
            }),
            post_instructions: Some(PostInstructions {
                text: "Stay in past tense.".to_owned(),
                depth,
            }),
            ..BuildOptions::default()
        };
        let history = vec![
            Message::user("First question"),
            Message::assistant("First answer"),
            Message::assistant_tool_calls("", vec![quill_llm::ToolCall::new("call_1", "list_characters", serde_json::json!({}))]),
            Message::tool_result("call_1", "{}"),
        ];

        let messages = build("Second question", &history, &post(0));
        assert_eq!(text_of(messages.last().unwrap()), "Second question\n\nStay in past tense.");
        assert_eq!(text_of(&messages[5]), "First question");

        let messages = build("Second question", &history, &post(1));
        assert_eq!(text_of(&messages[5]), "First question\n\nStay in past tense.");
        assert_eq!(text_of(messages.last().unwrap()), "Second question");

        // Depth past the oldest genuine turn clamps to it, never a context block
        let messages = build("Second question", &history, &post(7));
        assert_eq!(text_of(&messages[5]), "First question\n\nStay in past tense.");
        assert!(!text_of(&messages[1]).contains("past tense"));
        assert!(!text_of(&messages[3]).contains("past tense"));
    }

    #[test]
    fn tool_mode_post_instructions_stay_separate_on_the_openai_wire() {
        let history = vec![Message::user("Who is Mara?")];
        let options = BuildOptions {
            tools_enabled: true,
            post_instructions: Some(PostInstructions {
                text: "Stay in past tense.".to_owned(),
                depth: 0,
            }),
            ..BuildOptions::default()
        };
        let messages = build("", &history, &options);
        assert_eq!(
            messages.last().unwrap().content,
            Content::Parts(vec![
                ContentPart::cached_text("Who is Mara?"),
                ContentPart::text("Stay in past tense."),
            ])
        );

        let params = quill_llm::CompletionParams::new("gpt-4.1", messages);
        let wire = serde_json::to_value(quill_llm::protocol::openai::OpenAiRequest::from(&params)).unwrap();
        let wire_messages = wire["messages"].as_array().unwrap();
        assert_eq!(wire_messages.len(), 4);
        assert_eq!(wire_messages[3]["content"], "Who is Mara?\n\nStay in past tense.");
    }

    #[test]
    fn post_instructions_without_genuine_turns_are_dropped() {
        let options = BuildOptions {
            post_instructions: Some(PostInstructions {
                text: "Be brief.".to_owned(),
                depth: 0,
            }),
            ..BuildOptions::default()
        };
        let messages = build("", &[], &options);

        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| !text_of(m).contains("Be brief.")));
    }

    #[test]
    fn prefill_is_last() {
        let options = BuildOptions {
            prefill: Some("The door".to_owned()),
            ..BuildOptions::default()
        };
        let messages = build("Continue", &[], &options);

        assert_eq!(messages.last().unwrap(), &Message::assistant("The door"));
        assert_eq!(messages[messages.len() - 2], Message::user("Continue"));
    }
}
