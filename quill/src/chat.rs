//! The agentic chat loop behind `quill chat`

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use futures_util::StreamExt;
use quill_config::Config;
use quill_core::ProjectSnapshot;
use quill_llm::{
    AiStreamChunk, CompletionParams, Effort, FinishReason, LlmError, Message, Provider, ProviderId, ProviderRegistry,
    RequestContext, ToolCall,
};
use quill_prompt::{BuildOptions, ContextBundle, PostInstructions, build_messages};
use quill_tools::{InMemoryStore, ToolContext, ToolRegistry, ToolResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio_util::sync::CancellationToken;

use crate::args::ChatArgs;

/// What one model call produced
#[derive(Debug, Default)]
struct Turn {
    text: String,
    tool_calls: Vec<ToolCall>,
    finish_reason: Option<FinishReason>,
}

/// Tools offered to the model and how approval is obtained
struct Toolbox {
    registry: ToolRegistry,
    context: ToolContext,
    auto_approve: bool,
    /// Shared across prompts so piped answers are read in order
    answers: BufReader<Stdin>,
}

pub async fn run(config: &Config, args: &ChatArgs, cancellation: CancellationToken) -> anyhow::Result<()> {
    let provider_id = ProviderId::parse(&args.provider)?;
    let registry = ProviderRegistry::from_config(&config.llm)?;
    let (provider, default_model) = registry.resolve(&args.provider)?;
    let model = args.model.clone().unwrap_or_else(|| default_model.to_owned());

    let api_key = config
        .llm
        .provider(&args.provider)
        .and_then(|p| p.api_key.clone())
        .with_context(|| format!("no API key configured, set llm.providers.{}.api_key", args.provider))?;
    let request = RequestContext::new(api_key).with_cancellation(cancellation);

    let snapshot = load_snapshot(args.project.as_deref()).await?;
    let effort = resolve_effort(args.effort, config.agent.effort.as_deref())?;

    let options = BuildOptions {
        system_preamble: config.agent.system_preamble.clone(),
        images: args.images.clone(),
        tools_enabled: args.tools,
        selected_text: args.selected_text.clone(),
        post_instructions: config.agent.post_instructions.clone().map(|text| PostInstructions {
            text,
            depth: config.agent.post_instructions_depth,
        }),
        ..BuildOptions::default()
    };
    let mut messages = build_messages(&args.task, &args.message, &ContextBundle::from(&snapshot), &[], &options);

    let mut toolbox = if args.tools {
        Some(Toolbox {
            registry: ToolRegistry::with_builtin_tools()?,
            context: ToolContext::new(Arc::new(InMemoryStore::new(snapshot))),
            auto_approve: args.yes,
            answers: BufReader::new(tokio::io::stdin()),
        })
    } else {
        None
    };
    let descriptors = toolbox
        .as_ref()
        .map(|t| t.registry.definitions_for_model())
        .unwrap_or_default();

    tracing::info!(
        provider = provider_id.entry().label,
        model = %model,
        task = %args.task,
        tools = descriptors.len(),
        "starting chat"
    );

    let max_rounds = config.agent.max_tool_rounds;
    let mut round = 0;

    loop {
        let params = CompletionParams::new(model.clone(), messages.clone())
            .with_temperature(config.agent.temperature)
            .with_max_tokens(config.agent.max_tokens)
            .with_effort(effort)
            .with_tools(descriptors.clone());

        let result = if args.no_stream {
            complete_turn(provider.as_ref(), &params, &request).await
        } else {
            stream_turn(provider.as_ref(), &params, &request).await
        };

        let turn = match result {
            Ok(turn) => turn,
            Err(e) if matches!(e.downcast_ref::<LlmError>(), Some(LlmError::Cancelled)) => {
                tracing::info!("chat cancelled");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if turn.finish_reason == Some(FinishReason::Length) {
            tracing::warn!("response stopped at the output token limit");
        }

        let Some(toolbox) = toolbox.as_mut().filter(|_| !turn.tool_calls.is_empty()) else {
            return Ok(());
        };

        round += 1;
        if round > max_rounds {
            tracing::warn!(max_rounds, "tool round limit reached, stopping");
            return Ok(());
        }

        messages.push(Message::assistant_tool_calls(turn.text, turn.tool_calls.clone()));
        for call in turn.tool_calls {
            let result = toolbox.run(&call).await?;
            eprintln!("[{}] {}", call.name, result.message);
            messages.push(Message::tool_result(call.id, result.to_model_text()));
        }
    }
}

async fn load_snapshot(path: Option<&Path>) -> anyhow::Result<ProjectSnapshot> {
    let Some(path) = path else {
        return Ok(ProjectSnapshot::default());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read project snapshot {}", path.display()))?;

    ProjectSnapshot::from_json(&raw).with_context(|| format!("invalid project snapshot {}", path.display()))
}

/// The flag wins over `agent.effort`
fn resolve_effort(flag: Option<Effort>, configured: Option<&str>) -> anyhow::Result<Effort> {
    match (flag, configured) {
        (Some(effort), _) => Ok(effort),
        (None, Some(level)) => level.parse().map_err(|_| anyhow::anyhow!("invalid agent.effort '{level}'")),
        (None, None) => Ok(Effort::None),
    }
}

impl Toolbox {
    async fn run(&mut self, call: &ToolCall) -> anyhow::Result<ToolResult> {
        let needs_approval = self.registry.requires_approval(&call.name).unwrap_or(false);

        if needs_approval && !self.auto_approve && !confirm(call, &mut self.answers).await? {
            tracing::info!(tool = %call.name, "tool call declined");
            return Ok(ToolResult::failure(format!("the user declined to run {}", call.name)));
        }

        tracing::debug!(tool = %call.name, id = %call.id, "running tool");
        Ok(self.registry.execute(&call.name, call.input.clone(), &self.context).await)
    }
}

/// Ask on stderr, read one answer line from `answers`
async fn confirm<R: AsyncBufRead + Unpin>(call: &ToolCall, answers: &mut R) -> anyhow::Result<bool> {
    eprint!("Allow {} with {}? [y/N] ", call.name, call.input);
    std::io::stderr().flush()?;

    let mut answer = String::new();
    answers.read_line(&mut answer).await?;

    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn complete_turn(
    provider: &dyn Provider,
    params: &CompletionParams,
    request: &RequestContext,
) -> anyhow::Result<Turn> {
    let response = provider.complete(params, request).await?;

    if let Some(reasoning) = response.reasoning.as_deref().filter(|r| !r.is_empty()) {
        eprintln!("{reasoning}");
    }
    if !response.content.is_empty() {
        println!("{}", response.content);
    }
    if let Some(usage) = &response.usage {
        tracing::debug!(
            model = %response.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "completion finished"
        );
    }

    Ok(Turn {
        tool_calls: response.tool_calls().to_vec(),
        text: response.content,
        finish_reason: Some(response.finish_reason),
    })
}

async fn stream_turn(
    provider: &dyn Provider,
    params: &CompletionParams,
    request: &RequestContext,
) -> anyhow::Result<Turn> {
    let mut stream = provider.stream(params, request).await?;
    let mut turn = Turn::default();

    while let Some(chunk) = stream.next().await {
        match chunk? {
            AiStreamChunk::Reasoning { text } => {
                eprint!("{text}");
            }
            AiStreamChunk::Content { text } => {
                print!("{text}");
                std::io::stdout().flush()?;
                turn.text.push_str(&text);
            }
            AiStreamChunk::ToolUse {
                id,
                name,
                input,
                signature,
            } => turn.tool_calls.push(ToolCall {
                id,
                name,
                input,
                signature,
            }),
            AiStreamChunk::Stop { finish_reason } => turn.finish_reason = Some(finish_reason),
        }
    }

    if !turn.text.is_empty() {
        println!();
    }

    Ok(turn)
}

#[cfg(test)]
mod tests {
    use quill_llm::{Effort, ToolCall};

    use super::{confirm, is_affirmative, resolve_effort};

    #[test]
    fn approval_answers() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative("\n"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yep"));
    }

    #[test]
    fn effort_flag_overrides_config() {
        assert_eq!(resolve_effort(Some(Effort::Low), Some("high")).unwrap(), Effort::Low);
        assert_eq!(resolve_effort(None, Some("high")).unwrap(), Effort::High);
        assert_eq!(resolve_effort(None, None).unwrap(), Effort::None);
        assert!(resolve_effort(None, Some("extreme")).is_err());
    }

    #[tokio::test]
    async fn piped_answers_are_consumed_one_per_prompt() {
        let call = ToolCall::new("call_1", "create_character", serde_json::json!({"name": "Ilse"}));
        let mut answers: &[u8] = b"yes\nn\ny\n";

        assert!(confirm(&call, &mut answers).await.unwrap());
        assert!(!confirm(&call, &mut answers).await.unwrap());
        assert!(confirm(&call, &mut answers).await.unwrap());
        assert!(!confirm(&call, &mut answers).await.unwrap());
    }
}
