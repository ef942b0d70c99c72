use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quill_llm::Effort;

/// Default configuration file, loaded only when present
pub const DEFAULT_CONFIG: &str = "quill.toml";

#[derive(Debug, Parser)]
#[command(name = "quill", about = "AI writing assistant: providers, tools and an agentic chat loop")]
pub struct Args {
    /// Path to the TOML configuration file
    ///
    /// Without this flag `quill.toml` is read if it exists, otherwise built-in
    /// defaults apply.
    #[arg(short, long, env = "QUILL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the available providers with their default models
    Providers,
    /// Print the model-facing tool definitions as JSON
    Tools,
    /// Send one message and run the tool loop until the model answers
    Chat(ChatArgs),
}

#[derive(Debug, clap::Args)]
pub struct ChatArgs {
    /// Provider id (see `quill providers`)
    #[arg(short, long, default_value = "anthropic")]
    pub provider: String,

    /// Model id; defaults to the provider's default model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Reasoning effort: none, minimal, low, medium, high or xhigh
    #[arg(long)]
    pub effort: Option<Effort>,

    /// Writing task whose instructions frame the request
    #[arg(short, long, default_value = "chat")]
    pub task: String,

    /// Project snapshot (JSON) used as context and as the tool store
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Excerpt the message refers to
    #[arg(long)]
    pub selected_text: Option<String>,

    /// Image URL to attach; repeatable
    #[arg(long = "image")]
    pub images: Vec<String>,

    /// Let the model read and edit the project through tools
    #[arg(long)]
    pub tools: bool,

    /// Run approval-gated tools without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Wait for the whole response instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Message to send
    pub message: String,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn chat_defaults() {
        let args = Args::try_parse_from(["quill", "chat", "hello"]).unwrap();

        assert!(args.config.is_none());
        let Command::Chat(chat) = args.command else {
            panic!("expected chat");
        };
        assert_eq!(chat.provider, "anthropic");
        assert_eq!(chat.task, "chat");
        assert_eq!(chat.message, "hello");
        assert!(chat.effort.is_none());
        assert!(!chat.tools && !chat.yes && !chat.no_stream);
    }

    #[test]
    fn chat_flags() {
        let args = Args::try_parse_from([
            "quill",
            "--config",
            "custom.toml",
            "chat",
            "--provider",
            "openrouter",
            "--effort",
            "high",
            "--image",
            "https://example.com/a.png",
            "--image",
            "https://example.com/b.png",
            "--tools",
            "--yes",
            "Who is Mara?",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        let Command::Chat(chat) = args.command else {
            panic!("expected chat");
        };
        assert_eq!(chat.provider, "openrouter");
        assert_eq!(chat.effort, Some(Effort::High));
        assert_eq!(chat.images.len(), 2);
        assert!(chat.tools && chat.yes);
    }

    #[test]
    fn rejects_unknown_effort() {
        assert!(Args::try_parse_from(["quill", "chat", "--effort", "extreme", "hi"]).is_err());
    }
}
