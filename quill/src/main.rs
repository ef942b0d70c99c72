mod args;
mod chat;

use std::path::Path;

use args::{Args, Command, DEFAULT_CONFIG};
use clap::Parser;
use quill_config::Config;
use quill_llm::{BUILTIN_PROVIDERS, ProviderRegistry};
use quill_tools::ToolRegistry;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;

    quill_telemetry::init(&config.telemetry)?;

    match args.command {
        Command::Providers => print_providers(&config)?,
        Command::Tools => print_tools()?,
        Command::Chat(chat_args) => {
            let cancellation = CancellationToken::new();
            tokio::spawn(cancel_on_interrupt(cancellation.clone()));

            chat::run(&config, &chat_args, cancellation).await?;
        }
    }

    Ok(())
}

/// Explicit paths must exist; the default path is optional
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None if Path::new(DEFAULT_CONFIG).exists() => Config::load(Path::new(DEFAULT_CONFIG)),
        None => Ok(Config::default()),
    }
}

fn print_providers(config: &Config) -> anyhow::Result<()> {
    let registry = ProviderRegistry::from_config(&config.llm)?;
    let available: Vec<_> = registry.entries().collect();

    println!("{:<14} {:<18} {:<30} {:<20} STATUS", "ID", "LABEL", "DEFAULT MODEL", "KEY");
    for entry in BUILTIN_PROVIDERS {
        let id = entry.id.to_string();
        let registered_model = available.iter().find(|(e, _)| e.id == entry.id).map(|(_, model)| *model);
        let default_model = registered_model.unwrap_or(entry.default_model);
        let registered = registered_model.is_some();
        let has_key = config.llm.provider(&id).is_some_and(|p| p.api_key.is_some());
        let status = match (registered, has_key) {
            (false, _) => "needs project",
            (true, true) => "ready",
            (true, false) => "no api key",
        };

        println!(
            "{id:<14} {:<18} {default_model:<30} {:<20} {status}",
            entry.label, entry.api_key_hint
        );
    }

    Ok(())
}

fn print_tools() -> anyhow::Result<()> {
    let registry = ToolRegistry::with_builtin_tools()?;
    let tools: Vec<_> = registry
        .definitions()
        .map(|tool| {
            serde_json::json!({
                "name": tool.id,
                "title": tool.name,
                "description": tool.description,
                "requires_approval": tool.requires_approval,
                "parameters": tool.parameters(),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&tools)?);

    Ok(())
}

async fn cancel_on_interrupt(cancellation: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("interrupt received, cancelling request");
        cancellation.cancel();
    }
}
