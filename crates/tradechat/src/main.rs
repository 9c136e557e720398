// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tradechat - a terminal client for trade conversation chat.
//!
//! This is the binary entry point.

mod chat;
mod check_config;
mod repl;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tradechat_config::ChatConfig;
use tradechat_core::{ConversationId, UserId};

/// Tradechat - a terminal client for trade conversation chat.
#[derive(Parser, Debug)]
#[command(name = "tradechat", version, about, long_about = None)]
struct Cli {
    /// Configuration file, layered under TRADECHAT_* environment variables.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Open an interactive chat session.
    Chat {
        /// Your user id, sent as `senderId`.
        #[arg(long)]
        sender: String,
        /// Conversation to open on start.
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Validate configuration and print the effective settings.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => tradechat_config::load_and_validate_path(path),
        None => tradechat_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            tradechat_config::render_errors(&errors);
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Chat {
            sender,
            conversation,
        } => {
            init_tracing(&config);
            chat::run_chat(
                config,
                UserId::from(sender.as_str()),
                conversation.as_deref().map(ConversationId::from),
            )
            .await
        }
        Commands::CheckConfig => check_config::render_effective(&config).map(|rendered| {
            eprintln!("tradechat: configuration is valid");
            print!("{rendered}");
        }),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so they do not interleave with the REPL's stdout.
fn init_tracing(config: &ChatConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("tradechat={},warn", config.logging.level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
