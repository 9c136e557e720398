// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tradechat chat` command implementation.
//!
//! Wires the STOMP transport, token provider and optional history provider
//! into a session, then runs an interactive REPL on top of it. Pushed
//! messages and connection changes are printed by a separate task as they
//! arrive.

use std::sync::Arc;

use colored::Colorize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tradechat_config::ChatConfig;
use tradechat_core::{ChatError, ConversationId, Message, TransportState, UserId};
use tradechat_history::HttpHistory;
use tradechat_session::{SendOutcome, SessionBuilder, SessionEvent, SessionHandle, SessionSettings};
use tradechat_stomp::{StompOptions, StompTransport};

use crate::repl::{self, Input, ReplCommand};
use crate::shutdown;

/// Runs the `tradechat chat` REPL until `/quit`, end of input, or a signal.
pub async fn run_chat(
    config: ChatConfig,
    sender: UserId,
    conversation: Option<ConversationId>,
) -> Result<(), ChatError> {
    let session = build_session(&config)?;
    let cancel = shutdown::install_signal_handler();
    let printer = tokio::spawn(print_events(
        session.events(),
        sender.clone(),
        cancel.clone(),
    ));

    println!("{}", "tradechat".bold().green());
    println!(
        "connecting to {} as {}. Type {} for commands.\n",
        config.server.endpoint.cyan(),
        sender.to_string().cyan(),
        "/help".yellow()
    );

    if let Some(id) = conversation {
        session.open_conversation(id).await?;
    }

    let result = repl_loop(&session, &sender, &cancel).await;

    info!("leaving chat");
    if let Err(e) = session.shutdown().await {
        warn!(error = %e, "session shutdown failed");
    }
    cancel.cancel();
    if let Err(e) = printer.await {
        debug!(error = %e, "event printer task ended abnormally");
    }
    result
}

fn build_session(config: &ChatConfig) -> Result<SessionHandle, ChatError> {
    let tokens = tradechat_config::token_provider(&config.auth);
    let transport = StompTransport::new(StompOptions::from_config(&config.stomp));

    let mut builder = SessionBuilder::new(SessionSettings::from_config(config), Arc::new(transport))
        .tokens(tokens.clone());
    match HttpHistory::from_config(&config.server, tokens)? {
        Some(history) => {
            info!(url = history.url(), "history seeding enabled");
            builder = builder.history(Arc::new(history));
        }
        None => debug!("no history_url configured, conversations start empty"),
    }
    Ok(builder.spawn())
}

async fn repl_loop(
    session: &SessionHandle,
    sender: &UserId,
    cancel: &CancellationToken,
) -> Result<(), ChatError> {
    let mut input = repl::spawn_reader()?;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            line = input.recv() => line,
        };
        let line = match line {
            Some(Input::Line(line)) => line,
            Some(Input::Exit) | None => return Ok(()),
        };

        match repl::parse(&line) {
            ReplCommand::Say(text) => match session.compose_and_send(&text, sender.clone()).await {
                Ok(SendOutcome::Sent | SendOutcome::Skipped) => {}
                Err(e) if e.is_transient() => {
                    println!("{} {e}; message not sent", "!".yellow());
                }
                Err(e) => return Err(e),
            },
            ReplCommand::Open(id) => {
                println!("{} opening conversation {id}", "*".blue());
                session.open_conversation(id).await?;
            }
            ReplCommand::Close => {
                session.bind_conversation(None).await?;
                println!("{} no conversation open", "*".blue());
            }
            ReplCommand::State => {
                let snapshot = session.snapshot().await?;
                let target = snapshot
                    .target
                    .as_ref()
                    .map_or_else(|| "none".to_string(), ToString::to_string);
                let mut line = format!(
                    "{} {} (conversation: {target}",
                    "*".blue(),
                    paint_state(snapshot.state)
                );
                if snapshot.retry_count > 0 {
                    line.push_str(&format!(", failed attempts: {}", snapshot.retry_count));
                }
                if let Some(delay) = snapshot.next_retry_in {
                    line.push_str(&format!(", retry in {:.1}s", delay.as_secs_f64()));
                }
                line.push(')');
                println!("{line}");
            }
            ReplCommand::Log => {
                let target = session.snapshot().await?.target;
                let Some(id) = target else {
                    println!("{} no conversation open", "*".blue());
                    continue;
                };
                match session.conversation(id.clone()).await? {
                    Some(conversation) if !conversation.messages.is_empty() => {
                        for message in &conversation.messages {
                            println!("{}", format_message(message, sender));
                        }
                    }
                    _ => println!("{} conversation {id} has no messages", "*".blue()),
                }
            }
            ReplCommand::Help => println!("{}", repl::HELP),
            ReplCommand::Quit => return Ok(()),
            ReplCommand::Invalid(hint) => println!("{} {hint}", "?".yellow()),
        }
    }
}

async fn print_events(
    mut events: broadcast::Receiver<SessionEvent>,
    me: UserId,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(event) => {
                if let Some(line) = format_event(&event, &me) {
                    println!("{line}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event printer fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn format_message(message: &Message, me: &UserId) -> String {
    let who = if &message.sender_id == me {
        "you".green().bold()
    } else {
        message.sender_id.to_string().cyan().bold()
    };
    match &message.timestamp {
        Some(at) => format!("{} {who}: {}", format!("[{at}]").dimmed(), message.content),
        None => format!("{who}: {}", message.content),
    }
}

fn paint_state(state: TransportState) -> colored::ColoredString {
    let text = state.to_string();
    match state {
        TransportState::Subscribed => text.green(),
        TransportState::Connecting | TransportState::Connected => text.yellow(),
        TransportState::Failed => text.red(),
        TransportState::Disconnected => text.dimmed(),
    }
}

fn format_event(event: &SessionEvent, me: &UserId) -> Option<String> {
    match event {
        SessionEvent::MessageAppended { message, .. } => Some(format_message(message, me)),
        SessionEvent::StateChanged { to, .. } => Some(format!("{} {}", "*".blue(), paint_state(*to))),
        SessionEvent::Error { kind, message } => {
            Some(format!("{} {kind}: {message}", "!".red()))
        }
        SessionEvent::ReconnectScheduled { attempt, delay } => Some(format!(
            "{} reconnecting in {:.1}s (attempt {attempt})",
            "*".blue(),
            delay.as_secs_f64()
        )),
    }
}
