// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REPL input parsing and the line reader thread.

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tradechat_core::{ChatError, ConversationId};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `/open ID`: bind to a conversation, seeding it from history.
    Open(ConversationId),
    /// `/close`: bind none.
    Close,
    State,
    Log,
    Help,
    Quit,
    /// A plain line to compose and send.
    Say(String),
    /// Unrecognized or malformed slash command, with a usage hint.
    Invalid(String),
}

pub fn parse(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return ReplCommand::Say(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    let extra = parts.next();

    match (name, arg, extra) {
        ("open", Some(id), None) => ReplCommand::Open(ConversationId::from(id)),
        ("open", _, _) => ReplCommand::Invalid("usage: /open <conversation-id>".into()),
        ("close", None, _) => ReplCommand::Close,
        ("state", None, _) => ReplCommand::State,
        ("log", None, _) => ReplCommand::Log,
        ("help", None, _) => ReplCommand::Help,
        ("quit" | "exit", None, _) => ReplCommand::Quit,
        _ => ReplCommand::Invalid(format!("unknown command `/{command}`, try /help")),
    }
}

pub const HELP: &str = "\
/open <id>   open a conversation (loads history when configured)
/close       leave the current conversation
/state       show the connection state
/log         print the current conversation
/quit        exit
anything else is sent to the open conversation";

/// What the reader thread hands to the async side.
#[derive(Debug)]
pub enum Input {
    Line(String),
    /// Ctrl+C or Ctrl+D at the prompt.
    Exit,
}

/// Starts the blocking readline loop on its own thread.
///
/// The thread is not joined; it ends when the receiver is dropped or the
/// process exits.
pub fn spawn_reader() -> Result<mpsc::Receiver<Input>, ChatError> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| ChatError::Internal(format!("failed to initialize readline: {e}")))?;
    let (tx, rx) = mpsc::channel(1);
    let prompt = format!("{}> ", "tradechat".green());

    std::thread::Builder::new()
        .name("readline".into())
        .spawn(move || {
            loop {
                let input = match editor.readline(&prompt) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            let _ = editor.add_history_entry(line.as_str());
                        }
                        Input::Line(line)
                    }
                    Err(ReadlineError::Interrupted | ReadlineError::Eof) => Input::Exit,
                    Err(e) => {
                        eprintln!("{} {e}", "readline error:".red());
                        Input::Exit
                    }
                };
                let exit = matches!(input, Input::Exit);
                if tx.blocking_send(input).is_err() || exit {
                    break;
                }
            }
        })
        .map_err(|e| ChatError::Internal(format!("failed to start readline thread: {e}")))?;

    Ok(rx)
}
