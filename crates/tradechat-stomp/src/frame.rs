// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! STOMP 1.2 frame encoding and decoding.
//!
//! One WebSocket message may carry several frames and any number of
//! heart-beat EOLs between them. Header values are escaped on every frame
//! except CONNECT and CONNECTED.

use std::str::FromStr;

use strum::{Display, EnumString};
use thiserror::Error;
use tradechat_core::FrameHeaders;

/// STOMP frame commands, client and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl Command {
    fn escapes_headers(self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

/// Why a frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("malformed header line `{0}`")]
    MalformedHeader(String),

    #[error("invalid escape sequence in `{0}`")]
    BadEscape(String),

    #[error("invalid content-length `{0}`")]
    InvalidContentLength(String),

    #[error("frame is not NULL-terminated")]
    Unterminated,
}

/// One STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: FrameHeaders,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value for `name`. Repeated headers keep the first occurrence.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Serializes the frame, NULL terminator included.
    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(self.body.len() + 64);
        out.push_str(&self.command.to_string());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                push_escaped(&mut out, name);
                out.push(':');
                push_escaped(&mut out, value);
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }
}

fn push_escaped(out: &mut String, raw: &str) {
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
}

fn unescape(raw: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::BadEscape(raw.to_string())),
        }
    }
    Ok(out)
}

/// Decodes every frame in `input`, skipping heart-beat EOLs.
pub fn decode_all(input: &str) -> Result<Vec<Frame>, FrameError> {
    let mut frames = Vec::new();
    let mut rest = input;
    loop {
        rest = rest.trim_start_matches(['\n', '\r']);
        if rest.is_empty() {
            return Ok(frames);
        }
        let (frame, remaining) = decode_one(rest)?;
        frames.push(frame);
        rest = remaining;
    }
}

fn next_line(input: &str) -> Option<(&str, &str)> {
    let (line, rest) = input.split_once('\n')?;
    Some((line.strip_suffix('\r').unwrap_or(line), rest))
}

fn decode_one(input: &str) -> Result<(Frame, &str), FrameError> {
    let (command_line, mut rest) = next_line(input).ok_or(FrameError::Unterminated)?;
    let command = Command::from_str(command_line)
        .map_err(|_| FrameError::UnknownCommand(command_line.to_string()))?;
    let escaped = command.escapes_headers();

    let mut headers = FrameHeaders::new();
    loop {
        let (line, after) = next_line(rest).ok_or(FrameError::Unterminated)?;
        rest = after;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
        if escaped {
            headers.push((unescape(name)?, unescape(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .map(|(_, v)| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidContentLength(v.clone()))
        })
        .transpose()?;

    let body_len = match content_length {
        Some(n) => {
            if rest.len() <= n || !rest.is_char_boundary(n) {
                return Err(FrameError::InvalidContentLength(n.to_string()));
            }
            if rest.as_bytes()[n] != 0 {
                return Err(FrameError::Unterminated);
            }
            n
        }
        None => rest.find('\0').ok_or(FrameError::Unterminated)?,
    };

    let body = rest[..body_len].to_string();
    Ok((
        Frame {
            command,
            headers,
            body,
        },
        &rest[body_len + 1..],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_send_frame() {
        let frame = Frame::new(Command::Send)
            .header("destination", "/app/chat.sendMessage/7")
            .header("content-length", "2")
            .body("{}");
        assert_eq!(
            frame.encode(),
            "SEND\ndestination:/app/chat.sendMessage/7\ncontent-length:2\n\n{}\0"
        );
    }

    #[test]
    fn decodes_message_with_heartbeats_around() {
        let input = "\n\r\nMESSAGE\r\nsubscription:sub-1\ndestination:/chat-trade/7\n\n{\"a\":1}\0\n";
        let frames = decode_all(input).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::Message);
        assert_eq!(frames[0].get("subscription"), Some("sub-1"));
        assert_eq!(frames[0].body, "{\"a\":1}");
    }

    #[test]
    fn decodes_several_frames_in_one_message() {
        let input = "RECEIPT\nreceipt-id:1\n\n\0MESSAGE\nsubscription:s\n\nhi\0";
        let frames = decode_all(input).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].command, Command::Receipt);
        assert_eq!(frames[1].body, "hi");
    }

    #[test]
    fn content_length_allows_nul_in_body() {
        let input = "MESSAGE\ncontent-length:3\n\na\0b\0";
        let frames = decode_all(input).unwrap();
        assert_eq!(frames[0].body, "a\0b");
    }

    #[test]
    fn content_length_counts_bytes() {
        let body = "héllo";
        let frame = Frame::new(Command::Message)
            .header("content-length", body.len().to_string())
            .body(body);
        let decoded = decode_all(&frame.encode()).unwrap();
        assert_eq!(decoded[0].body, body);
    }

    #[test]
    fn headers_are_escaped_except_on_connect() {
        let frame = Frame::new(Command::Send).header("x", "a:b\nc\\");
        assert!(frame.encode().contains("x:a\\cb\\nc\\\\\n"));
        assert_eq!(decode_all(&frame.encode()).unwrap()[0], frame);

        let connect = Frame::new(Command::Connect).header("passcode", "a:b");
        assert!(connect.encode().contains("passcode:a:b\n"));
        assert_eq!(decode_all(&connect.encode()).unwrap()[0].get("passcode"), Some("a:b"));
    }

    #[test]
    fn first_repeated_header_wins() {
        let frames = decode_all("MESSAGE\nfoo:1\nfoo:2\n\n\0").unwrap();
        assert_eq!(frames[0].get("foo"), Some("1"));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            decode_all("HELLO\n\n\0"),
            Err(FrameError::UnknownCommand(_))
        ));
        assert!(matches!(
            decode_all("MESSAGE\nno-colon\n\n\0"),
            Err(FrameError::MalformedHeader(_))
        ));
        assert!(matches!(
            decode_all("MESSAGE\nx:\\t\n\n\0"),
            Err(FrameError::BadEscape(_))
        ));
        assert!(matches!(
            decode_all("MESSAGE\n\nbody without nul"),
            Err(FrameError::Unterminated)
        ));
        assert!(matches!(
            decode_all("MESSAGE\ncontent-length:99\n\nshort\0"),
            Err(FrameError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn heartbeat_only_message_has_no_frames() {
        assert!(decode_all("\n").unwrap().is_empty());
        assert!(decode_all("\r\n\n").unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn decode_never_panics(input in "\\PC{0,200}") {
            let _ = decode_all(&input);
        }

        #[test]
        fn escaped_header_values_survive(value in "[a-z:\\\\\n\r ]{0,24}") {
            let frame = Frame::new(Command::Message).header("h", value.clone());
            let decoded = decode_all(&frame.encode()).unwrap();
            prop_assert_eq!(decoded[0].get("h"), Some(value.as_str()));
        }
    }
}
