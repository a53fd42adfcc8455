use std::sync::mpsc::Sender;

use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use crate::events::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Exec,
    Chat,
}

/// Result of an exec-mode completion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecOutput {
    #[serde(rename = "cmd", default)]
    pub command: String,
    #[serde(rename = "exp", default)]
    pub explanation: String,
    #[serde(rename = "exec", default)]
    pub executable: bool,
}

impl ExecOutput {
    /// A command is only offered for confirmation when the backend flagged
    /// it executable and actually produced one.
    pub fn is_executable(&self) -> bool {
        self.executable && !self.command.trim().is_empty()
    }
}

/// One fragment of a streamed chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatChunk {
    pub content: String,
    pub last: bool,
}

impl ChatChunk {
    pub fn fragment(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            last: false,
        }
    }

    pub fn end() -> Self {
        Self {
            content: String::new(),
            last: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("missing API key, set `api_key` in the [ai] section of the settings")]
    MissingApiKey,
    #[error("API key contains characters that cannot be sent in a header")]
    InvalidApiKey,
    #[error("invalid proxy `{proxy}`: {source}")]
    Proxy {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend returned no completion")]
    EmptyCompletion,
    #[error("stream ended before completion")]
    StreamClosed,
    #[error("stream read failed: {0}")]
    StreamRead(#[from] std::io::Error),
}

pub type EventSender = Sender<SessionEvent>;

/// Completion backend as seen by the session controller.
///
/// Requests never block the caller: results come back as [`SessionEvent`]s
/// on the supplied sender. A chat stream is consumed one chunk per
/// [`Engine::await_chat_chunk`] call; callers must not issue a second await
/// before the previous one has delivered.
pub trait Engine: Send {
    fn mode(&self) -> EngineMode;
    fn set_mode(&mut self, mode: EngineMode);
    fn set_pipe(&mut self, pipe: &str);
    /// Forgets the conversation in every mode.
    fn reset(&mut self);
    fn request_exec(&mut self, input: &str, events: EventSender);
    fn start_chat_stream(&mut self, input: &str);
    fn await_chat_chunk(&mut self, events: EventSender);
}

/// Reads an exec completion. Backends do not always honour the JSON
/// contract, so fenced or prose-wrapped objects are accepted and anything
/// else becomes a plain, non-executable explanation.
pub fn parse_exec_output(content: &str) -> ExecOutput {
    let trimmed = strip_code_fence(content.trim());
    if let Ok(output) = serde_json::from_str::<ExecOutput>(trimmed) {
        return output;
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(output) = serde_json::from_str::<ExecOutput>(&trimmed[start..=end]) {
                return output;
            }
        }
    }
    ExecOutput {
        command: String::new(),
        explanation: content.trim().to_string(),
        executable: false,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

pub trait EngineFactory {
    fn build(&self, mode: EngineMode, config: &Config) -> Result<Box<dyn Engine>, EngineError>;
}
