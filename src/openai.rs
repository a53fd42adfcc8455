use std::io::{BufRead, BufReader};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::{
    ChatChunk, Engine, EngineError, EngineFactory, EngineMode, EventSender, parse_exec_output,
};
use crate::events::SessionEvent;
use crate::prompts::{build_chat_system_prompt, build_exec_system_prompt, build_user_message};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_BODY_LIMIT: usize = 512;
/// Question/answer pairs kept per conversation; older turns are dropped first.
const MAX_REMEMBERED_TURNS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SseLine<'a> {
    Data(&'a str),
    Done,
    Ignore,
}

fn parse_sse_line(line: &str) -> SseLine<'_> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let Some(payload) = trimmed.strip_prefix("data:") else {
        return SseLine::Ignore;
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        SseLine::Done
    } else if payload.is_empty() {
        SseLine::Ignore
    } else {
        SseLine::Data(payload)
    }
}

fn decode_stream_delta(payload: &str) -> Result<Option<String>, EngineError> {
    let chunk: StreamChunk = serde_json::from_str(payload)?;
    Ok(chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .reduce(|mut joined, part| {
            joined.push_str(&part);
            joined
        })
        .filter(|content| !content.is_empty()))
}

/// Everything a worker thread needs to post one request.
#[derive(Clone)]
struct Transport {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Transport {
    fn post(
        &self,
        messages: &[ChatMessage],
        stream: bool,
        response_format: Option<ResponseFormat>,
    ) -> Result<Response, EngineError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
            response_format,
        };
        let mut builder = self.client.post(&self.endpoint).json(&request);
        if stream {
            builder = builder.header(reqwest::header::ACCEPT, "text/event-stream");
        }
        let response = builder.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().unwrap_or_default();
        if body.len() > ERROR_BODY_LIMIT {
            let mut cut = ERROR_BODY_LIMIT;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(EngineError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}

type ChunkSender = Sender<Result<ChatChunk, EngineError>>;
type ChunkReceiver = Receiver<Result<ChatChunk, EngineError>>;
type Memory = Arc<Mutex<Vec<ChatMessage>>>;

/// Completion engine for OpenAI-compatible `/chat/completions` backends.
pub struct OpenAiEngine {
    mode: EngineMode,
    transport: Transport,
    exec_prompt: String,
    chat_prompt: String,
    pipe: String,
    exec_memory: Memory,
    chat_memory: Memory,
    stream: Arc<Mutex<Option<ChunkReceiver>>>,
}

impl OpenAiEngine {
    pub fn new(mode: EngineMode, config: &Config) -> Result<Self, EngineError> {
        let api_key = config.ai.api_key.trim();
        if api_key.is_empty() {
            return Err(EngineError::MissingApiKey);
        }
        let client = build_client(api_key, &config.ai.proxy)?;
        let endpoint = format!(
            "{}/chat/completions",
            config.ai.base_url.trim().trim_end_matches('/')
        );
        Ok(Self {
            mode,
            transport: Transport {
                client,
                endpoint,
                model: config.ai.model.clone(),
                temperature: config.ai.temperature,
                max_tokens: config.ai.max_tokens,
            },
            exec_prompt: build_exec_system_prompt(&config.system, &config.user.preferences),
            chat_prompt: build_chat_system_prompt(&config.system, &config.user.preferences),
            pipe: String::new(),
            exec_memory: Arc::new(Mutex::new(Vec::new())),
            chat_memory: Arc::new(Mutex::new(Vec::new())),
            stream: Arc::new(Mutex::new(None)),
        })
    }

    fn conversation(
        system_prompt: &str,
        memory: &Memory,
        user: &ChatMessage,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::new(Role::System, system_prompt)];
        if let Ok(memory) = memory.lock() {
            messages.extend(memory.iter().cloned());
        }
        messages.push(user.clone());
        messages
    }
}

fn build_client(api_key: &str, proxy: &str) -> Result<Client, EngineError> {
    let mut headers = reqwest::header::HeaderMap::new();
    let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|_| EngineError::InvalidApiKey)?;
    auth.set_sensitive(true);
    headers.insert(reqwest::header::AUTHORIZATION, auth);
    let mut builder = Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(None::<Duration>);
    let proxy = proxy.trim();
    if !proxy.is_empty() {
        let proxy_config = reqwest::Proxy::all(proxy).map_err(|source| EngineError::Proxy {
            proxy: proxy.to_string(),
            source,
        })?;
        builder = builder.proxy(proxy_config);
    }
    Ok(builder.build()?)
}

fn remember(memory: &Memory, user: ChatMessage, reply: String) {
    if let Ok(mut memory) = memory.lock() {
        memory.push(user);
        memory.push(ChatMessage::new(Role::Assistant, reply));
        let excess = memory.len().saturating_sub(MAX_REMEMBERED_TURNS * 2);
        memory.drain(..excess);
    }
}

impl Engine for OpenAiEngine {
    fn mode(&self) -> EngineMode {
        self.mode
    }

    fn set_mode(&mut self, mode: EngineMode) {
        self.mode = mode;
    }

    fn set_pipe(&mut self, pipe: &str) {
        self.pipe = pipe.to_string();
    }

    fn reset(&mut self) {
        for memory in [&self.exec_memory, &self.chat_memory] {
            if let Ok(mut memory) = memory.lock() {
                memory.clear();
            }
        }
    }

    fn request_exec(&mut self, input: &str, events: EventSender) {
        let user = ChatMessage::new(Role::User, build_user_message(input, &self.pipe));
        let messages = Self::conversation(&self.exec_prompt, &self.exec_memory, &user);
        let transport = self.transport.clone();
        let memory = self.exec_memory.clone();
        info!(model = %transport.model, turns = messages.len(), "exec completion requested");
        thread::spawn(move || {
            let result = run_exec_completion(&transport, &messages);
            let event = match result {
                Ok(content) => {
                    let output = parse_exec_output(&content);
                    remember(&memory, user, content);
                    SessionEvent::Exec(output)
                }
                Err(err) => {
                    warn!(%err, "exec completion failed");
                    SessionEvent::EngineFailed(err)
                }
            };
            let _ = events.send(event);
        });
    }

    fn start_chat_stream(&mut self, input: &str) {
        let user = ChatMessage::new(Role::User, build_user_message(input, &self.pipe));
        let messages = Self::conversation(&self.chat_prompt, &self.chat_memory, &user);
        let transport = self.transport.clone();
        let memory = self.chat_memory.clone();
        let (chunk_tx, chunk_rx) = mpsc::channel();
        if let Ok(mut stream) = self.stream.lock() {
            *stream = Some(chunk_rx);
        }
        info!(model = %transport.model, turns = messages.len(), "chat stream started");
        thread::spawn(move || match transport.post(&messages, true, None) {
            Ok(response) => pump_chat_stream(BufReader::new(response), &chunk_tx, &memory, user),
            Err(err) => {
                warn!(%err, "chat request failed");
                let _ = chunk_tx.send(Err(err));
            }
        });
    }

    fn await_chat_chunk(&mut self, events: EventSender) {
        let stream = self.stream.clone();
        thread::spawn(move || {
            // The receiver is taken out so the slot is never locked across `recv`.
            let receiver = stream.lock().ok().and_then(|mut slot| slot.take());
            let received = match receiver.as_ref() {
                Some(receiver) => receiver.recv().unwrap_or(Err(EngineError::StreamClosed)),
                None => Err(EngineError::StreamClosed),
            };
            let event = match received {
                Ok(chunk) => {
                    debug!(len = chunk.content.len(), last = chunk.last, "chat chunk");
                    if !chunk.last {
                        if let (Some(receiver), Ok(mut slot)) = (receiver, stream.lock()) {
                            if slot.is_none() {
                                *slot = Some(receiver);
                            }
                        }
                    }
                    SessionEvent::ChatChunk(chunk)
                }
                Err(err) => SessionEvent::EngineFailed(err),
            };
            let _ = events.send(event);
        });
    }
}

fn run_exec_completion(
    transport: &Transport,
    messages: &[ChatMessage],
) -> Result<String, EngineError> {
    let response = transport.post(
        messages,
        false,
        Some(ResponseFormat {
            kind: "json_object",
        }),
    )?;
    let completion: ChatCompletion = serde_json::from_str(&response.text()?)?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(EngineError::EmptyCompletion)
}

/// Streams one reply into `chunk_tx`. The reply is kept in `memory` only when
/// the end marker arrives; any failure is forwarded as the final item.
fn pump_chat_stream(
    reader: impl BufRead,
    chunk_tx: &ChunkSender,
    memory: &Memory,
    user: ChatMessage,
) {
    match read_chat_stream(reader, chunk_tx) {
        Ok(reply) => remember(memory, user, reply),
        Err(err) => {
            warn!(%err, "chat stream failed");
            let _ = chunk_tx.send(Err(err));
        }
    }
}

/// Forwards every delta as a fragment and the end marker as the last chunk.
/// Returns the assembled reply.
fn read_chat_stream(
    mut reader: impl BufRead,
    chunk_tx: &ChunkSender,
) -> Result<String, EngineError> {
    let mut line = String::new();
    let mut reply = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(EngineError::StreamClosed);
        }
        match parse_sse_line(&line) {
            SseLine::Ignore => {}
            SseLine::Done => {
                let _ = chunk_tx.send(Ok(ChatChunk::end()));
                return Ok(reply);
            }
            SseLine::Data(payload) => {
                if let Some(content) = decode_stream_delta(payload)? {
                    reply.push_str(&content);
                    if chunk_tx.send(Ok(ChatChunk::fragment(content))).is_err() {
                        return Err(EngineError::StreamClosed);
                    }
                }
            }
        }
    }
}

pub struct OpenAiEngineFactory;

impl EngineFactory for OpenAiEngineFactory {
    fn build(&self, mode: EngineMode, config: &Config) -> Result<Box<dyn Engine>, EngineError> {
        Ok(Box::new(OpenAiEngine::new(mode, config)?))
    }
}
