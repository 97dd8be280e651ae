//! GeminiChatAgent - Direct REST API chat implementation for Gemini.
//!
//! Keeps a multi-turn chat (history plus one system instruction) and talks to
//! the `generateContent` / `streamGenerateContent` endpoints. Replacing the
//! system instruction starts a fresh chat.

use crate::sse::SseDecoder;
use async_trait::async_trait;
use dmsim_core::agent::{AgentError, ChatAgent, DEFAULT_SYSTEM_INSTRUCTION};
use dmsim_core::config::{AppConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Agent implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiChatAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    chat: Arc<RwLock<ChatState>>,
}

/// Conversation the backend sees.
struct ChatState {
    system_instruction: String,
    history: Vec<Content>,
    /// Bumped on every instruction change so late replies from the previous
    /// chat are not recorded into the new one.
    generation: u64,
}

impl GeminiChatAgent {
    /// Creates a new agent with the default model and persona.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            chat: Arc::new(RwLock::new(ChatState {
                system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
                history: Vec::new(),
                generation: 0,
            })),
        }
    }

    /// Creates an agent using the model and endpoint from `config`.
    pub fn from_config(config: &AppConfig, api_key: impl Into<String>) -> Self {
        Self::new(api_key)
            .with_model(config.model.clone())
            .with_base_url(config.base_url.clone())
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the agent at another API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of turns (user and model) recorded in the current chat.
    pub async fn history_len(&self) -> usize {
        self.chat.read().await.history.len()
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}:{method}", self.base_url, self.model)
    }

    /// Snapshots the chat and appends `message` as the next user turn.
    async fn prepare(&self, message: &str) -> (GenerateContentRequest, u64) {
        let chat = self.chat.read().await;
        let mut contents = chat.history.clone();
        contents.push(Content::text("user", message));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: chat.system_instruction.clone(),
                }],
            }),
        };
        (request, chat.generation)
    }

    /// Records a completed exchange unless the chat was replaced meanwhile.
    async fn record_turn(&self, generation: u64, message: &str, reply: &str) {
        let mut chat = self.chat.write().await;
        if chat.generation != generation {
            tracing::debug!("system instruction changed during request, dropping turn");
            return;
        }
        chat.history.push(Content::text("user", message));
        chat.history.push(Content::text("model", reply));
    }

    async fn post(&self, url: String, body: &GenerateContentRequest) -> Result<Response, AgentError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| AgentError::Transport(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        Ok(response)
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, AgentError> {
        let response = self.post(self.endpoint("generateContent"), body).await?;

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            AgentError::MalformedResponse(format!("Failed to parse Gemini response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ChatAgent for GeminiChatAgent {
    async fn set_system_instruction(&self, instruction: String) {
        let mut chat = self.chat.write().await;
        chat.system_instruction = instruction;
        chat.history.clear();
        chat.generation += 1;
        tracing::info!(model = %self.model, "started new chat with updated system instruction");
    }

    async fn system_instruction(&self) -> String {
        self.chat.read().await.system_instruction.clone()
    }

    async fn try_request_reply(&self, message: &str) -> Result<String, AgentError> {
        let (request, generation) = self.prepare(message).await;
        tracing::debug!(model = %self.model, turns = request.contents.len(), "sending Gemini request");

        let reply = self.send_request(&request).await?;
        self.record_turn(generation, message, &reply).await;
        Ok(reply)
    }

    fn try_request_reply_stream(
        &self,
        message: &str,
    ) -> BoxStream<'static, Result<String, AgentError>> {
        let agent = self.clone();
        let message = message.to_string();

        let stream = async_stream::stream! {
            let (request, generation) = agent.prepare(&message).await;
            let url = format!("{}?alt=sse", agent.endpoint("streamGenerateContent"));
            let mut reply = String::new();
            let mut failure: Option<AgentError> = None;

            match agent.post(url, &request).await {
                Ok(response) => {
                    let mut bytes = response.bytes_stream();
                    let mut decoder = SseDecoder::new();
                    let mut events = Vec::new();
                    loop {
                        match bytes.next().await {
                            Some(Ok(chunk)) => events.extend(decoder.push(&chunk)),
                            Some(Err(err)) => {
                                failure = Some(AgentError::Transport(format!("Gemini stream broke: {err}")));
                                break;
                            }
                            None => {
                                events.extend(decoder.finish());
                                break;
                            }
                        }
                        for event in events.drain(..) {
                            match parse_stream_event(&event) {
                                Ok(Some(fragment)) => {
                                    reply.push_str(&fragment);
                                    yield Ok(fragment);
                                }
                                Ok(None) => {}
                                Err(err) => tracing::warn!(error = %err, "skipping undecodable stream event"),
                            }
                        }
                    }
                    for event in events.drain(..) {
                        if let Ok(Some(fragment)) = parse_stream_event(&event) {
                            reply.push_str(&fragment);
                            yield Ok(fragment);
                        }
                    }
                }
                Err(err) => failure = Some(err),
            }

            if failure.is_none() && reply.trim().is_empty() {
                failure = Some(AgentError::EmptyResponse);
            }

            match failure {
                Some(err) => yield Err(err),
                None => agent.record_turn(generation, &message, &reply).await,
            }
        };

        stream.boxed()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Serialize, Clone)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize, Clone)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Concatenated text of the first candidate, if any.
fn candidate_text(response: GenerateContentResponse) -> Option<String> {
    let content = response
        .candidates?
        .into_iter()
        .next()?
        .content?;
    let text: String = content.parts.into_iter().filter_map(|part| part.text).collect();
    Some(text)
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, AgentError> {
    candidate_text(response)
        .filter(|text| !text.trim().is_empty())
        .ok_or(AgentError::EmptyResponse)
}

/// Decodes one streamed chunk; `Ok(None)` for chunks without text.
fn parse_stream_event(data: &str) -> Result<Option<String>, AgentError> {
    let chunk: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|err| AgentError::MalformedResponse(format!("Bad Gemini stream chunk: {err}")))?;
    Ok(candidate_text(chunk).filter(|text| !text.is_empty()))
}

fn map_http_error(status: StatusCode, body: String) -> AgentError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    AgentError::Http {
        status: status.as_u16(),
        message,
    }
}
