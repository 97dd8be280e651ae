//! AI adapter seam.
//!
//! Every concrete backend (the Gemini REST agent, test fakes) implements
//! [`ChatAgent`]. The session manager only ever talks to this trait, so the
//! adapter is constructed once by the application and injected.

use async_trait::async_trait;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use thiserror::Error;

/// Returned by [`ChatAgent::request_reply`] when the backend answered without text.
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't think of a response.";

/// Returned by [`ChatAgent::request_reply`] when the backend could not be reached.
pub const ERROR_REPLY_FALLBACK: &str = "Something went wrong. Let's try again later!";

/// Final fragment of a reply stream that failed part-way.
pub const STREAM_FALLBACK_FRAGMENT: &str = "Oops, I hit a snag while typing.";

/// Persona used before any profile has been saved.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a friendly friend chatting on Instagram. Keep your responses short, informal, and engaging. Use emojis occasionally.";

/// The single "AI backend unavailable" failure kind.
///
/// Variants only carry diagnostic detail; callers treat all of them the same.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Network-level failure (connect, timeout, broken body)
    #[error("transport failure: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Response decoded fine but contained no text
    #[error("backend returned no text")]
    EmptyResponse,
}

impl AgentError {
    /// The static reply shown in place of a generated one.
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            AgentError::EmptyResponse => EMPTY_REPLY_FALLBACK,
            _ => ERROR_REPLY_FALLBACK,
        }
    }
}

/// A chat backend holding one mutable system instruction.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Replaces the persona configuration for all subsequent calls.
    async fn set_system_instruction(&self, instruction: String);

    /// Returns the persona configuration currently in effect.
    async fn system_instruction(&self) -> String;

    /// Sends `message` under the current persona and returns the generated text.
    async fn try_request_reply(&self, message: &str) -> Result<String, AgentError>;

    /// Like [`try_request_reply`](Self::try_request_reply), but never fails.
    ///
    /// Failures are logged and replaced by a static fallback text.
    async fn request_reply(&self, message: &str) -> String {
        match self.try_request_reply(message).await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "chat agent request failed");
                err.fallback_reply().to_string()
            }
        }
    }

    /// Streams the reply as text fragments in arrival order.
    ///
    /// The stream is finite and not restartable. A failure is yielded as a
    /// single `Err`, after which the stream ends.
    fn try_request_reply_stream(
        &self,
        message: &str,
    ) -> BoxStream<'static, Result<String, AgentError>>;

    /// Like [`try_request_reply_stream`](Self::try_request_reply_stream),
    /// but never fails.
    ///
    /// A failure is logged and yields [`STREAM_FALLBACK_FRAGMENT`] once
    /// before the stream ends.
    fn request_reply_stream(&self, message: &str) -> BoxStream<'static, String> {
        self.try_request_reply_stream(message)
            .scan(false, |failed, item| {
                if *failed {
                    return future::ready(None);
                }
                let fragment = match item {
                    Ok(fragment) => fragment,
                    Err(err) => {
                        tracing::error!(error = %err, "chat agent stream failed");
                        *failed = true;
                        STREAM_FALLBACK_FRAGMENT.to_string()
                    }
                };
                future::ready(Some(fragment))
            })
            .boxed()
    }
}
