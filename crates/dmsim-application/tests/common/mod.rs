//! Fake chat agents for session manager tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dmsim_core::agent::{AgentError, ChatAgent, DEFAULT_SYSTEM_INSTRUCTION};
use dmsim_core::theme::Theme;
use dmsim_core::thread::{Thread, UserProfile};
use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Mutex;
use tokio::sync::{Semaphore, mpsc};

/// Answers every message with `"echo: <message>"` and records what it saw.
pub struct EchoAgent {
    instruction: Mutex<String>,
    received: Mutex<Vec<String>>,
}

impl EchoAgent {
    pub fn new() -> Self {
        Self {
            instruction: Mutex::new(DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatAgent for EchoAgent {
    async fn set_system_instruction(&self, instruction: String) {
        *self.instruction.lock().unwrap() = instruction;
    }

    async fn system_instruction(&self) -> String {
        self.instruction.lock().unwrap().clone()
    }

    async fn try_request_reply(&self, message: &str) -> Result<String, AgentError> {
        self.received.lock().unwrap().push(message.to_string());
        Ok(format!("echo: {message}"))
    }

    fn try_request_reply_stream(&self, message: &str) -> BoxStream<'static, Result<String, AgentError>> {
        self.received.lock().unwrap().push(message.to_string());
        futures::stream::iter(vec![Ok("echo: ".to_string()), Ok(message.to_string())]).boxed()
    }
}

/// Fails every request with the given error.
pub struct FailingAgent(pub AgentError);

#[async_trait]
impl ChatAgent for FailingAgent {
    async fn set_system_instruction(&self, _instruction: String) {}

    async fn system_instruction(&self) -> String {
        DEFAULT_SYSTEM_INSTRUCTION.to_string()
    }

    async fn try_request_reply(&self, _message: &str) -> Result<String, AgentError> {
        Err(self.0.clone())
    }

    fn try_request_reply_stream(&self, _message: &str) -> BoxStream<'static, Result<String, AgentError>> {
        futures::stream::iter(vec![Err(self.0.clone())]).boxed()
    }
}

/// Streams `fragments`, then fails with `error`.
pub struct BrokenStreamAgent {
    pub fragments: Vec<&'static str>,
    pub error: AgentError,
}

#[async_trait]
impl ChatAgent for BrokenStreamAgent {
    async fn set_system_instruction(&self, _instruction: String) {}

    async fn system_instruction(&self) -> String {
        DEFAULT_SYSTEM_INSTRUCTION.to_string()
    }

    async fn try_request_reply(&self, _message: &str) -> Result<String, AgentError> {
        Err(self.error.clone())
    }

    fn try_request_reply_stream(&self, _message: &str) -> BoxStream<'static, Result<String, AgentError>> {
        let mut items: Vec<Result<String, AgentError>> =
            self.fragments.iter().map(|f| Ok(f.to_string())).collect();
        items.push(Err(self.error.clone()));
        futures::stream::iter(items).boxed()
    }
}

/// Holds every request until the test releases a permit.
///
/// Each request reports its message on `started` before it blocks. Its
/// reply stream ends without yielding anything.
pub struct GatedAgent {
    gate: Semaphore,
    started: mpsc::UnboundedSender<String>,
}

impl GatedAgent {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (started, rx) = mpsc::unbounded_channel();
        (
            Self {
                gate: Semaphore::new(0),
                started,
            },
            rx,
        )
    }

    /// Lets `n` pending or future requests complete.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl ChatAgent for GatedAgent {
    async fn set_system_instruction(&self, _instruction: String) {}

    async fn system_instruction(&self) -> String {
        DEFAULT_SYSTEM_INSTRUCTION.to_string()
    }

    async fn try_request_reply(&self, message: &str) -> Result<String, AgentError> {
        let _ = self.started.send(message.to_string());
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        permit.forget();
        Ok(format!("reply to {message}"))
    }

    fn try_request_reply_stream(&self, _message: &str) -> BoxStream<'static, Result<String, AgentError>> {
        futures::stream::empty().boxed()
    }
}

pub fn thread(id: &str, theme: Theme) -> Thread {
    Thread::new(UserProfile {
        id: id.to_string(),
        name: format!("Contact {id}"),
        username: id.to_string(),
        avatar: format!("https://picsum.photos/seed/{id}/200/200"),
        is_online: true,
        followers: None,
        posts: None,
        personality: None,
        language: None,
        theme,
    })
}
