use super::composing::{ComposingIndicator, ComposingTracker};
use super::factory::ThreadFactory;
use dmsim_core::agent::{AgentError, ChatAgent};
use dmsim_core::config::{AppConfig, FailurePolicy};
use dmsim_core::error::{DmsimError, Result};
use dmsim_core::persona;
use dmsim_core::thread::{Message, MessageStatus, ProfileDraft, Thread, UserProfile};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Knobs of [`ConversationSessionManager`] that come from `config.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub failure_policy: FailurePolicy,
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            failure_policy: config.failure_policy,
        }
    }
}

/// Result of [`ConversationSessionManager::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The text was blank; nothing changed.
    Ignored,
    /// The agent answered and its reply was appended.
    Replied { reply: String },
    /// The agent failed and the static fallback text was appended instead.
    FellBack { reply: String },
}

impl SendOutcome {
    /// Text appended as the agent message, if any.
    pub fn reply(&self) -> Option<&str> {
        match self {
            Self::Ignored => None,
            Self::Replied { reply } | Self::FellBack { reply } => Some(reply),
        }
    }
}

/// A send that holds its thread's lock and has appended the user message.
///
/// Dropped before [`ConversationSessionManager::finish_send`] ran (the send
/// future was cancelled), it clears the user message's `Sending` status.
struct PendingSend {
    state: Arc<RwLock<SessionState>>,
    thread_id: String,
    message_id: String,
    completed: bool,
    _serialized: OwnedMutexGuard<()>,
}

impl Drop for PendingSend {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        tracing::debug!(thread_id = %self.thread_id, "send cancelled before the reply arrived");
        if let Ok(mut state) = self.state.try_write() {
            state.clear_status(&self.thread_id, &self.message_id);
            return;
        }
        // Readers hold the state right now; clear it once they let go.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let state = Arc::clone(&self.state);
            let thread_id = std::mem::take(&mut self.thread_id);
            let message_id = std::mem::take(&mut self.message_id);
            handle.spawn(async move {
                state.write().await.clear_status(&thread_id, &message_id);
            });
        }
    }
}

struct SessionState {
    threads: Vec<Thread>,
    active_thread_id: Option<String>,
}

impl SessionState {
    fn thread_mut(&mut self, id: &str) -> Option<&mut Thread> {
        self.threads.iter_mut().find(|t| t.id() == id)
    }

    fn clear_status(&mut self, thread_id: &str, message_id: &str) {
        if let Some(thread) = self.thread_mut(thread_id) {
            thread.set_message_status(message_id, None);
        }
    }
}

/// Owns the conversation threads and drives message round trips through the
/// injected [`ChatAgent`].
///
/// `ConversationSessionManager` is responsible for:
/// - Keeping the ordered thread collection and the active thread
/// - Appending user and agent messages
/// - Raising the composing indicator while the agent is working
/// - Pushing persona instructions to the agent when a profile changes
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct ConversationSessionManager {
    state: Arc<RwLock<SessionState>>,
    agent: Arc<dyn ChatAgent>,
    /// One lock per thread id, so sends to the same thread are serialized
    send_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    composing: ComposingTracker,
    config: SessionConfig,
}

impl ConversationSessionManager {
    /// Creates a manager seeded with `threads`.
    ///
    /// The first seed thread starts out active.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `threads` is empty.
    pub fn new(
        agent: Arc<dyn ChatAgent>,
        threads: Vec<Thread>,
        config: SessionConfig,
    ) -> Result<Self> {
        let Some(first) = threads.first() else {
            return Err(DmsimError::config(
                "session needs at least one seed thread",
            ));
        };
        let active_thread_id = Some(first.id().to_string());

        Ok(Self {
            state: Arc::new(RwLock::new(SessionState {
                threads,
                active_thread_id,
            })),
            agent,
            send_locks: Arc::new(Mutex::new(HashMap::new())),
            composing: ComposingTracker::new(),
            config,
        })
    }

    /// The agent every send goes through.
    pub fn agent(&self) -> Arc<dyn ChatAgent> {
        self.agent.clone()
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Snapshot of all threads, most recently created first.
    pub async fn list_threads(&self) -> Vec<Thread> {
        self.state.read().await.threads.clone()
    }

    pub async fn thread(&self, id: &str) -> Option<Thread> {
        let state = self.state.read().await;
        state.threads.iter().find(|t| t.id() == id).cloned()
    }

    /// Resolves the active thread.
    ///
    /// A missing or stale active id resolves to the first thread.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` only if there are no threads at all.
    pub async fn get_active_thread(&self) -> Result<Thread> {
        let state = self.state.read().await;
        let active = state
            .active_thread_id
            .as_deref()
            .and_then(|id| state.threads.iter().find(|t| t.id() == id))
            .or_else(|| state.threads.first());

        match active {
            Some(thread) => Ok(thread.clone()),
            None => Err(DmsimError::not_found(
                "Thread",
                state.active_thread_id.clone().unwrap_or_default(),
            )),
        }
    }

    /// Stores `id` as the active thread without validating it.
    pub async fn set_active_thread(&self, id: impl Into<String>) {
        let id = id.into();
        tracing::debug!(thread_id = %id, "active thread changed");
        self.state.write().await.active_thread_id = Some(id);
    }

    /// The stored active id, which may not match any thread.
    pub async fn active_thread_id(&self) -> Option<String> {
        self.state.read().await.active_thread_id.clone()
    }

    /// Adds a thread with a fresh id at the front of the list.
    ///
    /// A draft without an avatar gets one seeded by the new id. The new
    /// thread is not activated.
    pub async fn create_thread(&self, draft: ProfileDraft) -> Thread {
        let mut profile = draft.into_profile(ThreadFactory::thread_id("ai"));
        if profile.avatar.is_empty() {
            profile.avatar = ThreadFactory::avatar_for(&profile.id);
        }
        let thread = Thread::new(profile);
        self.insert_front(thread.clone()).await;
        thread
    }

    /// Creates a blank "New Friend" thread and makes it active.
    pub async fn new_chat(&self) -> Thread {
        let thread = self.create_thread(ThreadFactory::new_chat_draft()).await;
        self.set_active_thread(thread.id()).await;
        thread
    }

    /// Inserts a random contact that has already sent an opening message.
    pub async fn add_mock_incoming_chat(&self) -> Thread {
        let thread = ThreadFactory::mock_incoming_thread();
        self.insert_front(thread.clone()).await;
        thread
    }

    async fn insert_front(&self, thread: Thread) {
        tracing::info!(thread_id = %thread.id(), name = %thread.profile().name, "thread created");
        self.state.write().await.threads.insert(0, thread);
    }

    /// Replaces the profile of thread `id`, keeping its id and history.
    ///
    /// Returns `false` (and changes nothing) if no such thread exists.
    pub async fn update_thread_profile(&self, id: &str, profile: UserProfile) -> bool {
        let mut state = self.state.write().await;
        match state.thread_mut(id) {
            Some(thread) => {
                thread.apply_profile(profile);
                true
            }
            None => {
                tracing::debug!(thread_id = %id, "profile update for unknown thread ignored");
                false
            }
        }
    }

    /// Updates the thread matching `profile.id` and re-targets the agent persona.
    ///
    /// The agent holds one instruction for all threads; the latest call wins.
    pub async fn apply_profile_and_reconfigure_agent(&self, profile: UserProfile) {
        let instruction = persona::system_instruction(&profile);
        let id = profile.id.clone();
        self.update_thread_profile(&id, profile).await;

        tracing::info!(thread_id = %id, "agent persona reconfigured");
        self.agent.set_system_instruction(instruction).await;
    }

    pub fn is_composing(&self) -> bool {
        self.composing.is_composing()
    }

    /// A handle that observes the composing flag.
    pub fn composing_indicator(&self) -> ComposingIndicator {
        self.composing.indicator()
    }

    /// Sends `text` as the user and appends the agent's reply.
    ///
    /// Blank text is ignored. Sends to the same thread run one at a time;
    /// sends to different threads run concurrently.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `thread_id` is unknown; nothing is appended.
    /// - `AgentUnavailable` if the agent fails under [`FailurePolicy::Drop`];
    ///   the user message stays in the thread without a status.
    pub async fn send_message(&self, thread_id: &str, text: &str) -> Result<SendOutcome> {
        let Some(pending) = self.begin_send(thread_id, text).await? else {
            return Ok(SendOutcome::Ignored);
        };

        let _composing = self.composing.begin();
        tracing::debug!(thread_id = %thread_id, "awaiting agent reply");
        let result = self.agent.try_request_reply(text).await;

        self.finish_send(thread_id, pending, result).await
    }

    /// Like [`send_message`](Self::send_message), but consumes the agent's
    /// reply stream and hands every fragment to `on_fragment` as it arrives.
    ///
    /// The concatenated fragments become the agent message. A stream that
    /// yields no text counts as an empty response. A stream that fails part
    /// way is handled like a failed [`send_message`](Self::send_message);
    /// fragments already forwarded are not appended.
    pub async fn send_message_streaming<F>(
        &self,
        thread_id: &str,
        text: &str,
        mut on_fragment: F,
    ) -> Result<SendOutcome>
    where
        F: FnMut(&str) + Send,
    {
        let Some(pending) = self.begin_send(thread_id, text).await? else {
            return Ok(SendOutcome::Ignored);
        };

        let _composing = self.composing.begin();
        tracing::debug!(thread_id = %thread_id, "streaming agent reply");
        let mut stream = self.agent.try_request_reply_stream(text);
        let mut reply = String::new();
        let mut failure = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    on_fragment(&fragment);
                    reply.push_str(&fragment);
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        let result = match failure {
            Some(err) => Err(err),
            None if reply.is_empty() => Err(AgentError::EmptyResponse),
            None => Ok(reply),
        };

        self.finish_send(thread_id, pending, result).await
    }

    /// Validates the send, takes the thread's send lock and appends the user
    /// message. Returns `None` for blank text.
    async fn begin_send(&self, thread_id: &str, text: &str) -> Result<Option<PendingSend>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if self.thread(thread_id).await.is_none() {
            return Err(DmsimError::not_found("Thread", thread_id));
        }

        let serialized = self.send_lock(thread_id).await.lock_owned().await;

        let message = Message::outgoing(text);
        let message_id = message.id.clone();
        self.with_thread(thread_id, |thread| thread.push_message(message))
            .await?;

        Ok(Some(PendingSend {
            state: Arc::clone(&self.state),
            thread_id: thread_id.to_string(),
            message_id,
            completed: false,
            _serialized: serialized,
        }))
    }

    async fn finish_send(
        &self,
        thread_id: &str,
        mut pending: PendingSend,
        result: std::result::Result<String, AgentError>,
    ) -> Result<SendOutcome> {
        pending.completed = true;
        let message_id = pending.message_id.as_str();
        match result {
            Ok(reply) => {
                let appended = reply.clone();
                self.with_thread(thread_id, |thread| {
                    thread.set_message_status(message_id, Some(MessageStatus::Sent));
                    thread.push_message(Message::from_agent(appended));
                })
                .await?;
                Ok(SendOutcome::Replied { reply })
            }
            Err(err) => {
                tracing::warn!(thread_id = %thread_id, error = %err, "agent reply failed");
                let policy = self.config.failure_policy;
                let fallback = err.fallback_reply().to_string();
                let appended = fallback.clone();

                self.with_thread(thread_id, |thread| {
                    thread.set_message_status(message_id, None);
                    if policy == FailurePolicy::Fallback {
                        thread.push_message(Message::from_agent(appended));
                    }
                })
                .await?;

                match policy {
                    FailurePolicy::Drop => Err(DmsimError::AgentUnavailable(err)),
                    FailurePolicy::Fallback => Ok(SendOutcome::FellBack { reply: fallback }),
                }
            }
        }
    }

    async fn send_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.send_locks.lock().await;
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn with_thread<R>(&self, id: &str, f: impl FnOnce(&mut Thread) -> R) -> Result<R> {
        let mut state = self.state.write().await;
        state
            .thread_mut(id)
            .map(f)
            .ok_or_else(|| DmsimError::not_found("Thread", id))
    }
}
