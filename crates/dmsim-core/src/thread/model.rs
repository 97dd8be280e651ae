//! Thread domain model.
//!
//! A thread bundles the profile of a simulated contact with the message
//! history of the conversation. The history is append-only and the
//! `last_message` preview is derived from it, so both live behind accessors.

use super::message::{Message, MessageStatus};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};

/// Preview text for a thread that has no messages yet.
pub const EMPTY_THREAD_PREVIEW: &str = "Start a conversation!";

/// Profile of a simulated contact.
///
/// Stats (`followers`, `posts`) are display strings such as `"1.2k"` and are
/// never parsed. `personality` and `language` steer the AI persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Unique identifier, stable for the lifetime of the session
    pub id: String,
    pub name: String,
    pub username: String,
    /// Avatar image URI
    pub avatar: String,
    pub is_online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Selects both rendering and the AI tone
    pub theme: Theme,
}

/// Everything a new thread needs except its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    pub name: String,
    pub username: String,
    pub avatar: String,
    pub is_online: bool,
    #[serde(default)]
    pub followers: Option<String>,
    #[serde(default)]
    pub posts: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    pub theme: Theme,
}

impl ProfileDraft {
    /// Assigns an id to the draft.
    pub fn into_profile(self, id: impl Into<String>) -> UserProfile {
        UserProfile {
            id: id.into(),
            name: self.name,
            username: self.username,
            avatar: self.avatar,
            is_online: self.is_online,
            followers: self.followers,
            posts: self.posts,
            personality: self.personality,
            language: self.language,
            theme: self.theme,
        }
    }
}

/// A simulated chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    #[serde(flatten)]
    profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_message: Option<String>,
    messages: Vec<Message>,
}

impl Thread {
    /// Creates a thread with an empty history.
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            last_message: None,
            messages: Vec::new(),
        }
    }

    /// Creates a thread from an existing history.
    pub fn with_messages(profile: UserProfile, messages: Vec<Message>) -> Self {
        let mut thread = Self::new(profile);
        for message in messages {
            thread.push_message(message);
        }
        thread
    }

    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Text of the most recent message, if any.
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Text shown next to the thread in a DM list.
    pub fn preview(&self) -> &str {
        self.last_message().unwrap_or(EMPTY_THREAD_PREVIEW)
    }

    /// Appends a message and refreshes the preview.
    pub fn push_message(&mut self, message: Message) {
        self.last_message = Some(message.text.clone());
        self.messages.push(message);
    }

    /// Updates the status of the message with `message_id`.
    ///
    /// Returns `false` if no such message exists.
    pub fn set_message_status(&mut self, message_id: &str, status: Option<MessageStatus>) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.status = status;
                true
            }
            None => false,
        }
    }

    /// Replaces the profile fields, keeping the id and the history.
    pub fn apply_profile(&mut self, profile: UserProfile) {
        let id = std::mem::take(&mut self.profile.id);
        self.profile = UserProfile { id, ..profile };
    }
}
