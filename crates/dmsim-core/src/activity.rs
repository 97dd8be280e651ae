//! Activity feed items (likes, follows, comments, follow requests).
//!
//! Items carry display data only. The `user` of an item is not linked to
//! any chat thread.

use crate::error::{DmsimError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Display time of freshly composed items.
pub const JUST_NOW: &str = "Just now";

const LIKE_CONTENT: &str = "liked your photo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Like,
    Follow,
    Comment,
    Request,
}

impl ActivityKind {
    /// Follows and follow requests offer confirm/delete actions.
    pub fn is_actionable(&self) -> bool {
        matches!(self, ActivityKind::Follow | ActivityKind::Request)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Like => "like",
            ActivityKind::Follow => "follow",
            ActivityKind::Comment => "comment",
            ActivityKind::Request => "request",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(ActivityKind::Like),
            "follow" => Ok(ActivityKind::Follow),
            "comment" => Ok(ActivityKind::Comment),
            "request" => Ok(ActivityKind::Request),
            other => Err(format!("unknown activity kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityUser {
    pub name: String,
    pub avatar: String,
}

/// A social notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub user: ActivityUser,
    /// Free-form display time such as `"2h"`
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Input of the activity composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDraft {
    pub name: String,
    pub avatar: String,
    pub kind: ActivityKind,
    /// Only used for [`ActivityKind::Comment`]
    pub comment: String,
}

impl ActivityDraft {
    /// A follow-request draft with a random avatar.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: Self::random_avatar(),
            kind: ActivityKind::Request,
            comment: String::new(),
        }
    }

    pub fn with_kind(mut self, kind: ActivityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn random_avatar() -> String {
        let seed: u64 = rand::thread_rng().r#gen();
        format!("https://picsum.photos/seed/{seed}/200/200")
    }

    /// Builds the feed item.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is blank.
    pub fn into_item(self) -> Result<ActivityItem> {
        if self.name.trim().is_empty() {
            return Err(DmsimError::validation("activity name must not be empty"));
        }

        let content = match self.kind {
            ActivityKind::Comment => Some(self.comment),
            ActivityKind::Like => Some(LIKE_CONTENT.to_string()),
            ActivityKind::Follow | ActivityKind::Request => None,
        };

        Ok(ActivityItem {
            id: Uuid::new_v4().to_string(),
            kind: self.kind,
            user: ActivityUser {
                name: self.name,
                avatar: self.avatar,
            },
            time: JUST_NOW.to_string(),
            content,
        })
    }
}
