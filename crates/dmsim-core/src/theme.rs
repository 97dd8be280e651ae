//! Chat themes.
//!
//! A theme picks the look of a thread and the tone of its AI persona. All
//! theme-specific behavior is a pure function of the theme and a message or
//! draft; renderers only consume the returned layout descriptions.

use crate::thread::{Message, Sender};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The messaging app a thread imitates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Instagram,
    Whatsapp,
    Snapchat,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Instagram, Theme::Whatsapp, Theme::Snapchat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Instagram => "instagram",
            Theme::Whatsapp => "whatsapp",
            Theme::Snapchat => "snapchat",
        }
    }

    /// Named accent colour of the theme.
    pub fn accent(&self) -> Accent {
        match self {
            Theme::Instagram => Accent::Blue,
            Theme::Whatsapp => Accent::Green,
            Theme::Snapchat => Accent::Yellow,
        }
    }

    /// Layout of one message bubble.
    pub fn bubble_layout(&self, message: &Message, position: BubblePosition) -> BubbleLayout {
        let is_user = message.sender == Sender::User;
        match self {
            Theme::Whatsapp => BubbleLayout {
                alignment: side_of(message.sender),
                label: None,
                corners: Corners::Uniform,
                footer: Some(BubbleFooter::Time {
                    clock: clock_label(message.timestamp),
                    double_check: is_user,
                }),
            },
            Theme::Snapchat => BubbleLayout {
                alignment: Alignment::Start,
                label: Some(if is_user { "ME" } else { "AI" }),
                corners: Corners::None,
                footer: None,
            },
            Theme::Instagram => BubbleLayout {
                alignment: side_of(message.sender),
                label: None,
                corners: Corners::Grouped {
                    round_top: position.is_first,
                    round_bottom: position.is_last,
                },
                footer: (position.is_last && is_user).then_some(BubbleFooter::Seen),
            },
        }
    }

    /// What the composer offers for the current draft.
    pub fn input_affordance(&self, draft: &str) -> InputAffordance {
        let has_text = !draft.trim().is_empty();
        let (placeholder, idle) = match self {
            Theme::Instagram => ("Message...", SubmitAction::MediaShortcuts),
            Theme::Whatsapp => ("Type a message", SubmitAction::Microphone),
            Theme::Snapchat => ("Send a Chat", SubmitAction::Hidden),
        };
        InputAffordance {
            placeholder,
            action: if has_text { SubmitAction::Send } else { idle },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" => Ok(Theme::Instagram),
            "whatsapp" => Ok(Theme::Whatsapp),
            "snapchat" => Ok(Theme::Snapchat),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// A draft may be submitted when it has content and no reply is pending.
pub fn can_submit(draft: &str, composing: bool) -> bool {
    !draft.trim().is_empty() && !composing
}

fn side_of(sender: Sender) -> Alignment {
    match sender {
        Sender::User => Alignment::End,
        Sender::Ai => Alignment::Start,
    }
}

fn clock_label(timestamp: DateTime<Utc>) -> String {
    format!("{}:{:02}", timestamp.hour(), timestamp.minute())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Blue,
    Green,
    Yellow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Start,
    End,
}

/// Corner treatment of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corners {
    /// Same radius on every corner.
    Uniform,
    /// Square bubble (a bar next to a label).
    None,
    /// Sender-side corners are tight except at the ends of a same-sender run.
    Grouped { round_top: bool, round_bottom: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BubbleFooter {
    /// "Seen" under the last user bubble.
    Seen,
    /// Clock time, with delivery ticks for user bubbles.
    Time { clock: String, double_check: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleLayout {
    pub alignment: Alignment,
    pub label: Option<&'static str>,
    pub corners: Corners,
    pub footer: Option<BubbleFooter>,
}

/// Where a message sits inside a run of messages from the same sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubblePosition {
    pub is_first: bool,
    pub is_last: bool,
}

impl BubblePosition {
    /// Position of `messages[index]`.
    ///
    /// Out-of-range indices are treated as a standalone bubble.
    pub fn in_sequence(messages: &[Message], index: usize) -> Self {
        let Some(current) = messages.get(index) else {
            return Self {
                is_first: true,
                is_last: true,
            };
        };
        let is_first = index == 0 || messages[index - 1].sender != current.sender;
        let is_last = messages
            .get(index + 1)
            .is_none_or(|next| next.sender != current.sender);
        Self { is_first, is_last }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    Send,
    Microphone,
    /// Microphone, gallery and sticker shortcuts.
    MediaShortcuts,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputAffordance {
    pub placeholder: &'static str,
    pub action: SubmitAction,
}
