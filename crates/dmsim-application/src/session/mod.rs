//! Conversation session management.
//!
//! The [`ConversationSessionManager`] owns the thread collection and the
//! active thread, and is the only component that talks to the chat agent.

mod composing;
mod factory;
mod manager;

pub use composing::ComposingIndicator;
pub use factory::ThreadFactory;
pub use manager::{ConversationSessionManager, SendOutcome, SessionConfig};
