//! Thread domain module.
//!
//! # Module Structure
//!
//! - `model`: Thread and profile types (`Thread`, `UserProfile`, `ProfileDraft`)
//! - `message`: Message types (`Message`, `Sender`, `MessageStatus`)

mod message;
mod model;

// Re-export public API
pub use message::{Message, MessageStatus, Sender};
pub use model::{EMPTY_THREAD_PREVIEW, ProfileDraft, Thread, UserProfile};
