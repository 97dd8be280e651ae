//! Application layer of DMSIM.
//!
//! Stateful managers that a presentation layer drives: conversation threads
//! with their AI round trips, and the activity feed.

pub mod activity_feed;
pub mod presets;
pub mod session;

pub use activity_feed::ActivityFeedManager;
pub use session::{ComposingIndicator, ConversationSessionManager, SendOutcome, SessionConfig};
