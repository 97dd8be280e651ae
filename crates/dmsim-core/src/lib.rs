//! Domain layer for DMSIM.
//!
//! Threads, messages, activity items, themes and the [`agent::ChatAgent`]
//! seam that every AI backend implements.

pub mod activity;
pub mod agent;
pub mod config;
pub mod error;
pub mod persona;
pub mod secret;
pub mod theme;
pub mod thread;
pub mod view;

// Re-export common error type
pub use error::{DmsimError, Result};
