//! AI backends for DMSIM.
//!
//! [`GeminiChatAgent`] implements [`dmsim_core::agent::ChatAgent`] over the
//! Gemini REST API.

pub mod gemini_chat_agent;
pub mod sse;

pub use gemini_chat_agent::GeminiChatAgent;
