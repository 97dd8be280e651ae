//! Builders for threads created at runtime.

use dmsim_core::theme::Theme;
use dmsim_core::thread::{Message, ProfileDraft, Thread};
use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

const MOCK_NAMES: [&str; 5] = ["Luna", "Max", "Sophie", "Bram", "Emma"];
const MOCK_OPENER: &str = "Hey, heb je even? Ik zag je profiel langskomen!";
const DEFAULT_LANGUAGE: &str = "Dutch";

/// Creates ids and profiles for "new chat" and "mock incoming chat".
pub struct ThreadFactory;

impl ThreadFactory {
    /// Allocates a fresh thread id such as `ai-<uuid>`.
    pub fn thread_id(prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4())
    }

    pub fn avatar_for(seed: &str) -> String {
        format!("https://picsum.photos/seed/{seed}/200/200")
    }

    /// Profile of a blank "New Friend" chat.
    ///
    /// The avatar is left empty; `create_thread` seeds it from the new id.
    pub fn new_chat_draft() -> ProfileDraft {
        let mut rng = rand::thread_rng();
        ProfileDraft {
            name: "New Friend".to_string(),
            avatar: String::new(),
            username: format!("user_{}", rng.gen_range(0..1000)),
            is_online: true,
            followers: Some("0".to_string()),
            posts: Some("0".to_string()),
            personality: Some("A new friendly AI.".to_string()),
            language: Some(DEFAULT_LANGUAGE.to_string()),
            theme: Theme::Instagram,
        }
    }

    /// A random contact that opened the conversation themselves.
    pub fn mock_incoming_thread() -> Thread {
        let mut rng = rand::thread_rng();
        let id = Self::thread_id("mock");
        let name = MOCK_NAMES.choose(&mut rng).copied().unwrap_or(MOCK_NAMES[0]);

        let profile = ProfileDraft {
            name: name.to_string(),
            username: format!("{}_{}", name.to_lowercase(), rng.gen_range(0..100)),
            avatar: Self::avatar_for(&id),
            is_online: true,
            followers: Some("1.2k".to_string()),
            posts: Some("12".to_string()),
            personality: Some("Random incoming request personality.".to_string()),
            language: Some(DEFAULT_LANGUAGE.to_string()),
            theme: Theme::Instagram,
        }
        .into_profile(id);

        Thread::with_messages(profile, vec![Message::from_agent(MOCK_OPENER)])
    }
}
