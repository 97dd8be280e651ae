use dmsim_core::activity::{ActivityItem, ActivityKind, ActivityUser};
use dmsim_core::theme::Theme;
use dmsim_core::thread::{Message, Thread, UserProfile};

/// Returns the threads every session starts with.
pub fn default_threads() -> Vec<Thread> {
    vec![
        Thread::with_messages(
            UserProfile {
                id: "ai-1".to_string(),
                name: "Gemini AI".to_string(),
                username: "gemini.chat".to_string(),
                avatar: "https://picsum.photos/seed/gemini/200/200".to_string(),
                is_online: true,
                followers: Some("10M".to_string()),
                posts: Some("42".to_string()),
                personality: Some("Friendly and helpful AI assistant.".to_string()),
                language: Some("Dutch".to_string()),
                theme: Theme::Instagram,
            },
            vec![Message::from_agent(
                "Hey! Ik ben je AI vriend op Instagram. Hoe gaat het? 👋",
            )],
        ),
        Thread::with_messages(
            UserProfile {
                id: "ai-2".to_string(),
                name: "Tech Buddy".to_string(),
                username: "techie_bot".to_string(),
                avatar: "https://picsum.photos/seed/tech/200/200".to_string(),
                is_online: false,
                followers: Some("50k".to_string()),
                posts: Some("120".to_string()),
                personality: Some("Nerdy and excited about gadgets.".to_string()),
                language: Some("English".to_string()),
                theme: Theme::Whatsapp,
            },
            vec![Message::from_agent(
                "Yo! Did you see the new AI drop? It is insane!",
            )],
        ),
    ]
}

/// Returns the activity items every session starts with.
pub fn default_activities() -> Vec<ActivityItem> {
    vec![
        ActivityItem {
            id: "a1".to_string(),
            kind: ActivityKind::Like,
            user: ActivityUser {
                name: "techie_bot".to_string(),
                avatar: "https://picsum.photos/seed/tech/200/200".to_string(),
            },
            time: "2h".to_string(),
            content: Some("liked your photo.".to_string()),
        },
        ActivityItem {
            id: "a2".to_string(),
            kind: ActivityKind::Follow,
            user: ActivityUser {
                name: "art_lover".to_string(),
                avatar: "https://picsum.photos/seed/art/200/200".to_string(),
            },
            time: "4h".to_string(),
            content: None,
        },
    ]
}
