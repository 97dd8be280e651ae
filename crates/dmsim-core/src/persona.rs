//! Persona instructions derived from thread profiles.

use crate::thread::UserProfile;

/// Renders the system instruction that makes the agent speak as `profile`.
///
/// Lines for unset `language` or `personality` are left out.
pub fn system_instruction(profile: &UserProfile) -> String {
    let theme = profile.theme.as_str();
    let mut lines = vec![format!(
        "Your name is {}. You are chatting on {theme}.",
        profile.name
    )];
    if let Some(language) = profile.language.as_deref() {
        lines.push(format!("Language: {language}."));
    }
    if let Some(personality) = profile.personality.as_deref() {
        lines.push(format!("Personality: {personality}."));
    }
    lines.push(format!("Adopt the slang and vibe of {theme}."));
    lines.join("\n")
}
