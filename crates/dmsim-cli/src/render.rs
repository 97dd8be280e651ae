//! Terminal rendering of the simulated screens.

use colored::{ColoredString, Colorize};
use dmsim_core::activity::{ActivityItem, ActivityKind};
use dmsim_core::theme::{
    Accent, Alignment, BubbleFooter, BubblePosition, Corners, SubmitAction, Theme,
};
use dmsim_core::thread::{Message, Sender, Thread, UserProfile};

const WIDTH: usize = 64;

fn accented(text: &str, accent: Accent) -> ColoredString {
    match accent {
        Accent::Blue => text.bright_blue(),
        Accent::Green => text.green(),
        Accent::Yellow => text.yellow(),
    }
}

fn online_dot(profile: &UserProfile) -> ColoredString {
    if profile.is_online {
        "●".green()
    } else {
        "○".bright_black()
    }
}

pub fn home(threads: &[Thread], new_activity: usize) -> String {
    let mut out = vec![format!("{}", "dmsim".bold())];
    let stories: Vec<String> = threads
        .iter()
        .map(|t| format!("({})", t.profile().username))
        .collect();
    out.push(stories.join(" "));
    if new_activity > 0 {
        out.push(format!("{} {new_activity} new", "♥".red()));
    }
    out.push(
        "/dms for messages, /activity for notifications"
            .bright_black()
            .to_string(),
    );
    out.join("\n")
}

pub fn dm_list(threads: &[Thread], active_id: Option<&str>) -> String {
    let mut out = vec![format!("{}", "Messages".bold())];
    for (i, thread) in threads.iter().enumerate() {
        let profile = thread.profile();
        let marker = if Some(thread.id()) == active_id { ">" } else { " " };
        out.push(format!(
            "{marker}{:>3}. {} {} {} {}",
            i + 1,
            online_dot(profile),
            accented(&profile.name, profile.theme.accent()).bold(),
            format!("@{} · {}", profile.username, profile.theme).bright_black(),
            thread.preview().italic(),
        ));
    }
    out.join("\n")
}

fn corner_glyph(corners: Corners) -> &'static str {
    match corners {
        Corners::Uniform => "(",
        Corners::None => "|",
        Corners::Grouped {
            round_top: true,
            round_bottom: true,
        } => "(",
        Corners::Grouped {
            round_top: true, ..
        } => "╭",
        Corners::Grouped {
            round_bottom: true, ..
        } => "╰",
        Corners::Grouped { .. } => "│",
    }
}

fn bubble(theme: Theme, messages: &[Message], index: usize) -> Vec<String> {
    let message = &messages[index];
    let layout = theme.bubble_layout(message, BubblePosition::in_sequence(messages, index));

    let label = layout
        .label
        .map(|label| format!("{label} "))
        .unwrap_or_default();
    let body = format!("{label}{} {}", corner_glyph(layout.corners), message.text);
    let body = match message.sender {
        Sender::User => accented(&body, theme.accent()).to_string(),
        Sender::Ai => body,
    };

    let footer = layout.footer.map(|footer| match footer {
        BubbleFooter::Seen => "Seen".to_string(),
        BubbleFooter::Time {
            clock,
            double_check: true,
        } => format!("{clock} ✓✓"),
        BubbleFooter::Time { clock, .. } => clock,
    });

    let align = |line: String, visible: usize| match layout.alignment {
        Alignment::Start => line,
        Alignment::End => format!("{}{line}", " ".repeat(WIDTH.saturating_sub(visible))),
    };

    let visible = label.chars().count() + 2 + message.text.chars().count();
    let mut lines = vec![align(body, visible)];
    if let Some(footer) = footer {
        let visible = footer.chars().count();
        lines.push(align(footer.bright_black().to_string(), visible));
    }
    lines
}

pub fn chat(thread: &Thread, composing: bool) -> String {
    let profile = thread.profile();
    let theme = profile.theme;
    let mut out = vec![format!(
        "{} {} {}",
        online_dot(profile),
        accented(&profile.name, theme.accent()).bold(),
        format!("@{} · {theme}", profile.username).bright_black()
    )];

    let messages = thread.messages();
    if messages.is_empty() {
        out.push(thread.preview().bright_black().to_string());
    }
    for index in 0..messages.len() {
        out.extend(bubble(theme, messages, index));
    }
    if composing {
        out.push(format!("{} is typing...", profile.name).bright_black().to_string());
    }

    let affordance = theme.input_affordance("");
    let action = match affordance.action {
        SubmitAction::Send => "send",
        SubmitAction::Microphone => "mic",
        SubmitAction::MediaShortcuts => "mic · gallery · sticker",
        SubmitAction::Hidden => "",
    };
    out.push(
        format!("[{}] {action}", affordance.placeholder)
            .bright_black()
            .to_string(),
    );
    out.join("\n")
}

pub fn activity(items: &[ActivityItem]) -> String {
    let mut out = vec![format!("{}", "Activity".bold())];
    if items.is_empty() {
        out.push("Nothing new.".bright_black().to_string());
    }
    for item in items {
        let content = item.content.as_deref().unwrap_or(match item.kind {
            ActivityKind::Follow => "started following you.",
            ActivityKind::Request => "wants to send you a message.",
            ActivityKind::Like | ActivityKind::Comment => "",
        });
        let mut line = format!(
            "{:<10} {} {} {}",
            item.id,
            item.user.name.bold(),
            content,
            item.time.bright_black()
        );
        if item.kind.is_actionable() {
            line.push_str(
                &format!("  [/activity remove {}]", item.id)
                    .bright_cyan()
                    .to_string(),
            );
        }
        out.push(line);
    }
    out.join("\n")
}

pub fn settings(profile: &UserProfile) -> String {
    let field = |name: &str, value: &str| format!("  {:<12} {value}", name.bright_black());
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    [
        format!("{}", "Settings".bold()),
        field("name", &profile.name),
        field("username", &profile.username),
        field("avatar", &profile.avatar),
        field("online", &profile.is_online.to_string()),
        field("followers", &optional(&profile.followers)),
        field("posts", &optional(&profile.posts)),
        field("personality", &optional(&profile.personality)),
        field("language", &optional(&profile.language)),
        field("theme", profile.theme.as_str()),
        format!(
            "  {}",
            "/settings field=value ... to save (themes: instagram, whatsapp, snapchat)"
                .bright_black()
        ),
    ]
    .join("\n")
}

pub fn help() -> String {
    [
        "/home                          home screen",
        "/dms                           list conversations",
        "/open <n|id>                   open a conversation",
        "/back                          go back",
        "/new                           start a chat with a new friend",
        "/mock                          simulate an incoming chat",
        "/settings [field=value ...]    show or edit the open contact",
        "/activity                      show notifications",
        "/activity add <kind> <name> [comment]",
        "/activity remove <id>          confirm or dismiss",
        "/quit                          exit",
        "anything else                  message the open contact",
    ]
    .join("\n")
}
