use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use tokio::time::timeout;

use dmsim_application::{ActivityFeedManager, ConversationSessionManager, SendOutcome};
use dmsim_core::activity::ActivityDraft;
use dmsim_core::view::{Navigator, Overlay, ViewState};

use crate::command::{self, ActivityCommand, Command, ProfileEdit};
use crate::render;

const REPLY_TIMEOUT: Duration = Duration::from_secs(60);

/// What the REPL loop should do after a command.
pub enum Flow {
    Continue,
    Quit,
}

/// REPL state: the two managers plus the screen the user is looking at.
pub struct App {
    sessions: ConversationSessionManager,
    activity: ActivityFeedManager,
    nav: Navigator,
    stream_replies: bool,
}

impl App {
    pub fn new(
        sessions: ConversationSessionManager,
        activity: ActivityFeedManager,
        stream_replies: bool,
    ) -> Self {
        Self {
            sessions,
            activity,
            nav: Navigator::new(),
            stream_replies,
        }
    }

    /// Prompt reflecting the current screen.
    pub async fn prompt(&self) -> String {
        match self.nav.view() {
            ViewState::Chat => match self.sessions.get_active_thread().await {
                Ok(thread) => format!("@{}> ", thread.profile().username),
                Err(_) => "dmsim> ".to_string(),
            },
            ViewState::Dms => "dms> ".to_string(),
            ViewState::Activity => "activity> ".to_string(),
            ViewState::Home => "dmsim> ".to_string(),
        }
    }

    /// Prints the current screen.
    pub async fn render(&self) -> Result<()> {
        let screen = match self.nav.view() {
            ViewState::Home => render::home(
                &self.sessions.list_threads().await,
                self.activity.added_since_seed(),
            ),
            ViewState::Dms => render::dm_list(
                &self.sessions.list_threads().await,
                self.sessions.active_thread_id().await.as_deref(),
            ),
            ViewState::Chat => render::chat(
                &self.sessions.get_active_thread().await?,
                self.sessions.is_composing(),
            ),
            ViewState::Activity => render::activity(self.activity.list()),
        };
        println!("{screen}");
        Ok(())
    }

    pub async fn handle(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Home => self.nav.show(ViewState::Home),
            Command::Dms => self.nav.show(ViewState::Dms),
            Command::Back => self.nav.back(),
            Command::Open(target) => self.open(&target).await?,
            Command::New => {
                self.sessions.new_chat().await;
                self.nav.open_thread();
            }
            Command::Mock => {
                let thread = self.sessions.add_mock_incoming_chat().await;
                println!(
                    "{}",
                    format!("New message request from {}", thread.profile().name).bright_magenta()
                );
                self.nav.show(ViewState::Dms);
            }
            Command::Settings(edits) => return self.settings(edits).await.map(|_| Flow::Continue),
            Command::Activity(action) => self.activity_command(action)?,
            Command::Help => {
                println!("{}", render::help());
                return Ok(Flow::Continue);
            }
            Command::Quit => return Ok(Flow::Quit),
            Command::Say(text) => {
                self.nav.open_thread();
                self.say(&text).await?;
            }
        }
        self.render().await?;
        Ok(Flow::Continue)
    }

    async fn open(&mut self, target: &str) -> Result<()> {
        let threads = self.sessions.list_threads().await;
        let by_position = target
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| threads.get(i));
        let thread = by_position
            .or_else(|| threads.iter().find(|t| t.id() == target))
            .ok_or_else(|| anyhow::anyhow!("no conversation '{target}'"))?;

        self.sessions.set_active_thread(thread.id()).await;
        self.nav.open_thread();
        Ok(())
    }

    async fn settings(&mut self, edits: Vec<ProfileEdit>) -> Result<()> {
        let thread = self.sessions.get_active_thread().await?;
        if edits.is_empty() {
            self.nav.open(Overlay::Settings);
            println!("{}", render::settings(thread.profile()));
            return Ok(());
        }

        let profile = command::apply_edits(thread.profile(), &edits)?;
        self.sessions
            .apply_profile_and_reconfigure_agent(profile)
            .await;
        self.nav.close(Overlay::Settings);
        println!("{}", "Saved.".bright_green());
        self.nav.open_thread();
        self.render().await
    }

    fn activity_command(&mut self, action: ActivityCommand) -> Result<()> {
        match action {
            ActivityCommand::Show => {}
            ActivityCommand::Add {
                kind,
                name,
                comment,
            } => {
                self.nav.open(Overlay::ActivityComposer);
                let mut draft = ActivityDraft::new(name).with_kind(kind);
                if let Some(comment) = comment {
                    draft = draft.with_comment(comment);
                }
                let added = self.activity.add_from_draft(draft);
                self.nav.close(Overlay::ActivityComposer);
                added?;
            }
            ActivityCommand::Remove(id) => {
                if self.activity.remove(&id).is_none() {
                    println!("{}", format!("No activity '{id}'").bright_black());
                }
            }
        }
        self.nav.show(ViewState::Activity);
        Ok(())
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        let thread = self.sessions.get_active_thread().await?;
        if !dmsim_core::theme::can_submit(text, self.sessions.is_composing()) {
            return Ok(());
        }
        let id = thread.id().to_string();

        let outcome = if self.stream_replies {
            print!("{} ", format!("{}:", thread.profile().name).bright_black());
            let sent = self
                .sessions
                .send_message_streaming(&id, text, |fragment| {
                    print!("{fragment}");
                    let _ = std::io::stdout().flush();
                });
            let outcome = timeout(REPLY_TIMEOUT, sent).await;
            println!();
            outcome
        } else {
            println!(
                "{}",
                format!("{} is typing...", thread.profile().name).bright_black()
            );
            timeout(REPLY_TIMEOUT, self.sessions.send_message(&id, text)).await
        };

        match outcome {
            Ok(Ok(SendOutcome::FellBack { .. })) => {
                println!("{}", "(the AI backend is unavailable)".bright_black());
            }
            Ok(Ok(_)) => {}
            Ok(Err(err)) if err.is_agent_unavailable() => {
                println!("{}", "(no reply, the AI backend is unavailable)".bright_black());
            }
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => println!("{}", "Error: Request timed out.".red()),
        }
        Ok(())
    }
}
