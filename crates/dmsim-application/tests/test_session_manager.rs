mod common;

use common::{BrokenStreamAgent, EchoAgent, FailingAgent, GatedAgent, thread};
use dmsim_application::presets::default_threads;
use dmsim_application::session::ThreadFactory;
use dmsim_application::{ConversationSessionManager, SendOutcome, SessionConfig};
use dmsim_core::agent::{
    AgentError, ChatAgent, EMPTY_REPLY_FALLBACK, ERROR_REPLY_FALLBACK, STREAM_FALLBACK_FRAGMENT,
};
use futures::StreamExt;
use dmsim_core::config::FailurePolicy;
use dmsim_core::theme::Theme;
use dmsim_core::thread::{MessageStatus, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn manager_with(agent: Arc<dyn ChatAgent>) -> ConversationSessionManager {
    ConversationSessionManager::new(
        agent,
        vec![thread("t1", Theme::Instagram), thread("t2", Theme::Whatsapp)],
        SessionConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn successful_send_appends_user_and_agent_messages() {
    let agent = Arc::new(EchoAgent::new());
    let manager = manager_with(agent.clone());

    let outcome = manager.send_message("t1", "hoi").await.unwrap();

    assert_eq!(
        outcome,
        SendOutcome::Replied {
            reply: "echo: hoi".to_string()
        }
    );
    let thread = manager.thread("t1").await.unwrap();
    let messages = thread.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].text, "hoi");
    assert_eq!(messages[0].status, Some(MessageStatus::Sent));
    assert_eq!(messages[1].sender, Sender::Ai);
    assert_eq!(messages[1].status, None);
    assert_eq!(thread.last_message(), Some("echo: hoi"));
    assert_eq!(agent.received(), vec!["hoi"]);
    assert!(!manager.is_composing());
}

#[tokio::test]
async fn blank_text_is_ignored() {
    let agent = Arc::new(EchoAgent::new());
    let manager = manager_with(agent.clone());

    let outcome = manager.send_message("t1", "   \n").await.unwrap();

    assert_eq!(outcome, SendOutcome::Ignored);
    assert!(manager.thread("t1").await.unwrap().messages().is_empty());
    assert!(agent.received().is_empty());
}

#[tokio::test]
async fn unknown_thread_is_not_found() {
    let agent = Arc::new(EchoAgent::new());
    let manager = manager_with(agent.clone());

    let err = manager.send_message("nope", "hi").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(agent.received().is_empty());
}

#[tokio::test]
async fn failing_agent_leaves_only_the_user_message() {
    let manager = manager_with(Arc::new(FailingAgent(AgentError::Transport(
        "connection refused".into(),
    ))));

    let err = manager.send_message("t2", "anyone there?").await.unwrap_err();

    assert!(err.is_agent_unavailable());
    let thread = manager.thread("t2").await.unwrap();
    assert_eq!(thread.messages().len(), 1);
    assert_eq!(thread.messages()[0].sender, Sender::User);
    assert_eq!(thread.messages()[0].status, None);
    assert_eq!(thread.last_message(), Some("anyone there?"));
    assert!(!manager.is_composing());
}

#[tokio::test]
async fn fallback_policy_appends_static_reply() {
    let manager = ConversationSessionManager::new(
        Arc::new(FailingAgent(AgentError::Http {
            status: 503,
            message: "unavailable".into(),
        })),
        vec![thread("t1", Theme::Snapchat)],
        SessionConfig {
            failure_policy: FailurePolicy::Fallback,
        },
    )
    .unwrap();

    let outcome = manager.send_message("t1", "yo").await.unwrap();

    assert_eq!(outcome.reply(), Some(ERROR_REPLY_FALLBACK));
    assert!(matches!(outcome, SendOutcome::FellBack { .. }));
    let thread = manager.thread("t1").await.unwrap();
    assert_eq!(thread.messages().len(), 2);
    assert_eq!(thread.last_message(), Some(ERROR_REPLY_FALLBACK));
}

#[tokio::test]
async fn composing_flag_spans_the_agent_round_trip() {
    let (agent, mut started) = GatedAgent::new();
    let agent = Arc::new(agent);
    let manager = manager_with(agent.clone());
    let mut indicator = manager.composing_indicator();
    assert!(!indicator.is_composing());

    let sender = manager.clone();
    let send = tokio::spawn(async move { sender.send_message("t1", "hey").await });

    assert_eq!(started.recv().await.as_deref(), Some("hey"));
    assert!(manager.is_composing());
    let pending = manager.thread("t1").await.unwrap();
    assert_eq!(pending.messages().len(), 1);
    assert_eq!(pending.messages()[0].status, Some(MessageStatus::Sending));
    assert_eq!(pending.last_message(), Some("hey"));

    agent.release(1);
    let outcome = send.await.unwrap().unwrap();

    assert_eq!(outcome.reply(), Some("reply to hey"));
    timeout(Duration::from_secs(1), indicator.wait_for(false))
        .await
        .unwrap();
    assert!(!manager.is_composing());
}

#[tokio::test]
async fn dropping_a_send_lowers_the_flag() {
    let (agent, mut started) = GatedAgent::new();
    let manager = manager_with(Arc::new(agent));

    let sender = manager.clone();
    let send = tokio::spawn(async move { sender.send_message("t1", "hey").await });
    started.recv().await.unwrap();
    assert!(manager.is_composing());

    send.abort();
    let _ = send.await;

    assert!(!manager.is_composing());
    let thread = manager.thread("t1").await.unwrap();
    assert_eq!(thread.messages().len(), 1);
    assert_eq!(thread.messages()[0].status, None);
}

#[tokio::test]
async fn timed_out_send_does_not_stay_sending() {
    let (agent, mut started) = GatedAgent::new();
    let agent = Arc::new(agent);
    let manager = manager_with(agent.clone());

    let sent = timeout(Duration::from_millis(50), manager.send_message("t1", "hey")).await;
    assert!(sent.is_err());
    assert_eq!(started.recv().await.as_deref(), Some("hey"));

    let thread = manager.thread("t1").await.unwrap();
    assert_eq!(thread.messages()[0].status, None);
    assert!(!manager.is_composing());

    agent.release(1);
    manager.send_message("t1", "again").await.unwrap();
    assert_eq!(manager.thread("t1").await.unwrap().messages().len(), 3);
}

#[tokio::test]
async fn sends_to_one_thread_are_serialized() {
    let (agent, mut started) = GatedAgent::new();
    let agent = Arc::new(agent);
    let manager = manager_with(agent.clone());

    let first = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.send_message("t1", "first").await })
    };
    assert_eq!(started.recv().await.as_deref(), Some("first"));

    let second = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.send_message("t1", "second").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(started.try_recv().is_err());
    assert_eq!(manager.thread("t1").await.unwrap().messages().len(), 1);

    agent.release(1);
    first.await.unwrap().unwrap();
    assert_eq!(started.recv().await.as_deref(), Some("second"));
    agent.release(1);
    second.await.unwrap().unwrap();

    let texts: Vec<_> = manager
        .thread("t1")
        .await
        .unwrap()
        .messages()
        .iter()
        .map(|m| m.text.clone())
        .collect();
    assert_eq!(
        texts,
        vec!["first", "reply to first", "second", "reply to second"]
    );
}

#[tokio::test]
async fn sends_to_different_threads_run_concurrently() {
    let (agent, mut started) = GatedAgent::new();
    let agent = Arc::new(agent);
    let manager = manager_with(agent.clone());

    let sends: Vec<_> = [("t1", "to one"), ("t2", "to two")]
        .into_iter()
        .map(|(id, text)| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.send_message(id, text).await })
        })
        .collect();

    let mut seen = Vec::new();
    for _ in 0..2 {
        let message = timeout(Duration::from_secs(1), started.recv())
            .await
            .unwrap()
            .unwrap();
        seen.push(message);
    }
    seen.sort();
    assert_eq!(seen, vec!["to one", "to two"]);
    assert!(manager.is_composing());

    agent.release(2);
    for send in sends {
        send.await.unwrap().unwrap();
    }
    assert!(!manager.is_composing());
    assert_eq!(manager.thread("t1").await.unwrap().messages().len(), 2);
    assert_eq!(manager.thread("t2").await.unwrap().messages().len(), 2);
}

#[tokio::test]
async fn active_thread_resolution() {
    let manager = manager_with(Arc::new(EchoAgent::new()));
    assert_eq!(manager.get_active_thread().await.unwrap().id(), "t1");

    manager.set_active_thread("t2").await;
    assert_eq!(manager.get_active_thread().await.unwrap().id(), "t2");

    manager.set_active_thread("gone").await;
    assert_eq!(manager.get_active_thread().await.unwrap().id(), "t1");
    assert_eq!(manager.active_thread_id().await.as_deref(), Some("gone"));
}

#[tokio::test]
async fn create_thread_inserts_at_front_without_activating() {
    let manager = manager_with(Arc::new(EchoAgent::new()));

    let created = manager
        .create_thread(ThreadFactory::new_chat_draft())
        .await;

    let threads = manager.list_threads().await;
    assert_eq!(threads.len(), 3);
    assert_eq!(threads[0].id(), created.id());
    assert!(created.id().starts_with("ai-"));
    assert!(created.messages().is_empty());
    assert_eq!(manager.get_active_thread().await.unwrap().id(), "t1");
}

#[tokio::test]
async fn create_thread_keeps_an_explicit_avatar() {
    let manager = manager_with(Arc::new(EchoAgent::new()));
    let mut draft = ThreadFactory::new_chat_draft();
    draft.avatar = "https://example.com/me.png".to_string();

    let created = manager.create_thread(draft).await;

    assert_eq!(created.profile().avatar, "https://example.com/me.png");
}

#[tokio::test]
async fn new_chat_and_mock_chat_flows() {
    let manager = manager_with(Arc::new(EchoAgent::new()));

    let fresh = manager.new_chat().await;
    assert_eq!(fresh.profile().name, "New Friend");
    assert_eq!(
        fresh.profile().avatar,
        ThreadFactory::avatar_for(fresh.id())
    );
    assert_eq!(manager.get_active_thread().await.unwrap().id(), fresh.id());

    let mock = manager.add_mock_incoming_chat().await;
    assert_eq!(mock.messages().len(), 1);
    assert_eq!(manager.list_threads().await[0].id(), mock.id());
    assert_eq!(manager.get_active_thread().await.unwrap().id(), fresh.id());
}

#[tokio::test]
async fn update_thread_profile_keeps_history() {
    let manager = manager_with(Arc::new(EchoAgent::new()));
    manager.send_message("t1", "hi").await.unwrap();

    let mut profile = manager.thread("t1").await.unwrap().profile().clone();
    profile.name = "Renamed".to_string();
    assert!(manager.update_thread_profile("t1", profile.clone()).await);

    let thread = manager.thread("t1").await.unwrap();
    assert_eq!(thread.profile().name, "Renamed");
    assert_eq!(thread.messages().len(), 2);

    assert!(!manager.update_thread_profile("missing", profile).await);
    assert_eq!(manager.list_threads().await.len(), 2);
}

#[tokio::test]
async fn reconfigure_pushes_persona_to_agent() {
    let agent = Arc::new(EchoAgent::new());
    let manager = manager_with(agent.clone());

    let mut profile = manager.thread("t1").await.unwrap().profile().clone();
    profile.theme = Theme::Whatsapp;
    profile.personality = Some("sarcastic".to_string());
    manager.apply_profile_and_reconfigure_agent(profile).await;

    let instruction = agent.system_instruction().await;
    assert!(instruction.contains("whatsapp"));
    assert!(instruction.contains("sarcastic"));
    assert_eq!(
        manager.thread("t1").await.unwrap().profile().theme,
        Theme::Whatsapp
    );
}

#[tokio::test]
async fn default_threads_seed_a_working_session() {
    let manager = ConversationSessionManager::new(
        Arc::new(EchoAgent::new()),
        default_threads(),
        SessionConfig::default(),
    )
    .unwrap();

    let active = manager.get_active_thread().await.unwrap();
    assert_eq!(active.id(), "ai-1");
    assert!(active.last_message().is_some());

    manager.send_message("ai-2", "hello").await.unwrap();
    assert_eq!(manager.thread("ai-2").await.unwrap().messages().len(), 3);
}

#[tokio::test]
async fn streaming_send_forwards_fragments_and_records_reply() {
    let agent = Arc::new(EchoAgent::new());
    let manager = manager_with(agent);

    let mut fragments = Vec::new();
    let outcome = manager
        .send_message_streaming("t2", "ping", |fragment| fragments.push(fragment.to_string()))
        .await
        .unwrap();

    assert_eq!(fragments, vec!["echo: ", "ping"]);
    assert_eq!(outcome.reply(), Some("echo: ping"));
    let thread = manager.thread("t2").await.unwrap();
    assert_eq!(thread.messages().len(), 2);
    assert_eq!(thread.messages()[0].status, Some(MessageStatus::Sent));
    assert_eq!(thread.last_message(), Some("echo: ping"));
    assert!(!manager.is_composing());
}

#[tokio::test]
async fn empty_stream_counts_as_failure() {
    let (agent, _started) = GatedAgent::new();
    let manager = manager_with(Arc::new(agent));

    let err = manager
        .send_message_streaming("t1", "hi", |_| {})
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        dmsim_core::error::DmsimError::AgentUnavailable(AgentError::EmptyResponse)
    ));
    assert_eq!(manager.thread("t1").await.unwrap().messages().len(), 1);
}

#[tokio::test]
async fn failing_agent_stream_yields_single_fallback_fragment() {
    let agent = FailingAgent(AgentError::Transport("reset".into()));

    let fragments: Vec<String> = agent.request_reply_stream("hi").collect().await;

    assert_eq!(fragments, vec![STREAM_FALLBACK_FRAGMENT.to_string()]);
}

#[tokio::test]
async fn streaming_failure_under_drop_policy_is_an_error() {
    let manager = manager_with(Arc::new(FailingAgent(AgentError::Transport(
        "connection refused".into(),
    ))));

    let mut fragments = Vec::new();
    let err = manager
        .send_message_streaming("t1", "anyone?", |f| fragments.push(f.to_string()))
        .await
        .unwrap_err();

    assert!(err.is_agent_unavailable());
    assert!(fragments.is_empty());
    let thread = manager.thread("t1").await.unwrap();
    assert_eq!(thread.messages().len(), 1);
    assert_eq!(thread.messages()[0].status, None);
    assert!(!manager.is_composing());
}

#[tokio::test]
async fn streaming_failure_under_fallback_policy_appends_static_reply() {
    let manager = ConversationSessionManager::new(
        Arc::new(FailingAgent(AgentError::EmptyResponse)),
        vec![thread("t1", Theme::Instagram)],
        SessionConfig {
            failure_policy: FailurePolicy::Fallback,
        },
    )
    .unwrap();

    let outcome = manager
        .send_message_streaming("t1", "hi", |_| {})
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SendOutcome::FellBack {
            reply: EMPTY_REPLY_FALLBACK.to_string()
        }
    );
    let thread = manager.thread("t1").await.unwrap();
    assert_eq!(thread.messages().len(), 2);
    assert_eq!(thread.messages()[0].status, None);
    assert_eq!(thread.last_message(), Some(EMPTY_REPLY_FALLBACK));
}

#[tokio::test]
async fn stream_breaking_part_way_discards_partial_reply() {
    let manager = manager_with(Arc::new(BrokenStreamAgent {
        fragments: vec!["Hel", "lo"],
        error: AgentError::Transport("stream broke".into()),
    }));

    let mut fragments = Vec::new();
    let err = manager
        .send_message_streaming("t2", "hi", |f| fragments.push(f.to_string()))
        .await
        .unwrap_err();

    assert!(err.is_agent_unavailable());
    assert_eq!(fragments, vec!["Hel", "lo"]);
    let thread = manager.thread("t2").await.unwrap();
    assert_eq!(thread.messages().len(), 1);
    assert_eq!(thread.last_message(), Some("hi"));
}
