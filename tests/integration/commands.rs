//! Chat command dispatcher against a live registry

use std::sync::Arc;

use async_trait::async_trait;
use hostwatch::{
    commands::{CommandHandler, parse_command},
    config::MonitorSettings,
    registry::Origin,
    settings::{MemorySettingsStore, SettingsError, SettingsResult, SettingsStore, UserSettings},
    tracker::Tracker,
};
use pretty_assertions::assert_eq;

use crate::helpers::{RecordingNotifier, ScriptedProber, origin, tracker};

struct Fixture {
    tracker: Tracker,
    settings: Arc<MemorySettingsStore>,
    handler: CommandHandler,
}

fn fixture() -> Fixture {
    let tracker = tracker(
        ScriptedProber::always(true),
        RecordingNotifier::new(),
        MonitorSettings::default(),
    );
    let settings = Arc::new(MemorySettingsStore::new());
    let handler = CommandHandler::new(tracker.clone(), settings.clone(), "eyes");

    Fixture {
        tracker,
        settings,
        handler,
    }
}

async fn run(handler: &CommandHandler, origin: &Origin, text: &str) -> String {
    let command = parse_command(text).unwrap();
    handler.handle(origin, &command).await
}

#[tokio::test]
async fn test_check_registers_each_host_once() {
    let f = fixture();
    let alice = origin("alice");

    let reply = run(&f.handler, &alice, "!check 10.0.0.1 10.0.0.2").await;
    assert_eq!(
        reply,
        "added check for `10.0.0.1`\nadded check for `10.0.0.2`\n"
    );
    assert_eq!(f.tracker.registry().keys().await, vec!["10.0.0.1", "10.0.0.2"]);
    assert_eq!(
        f.tracker.registry().exists("10.0.0.1").await.as_deref(),
        Some("via !check in ops")
    );

    let reply = run(&f.handler, &alice, "!ping 10.0.0.1").await;
    assert_eq!(
        reply,
        "`10.0.0.1` is already being monitored! (`via !check in ops`)\n"
    );
    assert_eq!(f.tracker.registry().len().await, 2);
}

#[tokio::test]
async fn test_check_without_arguments() {
    let f = fixture();
    let reply = run(&f.handler, &origin("alice"), "!check").await;
    assert_eq!(reply, "no hostname or ip address supplied.");
}

#[tokio::test]
async fn test_active_lists_hosts() {
    let f = fixture();
    let alice = origin("alice");

    assert_eq!(
        run(&f.handler, &alice, "!active").await,
        "no active hosts being monitored."
    );

    run(&f.handler, &alice, "!check 10.0.0.1").await;
    let reply = run(&f.handler, &alice, "!list").await;

    assert!(reply.starts_with("```\nq: 10.0.0.1 | ip: 10.0.0.1"));
    assert!(reply.contains("src: via !check in ops"));
    assert!(reply.ends_with("```"));
}

#[tokio::test]
async fn test_clear_by_user_and_by_pattern() {
    let f = fixture();
    let alice = origin("alice");
    let bob = origin("bob");

    run(&f.handler, &alice, "!check 10.0.0.1 10.0.0.2").await;
    run(&f.handler, &bob, "!check 10.0.1.1 10.0.2.1").await;

    let reply = run(&f.handler, &alice, "!clear").await;
    assert_eq!(reply, "sending cancellation signal to *your* active checks.");
    assert_eq!(f.tracker.registry().keys().await, vec!["10.0.1.1", "10.0.2.1"]);

    let reply = run(&f.handler, &alice, "!kill 10.0.1.*").await;
    assert_eq!(reply, "sending cancellation signal to checks matching: `10.0.1.*`");
    assert_eq!(f.tracker.registry().keys().await, vec!["10.0.2.1"]);

    let reply = run(&f.handler, &alice, "!clearall").await;
    assert_eq!(reply, "sending cancellation signal to active checks.");
    assert!(f.tracker.registry().is_empty().await);
}

#[tokio::test]
async fn test_clear_reports_invalid_pattern() {
    let f = fixture();
    let reply = run(&f.handler, &origin("alice"), "!clear [z-a]").await;

    assert!(reply.starts_with("invalid pattern `[z-a]`"));
    assert!(reply.ends_with("sending cancellation signal to checks matching: `[z-a]`"));
}

#[tokio::test]
async fn test_disable_and_enable() {
    let f = fixture();
    let alice = origin("alice");

    run(&f.handler, &alice, "!check 10.0.0.1").await;

    assert_eq!(
        run(&f.handler, &alice, "!disable").await,
        "disabled automatic host checks for you, and flushing existing checks."
    );
    assert!(f.settings.get("alice").await.unwrap().checks_disabled);
    assert!(f.tracker.registry().is_empty().await);

    assert_eq!(
        run(&f.handler, &alice, "!disable").await,
        "automatic host checks already disabled for you."
    );
    assert_eq!(
        run(&f.handler, &alice, "!enable").await,
        "re-enabled automatic host checks for you."
    );
    assert_eq!(
        run(&f.handler, &alice, "!enable").await,
        "automatic host checks already enabled for you."
    );
}

#[tokio::test]
async fn test_help_and_unknown() {
    let f = fixture();
    let alice = origin("alice");

    assert!(run(&f.handler, &alice, "!halp").await.contains(":eyes:"));
    assert_eq!(
        run(&f.handler, &alice, "!frobnicate now").await,
        "unknown command `frobnicate`. use `!help`?"
    );
}

struct BrokenStore;

#[async_trait]
impl SettingsStore for BrokenStore {
    async fn get(&self, _user: &str) -> SettingsResult<UserSettings> {
        Err(SettingsError::QueryFailed("disk on fire".to_string()))
    }

    async fn set(&self, _settings: &UserSettings) -> SettingsResult<()> {
        Err(SettingsError::QueryFailed("disk on fire".to_string()))
    }

    async fn all(&self) -> SettingsResult<Vec<UserSettings>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_settings_failure_is_reported() {
    let f = fixture();
    let handler = CommandHandler::new(f.tracker.clone(), Arc::new(BrokenStore), "eyes");

    let reply = run(&handler, &origin("alice"), "!enable").await;
    assert!(reply.starts_with("unable to load your settings: "));
    assert!(reply.contains("disk on fire"));
}
