//! Chat command dispatcher
//!
//! Parses `!<command> [args]` messages and maps them onto registry
//! operations. Replies are plain text; the adapter that received the message
//! decides how to deliver them.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::registry::{Origin, Trigger};
use crate::resolver;
use crate::settings::{SettingsError, SettingsStore};
use crate::tracker::{CheckRequest, Tracker};

static RE_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^!(\w+)(?:\s+(.*))?$").expect("command pattern is valid")
});

/// A parsed `!command`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Lower-cased command word
    pub name: String,
    pub args: String,
}

/// Parse a message into a command, if it is one
pub fn parse_command(text: &str) -> Option<Command> {
    let captures = RE_COMMAND.captures(text.trim())?;
    let name = captures.get(1)?.as_str().to_lowercase();
    let args = captures
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    Some(Command { name, args })
}

pub struct CommandHandler {
    tracker: Tracker,
    settings: Arc<dyn SettingsStore>,
    reaction_trigger: String,
}

impl CommandHandler {
    pub fn new(tracker: Tracker, settings: Arc<dyn SettingsStore>, reaction_trigger: impl Into<String>) -> Self {
        Self {
            tracker,
            settings,
            reaction_trigger: reaction_trigger.into(),
        }
    }

    /// Execute a command and build the reply
    ///
    /// Returns an empty string if there is nothing to say.
    #[instrument(skip(self, origin), fields(user = %origin.user))]
    pub async fn handle(&self, origin: &Origin, command: &Command) -> String {
        debug!("handling command");

        let reply = match command.name.as_str() {
            "enable" => self.enable(origin).await,
            "disable" => self.disable(origin).await,
            "active" | "list" | "listall" | "all" => Ok(self.active().await),
            "clearall" | "stopall" | "killall" => Ok(self.clear_all().await),
            "clear" | "stop" | "kill" => Ok(self.clear(origin, &command.args).await),
            "ping" | "check" | "pong" => Ok(self.check(origin, &command.args).await),
            "help" | "halp" => Ok(self.help()),
            other => Ok(format!("unknown command `{other}`. use `!help`?")),
        };

        reply.unwrap_or_else(|e| {
            warn!("settings store failure: {e}");
            format!("unable to load your settings: {e}")
        })
    }

    async fn enable(&self, origin: &Origin) -> Result<String, SettingsError> {
        let mut settings = self.settings.get(&origin.user).await?;
        if !settings.checks_disabled {
            return Ok(String::from("automatic host checks already enabled for you."));
        }

        settings.checks_disabled = false;
        self.settings.set(&settings).await?;
        Ok(String::from("re-enabled automatic host checks for you."))
    }

    async fn disable(&self, origin: &Origin) -> Result<String, SettingsError> {
        let mut settings = self.settings.get(&origin.user).await?;
        if settings.checks_disabled {
            return Ok(String::from("automatic host checks already disabled for you."));
        }

        settings.checks_disabled = true;
        self.settings.set(&settings).await?;
        self.remove_matching("", &origin.user).await;

        Ok(String::from(
            "disabled automatic host checks for you, and flushing existing checks.",
        ))
    }

    async fn active(&self) -> String {
        let dump = self.tracker.registry().dump().await;
        if dump.is_empty() {
            return String::from("no active hosts being monitored.");
        }

        format!("```\n{dump}```")
    }

    async fn clear_all(&self) -> String {
        self.remove_matching("", "").await;
        String::from("sending cancellation signal to active checks.")
    }

    async fn clear(&self, origin: &Origin, args: &str) -> String {
        if args.is_empty() {
            self.remove_matching("", &origin.user).await;
            return String::from("sending cancellation signal to *your* active checks.");
        }

        let patterns: Vec<&str> = args.split_whitespace().collect();
        let mut reply = String::new();
        for pattern in &patterns {
            if let Err(e) = self.tracker.registry().glob_remove(pattern, "").await {
                reply.push_str(&format!("{e}\n"));
            }
        }

        reply.push_str(&format!(
            "sending cancellation signal to checks matching: `{}`",
            patterns.join("`, `")
        ));
        reply
    }

    async fn remove_matching(&self, pattern: &str, user: &str) {
        if let Err(e) = self.tracker.registry().glob_remove(pattern, user).await {
            warn!("bulk removal failed: {e}");
        }
    }

    async fn check(&self, origin: &Origin, args: &str) -> String {
        let queries: Vec<&str> = args.split_whitespace().collect();
        if queries.is_empty() {
            return String::from("no hostname or ip address supplied.");
        }

        let registry = self.tracker.registry();
        let mut reply = String::new();

        for result in resolver::resolve_all(&queries).await {
            let resolved = match result {
                Ok(resolved) => resolved,
                Err(e) => {
                    debug!("{e}");
                    reply.push_str(&format!("invalid addr/host: `{}`\n", e.query()));
                    continue;
                }
            };

            let existing = match registry.exists(&resolved.query).await {
                Some(source) => Some(source),
                None => registry.exists(&resolved.address.to_string()).await,
            };
            if let Some(source) = existing {
                reply.push_str(&format!(
                    "`{}` is already being monitored! (`{source}`)\n",
                    resolved.query
                ));
                continue;
            }

            let mut source = String::from("via !check");
            if !origin.channel.is_empty() {
                source.push_str(&format!(" in {}", origin.channel));
            }

            let request = CheckRequest {
                key: resolved.key.clone(),
                address: resolved.address,
                origin: origin.clone(),
                trigger: Trigger::Command,
                source,
            };

            match self.tracker.track(request).await {
                Ok(_) if self.tracker.settings().notify_on_start => {}
                Ok(_) => reply.push_str(&format!("added check for `{}`\n", resolved.query)),
                Err(e) => reply.push_str(&format!("error adding `{}`: {e}\n", resolved.query)),
            }
        }

        reply
    }

    fn help(&self) -> String {
        format!(
            "how2basic:
`!disable` disables auto-monitoring (for you) and clears all of *your* checks
`!enable` enables auto-monitoring (for you)
`!check <host/ip>...` starts checks for the given hosts
`!active` lists all active host/ip checks
`!clearall` clears all checks
`!clear [query]` clear checks matching *query*, or all of *your* checks
`!help` this help info
`message-reactions` start monitoring by adding the :{}: reaction to a message with an ip/host",
            self.reaction_trigger
        )
    }
}
