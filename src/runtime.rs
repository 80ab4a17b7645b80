//! Command dispatch and event delivery for registered scripts.
//!
//! The runtime owns an index of every registered command (keyed by lower-cased
//! name and alias) and every event trigger. Registration swaps the whole
//! index, so an invocation running during a reload keeps the scripts it
//! started with.
//!
//! Each invocation gets its own [`ExecutionContext`] and therefore its own
//! variable scope, released when the context drops. A panic escaping an
//! action list is caught here; the scope is still released.

use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use crate::ast::{CommandDef, EventKind, EventTrigger, Script};
use crate::config::{MessageConfig, VskConfig};
use crate::eval::color::translate_color_codes;
use crate::eval::context::ExecutionContext;
use crate::eval::executor::ActionExecutor;
use crate::event::HostEvent;
use crate::provider::capabilities::host::{ProxyHost, Session};
use crate::variable::VariableManager;

/// What happened to a command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CommandOutcome {
    /// No command or alias by that label
    Unknown,
    /// Invoked without a session, e.g. from the console
    PlayersOnly,
    PermissionDenied,
    /// Too few arguments; the usage line was sent
    Usage,
    Executed,
    /// The action list panicked; the generic failure notice was sent
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub commands: usize,
    pub aliases: usize,
    pub triggers: BTreeMap<EventKind, usize>,
}

#[derive(Debug, Default)]
struct ScriptIndex {
    commands: HashMap<String, Arc<CommandDef>>,
    command_count: usize,
    events: HashMap<EventKind, Vec<Arc<EventTrigger>>>,
}

impl ScriptIndex {
    fn build(scripts: &[Script]) -> Self {
        let mut index = ScriptIndex::default();
        let mut aliases = Vec::new();

        for script in scripts {
            for command in &script.commands {
                let command = Arc::new(command.clone());
                let label = command.name.to_lowercase();
                if index.commands.insert(label, Arc::clone(&command)).is_some() {
                    warn!(
                        "Command /{} from script {} replaces an earlier definition",
                        command.name, script.name
                    );
                } else {
                    index.command_count += 1;
                }
                info!("Registered command: /{}", command.name);
                aliases.extend(command.aliases.iter().map(|a| (a.to_lowercase(), Arc::clone(&command))));
            }
            for trigger in &script.events {
                index
                    .events
                    .entry(trigger.kind)
                    .or_default()
                    .push(Arc::new(trigger.clone()));
            }
        }

        // Aliases never shadow a command name.
        for (alias, command) in aliases {
            if index.commands.contains_key(&alias) {
                warn!("Alias /{} of /{} is already taken", alias, command.name);
                continue;
            }
            debug!("Registered alias: /{} -> /{}", alias, command.name);
            index.commands.insert(alias, command);
        }
        index
    }
}

pub struct ScriptRuntime {
    executor: ActionExecutor,
    variables: Arc<VariableManager>,
    messages: MessageConfig,
    translate_colors: bool,
    index: RwLock<Arc<ScriptIndex>>,
}

impl ScriptRuntime {
    pub fn new(host: Arc<dyn ProxyHost>, variables: Arc<VariableManager>, config: &VskConfig) -> Self {
        Self {
            executor: ActionExecutor::with_config(host, config),
            variables,
            messages: config.messages.clone(),
            translate_colors: config.translate_color_codes,
            index: RwLock::new(Arc::new(ScriptIndex::default())),
        }
    }

    pub fn variables(&self) -> &Arc<VariableManager> {
        &self.variables
    }

    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    /// Replace every registered command and trigger with those of `scripts`.
    pub fn register(&self, scripts: &[Script]) {
        let index = Arc::new(ScriptIndex::build(scripts));
        info!(
            "Registered {} command(s) and {} event trigger(s) from {} script(s)",
            index.command_count,
            index.events.values().map(Vec::len).sum::<usize>(),
            scripts.len()
        );
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = index;
    }

    fn index(&self) -> Arc<ScriptIndex> {
        Arc::clone(&self.index.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Look up a command by name or alias.
    pub fn command(&self, label: &str) -> Option<Arc<CommandDef>> {
        let label = label.trim_start_matches('/').to_lowercase();
        self.index().commands.get(&label).cloned()
    }

    /// Run the command registered under `label` for `session`.
    pub fn dispatch_command(
        &self,
        label: &str,
        session: Option<Arc<dyn Session>>,
        args: &[String],
    ) -> CommandOutcome {
        let Some(command) = self.command(label) else {
            debug!("Unknown command: /{}", label);
            return CommandOutcome::Unknown;
        };
        let Some(session) = session else {
            info!("/{}: {}", command.name, self.messages.players_only);
            return CommandOutcome::PlayersOnly;
        };

        if let Some(permission) = command.permission.as_deref().filter(|p| !p.is_empty()) {
            if !session.has_permission(permission) {
                let message = command
                    .permission_message
                    .as_deref()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(&self.messages.permission_denied);
                self.notify(session.as_ref(), message);
                debug!("{} lacks {} for /{}", session.name(), permission, command.name);
                return CommandOutcome::PermissionDenied;
            }
        }

        if args.len() < command.arguments.len() {
            let usage = format!("{}{}", self.messages.usage_prefix, command.usage_or_default());
            self.notify(session.as_ref(), &usage);
            return CommandOutcome::Usage;
        }

        let ctx = ExecutionContext::new(&self.variables)
            .with_session(Arc::clone(&session))
            .with_arguments(&command.arguments, args);
        debug!("Executing /{} for {} in scope {:?}", command.name, session.name(), ctx.scope_id());

        let result = catch_unwind(AssertUnwindSafe(|| {
            self.executor.execute(&command.actions, &ctx)
        }));
        match result {
            Ok(()) => CommandOutcome::Executed,
            Err(_) => {
                error!(
                    "Error executing command /{} for player {}",
                    command.name,
                    session.name()
                );
                self.notify(session.as_ref(), &self.messages.command_failed);
                CommandOutcome::Failed
            }
        }
    }

    /// Run every trigger registered for the event's kind, in registration
    /// order, sharing one scope. Returns the number of triggers run.
    pub fn fire(&self, event: &HostEvent, session: &Arc<dyn Session>) -> usize {
        let index = self.index();
        let kind = event.kind();
        let Some(triggers) = index.events.get(&kind).filter(|t| !t.is_empty()) else {
            return 0;
        };

        let ctx = ExecutionContext::new(&self.variables)
            .with_session(Arc::clone(session))
            .with_event_data(event.event_data(session.as_ref()));
        debug!("Firing {} trigger(s) for {} ({})", triggers.len(), kind, session.name());

        for trigger in triggers {
            let result = catch_unwind(AssertUnwindSafe(|| {
                self.executor.execute(&trigger.actions, &ctx)
            }));
            if result.is_err() {
                error!(
                    "Error executing {} trigger from script {}",
                    kind, trigger.script_name
                );
            }
        }
        triggers.len()
    }

    pub fn stats(&self) -> RuntimeStats {
        let index = self.index();
        RuntimeStats {
            commands: index.command_count,
            aliases: index.commands.len() - index.command_count,
            triggers: index
                .events
                .iter()
                .map(|(kind, triggers)| (*kind, triggers.len()))
                .collect(),
        }
    }

    fn notify(&self, session: &dyn Session, message: &str) {
        let message = if self.translate_colors {
            translate_color_codes(message)
        } else {
            message.to_string()
        };
        if let Err(e) = session.send_message(&message) {
            warn!("Failed to notify {}: {}", session.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::parse_named;
    use crate::provider::capabilities::host::{Destination, HostError};
    use crate::provider::plugins::host::in_memory::{InMemoryProxy, InMemorySession};
    use crate::provider::plugins::storage::in_memory::InMemoryStore;
    use uuid::Uuid;

    const SCRIPT: &str = r#"
command /hello <name>:
    permission: vsk.hello
    permission message: &cNo hello for you
    aliases: hi, /hey
    trigger:
        set {_greeting} to "Hello"
        send "{_greeting} %name%!"

command /hi:
    trigger:
        send "plain hi"

on join:
    send "Welcome %player%"
on join:
    set {joins::%player%} to "yes"
"#;

    struct Fixture {
        proxy: InMemoryProxy,
        variables: Arc<VariableManager>,
        runtime: ScriptRuntime,
    }

    fn fixture() -> Fixture {
        let proxy = InMemoryProxy::new();
        let variables = Arc::new(VariableManager::new(Arc::new(InMemoryStore::new())));
        let runtime = ScriptRuntime::new(
            Arc::new(proxy.clone()),
            Arc::clone(&variables),
            &VskConfig::default(),
        );
        runtime.register(&[parse_named("test", SCRIPT).unwrap()]);
        Fixture {
            proxy,
            variables,
            runtime,
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_dispatch_executes_and_releases_scope() {
        let f = fixture();
        let alice = f.proxy.connect(InMemorySession::new("Alice").with_permission("vsk.hello"));
        let outcome = f.runtime.dispatch_command("hello", Some(alice.clone()), &args(&["Bob"]));
        assert_eq!(outcome, CommandOutcome::Executed);
        assert_eq!(alice.messages(), vec!["Hello Bob!"]);
        assert_eq!(f.variables.stats().scopes, 0);
    }

    #[test]
    fn test_aliases_do_not_shadow_commands() {
        let f = fixture();
        let alice = f.proxy.connect(InMemorySession::new("Alice").operator());
        f.runtime.dispatch_command("/HI", Some(alice.clone()), &[]);
        f.runtime.dispatch_command("hey", Some(alice.clone()), &args(&["Carol"]));
        assert_eq!(alice.messages(), vec!["plain hi", "Hello Carol!"]);
        assert_eq!(
            f.runtime.stats(),
            RuntimeStats {
                commands: 2,
                aliases: 1,
                triggers: BTreeMap::from([(EventKind::Join, 2)]),
            }
        );
    }

    #[test]
    fn test_permission_and_usage() {
        let f = fixture();
        let bob = f.proxy.connect(InMemorySession::new("Bob"));
        assert_eq!(
            f.runtime.dispatch_command("hello", Some(bob.clone()), &args(&["x"])),
            CommandOutcome::PermissionDenied
        );
        bob.grant("vsk.hello");
        assert_eq!(
            f.runtime.dispatch_command("hello", Some(bob.clone()), &[]),
            CommandOutcome::Usage
        );
        assert_eq!(
            bob.messages(),
            vec!["§cNo hello for you", "§cUsage: /hello <name>"]
        );
    }

    #[test]
    fn test_unknown_and_console() {
        let f = fixture();
        assert_eq!(
            f.runtime.dispatch_command("nope", None, &[]),
            CommandOutcome::Unknown
        );
        assert_eq!(
            f.runtime.dispatch_command("hi", None, &[]),
            CommandOutcome::PlayersOnly
        );
    }

    #[test]
    fn test_fire_runs_triggers_in_order() {
        let f = fixture();
        let alice = f.proxy.connect(InMemorySession::new("Alice"));
        let session: Arc<dyn Session> = alice.clone();
        assert_eq!(f.runtime.fire(&HostEvent::Join, &session), 2);
        assert_eq!(alice.messages(), vec!["Welcome Alice"]);
        assert_eq!(
            f.variables.list_entries("{joins::*}"),
            BTreeMap::from([("joins::Alice".to_string(), "yes".to_string())])
        );
        assert_eq!(f.runtime.fire(&HostEvent::Quit, &session), 0);
        assert_eq!(f.variables.stats().scopes, 0);
    }

    #[test]
    fn test_register_replaces_index() {
        let f = fixture();
        f.runtime.register(&[]);
        assert_eq!(f.runtime.stats(), RuntimeStats::default());
        assert!(f.runtime.command("hello").is_none());
    }

    struct Exploding;

    impl Session for Exploding {
        fn name(&self) -> String {
            "Boom".to_string()
        }
        fn unique_id(&self) -> Uuid {
            Uuid::nil()
        }
        fn current_destination(&self) -> Option<String> {
            None
        }
        fn send_message(&self, message: &str) -> Result<(), HostError> {
            if message == "plain hi" {
                panic!("host bug");
            }
            Ok(())
        }
        fn transfer(&self, _destination: &dyn Destination) -> Result<(), HostError> {
            Ok(())
        }
        fn has_permission(&self, _permission: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_panic_is_contained() {
        let f = fixture();
        let outcome = f.runtime.dispatch_command("hi", Some(Arc::new(Exploding)), &[]);
        assert_eq!(outcome, CommandOutcome::Failed);
        assert_eq!(f.variables.stats().scopes, 0);
    }
}
