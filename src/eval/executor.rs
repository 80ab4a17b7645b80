//! Tree-walking action executor.
//!
//! Actions run strictly in order. Each action either succeeds or yields an
//! [`ExecutionError`]; errors are logged and the next action runs regardless.
//! Nothing an action does can abort the list or reach the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::color::translate_color_codes;
use super::context::ExecutionContext;
use super::expression::evaluate_with_replacements;
use super::placeholder::resolve_variable_name;
use crate::ast::{
    Action, Broadcast, Conditional, DeleteVariable, MessageTarget, SendMessage, SetVariable,
    TransferSession,
};
use crate::config::{MessageConfig, VskConfig};
use crate::provider::capabilities::host::{HostError, ProxyHost, Session};

/// Why a single action had no effect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("no acting session")]
    NoSession,

    #[error("session not online: {0}")]
    SessionNotFound(String),

    #[error("destination not found: {0}")]
    DestinationNotFound(String),

    #[error("destination-member target is only valid on broadcast actions")]
    MisroutedTarget,

    #[error("no variables attached to this invocation")]
    VariablesUnavailable,

    #[error(transparent)]
    Host(#[from] HostError),
}

pub struct ActionExecutor {
    host: Arc<dyn ProxyHost>,
    translate_colors: bool,
    messages: MessageConfig,
}

impl ActionExecutor {
    pub fn new(host: Arc<dyn ProxyHost>) -> Self {
        Self::with_config(host, &VskConfig::default())
    }

    pub fn with_config(host: Arc<dyn ProxyHost>, config: &VskConfig) -> Self {
        Self {
            host,
            translate_colors: config.translate_color_codes,
            messages: config.messages.clone(),
        }
    }

    pub fn host(&self) -> &Arc<dyn ProxyHost> {
        &self.host
    }

    /// Run every action in order, isolating failures.
    pub fn execute(&self, actions: &[Action], ctx: &ExecutionContext) {
        for action in actions {
            self.execute_one(action, ctx);
        }
    }

    /// Run one action, logging instead of returning its failure.
    pub fn execute_one(&self, action: &Action, ctx: &ExecutionContext) {
        if let Err(e) = self.try_execute(action, ctx) {
            warn!("Skipped {} action: {}", action.kind(), e);
        }
    }

    /// Run one action and report its failure.
    pub fn try_execute(&self, action: &Action, ctx: &ExecutionContext) -> Result<(), ExecutionError> {
        match action {
            Action::SendMessage(send) => self.send_message(send, ctx),
            Action::TransferSession(transfer) => self.transfer_session(transfer, ctx),
            Action::BroadcastToDestinationMembers(broadcast) => self.broadcast(broadcast, ctx),
            Action::SetVariable(set) => self.set_variable(set, ctx),
            Action::DeleteVariable(delete) => self.delete_variable(delete, ctx),
            Action::Conditional(conditional) => {
                self.conditional(conditional, ctx);
                Ok(())
            }
        }
    }

    fn format(&self, message: &str, ctx: &ExecutionContext) -> String {
        let text = evaluate_with_replacements(message, ctx);
        if self.translate_colors {
            translate_color_codes(&text)
        } else {
            text
        }
    }

    fn send_message(&self, send: &SendMessage, ctx: &ExecutionContext) -> Result<(), ExecutionError> {
        let text = self.format(&send.message, ctx);
        match &send.target {
            MessageTarget::Invoker => {
                let session = ctx.session().ok_or(ExecutionError::NoSession)?;
                session.send_message(&text)?;
                debug!("Sent message to {}", session.name());
            }
            MessageTarget::Everyone => {
                deliver_all(self.host.sessions(), &text);
                debug!("Broadcast message to all sessions");
            }
            MessageTarget::Named(name) => {
                let name = evaluate_with_replacements(name, ctx);
                let session = self
                    .host
                    .session(&name)
                    .ok_or(ExecutionError::SessionNotFound(name))?;
                session.send_message(&text)?;
                debug!("Sent message to {}", session.name());
            }
            MessageTarget::DestinationMembers => return Err(ExecutionError::MisroutedTarget),
        }
        Ok(())
    }

    fn transfer_session(
        &self,
        transfer: &TransferSession,
        ctx: &ExecutionContext,
    ) -> Result<(), ExecutionError> {
        let session = match ctx.session() {
            Some(invoker) if transfer.target == "player" => Arc::clone(invoker),
            _ => {
                let name = evaluate_with_replacements(&transfer.target, ctx);
                self.host
                    .session(&name)
                    .ok_or(ExecutionError::SessionNotFound(name))?
            }
        };

        let destination_name = evaluate_with_replacements(&transfer.destination, ctx);
        let Some(destination) = self.host.destination(&destination_name) else {
            let notice = self
                .messages
                .server_not_found
                .replace("{server}", &destination_name);
            if let Err(e) = session.send_message(&notice) {
                debug!("Could not notify {}: {}", session.name(), e);
            }
            return Err(ExecutionError::DestinationNotFound(destination_name));
        };

        session.transfer(destination.as_ref())?;
        debug!(
            "Transferring {} to {}",
            session.name(),
            destination.name()
        );
        Ok(())
    }

    fn broadcast(&self, broadcast: &Broadcast, ctx: &ExecutionContext) -> Result<(), ExecutionError> {
        let text = self.format(&broadcast.message, ctx);
        let destination_name = evaluate_with_replacements(&broadcast.destination, ctx);
        let destination = self
            .host
            .destination(&destination_name)
            .ok_or(ExecutionError::DestinationNotFound(destination_name))?;
        let target = destination.name();

        let members: Vec<Arc<dyn Session>> = self
            .host
            .sessions()
            .into_iter()
            .filter(|s| s.current_destination().as_deref() == Some(target.as_str()))
            .collect();
        debug!("Sending message to {} session(s) on {}", members.len(), target);
        deliver_all(members, &text);
        Ok(())
    }

    fn set_variable(&self, set: &SetVariable, ctx: &ExecutionContext) -> Result<(), ExecutionError> {
        let name = resolve_variable_name(&set.name, ctx);
        let value = evaluate_with_replacements(&set.value, ctx);
        if !ctx.set_variable(&name, &value) {
            return Err(ExecutionError::VariablesUnavailable);
        }
        debug!("Set variable {} = {}", name, value);
        Ok(())
    }

    fn delete_variable(
        &self,
        delete: &DeleteVariable,
        ctx: &ExecutionContext,
    ) -> Result<(), ExecutionError> {
        let name = resolve_variable_name(&delete.name, ctx);
        if !ctx.delete_variable(&name) {
            return Err(ExecutionError::VariablesUnavailable);
        }
        debug!("Deleted variable {}", name);
        Ok(())
    }

    fn conditional(&self, conditional: &Conditional, ctx: &ExecutionContext) {
        if conditional.condition.evaluate(ctx) {
            self.execute(&conditional.if_branch, ctx);
        } else {
            self.execute(&conditional.else_branch, ctx);
        }
    }
}

fn deliver_all(sessions: Vec<Arc<dyn Session>>, text: &str) {
    for session in sessions {
        if let Err(e) = session.send_message(text) {
            warn!("Could not deliver message to {}: {}", session.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::condition::Condition;
    use crate::provider::plugins::host::in_memory::{InMemoryProxy, InMemorySession};
    use crate::provider::plugins::storage::in_memory::InMemoryStore;
    use crate::variable::VariableManager;

    struct Fixture {
        proxy: InMemoryProxy,
        executor: ActionExecutor,
        vars: Arc<VariableManager>,
    }

    fn fixture() -> Fixture {
        let proxy = InMemoryProxy::new();
        proxy.add_destination("lobby");
        proxy.add_destination("survival");
        proxy.connect(InMemorySession::new("Alice").with_destination("lobby"));
        proxy.connect(InMemorySession::new("Bob").with_destination("survival"));
        proxy.connect(InMemorySession::new("Carol").with_destination("lobby"));
        Fixture {
            executor: ActionExecutor::new(Arc::new(proxy.clone())),
            proxy,
            vars: Arc::new(VariableManager::new(Arc::new(InMemoryStore::new()))),
        }
    }

    impl Fixture {
        fn context_for(&self, name: &str) -> ExecutionContext {
            let session: Arc<dyn Session> = self.proxy.player(name).unwrap();
            ExecutionContext::new(&self.vars).with_session(session)
        }

        fn messages(&self, name: &str) -> Vec<String> {
            self.proxy.player(name).unwrap().messages()
        }
    }

    fn send(message: &str, target: MessageTarget) -> Action {
        Action::SendMessage(SendMessage {
            message: message.to_string(),
            target,
        })
    }

    #[test]
    fn test_send_targets() {
        let f = fixture();
        let ctx = f.context_for("Alice");
        f.executor.execute(
            &[
                send("&aHi %player%", MessageTarget::Invoker),
                send("all", MessageTarget::Everyone),
                send("psst", MessageTarget::Named("Bob".to_string())),
            ],
            &ctx,
        );
        assert_eq!(f.messages("Alice"), vec!["§aHi Alice", "all"]);
        assert_eq!(f.messages("Bob"), vec!["all", "psst"]);
        assert_eq!(f.messages("Carol"), vec!["all"]);
    }

    #[test]
    fn test_failures_do_not_stop_the_list() {
        let f = fixture();
        let ctx = f.context_for("Alice");
        f.executor.execute(
            &[
                send("lost", MessageTarget::Named("Nobody".to_string())),
                send("lost", MessageTarget::DestinationMembers),
                send("still here", MessageTarget::Invoker),
            ],
            &ctx,
        );
        assert_eq!(f.messages("Alice"), vec!["still here"]);
    }

    #[test]
    fn test_try_execute_reports_errors() {
        let f = fixture();
        let ctx = ExecutionContext::default();
        assert_eq!(
            f.executor
                .try_execute(&send("x", MessageTarget::Invoker), &ctx),
            Err(ExecutionError::NoSession)
        );
        assert_eq!(
            f.executor.try_execute(
                &Action::SetVariable(SetVariable {
                    name: "{x}".to_string(),
                    value: "1".to_string()
                }),
                &ctx
            ),
            Err(ExecutionError::VariablesUnavailable)
        );
    }

    #[test]
    fn test_transfer() {
        let f = fixture();
        let ctx = f.context_for("Alice");
        f.executor.execute(
            &[Action::TransferSession(TransferSession {
                target: "player".to_string(),
                destination: "survival".to_string(),
            })],
            &ctx,
        );
        let alice = f.proxy.player("Alice").unwrap();
        assert_eq!(alice.transfers(), vec!["survival"]);
    }

    #[test]
    fn test_transfer_unknown_destination_notifies() {
        let f = fixture();
        let ctx = f.context_for("Alice");
        let result = f.executor.try_execute(
            &Action::TransferSession(TransferSession {
                target: "player".to_string(),
                destination: "nowhere".to_string(),
            }),
            &ctx,
        );
        assert_eq!(
            result,
            Err(ExecutionError::DestinationNotFound("nowhere".to_string()))
        );
        assert_eq!(f.messages("Alice"), vec!["§cServer not found: nowhere"]);
    }

    #[test]
    fn test_broadcast_to_destination_members() {
        let f = fixture();
        let ctx = f.context_for("Bob");
        f.executor.execute(
            &[Action::BroadcastToDestinationMembers(Broadcast {
                message: "%player% says hi".to_string(),
                destination: "lobby".to_string(),
            })],
            &ctx,
        );
        assert_eq!(f.messages("Alice"), vec!["Bob says hi"]);
        assert_eq!(f.messages("Carol"), vec!["Bob says hi"]);
        assert!(f.messages("Bob").is_empty());
    }

    #[test]
    fn test_variables_and_conditional() {
        let f = fixture();
        let ctx = f.context_for("Alice");
        let actions = vec![
            Action::SetVariable(SetVariable {
                name: "{coins::%player%}".to_string(),
                value: "5".to_string(),
            }),
            Action::Conditional(Conditional {
                condition: Condition::parse("{coins::%player%} > 3"),
                if_branch: vec![send("rich {coins::%player%}", MessageTarget::Invoker)],
                else_branch: vec![send("poor", MessageTarget::Invoker)],
            }),
            Action::DeleteVariable(DeleteVariable {
                name: "{coins::%player%}".to_string(),
            }),
        ];
        f.executor.execute(&actions, &ctx);

        assert_eq!(f.messages("Alice"), vec!["rich 5"]);
        assert!(!ctx.is_variable_set("{coins::Alice}").unwrap());
    }

    #[test]
    fn test_session_braces_in_variable_names() {
        let f = fixture();
        let ctx = f.context_for("Alice");
        let actions = vec![
            Action::SetVariable(SetVariable {
                name: "{coins::{player}}".to_string(),
                value: "7".to_string(),
            }),
            Action::Conditional(Conditional {
                condition: Condition::parse("{coins::{player}} is set"),
                if_branch: vec![send("Coins: {coins::{player}}", MessageTarget::Invoker)],
                else_branch: vec![],
            }),
        ];
        f.executor.execute(&actions, &ctx);

        assert_eq!(f.messages("Alice"), vec!["Coins: 7"]);
        assert_eq!(ctx.get_variable("{coins::Alice}").as_deref(), Some("7"));
    }
}
