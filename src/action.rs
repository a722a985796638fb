//! Reasoner-invocable actions and the outbound send bridge.
//!
//! Actions are the reasoning engine's interface back to the host: each
//! implements the [`Action`] trait and is registered in an [`ActionRegistry`]
//! keyed by name and arity. Registration happens once at agent construction;
//! there is no runtime patching of engine internals.
//!
//! [`SendAction`] is the built-in `.send/3` action that turns a
//! `(recipients, performative, payload)` invocation into one outbound
//! message per recipient.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec;
use crate::error::{BdiResult, ReasonerError};
use crate::term::{Intention, Value};
use crate::transport::{AgentMessage, Transport};

/// An action the reasoning engine may invoke during inference.
pub trait Action: Send + Sync {
    /// Action name, including any leading dot (e.g. `.send`).
    fn name(&self) -> &str;

    /// Number of arguments the action takes.
    fn arity(&self) -> usize;

    /// Execute with the invocation's arguments and binding context.
    fn execute(&self, args: &[Value], intention: &Intention) -> BdiResult<()>;
}

/// Registry of actions keyed by `(name, arity)`.
///
/// If an action with the same key is registered twice, the later one wins.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<(String, usize), Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: Arc<dyn Action>) {
        self.actions
            .insert((action.name().to_string(), action.arity()), action);
    }

    pub fn get(&self, name: &str, arity: usize) -> Option<&Arc<dyn Action>> {
        self.actions.get(&(name.to_string(), arity))
    }

    /// Execute an action by name and arity.
    pub fn execute(&self, name: &str, args: &[Value], intention: &Intention) -> BdiResult<()> {
        let action = self.get(name, args.len()).ok_or_else(|| {
            ReasonerError::UnknownAction {
                name: name.to_string(),
                arity: args.len(),
            }
        })?;
        action.execute(args, intention)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ── SendAction ───────────────────────────────────────────────────────────

/// The `.send/3` action: `(recipients, performative, payload)`.
///
/// Recipients may be a single address or a list; each yields one
/// independently sent message. The performative argument must be an atom;
/// anything else makes the invocation a quiet no-op. Sending is
/// fire-and-forget; the engine regains control as soon as transmission is
/// scheduled.
pub struct SendAction {
    transport: Arc<dyn Transport>,
}

impl SendAction {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// The shared sending path: one mediation message with the given
    /// illocutionary force and raw body. Also used by the plan-query
    /// responder to route `tellHow` replies.
    pub fn dispatch(&self, recipient: &str, ilf: &str, body: String) -> BdiResult<()> {
        self.transport
            .send(AgentMessage::bdi(recipient, ilf, body))?;
        tracing::debug!(to = recipient, ilf, "outbound mediation message scheduled");
        Ok(())
    }

    fn recipient_addresses(value: &Value) -> Vec<String> {
        match value {
            Value::Tuple(items) => items
                .iter()
                .flat_map(Self::recipient_addresses)
                .collect(),
            Value::Str(s) => vec![s.clone()],
            Value::Term(t) if t.is_atom() => vec![t.functor().to_string()],
            _ => Vec::new(),
        }
    }
}

impl Action for SendAction {
    fn name(&self) -> &str {
        ".send"
    }

    fn arity(&self) -> usize {
        3
    }

    fn execute(&self, args: &[Value], intention: &Intention) -> BdiResult<()> {
        let [recipients, performative, payload] = args else {
            return Err(ReasonerError::UpdateRejected {
                message: format!(".send expects 3 arguments, got {}", args.len()),
            }
            .into());
        };

        let Some(ilf) = performative.frozen(intention).as_atom().map(String::from) else {
            // Non-atom performative: mirror the engine convention of yielding
            // without sending rather than failing the whole intention.
            tracing::debug!("non-atom performative in .send, nothing sent");
            return Ok(());
        };

        let body = codec::encode_value(&payload.frozen(intention));
        for recipient in Self::recipient_addresses(&recipients.frozen(intention)) {
            self.dispatch(&recipient, &ilf, body.clone())?;
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
