//! Agent-communication transport abstraction.
//!
//! The [`Transport`] trait is the seam between the mediation layer and
//! whatever messaging fabric the host process uses (XMPP, AMQP, an
//! in-process bus). Both operations are non-blocking: `try_receive` is a
//! zero-timeout poll, `send` is fire-and-forget.
//!
//! [`LocalBus`] is the provided in-process implementation, used by the test
//! suite and by embedders running several agents in one process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Metadata key carrying the protocol tag.
pub const PERFORMATIVE_KEY: &str = "performative";
/// Metadata key carrying the illocutionary force.
pub const ILF_KEY: &str = "ilf_type";
/// The reserved protocol tag identifying mediation messages.
pub const MEDIATION_TAG: &str = "BDI";

// ── Errors ───────────────────────────────────────────────────────────────

/// Errors specific to the transport layer.
#[derive(Debug, Error, Diagnostic)]
pub enum TransportError {
    #[error("no route to recipient \"{to}\"")]
    #[diagnostic(
        code(medu::transport::unknown_recipient),
        help("The recipient has no endpoint on this bus. Register it first with `LocalBus::endpoint`.")
    )]
    UnknownRecipient { to: String },

    #[error("transport closed for \"{address}\"")]
    #[diagnostic(
        code(medu::transport::closed),
        help("The underlying channel was dropped; the endpoint can no longer send or receive.")
    )]
    Closed { address: String },
}

/// Convenience alias for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

// ── Message ──────────────────────────────────────────────────────────────

/// A wire message: addressing, text body, and a flat metadata map.
///
/// Mediation messages carry `performative = "BDI"` plus an `ilf_type`; other
/// metadata passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Sender address; stamped by the transport on send.
    #[serde(default)]
    pub sender: String,
    /// Recipient address.
    pub to: String,
    /// Wire-form body text.
    pub body: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl AgentMessage {
    pub fn new(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: String::new(),
            to: to.into(),
            body: body.into(),
            metadata: HashMap::new(),
        }
    }

    /// Build a mediation-protocol message with the given illocutionary force.
    pub fn bdi(to: impl Into<String>, ilf: &str, body: impl Into<String>) -> Self {
        let mut msg = Self::new(to, body);
        msg.metadata
            .insert(PERFORMATIVE_KEY.to_string(), MEDIATION_TAG.to_string());
        msg.metadata.insert(ILF_KEY.to_string(), ilf.to_string());
        msg
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The illocutionary-force tag, if present.
    pub fn ilf_type(&self) -> Option<&str> {
        self.metadata.get(ILF_KEY).map(|s| s.as_str())
    }

    /// Whether this message carries the reserved mediation-protocol tag.
    pub fn is_mediation(&self) -> bool {
        self.metadata.get(PERFORMATIVE_KEY).map(|s| s.as_str()) == Some(MEDIATION_TAG)
    }
}

// ── Transport trait ──────────────────────────────────────────────────────

/// A messaging fabric endpoint owned by one agent.
///
/// Implementations must be cheap to call from the cycle loop: `try_receive`
/// never blocks and `send` returns as soon as transmission is scheduled.
pub trait Transport: Send + Sync {
    /// The local address messages from this endpoint are stamped with.
    fn address(&self) -> &str;

    /// Schedule a message for delivery. Fire-and-forget.
    fn send(&self, msg: AgentMessage) -> TransportResult<()>;

    /// Zero-timeout poll for one pending inbound message.
    fn try_receive(&self) -> TransportResult<Option<AgentMessage>>;
}

// ── LocalBus ─────────────────────────────────────────────────────────────

/// In-process message bus routing by exact recipient address.
#[derive(Debug, Clone, Default)]
pub struct LocalBus {
    routes: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<AgentMessage>>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an address on the bus and return its endpoint. Re-registering
    /// an address replaces the previous endpoint's mailbox.
    pub fn endpoint(&self, address: impl Into<String>) -> BusEndpoint {
        let address = address.into();
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.lock().unwrap().insert(address.clone(), tx);
        BusEndpoint {
            address,
            bus: self.clone(),
            rx: Mutex::new(rx),
        }
    }

    fn deliver(&self, msg: AgentMessage) -> TransportResult<()> {
        let routes = self.routes.lock().unwrap();
        let tx = routes
            .get(&msg.to)
            .ok_or_else(|| TransportError::UnknownRecipient {
                to: msg.to.clone(),
            })?;
        tx.send(msg).map_err(|e| TransportError::UnknownRecipient {
            to: e.0.to.clone(),
        })
    }
}

/// One agent's endpoint on a [`LocalBus`].
pub struct BusEndpoint {
    address: String,
    bus: LocalBus,
    rx: Mutex<mpsc::UnboundedReceiver<AgentMessage>>,
}

impl Transport for BusEndpoint {
    fn address(&self) -> &str {
        &self.address
    }

    fn send(&self, mut msg: AgentMessage) -> TransportResult<()> {
        msg.sender = self.address.clone();
        self.bus.deliver(msg)
    }

    fn try_receive(&self) -> TransportResult<Option<AgentMessage>> {
        match self.rx.lock().unwrap().try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(TransportError::Closed {
                address: self.address.clone(),
            }),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
