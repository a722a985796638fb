//! # medu-ib
//!
//! A BDI mediation layer: lets autonomous agents exchange beliefs,
//! goals, and plans as speech-act messages and have them applied to a
//! symbolic mental state owned by a pluggable reasoning engine.
//!
//! ## Architecture
//!
//! - **Term codec** (`codec`): wire-form text ⇄ structured logical terms
//! - **Belief facade** (`beliefs`): single-current-value semantics over the
//!   engine's multi-fact storage
//! - **Performative router** (`router`): illocutionary force → mental update
//! - **Outbound bridge** (`action`): the `.send/3` action and action registry
//! - **Mediation cycle** (`cycle`): poll → snapshot drain → one inference step
//! - **Plan-query responder** (`plan_query`): answers `askHow` with `tellHow`
//!
//! The transport ([`transport::Transport`]) and the reasoning engine
//! ([`reasoner::Reasoner`]) are collaborators consumed through traits;
//! an in-process bus and an inference-free reference engine are provided.
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use medu_ib::agent::BdiAgent;
//! use medu_ib::cycle::MediatorConfig;
//! use medu_ib::reasoner::MemoryReasoner;
//! use medu_ib::term::Value;
//! use medu_ib::transport::LocalBus;
//!
//! # #[tokio::main] async fn main() -> miette::Result<()> {
//! let bus = LocalBus::new();
//! let mut agent = BdiAgent::new(
//!     "slave_1@host",
//!     Arc::new(bus.endpoint("slave_1@host")),
//!     MemoryReasoner::new("slave_1@host"),
//!     Some("receiver.asl".into()),
//!     MediatorConfig::default(),
//! )?;
//! agent.set_belief("master", vec![Value::atom("master@host")]);
//! agent.run().await;
//! # Ok(()) }
//! ```

pub mod action;
pub mod agent;
pub mod beliefs;
pub mod codec;
pub mod cycle;
pub mod error;
pub mod plan_query;
pub mod queue;
pub mod reasoner;
pub mod router;
pub mod term;
pub mod transport;

pub use action::{Action, ActionRegistry, SendAction};
pub use agent::BdiAgent;
pub use beliefs::{BeliefFacade, BeliefResult};
pub use cycle::{MediatorConfig, TickResult};
pub use error::{BdiError, BdiResult, BeliefError, CodecError, ProtocolError, ReasonerError};
pub use plan_query::PlanQueryResponder;
pub use queue::{MentalUpdate, UpdateQueue};
pub use reasoner::{MemoryReasoner, PlanDef, PlanLibrary, PlanQueryHandler, Reasoner};
pub use router::Performative;
pub use term::{GoalType, Intention, Signature, Term, Trigger, Value};
pub use transport::{AgentMessage, BusEndpoint, LocalBus, Transport, TransportError};
