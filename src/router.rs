//! Performative router: illocutionary force → mental update.
//!
//! A fixed lookup table maps each recognized performative to the
//! `(trigger, goal type)` pair the reasoning engine understands, and builds
//! the payload term appropriate to that performative class: the how-family
//! wraps the raw body text in `plain_text`, everything else decodes through
//! the term codec. The routed term is annotated with the sender's address
//! before it is queued.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{BdiError, ProtocolError};
use crate::queue::MentalUpdate;
use crate::term::{GoalType, Term, Trigger};
use crate::transport::AgentMessage;

/// The communicative intent tag of a mediation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Performative {
    Tell,
    Untell,
    Achieve,
    Unachieve,
    TellHow,
    UntellHow,
    AskHow,
}

impl Performative {
    /// The wire tag carried in `ilf_type` metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tell => "tell",
            Self::Untell => "untell",
            Self::Achieve => "achieve",
            Self::Unachieve => "unachieve",
            Self::TellHow => "tellHow",
            Self::UntellHow => "untellHow",
            Self::AskHow => "askHow",
        }
    }

    /// The fixed `(trigger, goal type)` mapping.
    pub fn mapping(&self) -> (Trigger, GoalType) {
        match self {
            Self::Tell => (Trigger::Addition, GoalType::Belief),
            Self::Untell => (Trigger::Removal, GoalType::Belief),
            Self::Achieve => (Trigger::Addition, GoalType::Achievement),
            Self::Unachieve => (Trigger::Removal, GoalType::Achievement),
            Self::TellHow => (Trigger::Addition, GoalType::TellHow),
            Self::UntellHow => (Trigger::Removal, GoalType::UntellHow),
            Self::AskHow => (Trigger::Addition, GoalType::AskHow),
        }
    }

    /// Whether the payload is a raw plan text rather than an encoded term.
    pub fn carries_plain_text(&self) -> bool {
        matches!(self, Self::TellHow | Self::UntellHow | Self::AskHow)
    }
}

impl FromStr for Performative {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tell" => Ok(Self::Tell),
            "untell" => Ok(Self::Untell),
            "achieve" => Ok(Self::Achieve),
            "unachieve" => Ok(Self::Unachieve),
            "tellHow" => Ok(Self::TellHow),
            "untellHow" => Ok(Self::UntellHow),
            "askHow" => Ok(Self::AskHow),
            other => Err(ProtocolError::UnknownPerformative { ilf: other.into() }),
        }
    }
}

impl fmt::Display for Performative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Route one inbound mediation message into a pending mental update.
///
/// Fails on an unknown or missing illocutionary force and on malformed
/// structured bodies; the failure is fatal for this message only.
pub fn route(msg: &AgentMessage) -> Result<MentalUpdate, BdiError> {
    let ilf = msg.ilf_type().ok_or(ProtocolError::MissingIlf)?;
    let performative = Performative::from_str(ilf)?;
    let (trigger, goal_type) = performative.mapping();

    let payload = if performative.carries_plain_text() {
        Term::plain_text(msg.body.clone())
    } else {
        codec::decode(&msg.body)?
    };

    let term = payload.with_source(msg.sender.clone());
    Ok(MentalUpdate::new(trigger, goal_type, term))
}

// ── Tests ────────────────────────────────────────────────────────────────
