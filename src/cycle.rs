//! Mediation cycle: the cooperative scheduling loop.
//!
//! One Enabled tick polls the transport for at most one mediation message,
//! routes it into the pending-update queue, drains a snapshot of that queue
//! into the reasoning engine, and advances inference by a single step.
//! Disabled agents idle and re-check. Pausing is observed between ticks
//! only: a tick in progress always completes its drain and step.
//!
//! Every failure is local to the tick, message, or update that produced it;
//! the loop itself never dies.

use std::time::Duration;

use crate::agent::BdiAgent;
use crate::error::BdiError;
use crate::reasoner::Reasoner;
use crate::router;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Pacing for the mediation loop.
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    /// Delay between Enabled ticks (default: 10 ms).
    pub cycle_interval: Duration,
    /// Idle re-check interval while Disabled (default: 100 ms).
    pub idle_interval: Duration,
    /// Maximum Enabled ticks before [`run`] returns (0 = unlimited).
    pub max_ticks: usize,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_millis(10),
            idle_interval: Duration::from_millis(100),
            max_ticks: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// What one Enabled tick did.
#[derive(Debug, Default)]
pub struct TickResult {
    /// An inbound mediation message was routed into the queue.
    pub message_routed: bool,
    /// How many pending updates this tick's drain applied.
    pub updates_applied: usize,
    /// Whether the inference step found work to do.
    pub stepped: bool,
    /// The routing failure, if this tick's inbound message was dropped.
    pub routing_error: Option<BdiError>,
}

/// Run one Enabled tick: poll, drain, step.
pub fn run_tick<R: Reasoner>(agent: &mut BdiAgent<R>) -> TickResult {
    agent.tick_count += 1;
    let mut result = TickResult::default();

    // ── Poll ────────────────────────────────────────────────────────────
    match agent.transport.try_receive() {
        Ok(Some(msg)) if msg.is_mediation() => match router::route(&msg) {
            Ok(update) => {
                agent.queue.push(update);
                result.message_routed = true;
            }
            Err(err) => {
                tracing::warn!(sender = %msg.sender, error = %err, "inbound mediation message dropped");
                result.routing_error = Some(err);
            }
        },
        Ok(Some(msg)) => {
            tracing::debug!(sender = %msg.sender, "ignoring non-mediation message");
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(error = %err, "transport poll failed");
        }
    }

    // ── Drain ───────────────────────────────────────────────────────────
    // Snapshot first: updates appended while we apply (by belief-API calls
    // on other tasks) stay in the live queue for the next tick.
    for update in agent.queue.snapshot() {
        if let Err(err) = agent.reasoner.call(update) {
            tracing::warn!(error = %err, "mental update rejected by engine");
        }
        agent.queue.pop();
        result.updates_applied += 1;
    }

    // ── Step ────────────────────────────────────────────────────────────
    match agent.reasoner.step() {
        Ok(worked) => result.stepped = worked,
        Err(err) => {
            tracing::warn!(error = %err, "inference step failed");
        }
    }

    result
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Drive the mediation loop for the agent's lifetime.
///
/// Returns only when `max_ticks` is reached; embedders wanting external
/// shutdown should select against this future or drop it.
pub async fn run<R: Reasoner>(agent: &mut BdiAgent<R>) {
    tracing::info!(agent = %agent.jid(), "mediation loop started");
    let mut ticks = 0usize;
    loop {
        if agent.is_enabled() {
            run_tick(agent);
            ticks += 1;
            if agent.config.max_ticks > 0 && ticks >= agent.config.max_ticks {
                tracing::info!(ticks, "mediation loop reached max ticks, stopping");
                break;
            }
            tokio::time::sleep(agent.config.cycle_interval).await;
        } else {
            tokio::time::sleep(agent.config.idle_interval).await;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::MemoryReasoner;
    use crate::term::Value;
    use crate::transport::{AgentMessage, LocalBus, Transport};
    use std::sync::Arc;

    fn test_config() -> MediatorConfig {
        MediatorConfig {
            cycle_interval: Duration::from_millis(1),
            idle_interval: Duration::from_millis(5),
            max_ticks: 0,
        }
    }

    fn test_agent(bus: &LocalBus, jid: &str) -> BdiAgent<MemoryReasoner> {
        let agent = BdiAgent::new(
            jid,
            Arc::new(bus.endpoint(jid)),
            MemoryReasoner::new(jid),
            None,
            test_config(),
        )
        .unwrap();
        agent.resume_bdi();
        agent
    }

    #[test]
    fn inbound_tell_becomes_a_belief_after_one_tick() {
        let bus = LocalBus::new();
        let sender = bus.endpoint("a@host");
        let mut agent = test_agent(&bus, "b@host");

        sender
            .send(AgentMessage::bdi("b@host", "tell", "likes(mary,wine)"))
            .unwrap();

        let result = run_tick(&mut agent);
        assert!(result.message_routed);
        assert_eq!(result.updates_applied, 1);

        assert_eq!(
            agent.get_belief("likes", true).unwrap().as_deref(),
            Some("likes(mary,wine)[source(a@host)]")
        );
    }

    #[test]
    fn bogus_performative_leaves_queue_and_beliefs_untouched() {
        let bus = LocalBus::new();
        let sender = bus.endpoint("a@host");
        let mut agent = test_agent(&bus, "b@host");

        sender
            .send(AgentMessage::bdi("b@host", "bogus", "likes(mary,wine)"))
            .unwrap();

        let result = run_tick(&mut agent);
        assert!(result.routing_error.is_some());
        assert!(!result.message_routed);
        assert!(agent.queue().is_empty());
        assert!(agent.get_beliefs(false).is_empty());
    }

    #[test]
    fn non_mediation_messages_are_ignored() {
        let bus = LocalBus::new();
        let sender = bus.endpoint("a@host");
        let mut agent = test_agent(&bus, "b@host");

        sender
            .send(AgentMessage::new("b@host", "unrelated chatter"))
            .unwrap();

        let result = run_tick(&mut agent);
        assert!(!result.message_routed);
        assert!(result.routing_error.is_none());
        assert!(agent.queue().is_empty());
    }

    #[test]
    fn one_message_per_tick() {
        let bus = LocalBus::new();
        let sender = bus.endpoint("a@host");
        let mut agent = test_agent(&bus, "b@host");

        sender
            .send(AgentMessage::bdi("b@host", "tell", "one"))
            .unwrap();
        sender
            .send(AgentMessage::bdi("b@host", "tell", "two"))
            .unwrap();

        run_tick(&mut agent);
        assert_eq!(agent.get_beliefs(false).len(), 1);
        run_tick(&mut agent);
        assert_eq!(agent.get_beliefs(false).len(), 2);
    }

    #[test]
    fn achievement_goal_is_stepped() {
        let bus = LocalBus::new();
        let sender = bus.endpoint("a@host");
        let mut agent = test_agent(&bus, "b@host");

        sender
            .send(AgentMessage::bdi("b@host", "achieve", "ping(a@host)"))
            .unwrap();

        let result = run_tick(&mut agent);
        assert!(result.stepped);
        assert_eq!(agent.reasoner().goal_log().len(), 1);
    }

    #[tokio::test]
    async fn paused_agent_performs_no_work() {
        let bus = LocalBus::new();
        let mut agent = test_agent(&bus, "b@host");
        agent.pause_bdi();

        agent.set_belief("battery", vec![Value::atom("full")]);
        assert_eq!(agent.queue().len(), 1);

        let _ = tokio::time::timeout(Duration::from_millis(30), run(&mut agent)).await;
        // Still queued: no drain or step happened while paused.
        assert_eq!(agent.queue().len(), 1);
        assert!(agent.get_beliefs(false).is_empty());

        agent.resume_bdi();
        let _ = tokio::time::timeout(Duration::from_millis(30), run(&mut agent)).await;
        assert!(agent.queue().is_empty());
        assert_eq!(agent.get_beliefs(false), vec!["battery(full)"]);
    }

    #[tokio::test]
    async fn run_stops_at_max_ticks() {
        let bus = LocalBus::new();
        let mut agent = BdiAgent::new(
            "b@host",
            Arc::new(bus.endpoint("b@host")),
            MemoryReasoner::new("b@host"),
            None,
            MediatorConfig {
                max_ticks: 3,
                ..test_config()
            },
        )
        .unwrap();
        agent.resume_bdi();

        run(&mut agent).await;
        assert_eq!(agent.tick_count, 3);
    }
}
