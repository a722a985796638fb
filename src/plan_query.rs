//! Plan-query responder: answers `askHow` by sending matching plans back.
//!
//! The reasoning engine delivers its "how do I achieve this" queries to this
//! handler. The query's `source` annotation names the requester; the
//! responder scans the agent's plan library for heads named in the query,
//! groups matches by trigger, goal type, functor, and arity, and routes each
//! group back to the requester as a `tellHow` through the outbound bridge's
//! sending path.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::action::SendAction;
use crate::error::{BdiResult, ProtocolError};
use crate::reasoner::{PlanDef, PlanLibrary, PlanQueryHandler};
use crate::router::Performative;
use crate::term::{GoalType, Term, Trigger, Value};

/// Concrete [`PlanQueryHandler`] registered once at agent construction.
pub struct PlanQueryResponder {
    bridge: Arc<SendAction>,
}

impl PlanQueryResponder {
    pub fn new(bridge: Arc<SendAction>) -> Self {
        Self { bridge }
    }
}

/// The functor names a query asks about.
///
/// `askHow` bodies arrive as `plain_text` with a comma-separated name list;
/// tuples and atoms are accepted for queries constructed in-process.
fn requested_functors(query: &Term) -> HashSet<String> {
    fn collect(value: &Value, out: &mut HashSet<String>) {
        match value {
            Value::Str(s) => {
                out.extend(
                    s.split(',')
                        .map(|part| part.trim().trim_matches('"').to_string())
                        .filter(|part| !part.is_empty()),
                );
            }
            Value::Term(t) if t.is_atom() => {
                out.insert(t.functor().to_string());
            }
            Value::Tuple(items) => {
                for item in items {
                    collect(item, out);
                }
            }
            _ => {}
        }
    }

    let mut out = HashSet::new();
    if let Some(first) = query.args().first() {
        collect(first, &mut out);
    }
    out
}

impl PlanQueryHandler for PlanQueryResponder {
    fn on_plan_query(&self, query: &Term, plans: &PlanLibrary) -> BdiResult<()> {
        let requester = query
            .source()
            .ok_or(ProtocolError::MissingSource)?
            .to_string();
        let wanted = requested_functors(query);

        let mut groups: BTreeMap<(Trigger, GoalType, String, usize), Vec<&PlanDef>> =
            BTreeMap::new();
        for plan in plans.iter() {
            if wanted.contains(&plan.head.functor) {
                groups
                    .entry((
                        plan.trigger,
                        plan.goal_type,
                        plan.head.functor.clone(),
                        plan.head.arity,
                    ))
                    .or_default()
                    .push(plan);
            }
        }

        tracing::debug!(
            requester = %requester,
            requested = wanted.len(),
            groups = groups.len(),
            "answering plan query",
        );

        for group in groups.values() {
            let text = group
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            self.bridge
                .dispatch(&requester, Performative::TellHow.as_str(), text)?;
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BdiError;
    use crate::transport::{LocalBus, Transport};

    fn library(lines: &[&str]) -> PlanLibrary {
        let mut lib = PlanLibrary::new();
        for line in lines {
            lib.add(PlanDef::parse(line).unwrap());
        }
        lib
    }

    fn responder(bus: &LocalBus) -> PlanQueryResponder {
        let bridge = Arc::new(SendAction::new(Arc::new(bus.endpoint("a@host"))));
        PlanQueryResponder::new(bridge)
    }

    #[test]
    fn missing_source_annotation_is_an_error() {
        let bus = LocalBus::new();
        let r = responder(&bus);
        let query = Term::plain_text("ping");
        let result = r.on_plan_query(&query, &PlanLibrary::new());
        assert!(matches!(
            result,
            Err(BdiError::Protocol(ProtocolError::MissingSource))
        ));
    }

    #[test]
    fn matching_plans_are_sent_back_as_tell_how() {
        let bus = LocalBus::new();
        let b = bus.endpoint("b@host");
        let r = responder(&bus);

        let lib = library(&[
            "+!ping(S) <- .send(S, tell, pong).",
            "+!other <- noop.",
        ]);
        let query = Term::plain_text("ping").with_source("b@host");
        r.on_plan_query(&query, &lib).unwrap();

        let msg = b.try_receive().unwrap().unwrap();
        assert_eq!(msg.ilf_type(), Some("tellHow"));
        assert_eq!(msg.body, "+!ping(S) <- .send(S, tell, pong).");
        assert_eq!(msg.sender, "a@host");
        // Only the requested functor was advertised.
        assert!(b.try_receive().unwrap().is_none());
    }

    #[test]
    fn groups_are_keyed_by_signature() {
        let bus = LocalBus::new();
        let b = bus.endpoint("b@host");
        let r = responder(&bus);

        // Same functor, two arities: two separate advertisements.
        let lib = library(&[
            "+!ping(S) <- .send(S, tell, pong).",
            "+!ping(S,N) <- .send(S, tell, pong(N)).",
        ]);
        let query = Term::plain_text("ping").with_source("b@host");
        r.on_plan_query(&query, &lib).unwrap();

        let first = b.try_receive().unwrap().unwrap();
        let second = b.try_receive().unwrap().unwrap();
        assert_ne!(first.body, second.body);
        assert!(b.try_receive().unwrap().is_none());
    }

    #[test]
    fn plans_sharing_a_signature_travel_together() {
        let bus = LocalBus::new();
        let b = bus.endpoint("b@host");
        let r = responder(&bus);

        let lib = library(&[
            "+!ping(S) : day <- .send(S, tell, pong).",
            "+!ping(S) : night <- .send(S, tell, zzz).",
        ]);
        let query = Term::plain_text("ping").with_source("b@host");
        r.on_plan_query(&query, &lib).unwrap();

        let msg = b.try_receive().unwrap().unwrap();
        assert_eq!(msg.body.lines().count(), 2);
        assert!(b.try_receive().unwrap().is_none());
    }

    #[test]
    fn comma_separated_request_matches_several_functors() {
        let bus = LocalBus::new();
        let b = bus.endpoint("b@host");
        let r = responder(&bus);

        let lib = library(&[
            "+!ping(S) <- .send(S, tell, pong).",
            "+!greet(W) <- .send(W, tell, hello).",
        ]);
        let query = Term::plain_text("ping, greet").with_source("b@host");
        r.on_plan_query(&query, &lib).unwrap();

        assert!(b.try_receive().unwrap().is_some());
        assert!(b.try_receive().unwrap().is_some());
        assert!(b.try_receive().unwrap().is_none());
    }
}
