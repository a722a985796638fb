//! Belief-base facade: single-current-value semantics over the engine's
//! multi-fact storage.
//!
//! `set_belief` treats `(functor, arity)` as a key: re-asserting a fact that
//! already unifies with a stored one changes nothing, while all other facts
//! under the same signature are scheduled for retraction. Nothing mutates
//! immediately: every operation queues [`MentalUpdate`]s that the mediation
//! cycle applies on its next drain.
//!
//! When several facts share a signature, the read operations return the
//! first one the engine's storage yields. That enumeration order is
//! unspecified; callers must not rely on it.

use crate::codec;
use crate::error::BeliefError;
use crate::queue::{MentalUpdate, UpdateQueue};
use crate::reasoner::Reasoner;
use crate::term::{GoalType, Term, Value};

/// Result alias for belief queries.
pub type BeliefResult<T> = std::result::Result<T, BeliefError>;

/// Provenance annotation stamped on every facade-built belief.
fn percept_tagged(name: &str, args: Vec<Value>) -> Term {
    Term::new(name, args).with_source("percept")
}

/// Strip the `[source(...)]` suffix (and the quoting that comes with raw
/// string arguments) from a rendered belief, unless sources were asked for.
fn strip_source(raw: &str, include_source: bool) -> String {
    if include_source {
        return raw.to_string();
    }
    match raw.find("[source") {
        Some(idx) => raw[..idx].replace('"', ""),
        None => raw.to_string(),
    }
}

/// Borrowing facade over the reasoner's belief storage and the pending
/// update queue.
pub struct BeliefFacade<'a> {
    reasoner: &'a dyn Reasoner,
    queue: &'a UpdateQueue,
}

impl<'a> BeliefFacade<'a> {
    pub fn new(reasoner: &'a dyn Reasoner, queue: &'a UpdateQueue) -> Self {
        Self { reasoner, queue }
    }

    /// Assert a belief, replacing any conflicting facts under the same
    /// `(functor, arity)` key. Effects are observable after the next drain.
    pub fn set_belief(&self, name: &str, args: Vec<Value>) {
        let term = percept_tagged(name, args);
        let mut found = false;
        for fact in self.reasoner.beliefs_for(&term.signature()) {
            if term.unifies(&fact) {
                found = true;
            } else {
                self.queue.push(MentalUpdate::removal(GoalType::Belief, fact));
            }
        }
        if !found {
            self.queue.push(MentalUpdate::addition(GoalType::Belief, term));
        }
    }

    /// Queue removal of the exact given belief. No unification search.
    pub fn remove_belief(&self, name: &str, args: Vec<Value>) {
        self.queue.push(MentalUpdate::removal(
            GoalType::Belief,
            percept_tagged(name, args),
        ));
    }

    /// The first stored fact whose functor equals `key`, rendered as text.
    ///
    /// Returns `Ok(None)` for an entirely unknown functor, and
    /// [`BeliefError::NotInitiated`] when the signature is declared but
    /// currently holds zero facts.
    pub fn get_belief(&self, key: &str, include_source: bool) -> BeliefResult<Option<String>> {
        for (sig, facts) in self.reasoner.beliefs() {
            if sig.functor == key {
                let first = facts.first().ok_or_else(|| BeliefError::NotInitiated {
                    key: key.to_string(),
                })?;
                return Ok(Some(strip_source(&codec::encode(first), include_source)));
            }
        }
        Ok(None)
    }

    /// The argument tuple of `get_belief`'s result, split on commas.
    /// Zero-arity beliefs yield an empty tuple.
    pub fn get_belief_value(&self, key: &str) -> BeliefResult<Option<Vec<String>>> {
        let Some(text) = self.get_belief(key, false)? else {
            return Ok(None);
        };
        let values = match (text.find('('), text.rfind(')')) {
            (Some(open), Some(close)) if open < close => text[open + 1..close]
                .split(',')
                .map(|part| part.trim().to_string())
                .collect(),
            _ => Vec::new(),
        };
        Ok(Some(values))
    }

    /// One entry per known signature (first stored fact only), skipping
    /// signatures with zero current facts.
    pub fn get_beliefs(&self, include_source: bool) -> Vec<String> {
        self.reasoner
            .beliefs()
            .iter()
            .filter_map(|(_, facts)| facts.first())
            .map(|fact| strip_source(&codec::encode(fact), include_source))
            .collect()
    }

    /// Every stored fact across every signature (unlike `get_beliefs`, not
    /// limited to one per signature).
    pub fn enumerate_beliefs(&self, include_source: bool) -> Vec<String> {
        self.reasoner
            .beliefs()
            .iter()
            .flat_map(|(_, facts)| facts.iter())
            .map(|fact| strip_source(&codec::encode(fact), include_source))
            .collect()
    }

    /// Debug dump of the full belief base to stdout.
    pub fn print_beliefs(&self, include_source: bool) {
        for line in self.enumerate_beliefs(include_source) {
            println!("{line}");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::MemoryReasoner;

    /// Apply everything currently queued, the way one cycle drain would.
    fn drain(queue: &UpdateQueue, reasoner: &mut MemoryReasoner) {
        for update in queue.snapshot() {
            reasoner.call(update).unwrap();
            queue.pop();
        }
    }

    fn wine() -> Vec<Value> {
        vec![Value::atom("mary"), Value::atom("wine")]
    }

    #[test]
    fn set_belief_defers_to_the_next_drain() {
        let mut r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();
        BeliefFacade::new(&r, &q).set_belief("likes", wine());

        // Not yet visible.
        assert_eq!(
            BeliefFacade::new(&r, &q).get_belief("likes", false).unwrap(),
            None
        );

        drain(&q, &mut r);
        let facade = BeliefFacade::new(&r, &q);
        assert_eq!(
            facade.get_belief("likes", false).unwrap().as_deref(),
            Some("likes(mary,wine)")
        );
    }

    #[test]
    fn include_source_keeps_the_percept_tag() {
        let mut r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();
        BeliefFacade::new(&r, &q).set_belief("likes", wine());
        drain(&q, &mut r);

        let facade = BeliefFacade::new(&r, &q);
        assert_eq!(
            facade.get_belief("likes", true).unwrap().as_deref(),
            Some("likes(mary,wine)[source(percept)]")
        );
    }

    #[test]
    fn reassertion_replaces_the_previous_value() {
        let mut r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();

        BeliefFacade::new(&r, &q).set_belief("battery", vec![Value::atom("full")]);
        drain(&q, &mut r);
        BeliefFacade::new(&r, &q).set_belief("battery", vec![Value::atom("low")]);
        // Conflicting fact retracted, new one asserted.
        assert_eq!(q.len(), 2);
        drain(&q, &mut r);

        let sig = crate::term::Signature::new("battery", 1);
        let facts = r.beliefs_for(&sig);
        assert_eq!(facts.len(), 1);
        let facade = BeliefFacade::new(&r, &q);
        assert_eq!(
            facade.get_belief("battery", false).unwrap().as_deref(),
            Some("battery(low)")
        );
    }

    #[test]
    fn reasserting_the_same_value_queues_nothing() {
        let mut r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();

        BeliefFacade::new(&r, &q).set_belief("battery", vec![Value::atom("full")]);
        drain(&q, &mut r);
        BeliefFacade::new(&r, &q).set_belief("battery", vec![Value::atom("full")]);
        assert!(q.is_empty());

        let sig = crate::term::Signature::new("battery", 1);
        assert_eq!(r.beliefs_for(&sig).len(), 1);
    }

    #[test]
    fn retracted_signature_reports_not_initiated() {
        let mut r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();

        BeliefFacade::new(&r, &q).set_belief("likes", wine());
        drain(&q, &mut r);
        BeliefFacade::new(&r, &q).remove_belief("likes", wine());
        drain(&q, &mut r);

        let facade = BeliefFacade::new(&r, &q);
        assert!(matches!(
            facade.get_belief("likes", false),
            Err(BeliefError::NotInitiated { key }) if key == "likes"
        ));
    }

    #[test]
    fn unknown_signature_is_none_not_an_error() {
        let r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();
        let facade = BeliefFacade::new(&r, &q);
        assert_eq!(facade.get_belief("never_heard_of", false).unwrap(), None);
        assert_eq!(facade.get_belief_value("never_heard_of").unwrap(), None);
    }

    #[test]
    fn belief_value_splits_the_argument_tuple() {
        let mut r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();
        BeliefFacade::new(&r, &q).set_belief("likes", wine());
        drain(&q, &mut r);

        let facade = BeliefFacade::new(&r, &q);
        assert_eq!(
            facade.get_belief_value("likes").unwrap(),
            Some(vec!["mary".to_string(), "wine".to_string()])
        );
    }

    #[test]
    fn zero_arity_belief_value_is_an_empty_tuple() {
        let mut r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();
        BeliefFacade::new(&r, &q).set_belief("ready", Vec::new());
        drain(&q, &mut r);

        let facade = BeliefFacade::new(&r, &q);
        assert_eq!(facade.get_belief_value("ready").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn get_beliefs_skips_empty_signatures() {
        let mut r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();

        BeliefFacade::new(&r, &q).set_belief("likes", wine());
        BeliefFacade::new(&r, &q).set_belief("battery", vec![Value::atom("full")]);
        drain(&q, &mut r);
        BeliefFacade::new(&r, &q).remove_belief("battery", vec![Value::atom("full")]);
        drain(&q, &mut r);

        let facade = BeliefFacade::new(&r, &q);
        assert_eq!(facade.get_beliefs(false), vec!["likes(mary,wine)"]);
    }

    #[test]
    fn enumerate_lists_every_fact_per_signature() {
        let mut r = MemoryReasoner::new("a@host");
        let q = UpdateQueue::new();

        // Two facts under one signature, injected through the engine
        // directly (the facade itself keeps one per key).
        r.call(MentalUpdate::addition(
            GoalType::Belief,
            Term::new("color", vec![Value::atom("red")]),
        ))
        .unwrap();
        r.call(MentalUpdate::addition(
            GoalType::Belief,
            Term::new("color", vec![Value::atom("blue")]),
        ))
        .unwrap();

        let facade = BeliefFacade::new(&r, &q);
        assert_eq!(facade.enumerate_beliefs(false).len(), 2);
        assert_eq!(facade.get_beliefs(false).len(), 1);
    }

    #[test]
    fn strip_source_removes_suffix_and_quotes() {
        assert_eq!(
            strip_source("master(\"m@host\")[source(percept)]", false),
            "master(m@host)"
        );
        assert_eq!(
            strip_source("master(\"m@host\")[source(percept)]", true),
            "master(\"m@host\")[source(percept)]"
        );
        assert_eq!(strip_source("plain(x)", false), "plain(x)");
    }
}
