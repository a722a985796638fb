//! Pending mental-state updates and the queue that carries them.
//!
//! Producers (the performative router and the belief facade, possibly on
//! other tasks of the same process) append [`MentalUpdate`]s; the mediation
//! cycle is the sole consumer. Draining operates over a snapshot taken at
//! the start of the pass, so entries appended mid-drain wait for the next
//! tick and every entry is applied at most once.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::term::{GoalType, Intention, Term, Trigger};

/// One change to be applied to the agent's mental state.
///
/// Created by the performative router or by the belief facade; consumed
/// exactly once by the mediation cycle; never mutated after creation.
#[derive(Debug, Clone)]
pub struct MentalUpdate {
    pub trigger: Trigger,
    pub goal_type: GoalType,
    pub term: Term,
    pub intention: Intention,
}

impl MentalUpdate {
    pub fn new(trigger: Trigger, goal_type: GoalType, term: Term) -> Self {
        Self {
            trigger,
            goal_type,
            term,
            intention: Intention::new(),
        }
    }

    pub fn addition(goal_type: GoalType, term: Term) -> Self {
        Self::new(Trigger::Addition, goal_type, term)
    }

    pub fn removal(goal_type: GoalType, term: Term) -> Self {
        Self::new(Trigger::Removal, goal_type, term)
    }
}

/// FIFO queue of pending updates, shared between producers and the cycle.
///
/// Cloning the handle is cheap and shares the underlying queue.
#[derive(Debug, Clone, Default)]
pub struct UpdateQueue {
    inner: Arc<Mutex<VecDeque<MentalUpdate>>>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an update at the back of the queue.
    pub fn push(&self, update: MentalUpdate) {
        self.inner.lock().unwrap().push_back(update);
    }

    /// Copy the current contents without removing them. The drain loop
    /// iterates this snapshot and pops one live entry per applied update,
    /// so concurrent appends never extend the current pass.
    pub fn snapshot(&self) -> Vec<MentalUpdate> {
        self.inner.lock().unwrap().iter().cloned().collect()
    }

    /// Remove and return the front entry.
    pub fn pop(&self) -> Option<MentalUpdate> {
        self.inner.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(functor: &str) -> MentalUpdate {
        MentalUpdate::addition(GoalType::Belief, Term::atom(functor))
    }

    #[test]
    fn fifo_order() {
        let q = UpdateQueue::new();
        q.push(update("a"));
        q.push(update("b"));
        assert_eq!(q.pop().unwrap().term.functor(), "a");
        assert_eq!(q.pop().unwrap().term.functor(), "b");
        assert!(q.pop().is_none());
    }

    #[test]
    fn snapshot_does_not_consume() {
        let q = UpdateQueue::new();
        q.push(update("a"));
        let snap = q.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn appends_during_drain_wait_for_next_pass() {
        let q = UpdateQueue::new();
        q.push(update("a"));
        q.push(update("b"));

        let snapshot = q.snapshot();
        let mut applied = Vec::new();
        for entry in snapshot {
            // A producer appends while we are mid-drain.
            q.push(update("late"));
            applied.push(entry.term.functor().to_string());
            q.pop();
        }

        assert_eq!(applied, vec!["a", "b"]);
        // The two late arrivals are still queued for the next tick.
        assert_eq!(q.len(), 2);
        assert!(q.snapshot().iter().all(|u| u.term.functor() == "late"));
    }

    #[test]
    fn clones_share_the_same_queue() {
        let q = UpdateQueue::new();
        let producer = q.clone();
        producer.push(update("shared"));
        assert_eq!(q.len(), 1);
    }
}
