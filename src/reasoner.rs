//! Reasoning-engine seam: the trait the engine collaborator implements,
//! plan definitions, and an in-memory reference engine.
//!
//! The mediation layer never looks inside inference. It hands the engine
//! [`MentalUpdate`]s via `call`, advances it one unit of work via `step`,
//! and reads back beliefs and plans keyed by [`Signature`]. Plan queries are
//! delivered through the [`PlanQueryHandler`] contract registered once at
//! construction.
//!
//! [`MemoryReasoner`] is deliberately minimal: it stores beliefs and plans,
//! applies updates, and queues goal events, but performs no plan-body
//! execution. It exists so the mediation layer is fully testable without a
//! complete AgentSpeak interpreter; real deployments supply their own
//! engine behind the same trait.

use std::collections::VecDeque;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::action::ActionRegistry;
use crate::codec;
use crate::error::{BdiResult, ReasonerError};
use crate::queue::MentalUpdate;
use crate::term::{GoalType, Signature, Term, Trigger};

// ── Plan definitions ─────────────────────────────────────────────────────

static PLAN_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])(!|\?)?\s*(.+)$").unwrap());

/// One plan definition: trigger, goal type, head signature, and the raw
/// textual form (what `tellHow` puts on the wire).
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDef {
    pub trigger: Trigger,
    pub goal_type: GoalType,
    pub head: Signature,
    pub text: String,
}

impl PlanDef {
    /// Parse a single plan definition line, e.g.
    /// `+!ping(Sender) <- .send(Sender, tell, pong).`
    pub fn parse(line: &str) -> Result<PlanDef, ReasonerError> {
        let trimmed = line.trim().trim_end_matches('.').trim();
        let caps = PLAN_HEAD
            .captures(trimmed)
            .ok_or_else(|| ReasonerError::InvalidPlan { line: line.into() })?;

        let trigger = match &caps[1] {
            "+" => Trigger::Addition,
            _ => Trigger::Removal,
        };
        let goal_type = match caps.get(2).map(|m| m.as_str()) {
            Some("!") => GoalType::Achievement,
            Some("?") => GoalType::Test,
            _ => GoalType::Belief,
        };

        let rest = &caps[3];
        let head_text = rest
            .split("<-")
            .next()
            .unwrap_or(rest)
            .split(':')
            .next()
            .unwrap_or(rest)
            .trim();
        let head = codec::decode(head_text)
            .map_err(|_| ReasonerError::InvalidPlan { line: line.into() })?
            .signature();

        Ok(PlanDef {
            trigger,
            goal_type,
            head,
            text: line.trim().to_string(),
        })
    }
}

/// The agent's known plan definitions.
#[derive(Debug, Clone, Default)]
pub struct PlanLibrary {
    plans: Vec<PlanDef>,
}

impl PlanLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plan. Identical definitions are stored once.
    pub fn add(&mut self, plan: PlanDef) {
        if !self.plans.contains(&plan) {
            self.plans.push(plan);
        }
    }

    /// Remove every plan matching the given trigger, goal type, and head
    /// signature. Returns how many were retracted.
    pub fn retract(&mut self, trigger: Trigger, goal_type: GoalType, head: &Signature) -> usize {
        let before = self.plans.len();
        self.plans
            .retain(|p| !(p.trigger == trigger && p.goal_type == goal_type && &p.head == head));
        before - self.plans.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanDef> {
        self.plans.iter()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

// ── Callback contracts ───────────────────────────────────────────────────

/// Receives the engine's "how do I achieve this" queries.
///
/// Registered once at construction; the engine passes its current plan
/// library alongside the query so the handler never has to call back into
/// the engine mid-step.
pub trait PlanQueryHandler: Send + Sync {
    fn on_plan_query(&self, query: &Term, plans: &PlanLibrary) -> BdiResult<()>;
}

// ── Reasoner trait ───────────────────────────────────────────────────────

/// The reasoning-engine collaborator.
///
/// `call` enqueues one mental-state change; `step` advances inference by a
/// single unit of work. Belief enumeration order is whatever the engine's
/// backing storage yields; callers must not rely on it.
pub trait Reasoner: Send {
    /// Rebuild the mental state from plan-definition source text.
    fn build(&mut self, source: &str, actions: &ActionRegistry) -> BdiResult<()>;

    /// Register the plan-query callback. Later registrations replace
    /// earlier ones.
    fn register_plan_query_handler(&mut self, handler: Arc<dyn PlanQueryHandler>);

    /// Snapshot of the belief base, keyed by signature. A signature may be
    /// present with zero facts (declared but retracted).
    fn beliefs(&self) -> Vec<(Signature, Vec<Term>)>;

    /// Facts currently stored under one signature.
    fn beliefs_for(&self, sig: &Signature) -> Vec<Term> {
        self.beliefs()
            .into_iter()
            .find(|(s, _)| s == sig)
            .map(|(_, facts)| facts)
            .unwrap_or_default()
    }

    /// Apply one mental update.
    fn call(&mut self, update: MentalUpdate) -> BdiResult<()>;

    /// Advance inference by one unit of work. Returns whether any work
    /// was done.
    fn step(&mut self) -> BdiResult<bool>;

    /// Snapshot of the plan library.
    fn plans(&self) -> PlanLibrary;
}

// ── MemoryReasoner ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum PendingEvent {
    Goal { trigger: Trigger, term: Term },
    PlanQuery { term: Term },
}

/// In-memory reference engine: belief and plan storage without inference.
///
/// `build` accepts line-oriented plan source: `//` comment lines, belief
/// facts (`likes(mary,wine).`), initial goals (`!start.`), and single-line
/// plan definitions (`+!ping(S) <- ...`). Multi-line plan bodies are not
/// supported.
pub struct MemoryReasoner {
    name: String,
    beliefs: Vec<(Signature, Vec<Term>)>,
    plans: PlanLibrary,
    events: VecDeque<PendingEvent>,
    plan_query: Option<Arc<dyn PlanQueryHandler>>,
    goal_log: Vec<(Trigger, Term)>,
}

impl MemoryReasoner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            beliefs: Vec::new(),
            plans: PlanLibrary::new(),
            events: VecDeque::new(),
            plan_query: None,
            goal_log: Vec::new(),
        }
    }

    /// The agent identity this engine reasons for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Achievement and test goals processed so far, in order.
    pub fn goal_log(&self) -> &[(Trigger, Term)] {
        &self.goal_log
    }

    fn entry_mut(&mut self, sig: Signature) -> &mut Vec<Term> {
        if let Some(idx) = self.beliefs.iter().position(|(s, _)| *s == sig) {
            &mut self.beliefs[idx].1
        } else {
            self.beliefs.push((sig, Vec::new()));
            &mut self.beliefs.last_mut().unwrap().1
        }
    }

    fn add_belief(&mut self, term: Term) {
        let facts = self.entry_mut(term.signature());
        if !facts.contains(&term) {
            facts.push(term);
        }
    }

    /// Retract matching facts. The signature entry itself survives, so the
    /// belief family stays declared with zero facts.
    fn remove_belief(&mut self, term: &Term) {
        let sig = term.signature();
        let facts = self.entry_mut(sig);
        facts.retain(|fact| !term.unifies(fact));
    }

    fn plan_from_plain_text(term: &Term) -> BdiResult<Vec<PlanDef>> {
        let text = match term.args().first() {
            Some(crate::term::Value::Str(s)) => s.clone(),
            _ => {
                return Err(ReasonerError::UpdateRejected {
                    message: "plan advertisement payload is not plain_text".into(),
                }
                .into());
            }
        };
        let mut plans = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            plans.push(PlanDef::parse(line)?);
        }
        Ok(plans)
    }
}

impl Reasoner for MemoryReasoner {
    fn build(&mut self, source: &str, _actions: &ActionRegistry) -> BdiResult<()> {
        self.beliefs.clear();
        self.plans = PlanLibrary::new();
        self.events.clear();

        for line in source.lines() {
            let stmt = line.trim();
            if stmt.is_empty() || stmt.starts_with("//") {
                continue;
            }
            if stmt.starts_with('+') || stmt.starts_with('-') {
                self.plans.add(PlanDef::parse(stmt)?);
            } else if let Some(goal) = stmt.strip_prefix('!') {
                let term = codec::decode(goal.trim_end_matches('.').trim())?;
                self.events.push_back(PendingEvent::Goal {
                    trigger: Trigger::Addition,
                    term,
                });
            } else {
                let term = codec::decode(stmt.trim_end_matches('.').trim())?;
                self.add_belief(term);
            }
        }

        tracing::info!(
            agent = %self.name,
            beliefs = self.beliefs.len(),
            plans = self.plans.len(),
            "mental state built from plan source",
        );
        Ok(())
    }

    fn register_plan_query_handler(&mut self, handler: Arc<dyn PlanQueryHandler>) {
        self.plan_query = Some(handler);
    }

    fn beliefs(&self) -> Vec<(Signature, Vec<Term>)> {
        self.beliefs.clone()
    }

    fn call(&mut self, update: MentalUpdate) -> BdiResult<()> {
        let MentalUpdate {
            trigger,
            goal_type,
            term,
            ..
        } = update;

        match (trigger, goal_type) {
            (Trigger::Addition, GoalType::Belief) => self.add_belief(term),
            (Trigger::Removal, GoalType::Belief) => self.remove_belief(&term),

            (_, GoalType::Achievement) | (_, GoalType::Test) => {
                self.events.push_back(PendingEvent::Goal { trigger, term });
            }

            (Trigger::Addition, GoalType::TellHow) => {
                for plan in Self::plan_from_plain_text(&term)? {
                    self.plans.add(plan);
                }
            }
            (Trigger::Removal, GoalType::TellHow) | (_, GoalType::UntellHow) => {
                for plan in Self::plan_from_plain_text(&term)? {
                    let retracted =
                        self.plans
                            .retract(plan.trigger, plan.goal_type, &plan.head);
                    tracing::debug!(head = %plan.head, retracted, "plans retracted");
                }
            }

            (Trigger::Addition, GoalType::AskHow) => {
                self.events.push_back(PendingEvent::PlanQuery { term });
            }
            (Trigger::Removal, GoalType::AskHow) => {
                return Err(ReasonerError::UpdateRejected {
                    message: "askHow cannot be retracted".into(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn step(&mut self) -> BdiResult<bool> {
        let Some(event) = self.events.pop_front() else {
            return Ok(false);
        };

        match event {
            PendingEvent::Goal { trigger, term } => {
                tracing::debug!(agent = %self.name, goal = %term, "goal event processed");
                self.goal_log.push((trigger, term));
            }
            PendingEvent::PlanQuery { term } => {
                if let Some(handler) = self.plan_query.clone() {
                    handler.on_plan_query(&term, &self.plans)?;
                } else {
                    tracing::warn!(agent = %self.name, "plan query with no handler registered");
                }
            }
        }
        Ok(true)
    }

    fn plans(&self) -> PlanLibrary {
        self.plans.clone()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
