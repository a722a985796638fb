//! The BDI agent facade: construction, plan-source loading, and the
//! mental-state API exposed to the host application.
//!
//! A [`BdiAgent`] wires the pieces together once at construction: the
//! outbound send bridge and any custom actions go into the engine's action
//! registry, the plan-query responder is registered as the engine's
//! `askHow` callback, and the plan source (if any) is built into the
//! initial mental state. After that the host drives it through
//! [`BdiAgent::run`] (or [`BdiAgent::tick`] for manual scheduling) and the
//! belief API.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::action::{ActionRegistry, SendAction};
use crate::beliefs::{BeliefFacade, BeliefResult};
use crate::cycle::{self, MediatorConfig, TickResult};
use crate::error::BdiResult;
use crate::plan_query::PlanQueryResponder;
use crate::queue::UpdateQueue;
use crate::reasoner::Reasoner;
use crate::term::Value;
use crate::transport::Transport;

/// One BDI agent: identity, transport endpoint, reasoning engine, and the
/// mediation state shared with the cycle loop.
pub struct BdiAgent<R: Reasoner> {
    jid: String,
    pub(crate) config: MediatorConfig,
    pub(crate) reasoner: R,
    pub(crate) queue: UpdateQueue,
    pub(crate) transport: Arc<dyn Transport>,
    actions: ActionRegistry,
    enabled: Arc<AtomicBool>,
    plan_source: Option<PathBuf>,
    pub(crate) tick_count: u64,
}

impl<R: Reasoner> BdiAgent<R> {
    /// Construct an agent with the default action set (just `.send/3`).
    ///
    /// A missing or unreadable plan source is not fatal: the agent comes up
    /// Disabled and stays so until a successful [`set_source`] reload. A plan
    /// source that fails to build is an error.
    ///
    /// [`set_source`]: BdiAgent::set_source
    pub fn new(
        jid: impl Into<String>,
        transport: Arc<dyn Transport>,
        reasoner: R,
        plan_source: Option<PathBuf>,
        config: MediatorConfig,
    ) -> BdiResult<Self> {
        Self::with_actions(jid, transport, reasoner, plan_source, config, ActionRegistry::new())
    }

    /// Construct an agent with custom actions pre-registered. The `.send/3`
    /// bridge is always added (replacing any custom action under that key).
    pub fn with_actions(
        jid: impl Into<String>,
        transport: Arc<dyn Transport>,
        mut reasoner: R,
        plan_source: Option<PathBuf>,
        config: MediatorConfig,
        mut actions: ActionRegistry,
    ) -> BdiResult<Self> {
        let bridge = Arc::new(SendAction::new(transport.clone()));
        actions.register(bridge.clone());
        reasoner.register_plan_query_handler(Arc::new(PlanQueryResponder::new(bridge)));

        let mut agent = Self {
            jid: jid.into(),
            config,
            reasoner,
            queue: UpdateQueue::new(),
            transport,
            actions,
            enabled: Arc::new(AtomicBool::new(false)),
            plan_source: None,
            tick_count: 0,
        };
        if let Some(path) = plan_source {
            agent.set_source(path)?;
        }
        Ok(agent)
    }

    /// The agent's address on the messaging fabric.
    pub fn jid(&self) -> &str {
        &self.jid
    }

    pub fn reasoner(&self) -> &R {
        &self.reasoner
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Handle to the pending-update queue. Clones share the live queue, so
    /// producers on other tasks can append while the cycle drains.
    pub fn queue(&self) -> &UpdateQueue {
        &self.queue
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Stop mediation after the current tick, if one is in progress.
    pub fn pause_bdi(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// (Re)start mediation.
    pub fn resume_bdi(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Reload plan definitions from a file, pausing mediation during the
    /// swap. An unreadable file leaves the agent Disabled (logged, not an
    /// error); a file that fails to build is an error.
    pub fn set_source(&mut self, path: impl Into<PathBuf>) -> BdiResult<()> {
        let path = path.into();
        self.pause_bdi();
        match fs::read_to_string(&path) {
            Ok(source) => {
                self.reasoner.build(&source, &self.actions)?;
                self.plan_source = Some(path);
                self.resume_bdi();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    agent = %self.jid,
                    path = %path.display(),
                    error = %err,
                    "plan source unreadable, mediation disabled",
                );
                self.plan_source = None;
                Ok(())
            }
        }
    }

    /// Build the mental state from in-memory plan source text and resume.
    pub fn set_source_text(&mut self, source: &str) -> BdiResult<()> {
        self.pause_bdi();
        self.reasoner.build(source, &self.actions)?;
        self.resume_bdi();
        Ok(())
    }

    /// The currently loaded plan-source path, if any.
    pub fn plan_source(&self) -> Option<&PathBuf> {
        self.plan_source.as_ref()
    }

    // ── Scheduling ──────────────────────────────────────────────────────

    /// Run one Enabled tick by hand. Most embedders use [`run`] instead.
    ///
    /// [`run`]: BdiAgent::run
    pub fn tick(&mut self) -> TickResult {
        cycle::run_tick(self)
    }

    /// Drive the mediation loop until `max_ticks` (if configured).
    pub async fn run(&mut self) {
        cycle::run(self).await;
    }

    // ── Belief API ──────────────────────────────────────────────────────

    fn beliefs(&self) -> BeliefFacade<'_> {
        BeliefFacade::new(&self.reasoner, &self.queue)
    }

    /// Assert a belief (replace-if-matching). Applied on the next drain.
    pub fn set_belief(&self, name: &str, args: Vec<Value>) {
        self.beliefs().set_belief(name, args);
    }

    /// Queue removal of the exact given belief.
    pub fn remove_belief(&self, name: &str, args: Vec<Value>) {
        self.beliefs().remove_belief(name, args);
    }

    /// The first stored fact for `key`, rendered as text.
    pub fn get_belief(&self, key: &str, include_source: bool) -> BeliefResult<Option<String>> {
        self.beliefs().get_belief(key, include_source)
    }

    /// The argument tuple of the first stored fact for `key`.
    pub fn get_belief_value(&self, key: &str) -> BeliefResult<Option<Vec<String>>> {
        self.beliefs().get_belief_value(key)
    }

    /// One rendered fact per known signature.
    pub fn get_beliefs(&self, include_source: bool) -> Vec<String> {
        self.beliefs().get_beliefs(include_source)
    }

    /// Debug dump of every stored fact to stdout.
    pub fn print_beliefs(&self, include_source: bool) {
        self.beliefs().print_beliefs(include_source);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::error::BdiError;
    use crate::reasoner::MemoryReasoner;
    use crate::term::Intention;
    use crate::transport::LocalBus;
    use std::io::Write;

    fn agent_on(bus: &LocalBus, jid: &str, plan_source: Option<PathBuf>) -> BdiResult<BdiAgent<MemoryReasoner>> {
        BdiAgent::new(
            jid,
            Arc::new(bus.endpoint(jid)),
            MemoryReasoner::new(jid),
            plan_source,
            MediatorConfig::default(),
        )
    }

    #[test]
    fn missing_plan_source_disables_mediation() {
        let bus = LocalBus::new();
        let agent = agent_on(&bus, "a@host", Some("/nonexistent/plans.asl".into())).unwrap();
        assert!(!agent.is_enabled());
        assert!(agent.plan_source().is_none());
    }

    #[test]
    fn readable_plan_source_enables_mediation() {
        let bus = LocalBus::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "likes(mary,wine).").unwrap();
        writeln!(file, "+!ping(S) <- .send(S, tell, pong).").unwrap();

        let agent = agent_on(&bus, "a@host", Some(file.path().to_path_buf())).unwrap();
        assert!(agent.is_enabled());
        assert_eq!(agent.plan_source(), Some(&file.path().to_path_buf()));
        assert_eq!(agent.reasoner().plans().len(), 1);
        assert_eq!(agent.get_beliefs(false), vec!["likes(mary,wine)"]);
    }

    #[test]
    fn broken_plan_source_is_a_build_error() {
        let bus = LocalBus::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "+ not a valid plan head ((").unwrap();

        let result = agent_on(&bus, "a@host", Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(BdiError::Reasoner(_))));
    }

    #[test]
    fn reload_pauses_and_resumes() {
        let bus = LocalBus::new();
        let mut agent = agent_on(&bus, "a@host", None).unwrap();
        assert!(!agent.is_enabled());

        agent.set_source_text("+!ping(S) <- .send(S, tell, pong).").unwrap();
        assert!(agent.is_enabled());

        // Reloading from an unreadable path leaves the agent disabled.
        agent.set_source("/nonexistent/plans.asl").unwrap();
        assert!(!agent.is_enabled());
    }

    #[test]
    fn belief_api_round_trip_through_a_tick() {
        let bus = LocalBus::new();
        let mut agent = agent_on(&bus, "a@host", None).unwrap();
        agent.resume_bdi();

        agent.set_belief("battery", vec![Value::atom("full")]);
        agent.tick();
        assert_eq!(
            agent.get_belief("battery", false).unwrap().as_deref(),
            Some("battery(full)")
        );
        assert_eq!(
            agent.get_belief_value("battery").unwrap(),
            Some(vec!["full".to_string()])
        );

        agent.remove_belief("battery", vec![Value::atom("full")]);
        agent.tick();
        assert!(agent.get_belief("battery", false).is_err());
    }

    struct Noop;
    impl Action for Noop {
        fn name(&self) -> &str {
            ".noop"
        }
        fn arity(&self) -> usize {
            0
        }
        fn execute(&self, _args: &[Value], _intention: &Intention) -> BdiResult<()> {
            Ok(())
        }
    }

    #[test]
    fn custom_actions_sit_next_to_the_send_bridge() {
        let bus = LocalBus::new();
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(Noop));

        let agent = BdiAgent::with_actions(
            "a@host",
            Arc::new(bus.endpoint("a@host")),
            MemoryReasoner::new("a@host"),
            None,
            MediatorConfig::default(),
            registry,
        )
        .unwrap();

        assert!(agent.actions().get(".noop", 0).is_some());
        assert!(agent.actions().get(".send", 3).is_some());
    }
}
