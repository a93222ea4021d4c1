//! Runtime context: the activation target the orchestrator builds and
//! tears down across one bootstrap attempt.
//!
//! The context records which modules were registered and in what order; it
//! never constructs module objects (module lifetimes belong to the
//! embedding application).

use std::fmt;
use std::sync::Arc;

use crate::env::Environment;
use crate::error::BootError;
use crate::event::{Multicaster, PhaseEvent, PhaseListener};
use igniter_resolve::CandidateId;

pub struct RuntimeContext {
    environment: Environment,
    args: Vec<String>,
    modules: Vec<CandidateId>,
    listeners: Vec<Arc<dyn PhaseListener>>,
    sources_loaded: bool,
    active: bool,
    closed: bool,
    shutdown_hook: bool,
}

// Listeners are trait objects, so Debug is written out by hand.
impl fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("modules", &self.modules)
            .field("listeners", &self.listeners.len())
            .field("sources_loaded", &self.sources_loaded)
            .field("active", &self.active)
            .field("closed", &self.closed)
            .field("shutdown_hook", &self.shutdown_hook)
            .finish_non_exhaustive()
    }
}

impl RuntimeContext {
    pub fn new(environment: Environment, args: Vec<String>) -> Self {
        Self {
            environment,
            args,
            modules: Vec::new(),
            listeners: Vec::new(),
            sources_loaded: false,
            active: false,
            closed: false,
            shutdown_hook: false,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Record the resolved module order. Called once during context
    /// preparation.
    pub fn register_modules(&mut self, modules: Vec<CandidateId>) {
        self.modules = modules;
    }

    pub fn modules(&self) -> &[CandidateId] {
        &self.modules
    }

    pub fn add_listener(&mut self, listener: Arc<dyn PhaseListener>) {
        self.listeners.push(listener);
    }

    pub fn listeners(&self) -> &[Arc<dyn PhaseListener>] {
        &self.listeners
    }

    pub fn mark_sources_loaded(&mut self) {
        self.sources_loaded = true;
    }

    pub fn sources_loaded(&self) -> bool {
        self.sources_loaded
    }

    /// Activate the context (the "refresh" step).
    pub fn activate(&mut self) -> Result<(), BootError> {
        if self.closed {
            return Err(BootError::Context(
                "cannot activate a closed context".to_string(),
            ));
        }
        self.active = true;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Record that a shutdown hook should fire at process exit. The core
    /// owns no signal handling; the embedding process honors this intent.
    pub fn request_shutdown_hook(&mut self) {
        self.shutdown_hook = true;
    }

    pub fn shutdown_hook_registered(&self) -> bool {
        self.shutdown_hook
    }

    /// Dispatch an event to the context-bound listeners. Errors propagate;
    /// publishing on an inactive context is an error.
    pub fn publish(&self, event: &PhaseEvent) -> Result<(), BootError> {
        if !self.active {
            return Err(BootError::Context(
                "cannot publish events on an inactive context".to_string(),
            ));
        }
        let mut multicaster = Multicaster::new();
        for listener in &self.listeners {
            multicaster.add_listener(listener.clone());
        }
        multicaster.multicast(event)
    }

    /// Release the context. Idempotent.
    pub fn close(&mut self) -> Result<(), BootError> {
        if self.closed {
            return Ok(());
        }
        self.active = false;
        self.closed = true;
        log::debug!("runtime context closed ({} module(s))", self.modules.len());
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Phase;
    use std::sync::Mutex;

    struct Recorder(Arc<Mutex<Vec<Phase>>>);

    impl PhaseListener for Recorder {
        fn on_event(&self, event: &PhaseEvent) -> anyhow::Result<()> {
            self.0.lock().expect("lock").push(event.phase);
            Ok(())
        }
    }

    #[test]
    fn publish_requires_an_active_context() {
        let context = RuntimeContext::new(Environment::new(), Vec::new());
        let err = context
            .publish(&PhaseEvent::new(Phase::Started, Vec::new()))
            .expect_err("inactive");
        assert!(matches!(err, BootError::Context(_)));
    }

    #[test]
    fn publish_reaches_accumulated_listeners() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut context = RuntimeContext::new(Environment::new(), Vec::new());
        context.add_listener(Arc::new(Recorder(seen.clone())));
        context.activate().expect("activate");
        context
            .publish(&PhaseEvent::new(Phase::Started, Vec::new()))
            .expect("publish");
        assert_eq!(*seen.lock().expect("lock"), [Phase::Started]);
    }

    #[test]
    fn close_is_idempotent_and_deactivates() {
        let mut context = RuntimeContext::new(Environment::new(), Vec::new());
        context.activate().expect("activate");
        context.close().expect("close");
        assert!(!context.is_active());
        context.close().expect("close again");
        assert!(context.activate().is_err());
    }

    #[test]
    fn debug_output_summarizes_state_without_listener_contents() {
        let mut context = RuntimeContext::new(Environment::new(), Vec::new());
        context.register_modules(vec!["a".to_string()]);
        let rendered = format!("{context:?}");
        assert!(rendered.contains("modules: [\"a\"]"));
        assert!(rendered.contains("active: false"));
    }
}
