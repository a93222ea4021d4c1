//! Lifecycle phases and synchronous phase-event multicast.

use std::sync::Arc;

use serde::Serialize;

use crate::error::BootError;

/// Bootstrap lifecycle phase. Ordered; `Failed` is reachable from any
/// non-terminal phase and `Running` is terminal on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Phase {
    Starting,
    EnvironmentPrepared,
    ContextPrepared,
    ContextLoaded,
    Started,
    Running,
    Failed,
}

/// Notification delivered to phase listeners on each transition.
#[derive(Debug, Clone)]
pub struct PhaseEvent {
    pub phase: Phase,
    pub args: Vec<String>,
    /// Present only for [`Phase::Failed`].
    pub failure: Option<String>,
}

impl PhaseEvent {
    pub fn new(phase: Phase, args: Vec<String>) -> Self {
        Self {
            phase,
            args,
            failure: None,
        }
    }

    pub fn failed(args: Vec<String>, failure: String) -> Self {
        Self {
            phase: Phase::Failed,
            args,
            failure: Some(failure),
        }
    }
}

/// Receives phase-transition notifications. Registrations sort by
/// ascending order key, stable for equal keys.
pub trait PhaseListener: Send + Sync {
    fn order(&self) -> i32 {
        0
    }

    fn on_event(&self, event: &PhaseEvent) -> anyhow::Result<()>;
}

/// Synchronous in-process multicaster over an ordered listener list.
#[derive(Clone, Default)]
pub struct Multicaster {
    listeners: Vec<Arc<dyn PhaseListener>>,
}

impl Multicaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn PhaseListener>) {
        self.listeners.push(listener);
    }

    pub fn listeners(&self) -> &[Arc<dyn PhaseListener>] {
        &self.listeners
    }

    fn in_order(&self) -> Vec<Arc<dyn PhaseListener>> {
        let mut sorted = self.listeners.clone();
        sorted.sort_by_key(|listener| listener.order());
        sorted
    }

    /// Dispatch for ordinary phases: the first listener error aborts
    /// dispatch and propagates as part of the phase's failure.
    pub fn multicast(&self, event: &PhaseEvent) -> Result<(), BootError> {
        for listener in self.in_order() {
            listener
                .on_event(event)
                .map_err(|err| BootError::Listener {
                    phase: event.phase,
                    message: format!("{err:#}"),
                })?;
        }
        Ok(())
    }

    /// Dispatch for the failure path: listener errors are logged, never
    /// propagated, so the original failure is not masked.
    pub fn multicast_best_effort(&self, event: &PhaseEvent) {
        for listener in self.in_order() {
            if let Err(err) = listener.on_event(event) {
                log::warn!("listener error during {:?} dispatch: {err:#}", event.phase);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        tag: &'static str,
        order: i32,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl PhaseListener for Recording {
        fn order(&self) -> i32 {
            self.order
        }

        fn on_event(&self, _event: &PhaseEvent) -> anyhow::Result<()> {
            self.log.lock().expect("lock").push(self.tag);
            if self.fail {
                anyhow::bail!("listener {} failed", self.tag);
            }
            Ok(())
        }
    }

    fn listener(
        tag: &'static str,
        order: i32,
        log: &Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    ) -> Arc<dyn PhaseListener> {
        Arc::new(Recording {
            tag,
            order,
            log: log.clone(),
            fail,
        })
    }

    #[test]
    fn dispatch_follows_order_keys_stably() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut multicaster = Multicaster::new();
        multicaster.add_listener(listener("b", 10, &log, false));
        multicaster.add_listener(listener("a", -5, &log, false));
        multicaster.add_listener(listener("c", 10, &log, false));
        multicaster
            .multicast(&PhaseEvent::new(Phase::Starting, Vec::new()))
            .expect("dispatch");
        assert_eq!(*log.lock().expect("lock"), ["a", "b", "c"]);
    }

    #[test]
    fn ordinary_dispatch_aborts_on_first_listener_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut multicaster = Multicaster::new();
        multicaster.add_listener(listener("first", 0, &log, true));
        multicaster.add_listener(listener("second", 1, &log, false));
        let err = multicaster
            .multicast(&PhaseEvent::new(Phase::Started, Vec::new()))
            .expect_err("propagates");
        assert!(matches!(err, BootError::Listener { phase: Phase::Started, .. }));
        assert_eq!(*log.lock().expect("lock"), ["first"]);
    }

    #[test]
    fn best_effort_dispatch_reaches_every_listener() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut multicaster = Multicaster::new();
        multicaster.add_listener(listener("first", 0, &log, true));
        multicaster.add_listener(listener("second", 1, &log, false));
        multicaster.multicast_best_effort(&PhaseEvent::failed(
            Vec::new(),
            "boom".to_string(),
        ));
        assert_eq!(*log.lock().expect("lock"), ["first", "second"]);
    }

    #[test]
    fn phases_are_ordered() {
        assert!(Phase::Starting < Phase::EnvironmentPrepared);
        assert!(Phase::Started < Phase::Running);
        assert!(Phase::Running < Phase::Failed);
    }
}
