//! Run listeners: per-phase callbacks the orchestrator drives, and the
//! event-publishing implementation that translates them into phase events.

use std::sync::Arc;

use crate::context::RuntimeContext;
use crate::env::Environment;
use crate::error::BootError;
use crate::event::{Multicaster, Phase, PhaseEvent, PhaseListener};

/// Per-phase lifecycle callbacks. Implementations default every method to
/// a no-op so listeners override only the transitions they care about.
pub trait RunListener: Send {
    fn starting(&mut self, _args: &[String]) -> anyhow::Result<()> {
        Ok(())
    }

    fn environment_prepared(&mut self, _environment: &Environment) -> anyhow::Result<()> {
        Ok(())
    }

    fn context_prepared(&mut self, _context: &mut RuntimeContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn context_loaded(&mut self, _context: &mut RuntimeContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn started(&mut self, _context: &RuntimeContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn running(&mut self, _context: &RuntimeContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn failed(
        &mut self,
        _context: Option<&RuntimeContext>,
        _failure: &BootError,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Composite over the attempt's run listeners. Ordinary phases propagate
/// the first error; `failed` is delivered to every listener with errors
/// logged, since a more informative original failure already exists.
pub struct RunListeners {
    listeners: Vec<Box<dyn RunListener>>,
}

macro_rules! forward_phase {
    ($name:ident, $phase:expr, $arg_ty:ty) => {
        pub fn $name(&mut self, arg: $arg_ty) -> Result<(), BootError> {
            for listener in &mut self.listeners {
                listener.$name(arg).map_err(|err| BootError::Listener {
                    phase: $phase,
                    message: format!("{err:#}"),
                })?;
            }
            Ok(())
        }
    };
}

impl RunListeners {
    pub fn new(listeners: Vec<Box<dyn RunListener>>) -> Self {
        Self { listeners }
    }

    forward_phase!(starting, Phase::Starting, &[String]);
    forward_phase!(environment_prepared, Phase::EnvironmentPrepared, &Environment);
    forward_phase!(context_prepared, Phase::ContextPrepared, &mut RuntimeContext);
    forward_phase!(context_loaded, Phase::ContextLoaded, &mut RuntimeContext);
    forward_phase!(started, Phase::Started, &RuntimeContext);
    forward_phase!(running, Phase::Running, &RuntimeContext);

    pub fn failed(&mut self, context: Option<&RuntimeContext>, failure: &BootError) {
        for listener in &mut self.listeners {
            if let Err(err) = listener.failed(context, failure) {
                log::warn!("run listener failed during failure notification: {err:#}");
            }
        }
    }
}

/// Translates run-listener callbacks into [`PhaseEvent`] multicast.
///
/// Events before the context is active go through an internal multicaster
/// seeded with the application's phase listeners; `context_loaded` hands
/// those listeners to the context, and later events publish through the
/// context itself.
pub struct EventPublishingRunListener {
    args: Vec<String>,
    multicaster: Multicaster,
}

impl EventPublishingRunListener {
    pub fn new(args: Vec<String>, app_listeners: &[Arc<dyn PhaseListener>]) -> Self {
        let mut multicaster = Multicaster::new();
        for listener in app_listeners {
            multicaster.add_listener(listener.clone());
        }
        Self { args, multicaster }
    }

    fn event(&self, phase: Phase) -> PhaseEvent {
        PhaseEvent::new(phase, self.args.clone())
    }
}

impl RunListener for EventPublishingRunListener {
    fn starting(&mut self, _args: &[String]) -> anyhow::Result<()> {
        Ok(self.multicaster.multicast(&self.event(Phase::Starting))?)
    }

    fn environment_prepared(&mut self, _environment: &Environment) -> anyhow::Result<()> {
        Ok(self
            .multicaster
            .multicast(&self.event(Phase::EnvironmentPrepared))?)
    }

    fn context_prepared(&mut self, _context: &mut RuntimeContext) -> anyhow::Result<()> {
        Ok(self
            .multicaster
            .multicast(&self.event(Phase::ContextPrepared))?)
    }

    fn context_loaded(&mut self, context: &mut RuntimeContext) -> anyhow::Result<()> {
        for listener in self.multicaster.listeners() {
            context.add_listener(listener.clone());
        }
        Ok(self
            .multicaster
            .multicast(&self.event(Phase::ContextLoaded))?)
    }

    fn started(&mut self, context: &RuntimeContext) -> anyhow::Result<()> {
        Ok(context.publish(&self.event(Phase::Started))?)
    }

    fn running(&mut self, context: &RuntimeContext) -> anyhow::Result<()> {
        Ok(context.publish(&self.event(Phase::Running))?)
    }

    fn failed(
        &mut self,
        context: Option<&RuntimeContext>,
        failure: &BootError,
    ) -> anyhow::Result<()> {
        let event = PhaseEvent::failed(self.args.clone(), failure.to_string());
        match context {
            Some(context) if context.is_active() => {
                // Listeners were handed to the context, so use it.
                Ok(context.publish(&event)?)
            }
            _ => {
                // The context may never have become active; fall back to
                // the internal multicaster extended with whatever
                // listeners the context had accumulated. After
                // context_loaded the two sets overlap, so skip listeners
                // the multicaster already carries.
                let mut fallback = self.multicaster.clone();
                if let Some(context) = context {
                    for listener in context.listeners() {
                        let already = fallback
                            .listeners()
                            .iter()
                            .any(|existing| Arc::ptr_eq(existing, listener));
                        if !already {
                            fallback.add_listener(listener.clone());
                        }
                    }
                }
                fallback.multicast_best_effort(&event);
                Ok(())
            }
        }
    }
}
