//! Runtime layer over [`igniter_resolve`]: an ordered bootstrap lifecycle
//! that resolves the active module set, loads declared sources, activates
//! a runtime context, and reports failures with a process exit code.
//!
//! [`Bootstrap`] is the entry point. It is configured builder-style, then
//! driven once with [`Bootstrap::run`]; the phase machine walks
//! `Starting → EnvironmentPrepared → ContextPrepared → ContextLoaded →
//! Started → Running`, and any failure diverts to `Failed`.

pub mod app;
pub mod context;
pub mod env;
pub mod error;
pub mod event;
pub mod exit;
pub mod listener;

pub use app::{
    Bootstrap, FILTERS_KEY, LISTENERS_KEY, MODULES_KEY, RUN_LISTENERS_KEY, ResolutionReport,
    Runner, SourceLoader,
};
pub use context::RuntimeContext;
pub use env::{EXCLUDE_KEY, Environment};
pub use error::BootError;
pub use event::{Multicaster, Phase, PhaseEvent, PhaseListener};
pub use exit::{ExitCodeGenerator, ExitCodeMapper, resolve_exit_code};
pub use listener::{EventPublishingRunListener, RunListener, RunListeners};
