use thiserror::Error;

use crate::event::Phase;
use igniter_resolve::ResolveError;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),
    #[error("{phase:?} phase failed: {message}")]
    Phase { phase: Phase, message: String },
    #[error("listener failed during {phase:?}: {message}")]
    Listener { phase: Phase, message: String },
    #[error("runner '{name}' failed: {message}")]
    Runner { name: String, message: String },
    #[error("context error: {0}")]
    Context(String),
    /// Wraps a failure with a categorical exit code. Displays as its
    /// source so the original message survives re-raise.
    #[error("{source}")]
    WithExitCode {
        code: i32,
        #[source]
        source: Box<BootError>,
    },
}

impl BootError {
    pub fn with_exit_code(self, code: i32) -> Self {
        BootError::WithExitCode {
            code,
            source: Box::new(self),
        }
    }

    /// Exit code embedded anywhere in this failure's chain; the outermost
    /// contribution wins.
    pub fn embedded_exit_code(&self) -> Option<i32> {
        match self {
            BootError::WithExitCode { code, .. } => Some(*code),
            _ => None,
        }
    }
}
