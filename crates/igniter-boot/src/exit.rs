//! Exit code resolution: reduce the contributions of generators and
//! mappers to one process exit status.

use indexmap::IndexSet;

use crate::error::BootError;

/// Contributes zero or one candidate exit code.
pub trait ExitCodeGenerator: Send + Sync {
    fn exit_code(&self) -> Option<i32>;
}

impl<F> ExitCodeGenerator for F
where
    F: Fn() -> Option<i32> + Send + Sync,
{
    fn exit_code(&self) -> Option<i32> {
        self()
    }
}

/// Maps a terminal failure to zero or one candidate exit code.
pub trait ExitCodeMapper: Send + Sync {
    fn map(&self, failure: &BootError) -> Option<i32>;
}

impl<F> ExitCodeMapper for F
where
    F: Fn(&BootError) -> Option<i32> + Send + Sync,
{
    fn map(&self, failure: &BootError) -> Option<i32> {
        self(failure)
    }
}

/// Collect every contributed code and reduce: if all are non-negative the
/// maximum wins; if any is negative the minimum wins, so negative codes
/// signal a categorical failure no positive code can outrank. No
/// contributions at all resolve to 0.
pub fn resolve_exit_code(
    failure: Option<&BootError>,
    generators: &[Box<dyn ExitCodeGenerator>],
    mappers: &[Box<dyn ExitCodeMapper>],
) -> i32 {
    let mut codes: IndexSet<i32> = IndexSet::new();
    if let Some(failure) = failure {
        if let Some(code) = failure.embedded_exit_code() {
            codes.insert(code);
        }
        for mapper in mappers {
            if let Some(code) = mapper.map(failure) {
                codes.insert(code);
            }
        }
    }
    for generator in generators {
        if let Some(code) = generator.exit_code() {
            codes.insert(code);
        }
    }
    reduce(&codes)
}

fn reduce(codes: &IndexSet<i32>) -> i32 {
    if codes.iter().any(|&code| code < 0) {
        codes.iter().copied().min().unwrap_or(0)
    } else {
        codes.iter().copied().max().unwrap_or(0)
    }
}
