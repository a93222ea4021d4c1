//! Failure-path test: a source loader fault diverts to `Failed`, computes
//! the exit code, and still notifies listeners best-effort.


use fixtures::{RecordingListener, phases, registry};
use igniter_boot::{Bootstrap, BootError, ExitCodeMapper, Phase, RuntimeContext};

#[test]
fn loader_failure_diverts_to_failed_with_exit_code() {
    let (listener, seen) = RecordingListener::new();
    let mut bootstrap = Bootstrap::new(registry("modules=a\n"))
        .with_listener(listener)
        .with_source_loader(Box::new(|_context: &mut RuntimeContext| {
            anyhow::bail!("declared source is unreadable");
        }))
        .with_exit_mapper(Box::new(|failure: &BootError| match failure {
            BootError::Phase { phase: Phase::ContextLoaded, .. } => Some(7),
            _ => None,
        }) as Box<dyn ExitCodeMapper>);

    let err = bootstrap.run(Vec::new()).expect_err("loader fails");

    assert!(matches!(
        err,
        BootError::Phase { phase: Phase::ContextLoaded, .. }
    ));
    assert!(err.to_string().contains("declared source is unreadable"));
    assert_eq!(bootstrap.phase(), Phase::Failed);
    assert_eq!(bootstrap.exit_code(), 7);

    // The context never activated, so the failure event travels through the
    // fallback multicaster and still reaches the registered listener.
    let observed = phases(&seen);
    assert_eq!(
        observed,
        [
            Phase::Starting,
            Phase::EnvironmentPrepared,
            Phase::ContextPrepared,
            Phase::Failed,
        ]
    );
    let failure = seen
        .lock()
        .expect("seen lock")
        .iter()
        .find(|event| event.phase == Phase::Failed)
        .and_then(|event| event.failure.clone())
        .expect("failure payload");
    assert!(failure.contains("declared source is unreadable"));
}

#[test]
fn invalid_exclude_lists_the_offender_in_the_error() {
    use std::sync::Arc;

    use igniter_resolve::ResolutionRequest;

    let mut known = indexmap::IndexSet::new();
    known.insert("registered-but-not-a-candidate".to_string());

    let mut bootstrap = Bootstrap::new(registry("modules=a\n"))
        .with_known_modules(Arc::new(known))
        .with_request(
            ResolutionRequest::new("main").exclude("registered-but-not-a-candidate"),
        );

    let err = bootstrap.run(Vec::new()).expect_err("invalid exclude");
    assert!(matches!(err, BootError::Resolve(_)));
    assert!(err.to_string().contains("registered-but-not-a-candidate"));
    assert_eq!(bootstrap.phase(), Phase::Failed);
}
