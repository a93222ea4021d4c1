//! Full-lifecycle test: resolve, order, exclude, and activate a module set,
//! observing every phase through a registered listener.


use std::sync::{Arc, Mutex};

use fixtures::{RecordingListener, phases, registry};
use igniter_boot::{Bootstrap, Environment, Phase, Runner};
use igniter_resolve::{CandidateMetadata, FACT_AFTER, ResolutionRequest};

struct CountingRunner(Arc<Mutex<u32>>);

impl Runner for CountingRunner {
    fn name(&self) -> &str {
        "counting"
    }

    fn run(&mut self, _args: &[String]) -> anyhow::Result<()> {
        *self.0.lock().expect("count lock") += 1;
        Ok(())
    }
}

#[test]
fn resolves_orders_and_activates_modules_through_all_phases() {
    let mut metadata = CandidateMetadata::new();
    metadata.set("b", FACT_AFTER, "a");

    let (listener, seen) = RecordingListener::new();
    let runs = Arc::new(Mutex::new(0));
    let mut bootstrap = Bootstrap::new(registry("modules=b,a,c\n"))
        .with_metadata(metadata)
        .with_listener(listener)
        .with_request(ResolutionRequest::new("main").exclude("c"))
        .with_runner(Box::new(CountingRunner(runs.clone())));

    let args = vec!["--profile=test".to_string()];
    let context = bootstrap.run(args.clone()).expect("bootstrap run");

    assert_eq!(bootstrap.phase(), Phase::Running);
    assert_eq!(context.modules(), ["a", "b"]);
    assert!(context.is_active());
    assert!(context.sources_loaded());
    assert_eq!(context.args(), args.as_slice());
    assert_eq!(*runs.lock().expect("count lock"), 1);
    assert_eq!(bootstrap.exit_code(), 0);

    assert_eq!(
        phases(&seen),
        [
            Phase::Starting,
            Phase::EnvironmentPrepared,
            Phase::ContextPrepared,
            Phase::ContextLoaded,
            Phase::Started,
            Phase::Running,
        ]
    );
}

#[test]
fn environment_exclusions_and_report_line_up() {
    let mut environment = Environment::new();
    environment.set(igniter_boot::EXCLUDE_KEY, "b, c");

    let mut bootstrap =
        Bootstrap::new(registry("modules=a,b,c\n")).with_environment(environment);
    let context = bootstrap.run(Vec::new()).expect("bootstrap run");

    assert_eq!(context.modules(), ["a"]);
    let report = bootstrap.report();
    assert_eq!(report.selected.len(), 1);
    assert_eq!(report.selected[0].candidate, "a");
    assert_eq!(report.exclusions, ["b", "c"]);
}

#[test]
fn source_loaders_run_before_context_loaded() {
    let (listener, seen) = RecordingListener::new();
    let loaded = Arc::new(Mutex::new(false));
    let flag = loaded.clone();
    let mut bootstrap = Bootstrap::new(registry("modules=a\n"))
        .with_listener(listener)
        .with_source_loader(Box::new(
            move |context: &mut igniter_boot::RuntimeContext| {
                assert_eq!(context.modules(), ["a"]);
                assert!(!context.sources_loaded());
                *flag.lock().expect("flag lock") = true;
                Ok(())
            },
        ));

    bootstrap.run(Vec::new()).expect("bootstrap run");
    assert!(*loaded.lock().expect("flag lock"));
    assert!(phases(&seen).contains(&Phase::ContextLoaded));
}
