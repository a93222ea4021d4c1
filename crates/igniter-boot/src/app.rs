//! Bootstrap orchestrator: drives one process attempt through the ordered
//! lifecycle phases, consuming the resolved module order along the way.

use std::sync::Arc;

use indexmap::IndexSet;
use serde::Serialize;

use crate::context::RuntimeContext;
use crate::env::Environment;
use crate::error::BootError;
use crate::event::{Phase, PhaseListener};
use crate::exit::{ExitCodeGenerator, ExitCodeMapper, resolve_exit_code};
use crate::listener::{EventPublishingRunListener, RunListener, RunListeners};
use igniter_resolve::{
    CandidateFilter, CandidateMetadata, CandidateRegistry, FactoryRegistry, Resolvable,
    ResolutionGroup, ResolutionRequest, Resolver, SelectedCandidate,
};

/// Default capability key of the activatable module candidates.
pub const MODULES_KEY: &str = "modules";
/// Capability key under which filter stage ids are listed.
pub const FILTERS_KEY: &str = "module-filters";
/// Capability key under which phase listener ids are listed.
pub const LISTENERS_KEY: &str = "phase-listeners";
/// Capability key under which run listener ids are listed.
pub const RUN_LISTENERS_KEY: &str = "run-listeners";

/// Post-activation callback, run between `Started` and `Running`.
pub trait Runner: Send {
    fn name(&self) -> &str {
        "runner"
    }

    fn order(&self) -> i32 {
        0
    }

    fn run(&mut self, args: &[String]) -> anyhow::Result<()>;
}

/// Loads one declared module source into the context during the
/// `ContextLoaded` phase.
pub trait SourceLoader: Send {
    fn load(&mut self, context: &mut RuntimeContext) -> anyhow::Result<()>;
}

impl<F> SourceLoader for F
where
    F: FnMut(&mut RuntimeContext) -> anyhow::Result<()> + Send,
{
    fn load(&mut self, context: &mut RuntimeContext) -> anyhow::Result<()> {
        self(context)
    }
}

/// Diagnostic record of one attempt's resolution outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    pub selected: Vec<SelectedCandidate>,
    pub exclusions: Vec<String>,
}

/// Drives the bootstrap lifecycle. One instance serves one attempt; `run`
/// is not re-entrant and a consumed instance rejects further calls.
pub struct Bootstrap {
    registry: Arc<CandidateRegistry>,
    metadata: Arc<CandidateMetadata>,
    known_modules: Arc<dyn Resolvable + Send + Sync>,
    filter_factories: FactoryRegistry<Box<dyn CandidateFilter>>,
    listener_factories: FactoryRegistry<Arc<dyn PhaseListener>>,
    run_listener_factories: FactoryRegistry<Box<dyn RunListener>>,
    module_key: String,
    requests: Vec<ResolutionRequest>,
    listeners: Vec<Arc<dyn PhaseListener>>,
    extra_run_listeners: Vec<Box<dyn RunListener>>,
    source_loaders: Vec<Box<dyn SourceLoader>>,
    runners: Vec<Box<dyn Runner>>,
    environment: Environment,
    register_shutdown_hook: bool,
    exit_generators: Vec<Box<dyn ExitCodeGenerator>>,
    exit_mappers: Vec<Box<dyn ExitCodeMapper>>,
    phase: Phase,
    report: ResolutionReport,
    exit_code: Option<i32>,
}

impl Bootstrap {
    pub fn new(registry: Arc<CandidateRegistry>) -> Self {
        Self {
            registry,
            metadata: Arc::new(CandidateMetadata::new()),
            known_modules: Arc::new(IndexSet::<String>::new()),
            filter_factories: FactoryRegistry::new(),
            listener_factories: FactoryRegistry::new(),
            run_listener_factories: FactoryRegistry::new(),
            module_key: MODULES_KEY.to_string(),
            requests: Vec::new(),
            listeners: Vec::new(),
            extra_run_listeners: Vec::new(),
            source_loaders: Vec::new(),
            runners: Vec::new(),
            environment: Environment::new(),
            register_shutdown_hook: true,
            exit_generators: Vec::new(),
            exit_mappers: Vec::new(),
            phase: Phase::Starting,
            report: ResolutionReport::default(),
            exit_code: None,
        }
    }

    pub fn with_metadata(mut self, metadata: CandidateMetadata) -> Self {
        self.metadata = Arc::new(metadata);
        self
    }

    pub fn with_known_modules(mut self, known: Arc<dyn Resolvable + Send + Sync>) -> Self {
        self.known_modules = known;
        self
    }

    pub fn with_filter_factories(
        mut self,
        factories: FactoryRegistry<Box<dyn CandidateFilter>>,
    ) -> Self {
        self.filter_factories = factories;
        self
    }

    pub fn with_listener_factories(
        mut self,
        factories: FactoryRegistry<Arc<dyn PhaseListener>>,
    ) -> Self {
        self.listener_factories = factories;
        self
    }

    pub fn with_run_listener_factories(
        mut self,
        factories: FactoryRegistry<Box<dyn RunListener>>,
    ) -> Self {
        self.run_listener_factories = factories;
        self
    }

    pub fn with_module_key(mut self, key: impl Into<String>) -> Self {
        self.module_key = key.into();
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_request(mut self, request: ResolutionRequest) -> Self {
        self.requests.push(request);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn PhaseListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_run_listener(mut self, listener: Box<dyn RunListener>) -> Self {
        self.extra_run_listeners.push(listener);
        self
    }

    pub fn with_source_loader(mut self, loader: Box<dyn SourceLoader>) -> Self {
        self.source_loaders.push(loader);
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn Runner>) -> Self {
        self.runners.push(runner);
        self
    }

    pub fn with_shutdown_hook(mut self, register: bool) -> Self {
        self.register_shutdown_hook = register;
        self
    }

    pub fn with_exit_generator(mut self, generator: Box<dyn ExitCodeGenerator>) -> Self {
        self.exit_generators.push(generator);
        self
    }

    pub fn with_exit_mapper(mut self, mapper: Box<dyn ExitCodeMapper>) -> Self {
        self.exit_mappers.push(mapper);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Resolution outcome of the last attempt, for diagnostics.
    pub fn report(&self) -> &ResolutionReport {
        &self.report
    }

    /// Exit code computed for the last failed attempt; the embedding
    /// process uses it as the exit status (0 means success).
    pub fn exit_code(&self) -> i32 {
        self.exit_code.unwrap_or(0)
    }

    /// Drive the full lifecycle. Returns the activated context on success;
    /// on failure the ORIGINAL error is returned after exit-code
    /// computation, best-effort failure notification, and context release.
    pub fn run(&mut self, args: Vec<String>) -> Result<RuntimeContext, BootError> {
        if self.phase != Phase::Starting {
            return Err(BootError::Phase {
                phase: self.phase,
                message: "bootstrap instance already consumed".to_string(),
            });
        }

        let mut listeners = self.build_run_listeners(&args);

        let mut context = match self.prepare(&args, &mut listeners) {
            Ok(context) => context,
            Err(err) => return Err(self.handle_run_failure(err, None, &mut listeners)),
        };
        if let Err(err) = self.start(&args, &mut context, &mut listeners) {
            return Err(self.handle_run_failure(err, Some(&mut context), &mut listeners));
        }
        self.phase = Phase::Running;
        Ok(context)
    }

    fn build_run_listeners(&mut self, args: &[String]) -> RunListeners {
        let discovered = match self.registry.load(LISTENERS_KEY) {
            Ok(ids) => self
                .listener_factories
                .create_all(ids.iter().map(String::as_str)),
            Err(err) => {
                // A malformed manifest surfaces again when modules load;
                // listener discovery stays best-effort.
                log::warn!("listener discovery failed: {err}");
                Vec::new()
            }
        };
        let mut app_listeners = self.listeners.clone();
        app_listeners.extend(discovered);

        let mut run_listeners: Vec<Box<dyn RunListener>> = vec![Box::new(
            EventPublishingRunListener::new(args.to_vec(), &app_listeners),
        )];
        match self.registry.load(RUN_LISTENERS_KEY) {
            Ok(ids) => run_listeners.extend(
                self.run_listener_factories
                    .create_all(ids.iter().map(String::as_str)),
            ),
            Err(err) => log::warn!("run listener discovery failed: {err}"),
        }
        run_listeners.append(&mut self.extra_run_listeners);
        RunListeners::new(run_listeners)
    }

    fn prepare(
        &mut self,
        args: &[String],
        listeners: &mut RunListeners,
    ) -> Result<RuntimeContext, BootError> {
        listeners.starting(args)?;

        let environment = self.environment.clone();
        listeners.environment_prepared(&environment)?;
        self.phase = Phase::EnvironmentPrepared;

        Ok(RuntimeContext::new(environment, args.to_vec()))
    }

    fn start(
        &mut self,
        args: &[String],
        context: &mut RuntimeContext,
        listeners: &mut RunListeners,
    ) -> Result<(), BootError> {
        let selected = self.resolve_modules(context.environment())?;
        context.register_modules(
            selected
                .iter()
                .map(|entry| entry.candidate.clone())
                .collect(),
        );
        listeners.context_prepared(context)?;
        self.phase = Phase::ContextPrepared;

        let mut loaders = std::mem::take(&mut self.source_loaders);
        for loader in &mut loaders {
            loader.load(context).map_err(|err| BootError::Phase {
                phase: Phase::ContextLoaded,
                message: format!("{err:#}"),
            })?;
        }
        context.mark_sources_loaded();
        listeners.context_loaded(context)?;
        self.phase = Phase::ContextLoaded;

        context.activate()?;
        if self.register_shutdown_hook {
            context.request_shutdown_hook();
        }
        listeners.started(context)?;
        self.phase = Phase::Started;

        self.call_runners(args)?;
        listeners.running(context)?;
        Ok(())
    }

    fn resolve_modules(
        &mut self,
        environment: &Environment,
    ) -> Result<Vec<SelectedCandidate>, BootError> {
        let environment_excludes = environment.exclusions();

        let filter_ids = self.registry.load(FILTERS_KEY)?;
        let filters = self
            .filter_factories
            .create_all(filter_ids.iter().map(String::as_str));

        let resolver = Resolver::new(
            self.registry.clone(),
            self.module_key.clone(),
            self.known_modules.clone(),
            self.metadata.clone(),
        )
        .with_filters(filters);

        let requests = if self.requests.is_empty() {
            vec![ResolutionRequest::new("main")]
        } else {
            self.requests.clone()
        };

        let mut group = ResolutionGroup::new();
        for mut request in requests {
            request
                .environment_excludes
                .extend(environment_excludes.iter().cloned());
            group.process(resolver.resolve(&request)?);
        }

        let selected = group.select(&self.metadata);
        self.report = ResolutionReport {
            selected: selected.clone(),
            exclusions: group.exclusions().into_iter().collect(),
        };
        log::debug!(
            "resolved {} module(s) with {} exclusion(s)",
            self.report.selected.len(),
            self.report.exclusions.len()
        );
        Ok(selected)
    }

    fn call_runners(&mut self, args: &[String]) -> Result<(), BootError> {
        let mut runners = std::mem::take(&mut self.runners);
        runners.sort_by_key(|runner| runner.order());
        for runner in &mut runners {
            if let Err(err) = runner.run(args) {
                return Err(BootError::Runner {
                    name: runner.name().to_string(),
                    message: format!("{err:#}"),
                });
            }
        }
        Ok(())
    }

    fn handle_run_failure(
        &mut self,
        failure: BootError,
        context: Option<&mut RuntimeContext>,
        listeners: &mut RunListeners,
    ) -> BootError {
        self.phase = Phase::Failed;
        self.exit_code = Some(resolve_exit_code(
            Some(&failure),
            &self.exit_generators,
            &self.exit_mappers,
        ));

        match context {
            Some(context) => {
                listeners.failed(Some(&*context), &failure);
                if let Err(err) = context.close() {
                    log::warn!("context close after failure: {err}");
                }
            }
            None => listeners.failed(None, &failure),
        }

        log::error!("bootstrap run failed: {failure}");
        failure
    }
}
