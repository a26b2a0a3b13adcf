//! # Kernel: the service container.
//!
//! The [`Kernel`] owns every deployed service and drives the lifecycle:
//!
//! ```text
//! add_service(root)*          (builds the dependency graph, DFS)
//!   │
//!   ▼
//! launch()
//!   ├─ freeze                 (no identity may be added from here on)
//!   ├─ parse flags            (declared by Init hooks, parsed exactly once)
//!   ├─ post-init              (registration order, fail fast)
//!   ├─ install signal handler (signal → stop sequence → exit 0)
//!   ├─ start                  (registration order; stop guaranteed from here)
//!   ├─ run                    (registration order, fail fast)
//!   └─ stop                   (reverse start order, exactly once, best effort)
//! ```
//!
//! ## Deployment rules
//! - one instance per identity: a second registration of the same identity
//!   returns the already-deployed instance, which is how unrelated services
//!   sharing a dependency observe the *same* object;
//! - an identity found in the in-flight resolution set is a circular
//!   dependency and fails immediately instead of recursing;
//! - injection points resolve before the instance's Init hook runs, so a
//!   hook can already use everything it declared.
//!
//! The kernel is an explicitly constructed value — tests build isolated
//! kernels instead of resetting shared state.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::DynamicConfig;
use crate::error::{KernelError, Phase};
use crate::inject::{Action, Deploy as _, FlagSet, InjectionPoint, SectionBind as _};
use crate::kernel::{signals, BoxFuture, Service, ServiceId, ServiceRef};

struct Deployed {
    id: ServiceId,
    service: ServiceRef,
    /// Same instance, kept downcastable for typed retrieval.
    concrete: Arc<dyn Any + Send + Sync>,
}

struct ApiBinding {
    value: Arc<dyn Any + Send + Sync>,
    /// Data-pointer address of the bound instance, for same-instance checks.
    addr: usize,
}

/// Reverse-order stop list, fired at most once per launch.
struct StopList {
    entries: Mutex<Vec<(ServiceId, ServiceRef)>>,
    fired: AtomicBool,
}

impl StopList {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fired: AtomicBool::new(false),
        }
    }

    fn push(&self, id: ServiceId, service: ServiceRef) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, service));
    }

    async fn stop_all(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        let entries = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *entries)
        };
        for (id, service) in entries.into_iter().rev() {
            if let Some(stoppable) = service.as_stoppable() {
                tracing::debug!(service = %id, "stopping");
                stoppable.stop().await;
            }
        }
    }
}

/// The service container.
pub struct Kernel {
    services: Vec<Deployed>,
    index: HashMap<ServiceId, usize>,
    /// Identities currently being deployed; cycle detection.
    resolving: HashSet<ServiceId>,
    apis: HashMap<ServiceId, ApiBinding>,
    flags: FlagSet,
    stop: Arc<StopList>,
    frozen: bool,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            index: HashMap::new(),
            resolving: HashSet::new(),
            apis: HashMap::new(),
            flags: FlagSet::default(),
            stop: Arc::new(StopList::new()),
            frozen: false,
        }
    }

    /// Deferred-registration builder over a fresh kernel.
    pub fn builder() -> crate::kernel::KernelBuilder {
        crate::kernel::KernelBuilder::new()
    }

    /// Deploys a service, or returns the already-deployed instance with the
    /// same identity.
    ///
    /// Deployment resolves the service's injection points, then runs its
    /// Init hook (which may itself register further dependencies). The
    /// instance only joins the deployed list once both succeeded.
    pub async fn add_service<S: Service>(&mut self, service: S) -> Result<Arc<S>, KernelError> {
        let id = ServiceId::for_service(&service);
        if self.frozen {
            return Err(KernelError::ReadOnly(id));
        }
        if self.resolving.contains(&id) {
            return Err(KernelError::CircularDependency(id));
        }
        if let Some(&at) = self.index.get(&id) {
            return Arc::clone(&self.services[at].concrete)
                .downcast::<S>()
                .map_err(|_| KernelError::IdentityConflict(id));
        }

        self.resolving.insert(id.clone());
        tracing::debug!(service = %id, "deploying");
        let outcome = self.deploy(id.clone(), service).await;
        self.resolving.remove(&id);
        outcome
    }

    async fn deploy<S: Service>(
        &mut self,
        id: ServiceId,
        service: S,
    ) -> Result<Arc<S>, KernelError> {
        let service = Arc::new(service);

        for point in service.injection_points() {
            self.resolve(&id, point).await?;
        }

        if let Some(init) = service.as_initializable() {
            init.init(self).await.map_err(|source| KernelError::Phase {
                phase: Phase::Init,
                service: id.clone(),
                source,
            })?;
        }

        let entry = Deployed {
            id: id.clone(),
            service: Arc::clone(&service) as ServiceRef,
            concrete: Arc::clone(&service) as Arc<dyn Any + Send + Sync>,
        };
        self.index.insert(id, self.services.len());
        self.services.push(entry);
        Ok(service)
    }

    async fn resolve(&mut self, owner: &ServiceId, point: InjectionPoint) -> Result<(), KernelError> {
        tracing::debug!(service = %owner, field = point.field(), "resolving injection point");
        let (field, action) = point.into_parts();
        match action {
            Action::Deploy(deploy) | Action::Capability(deploy) => deploy.deploy(self).await,
            Action::Flag {
                name,
                description,
                default,
                bind,
            } => self.flags.declare(&field, name, description, default, bind),
            Action::Config { section, bind } => {
                let loader = self.config_loader().await?;
                let section = section.unwrap_or_else(|| field.to_string());
                bind.register(&loader, &section)
            }
        }
    }

    /// Lazily deploys the config loader service; boxed to keep the
    /// deploy/resolve recursion finite.
    fn config_loader(&mut self) -> BoxFuture<'_, Result<Arc<DynamicConfig>, KernelError>> {
        Box::pin(self.add_service(DynamicConfig::default()))
    }

    /// Binds `api` to the capability identity `A`, usually a trait object
    /// type, so dependents can request the capability instead of a concrete
    /// service.
    ///
    /// Re-binding the same instance is a no-op; binding a different
    /// instance to an already-bound capability fails.
    pub fn register_api<A>(&mut self, api: Arc<A>) -> Result<(), KernelError>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        let id = ServiceId::of::<A>();
        if self.frozen {
            return Err(KernelError::ReadOnly(id));
        }
        let addr = Arc::as_ptr(&api) as *const () as usize;
        if let Some(existing) = self.apis.get(&id) {
            if existing.addr != addr {
                return Err(KernelError::DuplicateCapability(id));
            }
            return Ok(());
        }
        tracing::debug!(capability = %id, "registered capability");
        self.apis.insert(
            id,
            ApiBinding {
                value: Arc::new(api),
                addr,
            },
        );
        Ok(())
    }

    /// The instance bound to capability `A`, if any.
    pub fn api<A>(&self) -> Option<Arc<A>>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        self.apis
            .get(&ServiceId::of::<A>())
            .and_then(|binding| binding.value.downcast_ref::<Arc<A>>())
            .map(Arc::clone)
    }

    /// Runs the lifecycle with the process command line.
    ///
    /// Returns the first error any phase produced; the stop sequence is
    /// guaranteed once the start phase has begun. On a termination signal
    /// the stop sequence runs asynchronously and the process exits with
    /// code 0.
    pub async fn launch(self) -> Result<(), KernelError> {
        self.launch_from(std::env::args_os()).await
    }

    /// Runs the lifecycle with an explicit argv (element 0 is the binary
    /// name). This is also the seam tests and embedders use.
    pub async fn launch_from<I, T>(mut self, args: I) -> Result<(), KernelError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        if self.services.is_empty() {
            return Err(KernelError::Empty);
        }
        self.frozen = true;

        self.flags.parse_from(args)?;
        self.post_init().await?;
        self.install_signal_handler();

        let outcome = match self.start().await {
            Ok(()) => self.run().await,
            Err(err) => Err(err),
        };
        self.stop.stop_all().await;
        outcome
    }

    async fn post_init(&self) -> Result<(), KernelError> {
        for deployed in &self.services {
            if let Some(hook) = deployed.service.as_post_initializable() {
                tracing::debug!(service = %deployed.id, "post-init");
                hook.post_init()
                    .await
                    .map_err(|source| KernelError::Phase {
                        phase: Phase::PostInit,
                        service: deployed.id.clone(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    fn install_signal_handler(&self) {
        let stop = Arc::clone(&self.stop);
        tokio::spawn(async move {
            if signals::wait_for_shutdown_signal().await.is_ok() {
                tracing::info!("termination signal received, stopping services");
                stop.stop_all().await;
                tracing::info!("application terminated");
                std::process::exit(0);
            }
        });
    }

    async fn start(&self) -> Result<(), KernelError> {
        for deployed in &self.services {
            if let Some(hook) = deployed.service.as_startable() {
                tracing::debug!(service = %deployed.id, "start");
                hook.start().await.map_err(|source| KernelError::Phase {
                    phase: Phase::Start,
                    service: deployed.id.clone(),
                    source,
                })?;
            }
            if deployed.service.as_stoppable().is_some() {
                self.stop
                    .push(deployed.id.clone(), Arc::clone(&deployed.service));
            }
        }
        Ok(())
    }

    async fn run(&self) -> Result<(), KernelError> {
        for deployed in &self.services {
            if let Some(hook) = deployed.service.as_runnable() {
                tracing::debug!(service = %deployed.id, "run");
                hook.run().await.map_err(|source| KernelError::Phase {
                    phase: Phase::Run,
                    service: deployed.id.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;

    use super::*;
    use crate::error::BoxError;
    use crate::inject::{Dep, Flag};
    use crate::kernel::{Initializable, PostInitializable, Runnable, Startable, Stoppable};
    use crate::tasks::Task;
    use crate::worker::Worker;

    type EventLog = Arc<Mutex<Vec<String>>>;

    fn log(events: &EventLog, entry: impl Into<String>) {
        events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    fn entries(events: &EventLog) -> Vec<String> {
        events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    struct Tracked {
        tag: &'static str,
        events: EventLog,
    }

    impl Service for Tracked {
        fn service_name(&self) -> Option<&str> {
            Some(self.tag)
        }
        fn as_startable(&self) -> Option<&dyn Startable> {
            Some(self)
        }
        fn as_stoppable(&self) -> Option<&dyn Stoppable> {
            Some(self)
        }
    }

    #[async_trait]
    impl Startable for Tracked {
        async fn start(&self) -> Result<(), BoxError> {
            log(&self.events, format!("start:{}", self.tag));
            Ok(())
        }
    }

    #[async_trait]
    impl Stoppable for Tracked {
        async fn stop(&self) {
            log(&self.events, format!("stop:{}", self.tag));
        }
    }

    struct StopOnly {
        tag: &'static str,
        events: EventLog,
    }

    impl Service for StopOnly {
        fn service_name(&self) -> Option<&str> {
            Some(self.tag)
        }
        fn as_stoppable(&self) -> Option<&dyn Stoppable> {
            Some(self)
        }
    }

    #[async_trait]
    impl Stoppable for StopOnly {
        async fn stop(&self) {
            log(&self.events, format!("stop:{}", self.tag));
        }
    }

    #[tokio::test]
    async fn test_launch_with_nothing_deployed_fails() {
        let err = Kernel::new().launch_from(["test"]).await.unwrap_err();
        assert_eq!(err.as_label(), "kernel_empty");
    }

    #[tokio::test]
    async fn test_add_service_is_idempotent_per_identity() {
        #[derive(Default)]
        struct Shared {
            value: Mutex<i64>,
        }
        impl Service for Shared {
            fn service_name(&self) -> Option<&str> {
                Some("shared")
            }
        }

        let mut kernel = Kernel::new();
        let first = kernel.add_service(Shared::default()).await.expect("first");
        let second = kernel.add_service(Shared::default()).await.expect("second");
        assert!(Arc::ptr_eq(&first, &second));

        *first.value.lock().unwrap() = 41;
        assert_eq!(*second.value.lock().unwrap(), 41);
    }

    #[derive(Default)]
    struct SharedCounter {
        value: Mutex<i64>,
    }
    impl Service for SharedCounter {
        fn service_name(&self) -> Option<&str> {
            Some("shared-counter")
        }
    }

    #[derive(Default)]
    struct UserOne {
        shared: Dep<SharedCounter>,
    }
    impl Service for UserOne {
        fn injection_points(&self) -> Vec<InjectionPoint> {
            vec![InjectionPoint::dependency("shared", &self.shared)]
        }
    }

    #[derive(Default)]
    struct UserTwo {
        shared: Dep<SharedCounter>,
    }
    impl Service for UserTwo {
        fn injection_points(&self) -> Vec<InjectionPoint> {
            vec![InjectionPoint::dependency("shared", &self.shared)]
        }
    }

    #[tokio::test]
    async fn test_dependents_share_one_instance_and_see_mutations() {
        let one = UserOne::default();
        let two = UserTwo::default();
        let cell_one = one.shared.clone();
        let cell_two = two.shared.clone();

        let mut kernel = Kernel::new();
        kernel.add_service(one).await.expect("one");
        kernel.add_service(two).await.expect("two");
        kernel.launch_from(["test"]).await.expect("launch");

        assert!(Arc::ptr_eq(cell_one.get(), cell_two.get()));

        *cell_one.get().value.lock().unwrap() = 7;
        assert_eq!(*cell_two.get().value.lock().unwrap(), 7);
    }

    #[derive(Default, Debug)]
    struct LoopA {
        other: Dep<LoopB>,
    }
    impl Service for LoopA {
        fn injection_points(&self) -> Vec<InjectionPoint> {
            vec![InjectionPoint::dependency("other", &self.other)]
        }
    }

    #[derive(Default)]
    struct LoopB {
        other: Dep<LoopA>,
    }
    impl Service for LoopB {
        fn injection_points(&self) -> Vec<InjectionPoint> {
            vec![InjectionPoint::dependency("other", &self.other)]
        }
    }

    #[tokio::test]
    async fn test_transitive_cycle_is_detected() {
        let mut kernel = Kernel::new();
        let err = kernel.add_service(LoopA::default()).await.unwrap_err();
        assert_eq!(err.as_label(), "kernel_circular_dependency");
    }

    #[derive(Default, Debug)]
    struct SelfDep {
        me: Dep<SelfDep>,
    }
    impl Service for SelfDep {
        fn injection_points(&self) -> Vec<InjectionPoint> {
            vec![InjectionPoint::dependency("me", &self.me)]
        }
    }

    #[tokio::test]
    async fn test_self_dependency_is_detected() {
        let mut kernel = Kernel::new();
        let err = kernel.add_service(SelfDep::default()).await.unwrap_err();
        assert_eq!(err.as_label(), "kernel_circular_dependency");
    }

    #[tokio::test]
    async fn test_frozen_kernel_rejects_new_identities() {
        #[derive(Default, Debug)]
        struct Late;
        impl Service for Late {}

        let mut kernel = Kernel::new();
        kernel
            .add_service(SharedCounter::default())
            .await
            .expect("add");
        kernel.frozen = true;

        let err = kernel.add_service(Late::default()).await.unwrap_err();
        assert_eq!(err.as_label(), "kernel_read_only");
    }

    #[tokio::test]
    async fn test_init_hook_can_register_dependencies() {
        #[derive(Default)]
        struct ManualInit {
            dep: Dep<SharedCounter>,
        }
        impl Service for ManualInit {
            fn as_initializable(&self) -> Option<&dyn Initializable> {
                Some(self)
            }
        }
        #[async_trait]
        impl Initializable for ManualInit {
            async fn init(&self, kernel: &mut Kernel) -> Result<(), BoxError> {
                let shared = kernel.add_service(SharedCounter::default()).await?;
                self.dep.fill(shared);
                Ok(())
            }
        }

        let manual = ManualInit::default();
        let cell = manual.dep.clone();
        let injected = UserOne::default();
        let injected_cell = injected.shared.clone();

        let mut kernel = Kernel::new();
        kernel.add_service(manual).await.expect("manual");
        kernel.add_service(injected).await.expect("injected");

        // init-registered and injection-resolved instances deduplicate
        assert!(Arc::ptr_eq(cell.get(), injected_cell.get()));
    }

    #[tokio::test]
    async fn test_stop_order_reverses_start_order_with_mixed_services() {
        let events: EventLog = Arc::new(Mutex::new(Vec::new()));

        let mut kernel = Kernel::new();
        kernel
            .add_service(Tracked {
                tag: "a",
                events: Arc::clone(&events),
            })
            .await
            .expect("a");
        kernel
            .add_service(StopOnly {
                tag: "b",
                events: Arc::clone(&events),
            })
            .await
            .expect("b");
        kernel
            .add_service(Tracked {
                tag: "c",
                events: Arc::clone(&events),
            })
            .await
            .expect("c");

        kernel.launch_from(["test"]).await.expect("launch");

        assert_eq!(
            entries(&events),
            vec!["start:a", "start:c", "stop:c", "stop:b", "stop:a"]
        );
    }

    #[tokio::test]
    async fn test_start_failure_unwinds_already_started_services() {
        struct BrokenStart;
        impl Service for BrokenStart {
            fn as_startable(&self) -> Option<&dyn Startable> {
                Some(self)
            }
        }
        #[async_trait]
        impl Startable for BrokenStart {
            async fn start(&self) -> Result<(), BoxError> {
                Err("refusing to start".into())
            }
        }

        let events: EventLog = Arc::new(Mutex::new(Vec::new()));
        let mut kernel = Kernel::new();
        kernel
            .add_service(Tracked {
                tag: "a",
                events: Arc::clone(&events),
            })
            .await
            .expect("a");
        kernel.add_service(BrokenStart).await.expect("broken");
        kernel
            .add_service(Tracked {
                tag: "z",
                events: Arc::clone(&events),
            })
            .await
            .expect("z");

        let err = kernel.launch_from(["test"]).await.unwrap_err();
        match err {
            KernelError::Phase { phase, .. } => assert_eq!(phase, Phase::Start),
            other => panic!("unexpected error: {other}"),
        }
        // "z" never started, "a" was stopped anyway
        assert_eq!(entries(&events), vec!["start:a", "stop:a"]);
    }

    #[tokio::test]
    async fn test_post_init_is_fail_fast_and_precedes_start() {
        struct PostOk {
            tag: &'static str,
            events: EventLog,
        }
        impl Service for PostOk {
            fn service_name(&self) -> Option<&str> {
                Some(self.tag)
            }
            fn as_post_initializable(&self) -> Option<&dyn PostInitializable> {
                Some(self)
            }
        }
        #[async_trait]
        impl PostInitializable for PostOk {
            async fn post_init(&self) -> Result<(), BoxError> {
                log(&self.events, format!("post:{}", self.tag));
                Ok(())
            }
        }

        struct PostBroken;
        impl Service for PostBroken {
            fn as_post_initializable(&self) -> Option<&dyn PostInitializable> {
                Some(self)
            }
        }
        #[async_trait]
        impl PostInitializable for PostBroken {
            async fn post_init(&self) -> Result<(), BoxError> {
                Err("post-init exploded".into())
            }
        }

        let events: EventLog = Arc::new(Mutex::new(Vec::new()));
        let mut kernel = Kernel::new();
        kernel
            .add_service(PostOk {
                tag: "first",
                events: Arc::clone(&events),
            })
            .await
            .expect("first");
        kernel.add_service(PostBroken).await.expect("broken");
        kernel
            .add_service(Tracked {
                tag: "starter",
                events: Arc::clone(&events),
            })
            .await
            .expect("starter");

        let err = kernel.launch_from(["test"]).await.unwrap_err();
        match err {
            KernelError::Phase { phase, .. } => assert_eq!(phase, Phase::PostInit),
            other => panic!("unexpected error: {other}"),
        }
        // nothing started, nothing stopped
        assert_eq!(entries(&events), vec!["post:first"]);
    }

    #[tokio::test]
    async fn test_run_phase_executes_runnables_in_order() {
        struct Runner {
            tag: &'static str,
            events: EventLog,
        }
        impl Service for Runner {
            fn service_name(&self) -> Option<&str> {
                Some(self.tag)
            }
            fn as_runnable(&self) -> Option<&dyn Runnable> {
                Some(self)
            }
        }
        #[async_trait]
        impl Runnable for Runner {
            async fn run(&self) -> Result<(), BoxError> {
                log(&self.events, format!("run:{}", self.tag));
                Ok(())
            }
        }

        let events: EventLog = Arc::new(Mutex::new(Vec::new()));
        let mut kernel = Kernel::new();
        for tag in ["one", "two"] {
            kernel
                .add_service(Runner {
                    tag,
                    events: Arc::clone(&events),
                })
                .await
                .expect("runner");
        }
        kernel.launch_from(["test"]).await.expect("launch");
        assert_eq!(entries(&events), vec!["run:one", "run:two"]);
    }

    #[tokio::test]
    async fn test_flag_is_bound_after_launch() {
        #[derive(Default)]
        struct Flagged {
            verbose: Flag<bool>,
        }
        impl Service for Flagged {
            fn injection_points(&self) -> Vec<InjectionPoint> {
                vec![InjectionPoint::flag("verbose", &self.verbose)]
            }
        }

        let service = Flagged::default();
        let cell = service.verbose.clone();

        let mut kernel = Kernel::new();
        kernel.add_service(service).await.expect("add");
        assert!(cell.try_get().is_none());

        kernel.launch_from(["test"]).await.expect("launch");
        assert_eq!(cell.get(), &false);
    }

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    #[derive(Default)]
    struct EnglishGreeter;
    impl Service for EnglishGreeter {}
    impl Greeter for EnglishGreeter {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[tokio::test]
    async fn test_capability_registration_and_injection() {
        #[derive(Default)]
        struct Provider;
        impl Service for Provider {
            fn as_initializable(&self) -> Option<&dyn Initializable> {
                Some(self)
            }
        }
        #[async_trait]
        impl Initializable for Provider {
            async fn init(&self, kernel: &mut Kernel) -> Result<(), BoxError> {
                let greeter = kernel.add_service(EnglishGreeter::default()).await?;
                kernel.register_api::<dyn Greeter>(greeter)?;
                Ok(())
            }
        }

        #[derive(Default)]
        struct NeedsGreeter {
            greeter: Dep<dyn Greeter>,
        }
        impl Service for NeedsGreeter {
            fn injection_points(&self) -> Vec<InjectionPoint> {
                vec![InjectionPoint::capability("greeter", &self.greeter)]
            }
        }

        let needs = NeedsGreeter::default();
        let cell = needs.greeter.clone();

        let mut kernel = Kernel::new();
        kernel.add_service(Provider).await.expect("provider");
        kernel.add_service(needs).await.expect("needs");

        assert_eq!(cell.get().greet(), "hello");
    }

    #[tokio::test]
    async fn test_unbound_capability_fails_resolution() {
        #[derive(Default, Debug)]
        struct NeedsGreeter {
            greeter: Dep<dyn Greeter>,
        }
        impl Service for NeedsGreeter {
            fn injection_points(&self) -> Vec<InjectionPoint> {
                vec![InjectionPoint::capability("greeter", &self.greeter)]
            }
        }

        let mut kernel = Kernel::new();
        let err = kernel
            .add_service(NeedsGreeter::default())
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "kernel_unknown_capability");
    }

    #[tokio::test]
    async fn test_rebinding_a_capability_to_another_instance_fails() {
        let mut kernel = Kernel::new();
        let first: Arc<dyn Greeter> = Arc::new(EnglishGreeter);
        let second: Arc<dyn Greeter> = Arc::new(EnglishGreeter);

        kernel
            .register_api::<dyn Greeter>(Arc::clone(&first))
            .expect("bind");
        // same instance again: fine
        kernel.register_api::<dyn Greeter>(first).expect("rebind");

        let err = kernel.register_api::<dyn Greeter>(second).unwrap_err();
        assert_eq!(err.as_label(), "kernel_duplicate_capability");
    }

    #[tokio::test]
    async fn test_worker_runs_queued_tasks_during_launch() {
        #[derive(Default)]
        struct Scheduler {
            worker: Dep<Worker>,
            done: Arc<AtomicBool>,
        }
        impl Service for Scheduler {
            fn injection_points(&self) -> Vec<InjectionPoint> {
                vec![InjectionPoint::worker("worker", &self.worker)]
            }
            fn as_startable(&self) -> Option<&dyn Startable> {
                Some(self)
            }
        }
        #[async_trait]
        impl Startable for Scheduler {
            async fn start(&self) -> Result<(), BoxError> {
                let done = Arc::clone(&self.done);
                self.worker.get().add_task(Task::new(move |_ctx| {
                    let done = Arc::clone(&done);
                    async move {
                        done.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                }));
                Ok(())
            }
        }

        let scheduler = Scheduler::default();
        let done = Arc::clone(&scheduler.done);

        let mut kernel = Kernel::new();
        kernel.add_service(scheduler).await.expect("scheduler");
        kernel.launch_from(["test"]).await.expect("launch");

        // one-shot mode drained the queue during the run phase
        assert!(done.load(Ordering::SeqCst));
    }
}
