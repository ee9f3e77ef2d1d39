//! Lifecycle hook dispatch and dry-run silence

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use beanpod::{BeanAccessor, BeanRepository, Lifecycle, Result};

struct WorkerService {
    ready: Arc<AtomicUsize>,
}

impl WorkerService {
    fn create(
        ready: Arc<AtomicUsize>,
    ) -> impl Fn(&BeanAccessor) -> Result<WorkerService> + Send + Sync + 'static {
        move |_| {
            Ok(WorkerService {
                ready: ready.clone(),
            })
        }
    }
}

impl Lifecycle for WorkerService {
    fn on_ready(&self, _beans: &BeanRepository) {
        self.ready.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_eager_build_hooks_exactly_once() {
    let ready = Arc::new(AtomicUsize::new(0));
    let repository = BeanRepository::builder("app")
        .singleton(WorkerService::create(ready.clone()))
        .build()
        .expect("build must succeed");

    assert_eq!(ready.load(Ordering::SeqCst), 1);
    repository.get::<WorkerService>().expect("get");
    assert_eq!(ready.load(Ordering::SeqCst), 1);
}

#[test]
fn test_lazy_build_defers_the_hook_to_first_get() {
    let ready = Arc::new(AtomicUsize::new(0));
    let repository = BeanRepository::builder("app")
        .singleton(WorkerService::create(ready.clone()))
        .lazy_singletons(true)
        .build()
        .expect("build must succeed");

    assert_eq!(ready.load(Ordering::SeqCst), 0);
    repository.get::<WorkerService>().expect("get");
    assert_eq!(ready.load(Ordering::SeqCst), 1);
    repository.get::<WorkerService>().expect("get again");
    assert_eq!(ready.load(Ordering::SeqCst), 1);
}

#[test]
fn test_instances_never_pass_through_the_hook() {
    struct Config {
        ready: Arc<AtomicUsize>,
    }
    impl Lifecycle for Config {
        fn on_ready(&self, _beans: &BeanRepository) {
            self.ready.fetch_add(1, Ordering::SeqCst);
        }
    }

    let ready = Arc::new(AtomicUsize::new(0));
    let repository = BeanRepository::builder("app")
        .instance(Config {
            ready: ready.clone(),
        })
        .build()
        .expect("build must succeed");

    repository.get::<Config>().expect("get");
    assert_eq!(ready.load(Ordering::SeqCst), 0);
}

#[test]
fn test_hook_can_resolve_other_beans() {
    struct PrintService;
    impl Lifecycle for PrintService {}

    struct Startup {
        resolved: Arc<AtomicUsize>,
    }
    impl Lifecycle for Startup {
        fn on_ready(&self, beans: &BeanRepository) {
            // All registrations exist by the time any hook runs.
            beans.get::<PrintService>().expect("hook lookup");
            self.resolved.fetch_add(1, Ordering::SeqCst);
        }
    }

    let resolved = Arc::new(AtomicUsize::new(0));
    let _repository = BeanRepository::builder("app")
        .singleton({
            let resolved = resolved.clone();
            move |_| {
                Ok(Startup {
                    resolved: resolved.clone(),
                })
            }
        })
        .singleton(|_| Ok(PrintService))
        .build()
        .expect("build must succeed");

    assert_eq!(resolved.load(Ordering::SeqCst), 1);
}

#[test]
fn test_hook_can_run_bulk_queries() {
    trait Animal: Send + Sync {}

    struct Dog;
    impl Lifecycle for Dog {}
    impl Animal for Dog {}

    struct Cat;
    impl Lifecycle for Cat {}
    impl Animal for Cat {}

    struct AnimalCollector {
        seen: Arc<AtomicUsize>,
    }
    impl Lifecycle for AnimalCollector {
        fn on_ready(&self, beans: &BeanRepository) {
            let animals = beans
                .get_beans_of_type::<dyn Animal>()
                .expect("bulk query from hook");
            self.seen.fetch_add(animals.len(), Ordering::SeqCst);
        }
    }

    let seen = Arc::new(AtomicUsize::new(0));
    let _repository = BeanRepository::builder("app")
        .singleton(|_| Ok(Dog))
        .singleton(|_| Ok(Cat))
        .singleton({
            let seen = seen.clone();
            move |_| Ok(AnimalCollector { seen: seen.clone() })
        })
        .bind(|dog: Arc<Dog>| dog as Arc<dyn Animal>)
        .bind(|cat: Arc<Cat>| cat as Arc<dyn Animal>)
        .build()
        .expect("build must succeed");

    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn test_constructor_failure_aborts_build() {
    struct Flaky;
    impl Lifecycle for Flaky {}

    let err = BeanRepository::builder("app")
        .singleton::<Flaky, _>(|_| Err(beanpod::Error::construction("bad wiring")))
        .build()
        .expect_err("build must fail");

    match err {
        beanpod::Error::Construction { message, .. } => assert_eq!(message, "bad wiring"),
        other => panic!("expected Construction, got {other:?}"),
    }
}
