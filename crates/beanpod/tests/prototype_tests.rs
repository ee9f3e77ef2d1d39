//! Prototype scope behaviour

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use beanpod::{BeanRepository, Lifecycle};

struct PrintService;
impl Lifecycle for PrintService {}

struct GreetingService {
    ready: Arc<AtomicUsize>,
}

impl Lifecycle for GreetingService {
    fn on_ready(&self, _beans: &BeanRepository) {
        self.ready.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_prototype_returns_fresh_instances() {
    let repository = BeanRepository::builder("app")
        .prototype(|_| Ok(PrintService))
        .build()
        .expect("build must succeed");

    let first = repository.get::<PrintService>().expect("first get");
    let second = repository.get::<PrintService>().expect("second get");

    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_prototype_hook_fires_per_request() {
    let ready = Arc::new(AtomicUsize::new(0));
    let repository = BeanRepository::builder("app")
        .prototype({
            let ready = ready.clone();
            move |_| {
                Ok(GreetingService {
                    ready: ready.clone(),
                })
            }
        })
        .build()
        .expect("build must succeed");

    // The build probe constructed one instance without hooking it.
    assert_eq!(ready.load(Ordering::SeqCst), 0);

    repository.get::<GreetingService>().expect("get");
    repository.get::<GreetingService>().expect("get again");

    assert_eq!(ready.load(Ordering::SeqCst), 2);
}

#[test]
fn test_ad_hoc_prototype_with_parameters() {
    struct Greeting {
        text: String,
    }
    impl Lifecycle for Greeting {}

    let repository = BeanRepository::builder("app")
        .singleton(|_| Ok(PrintService))
        .build()
        .expect("build must succeed");

    // Parameters travel as captures; bean dependencies come from the
    // accessor.
    let name = "world";
    let greeting = repository
        .get_prototype(|beans| {
            let _printer = beans.get::<PrintService>()?;
            Ok(Greeting {
                text: format!("hello {name}"),
            })
        })
        .expect("ad-hoc prototype must build");

    assert_eq!(greeting.text, "hello world");
}

#[test]
fn test_ad_hoc_prototype_runs_hook() {
    let ready = Arc::new(AtomicUsize::new(0));
    let repository = BeanRepository::builder("app")
        .build()
        .expect("build must succeed");

    let bean = repository
        .get_prototype(|_| {
            Ok(GreetingService {
                ready: ready.clone(),
            })
        })
        .expect("ad-hoc prototype must build");

    assert_eq!(bean.ready.load(Ordering::SeqCst), 1);
}

#[test]
fn test_accessor_can_build_ad_hoc_prototypes() {
    struct Wrapper {
        inner: GreetingService,
    }
    impl Lifecycle for Wrapper {}

    let ready = Arc::new(AtomicUsize::new(0));
    let repository = BeanRepository::builder("app")
        .singleton({
            let ready = ready.clone();
            move |beans| {
                let inner = beans.get_prototype({
                    let ready = ready.clone();
                    move |_| {
                        Ok(GreetingService {
                            ready: ready.clone(),
                        })
                    }
                })?;
                Ok(Wrapper { inner })
            }
        })
        .build()
        .expect("build must succeed");

    let wrapper = repository.get::<Wrapper>().expect("get wrapper");
    // The eager singleton was constructed once at build; its inner ad-hoc
    // prototype was hooked during that one real construction.
    assert_eq!(wrapper.inner.ready.load(Ordering::SeqCst), 1);
}
