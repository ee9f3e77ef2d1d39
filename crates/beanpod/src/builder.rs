//! Repository configuration
//!
//! [`RepositoryBuilder`] accumulates registrations and finalises them into
//! an immutable [`BeanRepository`]. Nothing is constructed while the builder
//! is being filled; [`RepositoryBuilder::build`] validates the registration
//! set (duplicate keys locally and against the parent chain, dangling alias
//! and binding targets), then walks the whole dependency graph once,
//! constructing eager singletons for real and probing everything else under
//! the dry-run flag, so that unresolvable dependencies and cycles surface
//! before any bean reaches application code.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::accessor::BeanAccessor;
use crate::error::{Error, Result};
use crate::factory::BeanFactory;
use crate::key::BeanKey;
use crate::lifecycle::Lifecycle;
use crate::provider::{BeanProvider, InterfaceBinding};
use crate::repository::{BeanRepository, RepositoryInner};

const ANONYMOUS: &str = "<anonymous>";

/// Fluent configuration for a [`BeanRepository`].
pub struct RepositoryBuilder {
    name: String,
    parent: Option<BeanRepository>,
    providers: Vec<BeanProvider>,
    bindings: Vec<(BeanKey, InterfaceBinding)>,
    lazy_singletons: bool,
}

impl RepositoryBuilder {
    /// Creates a builder for a repository with the given module name. The
    /// name shows up in diagnostics and conflict errors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            providers: Vec::new(),
            bindings: Vec::new(),
            lazy_singletons: false,
        }
    }

    /// Declares `parent` as the ancestor module: lookups fall back to it,
    /// and registering a key the parent chain already owns is a build
    /// error, never a silent override.
    pub fn parent(mut self, parent: &BeanRepository) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// When enabled, singletons are constructed on first request instead of
    /// at build time. The build pass still probes their dependency graph.
    pub fn lazy_singletons(mut self, enabled: bool) -> Self {
        self.lazy_singletons = enabled;
        self
    }

    /// Registers a singleton: constructed at most once per repository, the
    /// same instance is returned for every request.
    pub fn singleton<T, F>(mut self, ctor: F) -> Self
    where
        T: Lifecycle + Send + Sync + 'static,
        F: Fn(&BeanAccessor) -> Result<T> + Send + Sync + 'static,
    {
        debug!(bean = type_name::<T>(), module = %self.name, "registering singleton");
        self.providers
            .push(BeanProvider::singleton(self.name.clone(), ctor));
        self
    }

    /// Registers a prototype: a fresh instance is constructed for every
    /// request.
    pub fn prototype<T, F>(mut self, ctor: F) -> Self
    where
        T: Lifecycle + Send + Sync + 'static,
        F: Fn(&BeanAccessor) -> Result<T> + Send + Sync + 'static,
    {
        debug!(bean = type_name::<T>(), module = %self.name, "registering prototype");
        self.providers
            .push(BeanProvider::prototype(self.name.clone(), ctor));
        self
    }

    /// Registers a pre-built value under its own type. The value never
    /// passes through a construction closure or the lifecycle hook.
    pub fn instance<T>(mut self, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        debug!(bean = type_name::<T>(), module = %self.name, "registering instance");
        self.providers
            .push(BeanProvider::instance(self.name.clone(), value));
        self
    }

    /// Registers a singleton built in two stages: the closure creates the
    /// factory, and the factory's
    /// [`create_instance`](BeanFactory::create_instance) creates the bean,
    /// exactly once, never while probing.
    pub fn singleton_factory<F, C>(mut self, ctor: C) -> Self
    where
        F: BeanFactory + Lifecycle + Send + Sync + 'static,
        F::Bean: Lifecycle,
        C: Fn(&BeanAccessor) -> Result<F> + Send + Sync + 'static,
    {
        debug!(
            bean = type_name::<F::Bean>(),
            module = %self.name,
            "registering singleton factory"
        );
        self.providers
            .push(BeanProvider::singleton_factory::<F, C>(self.name.clone(), ctor));
        self
    }

    /// Registers a prototype built in two stages; a fresh factory and a
    /// fresh bean per request.
    pub fn prototype_factory<F, C>(mut self, ctor: C) -> Self
    where
        F: BeanFactory + Lifecycle + Send + Sync + 'static,
        F::Bean: Lifecycle,
        C: Fn(&BeanAccessor) -> Result<F> + Send + Sync + 'static,
    {
        debug!(
            bean = type_name::<F::Bean>(),
            module = %self.name,
            "registering prototype factory"
        );
        self.providers
            .push(BeanProvider::prototype_factory::<F, C>(self.name.clone(), ctor));
        self
    }

    /// Registers `A` as an alias for the bean registered under `B`: both
    /// keys resolve to the same instance with the same scope, and the
    /// lifecycle hook fires no additional time for the alias. The cast
    /// closure performs the coercion, typically `|bean| bean as Arc<dyn T>`.
    pub fn alias<A, B, F>(mut self, cast: F) -> Self
    where
        A: ?Sized + 'static,
        B: Send + Sync + 'static,
        F: Fn(Arc<B>) -> Arc<A> + Send + Sync + 'static,
    {
        debug!(
            alias = type_name::<A>(),
            target = type_name::<B>(),
            module = %self.name,
            "registering alias"
        );
        self.providers
            .push(BeanProvider::alias(self.name.clone(), cast));
        self
    }

    /// Declares that the bean registered under `B` is also visible as `A`
    /// in [`BeanRepository::get_beans_of_type`]. Unlike an alias this does
    /// not create a requestable key, so any number of beans may bind to the
    /// same type.
    pub fn bind<A, B, F>(mut self, cast: F) -> Self
    where
        A: ?Sized + 'static,
        B: Send + Sync + 'static,
        F: Fn(Arc<B>) -> Arc<A> + Send + Sync + 'static,
    {
        debug!(
            bound = type_name::<A>(),
            target = type_name::<B>(),
            module = %self.name,
            "registering interface binding"
        );
        self.bindings.push(InterfaceBinding::new(cast));
        self
    }

    /// Validates the registration set and finalises the repository.
    ///
    /// Eager singletons (the default) are fully constructed here; their
    /// lifecycle hooks have run when `build` returns. With
    /// [`lazy_singletons`](Self::lazy_singletons) enabled the graph is only
    /// probed and construction waits for the first request. Either way a
    /// cyclic dependency graph fails the build with
    /// [`Error::CircularDependency`].
    pub fn build(self) -> Result<BeanRepository> {
        let Self {
            name,
            parent,
            providers: registrations,
            bindings,
            lazy_singletons,
        } = self;

        let mut providers = HashMap::with_capacity(registrations.len());
        let mut order = Vec::with_capacity(registrations.len());

        for provider in registrations {
            let key = provider.key();
            if let Some(existing) = providers.get(&key.id()) {
                let existing: &BeanProvider = existing;
                return Err(Error::duplicate(
                    key.type_name(),
                    provider.module(),
                    existing.module(),
                ));
            }
            if let Some(parent) = &parent {
                if let Some((_, existing)) = parent.find_provider(key) {
                    return Err(Error::duplicate(
                        key.type_name(),
                        provider.module(),
                        existing.module(),
                    ));
                }
            }
            order.push(key.id());
            providers.insert(key.id(), provider);
        }

        // Alias and binding targets must refer to a registered key, locally
        // or anywhere up the parent chain.
        for provider in providers.values() {
            if let Some(target) = provider.alias_target() {
                ensure_registered(&providers, parent.as_ref(), &name, target)?;
            }
        }
        for (_, binding) in &bindings {
            ensure_registered(&providers, parent.as_ref(), &name, binding.target())?;
        }

        let inner = RepositoryInner {
            id: BeanRepository::next_id(),
            name,
            providers,
            order,
            bindings,
            parent,
        };
        let repository = BeanRepository::from_inner(Arc::new(inner));

        repository.run_build_pass(lazy_singletons)?;

        info!(
            repository = repository.name(),
            beans = repository.inner_arc().order.len(),
            lazy_singletons,
            "bean repository built"
        );
        Ok(repository)
    }
}

fn ensure_registered(
    providers: &HashMap<std::any::TypeId, BeanProvider>,
    parent: Option<&BeanRepository>,
    module: &str,
    target: BeanKey,
) -> Result<()> {
    let local = providers.contains_key(&target.id());
    let inherited = parent.is_some_and(|parent| parent.find_provider(target).is_some());
    if local || inherited {
        Ok(())
    } else {
        Err(Error::not_found(target.type_name(), module))
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new(ANONYMOUS)
    }
}
