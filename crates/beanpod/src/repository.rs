//! The bean repository
//!
//! ## Architecture
//!
//! ```text
//! RepositoryBuilder ── build() ──▶ BeanRepository
//!                                   │  immutable key → provider map
//!                                   │  optional parent (module chain)
//!                                   ▼
//!                        get / get_beans_of_type / get_provider
//!                                   │
//!                                   ▼
//!                        BeanProvider::produce ──▶ ctor closure
//!                                   ▲                  │
//!                                   └── BeanAccessor ◀─┘  (dependencies)
//! ```
//!
//! Lookup walks the local map first, then the parent chain; a parent never
//! sees its children. Every resolution enters the thread-local resolution
//! chain, so a cyclic graph fails with a named error instead of overflowing
//! the stack. The dry-run flag rides on the same thread, which is what lets
//! a build-time probe recurse through provider after provider without
//! firing lifecycle hooks or filling singleton caches.
//!
//! A `BeanRepository` is a cheap clonable handle over shared immutable
//! state; it stays alive as long as any clone or resolving handle needs it.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::accessor::BeanAccessor;
use crate::builder::RepositoryBuilder;
use crate::dry_run::DryRunContext;
use crate::error::{Error, Result};
use crate::handle::{BeanHandle, DynBeanHandle};
use crate::key::BeanKey;
use crate::lifecycle::Lifecycle;
use crate::provider::{BeanProvider, ErasedBean, InterfaceBinding, Scope};
use crate::resolution::ResolutionGuard;

static NEXT_REPOSITORY_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct RepositoryInner {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) providers: HashMap<TypeId, BeanProvider>,
    /// Registration order, for deterministic build passes and listings.
    pub(crate) order: Vec<TypeId>,
    pub(crate) bindings: Vec<(BeanKey, InterfaceBinding)>,
    pub(crate) parent: Option<BeanRepository>,
}

/// Gives access to all configured beans.
///
/// Built once from a [`RepositoryBuilder`]; immutable afterwards. The scope
/// of each bean depends on its registration: singletons are constructed at
/// most once per repository, prototypes on every request, instances are
/// supplied pre-built. A repository may have a parent, forming a module
/// chain that lookups traverse child-to-parent.
#[derive(Clone)]
pub struct BeanRepository {
    inner: Arc<RepositoryInner>,
}

impl BeanRepository {
    /// Starts configuring a new repository.
    pub fn builder(name: impl Into<String>) -> RepositoryBuilder {
        RepositoryBuilder::new(name)
    }

    pub(crate) fn from_inner(inner: Arc<RepositoryInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn next_id() -> u64 {
        NEXT_REPOSITORY_ID.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn inner_arc(&self) -> &Arc<RepositoryInner> {
        &self.inner
    }

    /// Name this repository was built under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the fully initialised bean registered for `T`.
    ///
    /// The lookup walks the module chain. Depending on the registered scope
    /// this returns the shared instance or a freshly constructed one; the
    /// lifecycle hook has run by the time the bean is handed out.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = BeanKey::of::<T>();
        let Some((owner, provider)) = self.find_provider(key) else {
            return Err(Error::not_found(key.type_name(), &self.inner.name));
        };
        let _guard = ResolutionGuard::enter(owner.inner.id, key)?;
        match provider.produce(owner, DryRunContext::is_dry_run())? {
            Some(bean) => provider.cast_to::<T>(bean),
            None => Err(Error::dry_run(key.type_name())),
        }
    }

    /// Returns every bean visible as `T`: the bean registered under `T`
    /// itself plus every declared interface binding to `T`, aggregated from
    /// the parent chain first. Matched beans are constructed through the
    /// normal path (cached and hooked exactly once), and a bean reachable
    /// both directly and through an ancestor appears only once.
    pub fn get_beans_of_type<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>> {
        let mut collected = Vec::new();
        let mut seen = HashSet::new();
        self.collect_beans_of_type::<T>(&mut collected, &mut seen)?;
        Ok(collected)
    }

    fn collect_beans_of_type<T: ?Sized + Send + Sync + 'static>(
        &self,
        out: &mut Vec<Arc<T>>,
        seen: &mut HashSet<*const ()>,
    ) -> Result<()> {
        if let Some(parent) = &self.inner.parent {
            parent.collect_beans_of_type::<T>(out, seen)?;
        }

        let key = BeanKey::of::<T>();
        if let Some(provider) = self.inner.providers.get(&key.id()) {
            let bean = self.resolve_erased(key)?;
            if seen.insert(Arc::as_ptr(&bean).cast::<()>()) {
                out.push(provider.cast_to::<T>(bean)?);
            }
        }

        for (bound, binding) in &self.inner.bindings {
            if bound.id() == key.id() {
                let bean = self.resolve_erased(binding.target())?;
                if seen.insert(Arc::as_ptr(&bean).cast::<()>()) {
                    out.push(binding.cast_to::<T>(bean)?);
                }
            }
        }
        Ok(())
    }

    /// Returns a deferred handle for the bean registered under `T`.
    ///
    /// The handle does not resolve anything until [`BeanHandle::get`] is
    /// called; registration is still validated eagerly.
    pub fn get_provider<T: ?Sized + Send + Sync + 'static>(&self) -> Result<BeanHandle<T>> {
        let key = BeanKey::of::<T>();
        let Some((owner, _)) = self.find_provider(key) else {
            return Err(Error::not_found(key.type_name(), &self.inner.name));
        };
        Ok(BeanHandle::new(Arc::downgrade(owner.inner_arc())))
    }

    /// Deferred handles for every singleton-scoped bean in the module chain.
    pub fn providers_for_singletons(&self) -> Vec<DynBeanHandle> {
        self.providers_for_scope(Scope::Singleton)
    }

    /// Deferred handles for every prototype-scoped bean in the module chain.
    pub fn providers_for_prototypes(&self) -> Vec<DynBeanHandle> {
        self.providers_for_scope(Scope::Prototype)
    }

    /// Deferred handles for every pre-built instance in the module chain.
    pub fn providers_for_instances(&self) -> Vec<DynBeanHandle> {
        self.providers_for_scope(Scope::Instance)
    }

    fn providers_for_scope(&self, scope: Scope) -> Vec<DynBeanHandle> {
        let mut handles = match &self.inner.parent {
            Some(parent) => parent.providers_for_scope(scope),
            None => Vec::new(),
        };
        for type_id in &self.inner.order {
            let provider = &self.inner.providers[type_id];
            if provider.scope() == Some(scope) {
                handles.push(DynBeanHandle::new(
                    Arc::downgrade(&self.inner),
                    provider.key(),
                ));
            }
        }
        handles
    }

    /// Builds an unregistered prototype bean with the given closure and
    /// runs its lifecycle hook. Construction parameters travel as closure
    /// captures; bean dependencies come from the provided accessor.
    pub fn get_prototype<T, F>(&self, ctor: F) -> Result<T>
    where
        T: Lifecycle,
        F: FnOnce(&BeanAccessor) -> Result<T>,
    {
        let accessor = BeanAccessor::new(self);
        let bean = ctor(&accessor)?;
        if !DryRunContext::is_dry_run() {
            bean.on_ready(self);
        }
        Ok(bean)
    }

    /// Resolves `key` to its erased value through the normal production
    /// path, entering the resolution chain.
    pub(crate) fn resolve_erased(&self, key: BeanKey) -> Result<ErasedBean> {
        let Some((owner, provider)) = self.find_provider(key) else {
            return Err(Error::not_found(key.type_name(), &self.inner.name));
        };
        trace!(
            bean = key.type_name(),
            repository = %owner.inner.name,
            dry_run = DryRunContext::is_dry_run(),
            "resolving bean"
        );
        let _guard = ResolutionGuard::enter(owner.inner.id, key)?;
        match provider.produce(owner, DryRunContext::is_dry_run())? {
            Some(bean) => Ok(bean),
            None => Err(Error::dry_run(key.type_name())),
        }
    }

    /// Walks the module chain for the provider owning `key`, together with
    /// the repository it is registered in.
    pub(crate) fn find_provider(&self, key: BeanKey) -> Option<(&BeanRepository, &BeanProvider)> {
        if let Some(provider) = self.inner.providers.get(&key.id()) {
            return Some((self, provider));
        }
        self.inner
            .parent
            .as_ref()
            .and_then(|parent| parent.find_provider(key))
    }

    /// Probe pass run once at build time: eager singletons are really
    /// constructed, everything else is resolved under the dry-run flag so
    /// the whole dependency graph gets walked without side effects.
    pub(crate) fn run_build_pass(&self, lazy_singletons: bool) -> Result<()> {
        for type_id in &self.inner.order {
            let provider = &self.inner.providers[type_id];
            let key = provider.key();
            let eager = provider.scope() == Some(Scope::Singleton) && !lazy_singletons;
            let outcome = if eager {
                self.resolve_erased(key).map(drop)
            } else {
                DryRunContext::run_dry(|| self.resolve_erased(key).map(drop))
            };
            match outcome {
                // A factory bean aborting a probe is the probe succeeding:
                // its closure already ran, only the second stage is skipped.
                Ok(()) | Err(Error::DryRun { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

impl fmt::Display for BeanRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[BeanRepository: {}]", self.inner.name)
    }
}

impl fmt::Debug for BeanRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanRepository")
            .field("name", &self.inner.name)
            .field("beans", &self.inner.order.len())
            .field(
                "parent",
                &self.inner.parent.as_ref().map(BeanRepository::name),
            )
            .finish()
    }
}
