//! Provider strategies
//!
//! A provider knows how to produce a value for one registered key. The six
//! strategies differ in when construction happens and what gets remembered:
//!
//! | Strategy            | Construction                    | Cached |
//! |---------------------|---------------------------------|--------|
//! | `Singleton`         | closure, at most once           | yes    |
//! | `Prototype`         | closure, every request          | no     |
//! | `Instance`          | pre-built, never constructed    | n/a    |
//! | `SingletonFactory`  | closure → factory → bean, once  | yes    |
//! | `PrototypeFactory`  | closure → factory → bean        | no     |
//! | `Alias`             | forwards to the aliased key     | shares |
//!
//! Values move through the repository type-erased as
//! `Arc<dyn Any + Send + Sync>`; each provider carries a caster closure,
//! captured at registration time while the concrete type was still known,
//! that restores the registration type on the way out. The same trick backs
//! aliases and interface bindings, where the caster additionally performs
//! the user-supplied `Arc<Concrete> -> Arc<dyn Trait>` coercion.
//!
//! Production under a dry run suppresses side effects but not recursion:
//! construction closures still run and still resolve their dependencies, so
//! the build-time probe walks the entire graph. Lifecycle hooks never fire,
//! singleton cells stay empty, and factories skip `create_instance`. A
//! factory provider yields `None` while probing, which the repository maps
//! to [`Error::DryRun`](crate::Error::DryRun).

use std::any::{Any, type_name};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::debug;

use crate::accessor::BeanAccessor;
use crate::error::{Error, Result};
use crate::factory::BeanFactory;
use crate::key::BeanKey;
use crate::lifecycle::Lifecycle;
use crate::repository::BeanRepository;

/// Type-erased bean value as stored and shared internally.
pub(crate) type ErasedBean = Arc<dyn Any + Send + Sync>;

/// Type-erased construction closure. The flag is the dry-run state at the
/// time of the call; `None` means production was suppressed by the probe.
type ErasedCtor = Box<dyn Fn(&BeanRepository, bool) -> Result<Option<ErasedBean>> + Send + Sync>;

/// Restores the registration type `T` from an erased value.
pub(crate) type BeanCast<T> = Box<dyn Fn(ErasedBean) -> Result<Arc<T>> + Send + Sync>;

/// Lifecycle policy of a registered bean.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scope {
    /// One instance per repository, constructed at most once.
    Singleton,
    /// A fresh instance for every request.
    Prototype,
    /// A pre-built value supplied at registration time.
    Instance,
}

/// A registered construction strategy for one key.
pub(crate) struct BeanProvider {
    key: BeanKey,
    module: String,
    kind: ProviderKind,
    /// Erased [`BeanCast`] for the registration type.
    cast: Box<dyn Any + Send + Sync>,
}

enum ProviderKind {
    Singleton { ctor: ErasedCtor, cell: SingletonCell },
    Prototype { ctor: ErasedCtor },
    Instance { value: ErasedBean },
    SingletonFactory { ctor: ErasedCtor, cell: SingletonCell },
    PrototypeFactory { ctor: ErasedCtor },
    Alias { target: BeanKey },
}

impl BeanProvider {
    pub(crate) fn singleton<T, F>(module: String, ctor: F) -> Self
    where
        T: Lifecycle + Send + Sync + 'static,
        F: Fn(&BeanAccessor) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            key: BeanKey::of::<T>(),
            module,
            kind: ProviderKind::Singleton {
                ctor: erase_ctor(ctor),
                cell: SingletonCell::new(),
            },
            cast: Box::new(downcast_to::<T>()),
        }
    }

    pub(crate) fn prototype<T, F>(module: String, ctor: F) -> Self
    where
        T: Lifecycle + Send + Sync + 'static,
        F: Fn(&BeanAccessor) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            key: BeanKey::of::<T>(),
            module,
            kind: ProviderKind::Prototype {
                ctor: erase_ctor(ctor),
            },
            cast: Box::new(downcast_to::<T>()),
        }
    }

    pub(crate) fn instance<T>(module: String, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            key: BeanKey::of::<T>(),
            module,
            kind: ProviderKind::Instance {
                value: Arc::new(value),
            },
            cast: Box::new(downcast_to::<T>()),
        }
    }

    pub(crate) fn singleton_factory<F, C>(module: String, ctor: C) -> Self
    where
        F: BeanFactory + Lifecycle + Send + Sync + 'static,
        F::Bean: Lifecycle,
        C: Fn(&BeanAccessor) -> Result<F> + Send + Sync + 'static,
    {
        Self {
            key: BeanKey::of::<F::Bean>(),
            module,
            kind: ProviderKind::SingletonFactory {
                ctor: erase_factory_ctor(ctor),
                cell: SingletonCell::new(),
            },
            cast: Box::new(downcast_to::<F::Bean>()),
        }
    }

    pub(crate) fn prototype_factory<F, C>(module: String, ctor: C) -> Self
    where
        F: BeanFactory + Lifecycle + Send + Sync + 'static,
        F::Bean: Lifecycle,
        C: Fn(&BeanAccessor) -> Result<F> + Send + Sync + 'static,
    {
        Self {
            key: BeanKey::of::<F::Bean>(),
            module,
            kind: ProviderKind::PrototypeFactory {
                ctor: erase_factory_ctor(ctor),
            },
            cast: Box::new(downcast_to::<F::Bean>()),
        }
    }

    pub(crate) fn alias<A, B, F>(module: String, cast: F) -> Self
    where
        A: ?Sized + 'static,
        B: Send + Sync + 'static,
        F: Fn(Arc<B>) -> Arc<A> + Send + Sync + 'static,
    {
        let composed: BeanCast<A> = Box::new(move |bean: ErasedBean| {
            let concrete = bean
                .downcast::<B>()
                .map_err(|_| Error::type_mismatch(type_name::<B>()))?;
            Ok(cast(concrete))
        });
        Self {
            key: BeanKey::of::<A>(),
            module,
            kind: ProviderKind::Alias {
                target: BeanKey::of::<B>(),
            },
            cast: Box::new(composed),
        }
    }

    pub(crate) fn key(&self) -> BeanKey {
        self.key
    }

    pub(crate) fn module(&self) -> &str {
        &self.module
    }

    /// The aliased key, when this provider is an alias.
    pub(crate) fn alias_target(&self) -> Option<BeanKey> {
        match &self.kind {
            ProviderKind::Alias { target } => Some(*target),
            _ => None,
        }
    }

    /// Scope of the produced bean. Aliases have none of their own; they
    /// share the scope of their target.
    pub(crate) fn scope(&self) -> Option<Scope> {
        match &self.kind {
            ProviderKind::Singleton { .. } | ProviderKind::SingletonFactory { .. } => {
                Some(Scope::Singleton)
            }
            ProviderKind::Prototype { .. } | ProviderKind::PrototypeFactory { .. } => {
                Some(Scope::Prototype)
            }
            ProviderKind::Instance { .. } => Some(Scope::Instance),
            ProviderKind::Alias { .. } => None,
        }
    }

    /// Produces a value, or `None` when suppressed by a dry run.
    ///
    /// `repository` is the repository the provider is registered in, so
    /// construction closures resolve their dependencies against their own
    /// module and its ancestors, never against an unrelated child.
    pub(crate) fn produce(
        &self,
        repository: &BeanRepository,
        dry_run: bool,
    ) -> Result<Option<ErasedBean>> {
        match &self.kind {
            ProviderKind::Singleton { ctor, cell }
            | ProviderKind::SingletonFactory { ctor, cell } => {
                // Cheap read first; the init lock is only taken on a miss.
                if let Some(existing) = cell.cached() {
                    return Ok(Some(existing));
                }
                let _init = cell.lock_init();
                if let Some(existing) = cell.cached() {
                    return Ok(Some(existing));
                }
                match ctor(repository, dry_run)? {
                    Some(bean) if !dry_run => {
                        // The ctor has already run the lifecycle hook; only a
                        // fully initialised bean is ever published.
                        cell.publish(bean.clone());
                        debug!(
                            bean = self.key.type_name(),
                            module = %self.module,
                            "singleton constructed"
                        );
                        Ok(Some(bean))
                    }
                    // Probing: the value (if any) is handed back for the
                    // caller's own probe but the cell stays empty.
                    other => Ok(other),
                }
            }
            ProviderKind::Prototype { ctor } | ProviderKind::PrototypeFactory { ctor } => {
                ctor(repository, dry_run)
            }
            ProviderKind::Instance { value } => Ok(Some(value.clone())),
            ProviderKind::Alias { target } => repository.resolve_erased(*target).map(Some),
        }
    }

    /// Restores the registration type from an erased value produced by this
    /// provider.
    pub(crate) fn cast_to<T: ?Sized + 'static>(&self, bean: ErasedBean) -> Result<Arc<T>> {
        match self.cast.downcast_ref::<BeanCast<T>>() {
            Some(cast) => cast(bean),
            None => Err(Error::type_mismatch(self.key.type_name())),
        }
    }
}

/// Declares that the bean registered under `target` is also visible as the
/// bound type in [`get_beans_of_type`](crate::BeanRepository::get_beans_of_type).
pub(crate) struct InterfaceBinding {
    target: BeanKey,
    /// Erased [`BeanCast`] for the bound type.
    cast: Box<dyn Any + Send + Sync>,
}

impl InterfaceBinding {
    /// Returns the bound key and the binding itself.
    pub(crate) fn new<A, B, F>(cast: F) -> (BeanKey, Self)
    where
        A: ?Sized + 'static,
        B: Send + Sync + 'static,
        F: Fn(Arc<B>) -> Arc<A> + Send + Sync + 'static,
    {
        let composed: BeanCast<A> = Box::new(move |bean: ErasedBean| {
            let concrete = bean
                .downcast::<B>()
                .map_err(|_| Error::type_mismatch(type_name::<B>()))?;
            Ok(cast(concrete))
        });
        (
            BeanKey::of::<A>(),
            Self {
                target: BeanKey::of::<B>(),
                cast: Box::new(composed),
            },
        )
    }

    pub(crate) fn target(&self) -> BeanKey {
        self.target
    }

    pub(crate) fn cast_to<T: ?Sized + 'static>(&self, bean: ErasedBean) -> Result<Arc<T>> {
        match self.cast.downcast_ref::<BeanCast<T>>() {
            Some(cast) => cast(bean),
            None => Err(Error::type_mismatch(self.target.type_name())),
        }
    }
}

/// Wraps a typed construction closure into the erased form, folding in
/// lifecycle dispatch: the hook runs only for real construction, before the
/// value is handed back (and so before a singleton cell can publish it).
fn erase_ctor<T, F>(ctor: F) -> ErasedCtor
where
    T: Lifecycle + Send + Sync + 'static,
    F: Fn(&BeanAccessor) -> Result<T> + Send + Sync + 'static,
{
    Box::new(move |repository, dry_run| {
        let accessor = BeanAccessor::new(repository);
        let bean = ctor(&accessor)?;
        if !dry_run {
            bean.on_ready(repository);
        }
        Ok(Some(Arc::new(bean) as ErasedBean))
    })
}

/// Like [`erase_ctor`], for the two-stage factory strategies. A dry run
/// still creates the factory (its dependency resolution is part of the
/// graph) but never asks it for a bean.
fn erase_factory_ctor<F, C>(ctor: C) -> ErasedCtor
where
    F: BeanFactory + Lifecycle + Send + Sync + 'static,
    F::Bean: Lifecycle,
    C: Fn(&BeanAccessor) -> Result<F> + Send + Sync + 'static,
{
    Box::new(move |repository, dry_run| {
        let accessor = BeanAccessor::new(repository);
        let factory = ctor(&accessor)?;
        if dry_run {
            return Ok(None);
        }
        factory.on_ready(repository);
        let bean = factory.create_instance();
        bean.on_ready(repository);
        Ok(Some(Arc::new(bean) as ErasedBean))
    })
}

fn downcast_to<T: Send + Sync + 'static>() -> BeanCast<T> {
    Box::new(|bean: ErasedBean| {
        bean.downcast::<T>()
            .map_err(|_| Error::type_mismatch(type_name::<T>()))
    })
}

/// Double-checked singleton cache: an unexclusive read on the fast path, an
/// exclusive init lock around construction, publication only after the
/// lifecycle hook has completed. Lock poisoning is recovered: a panicking
/// constructor leaves the cell empty, which is a valid state.
struct SingletonCell {
    value: RwLock<Option<ErasedBean>>,
    init: Mutex<()>,
}

impl SingletonCell {
    fn new() -> Self {
        Self {
            value: RwLock::new(None),
            init: Mutex::new(()),
        }
    }

    fn cached(&self) -> Option<ErasedBean> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_init(&self) -> MutexGuard<'_, ()> {
        self.init.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, bean: ErasedBean) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(bean);
    }
}
