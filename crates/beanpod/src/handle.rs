//! Deferred bean handles
//!
//! A handle names a registered bean without resolving it. Resolution happens
//! on [`BeanHandle::get`], which re-enters the repository through the normal
//! path: a singleton handle yields the shared instance, a prototype handle
//! constructs (and runs the lifecycle hook on) a fresh bean per call.
//!
//! Handles hold a weak reference, so a handle stored beyond the life of its
//! repository reports [`Error::RepositoryGone`] instead of keeping the whole
//! object graph alive.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::key::BeanKey;
use crate::provider::ErasedBean;
use crate::repository::{BeanRepository, RepositoryInner};

/// Deferred handle to the bean registered under `T`.
pub struct BeanHandle<T: ?Sized> {
    repository: Weak<RepositoryInner>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> BeanHandle<T> {
    pub(crate) fn new(repository: Weak<RepositoryInner>) -> Self {
        Self {
            repository,
            _marker: PhantomData,
        }
    }

    /// Resolves the bean now.
    pub fn get(&self) -> Result<Arc<T>> {
        let inner = self.repository.upgrade().ok_or(Error::RepositoryGone)?;
        BeanRepository::from_inner(inner).get::<T>()
    }
}

impl<T: ?Sized> Clone for BeanHandle<T> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            _marker: PhantomData,
        }
    }
}

/// Untyped deferred handle, as returned by the per-scope listings.
pub struct DynBeanHandle {
    repository: Weak<RepositoryInner>,
    key: BeanKey,
}

impl DynBeanHandle {
    pub(crate) fn new(repository: Weak<RepositoryInner>, key: BeanKey) -> Self {
        Self { repository, key }
    }

    /// Key of the bean this handle refers to.
    pub fn key(&self) -> BeanKey {
        self.key
    }

    /// Resolves the bean now, type-erased. Downcast with
    /// [`Arc::downcast`](std::sync::Arc::downcast) when the concrete type is
    /// known.
    pub fn get(&self) -> Result<Arc<dyn Any + Send + Sync>> {
        let inner = self.repository.upgrade().ok_or(Error::RepositoryGone)?;
        let bean: ErasedBean = BeanRepository::from_inner(inner).resolve_erased(self.key)?;
        Ok(bean)
    }
}

impl Clone for DynBeanHandle {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            key: self.key,
        }
    }
}
