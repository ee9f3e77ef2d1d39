//! Restricted repository view for construction closures
//!
//! A construction closure runs while the repository may still be wiring
//! other beans, so it must not enumerate the registration set: bulk queries
//! like [`BeanRepository::get_beans_of_type`] would observe an incomplete
//! world. [`BeanAccessor`] is the capability handed to closures instead: a
//! distinct type that simply does not have those methods and offers no
//! conversion back to the full [`BeanRepository`]. The restriction is
//! enforced by the type system, not by convention.

use std::sync::Arc;

use crate::error::Result;
use crate::handle::BeanHandle;
use crate::lifecycle::Lifecycle;
use crate::repository::BeanRepository;

/// Narrow view of a [`BeanRepository`] available during bean construction.
pub struct BeanAccessor {
    repository: BeanRepository,
}

impl BeanAccessor {
    pub(crate) fn new(repository: &BeanRepository) -> Self {
        Self {
            repository: repository.clone(),
        }
    }

    /// Resolves a single dependency, walking the module chain.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.repository.get::<T>()
    }

    /// Returns a deferred handle for `T` without resolving it.
    ///
    /// The handle re-enters the repository on
    /// [`BeanHandle::get`], which is how intentionally self-referential
    /// object graphs break their cycle: depend on the handle, resolve it
    /// after construction has finished.
    pub fn get_provider<T: ?Sized + Send + Sync + 'static>(&self) -> Result<BeanHandle<T>> {
        self.repository.get_provider::<T>()
    }

    /// Builds an unregistered prototype bean with the given closure.
    ///
    /// Construction parameters travel as closure captures; the closure
    /// receives its own accessor for bean dependencies.
    pub fn get_prototype<T, F>(&self, ctor: F) -> Result<T>
    where
        T: Lifecycle,
        F: FnOnce(&BeanAccessor) -> Result<T>,
    {
        self.repository.get_prototype(ctor)
    }
}
