//! Two-stage bean construction

/// Builds a bean in a second, deferred construction stage.
///
/// A factory is itself created by a construction closure, but it is not the
/// bean: the value returned by [`BeanFactory::create_instance`] is what gets
/// registered under [`BeanFactory::Bean`]. While the repository probes the
/// dependency graph, the factory closure runs but `create_instance` never
/// does, so expensive or effectful work stays deferred until a bean is
/// really needed.
///
/// If both the factory and the created bean override their lifecycle hooks,
/// the factory's hook runs first, then the bean's.
pub trait BeanFactory {
    /// The type the created bean is registered under.
    type Bean: Send + Sync + 'static;

    /// Creates the bean. Lifecycle hooks are the repository's job; an
    /// implementation must not invoke them itself.
    fn create_instance(&self) -> Self::Bean;
}
