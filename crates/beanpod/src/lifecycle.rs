//! Bean lifecycle contract

use crate::repository::BeanRepository;

/// One-time initialisation hook for constructed beans.
///
/// Every bean registered through a construction closure implements this
/// trait; the default body does nothing, so opting in means overriding
/// [`Lifecycle::on_ready`]. The repository invokes the hook exactly once per
/// real construction (once ever for a singleton, once per request for a
/// prototype) after the bean's dependencies have all been resolved, and
/// never during a dry run. A singleton is published to its cache only after
/// the hook has returned.
///
/// The hook receives the full repository, so it may look up other beans or
/// run bulk queries such as [`BeanRepository::get_beans_of_type`]: by the
/// time any hook runs, the registration set is complete. Pre-built values
/// registered with `instance` never pass through the hook.
pub trait Lifecycle {
    /// Called once after construction, with all dependencies available.
    fn on_ready(&self, _beans: &BeanRepository) {}
}
