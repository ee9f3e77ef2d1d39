//! Dry-run context
//!
//! A dry run exercises dependency-resolution recursion without triggering
//! construction side effects: lifecycle hooks do not fire, singleton caches
//! stay empty and factories never run their second stage. The flag is a
//! thread-local depth counter rather than a boolean so that nested probes
//! restore the previous state on exit: an inner probe returning must not
//! clear an outer probe's flag.

use std::cell::Cell;

thread_local! {
    static DRY_RUN_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Tracks whether the current thread is probing rather than constructing.
pub(crate) struct DryRunContext;

impl DryRunContext {
    /// True while any enclosing [`DryRunContext::run_dry`] frame is active
    /// on this thread.
    pub(crate) fn is_dry_run() -> bool {
        DRY_RUN_DEPTH.with(|depth| depth.get() > 0)
    }

    /// Executes `probe` with the dry-run flag set, restoring the previous
    /// depth on exit even if `probe` panics.
    pub(crate) fn run_dry<R>(probe: impl FnOnce() -> R) -> R {
        let _frame = DryRunFrame::enter();
        probe()
    }
}

struct DryRunFrame;

impl DryRunFrame {
    fn enter() -> Self {
        DRY_RUN_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for DryRunFrame {
    fn drop(&mut self) {
        DRY_RUN_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}
