//! In-progress resolution tracking
//!
//! Every `get` pushes its key onto a thread-local chain before asking the
//! provider to produce a value, and pops it when production finishes. A key
//! reappearing in its own ancestor chain means the dependency graph is
//! cyclic; resolution aborts with [`Error::CircularDependency`] naming the
//! full chain instead of recursing until the stack is exhausted.
//!
//! Entries are keyed by `(repository id, bean key)` so that the same type
//! registered in unrelated sibling modules never produces a false positive.

use std::cell::RefCell;

use crate::error::{Error, Result};
use crate::key::BeanKey;

thread_local! {
    static RESOLUTION_CHAIN: RefCell<Vec<(u64, BeanKey)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as "currently being resolved" for the lifetime of the guard.
pub(crate) struct ResolutionGuard {
    _private: (),
}

impl ResolutionGuard {
    /// Enters `key` into the chain, or fails if it is already present.
    pub(crate) fn enter(repository_id: u64, key: BeanKey) -> Result<Self> {
        RESOLUTION_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            if chain
                .iter()
                .any(|(id, entry)| *id == repository_id && *entry == key)
            {
                let mut names: Vec<&str> =
                    chain.iter().map(|(_, entry)| entry.type_name()).collect();
                names.push(key.type_name());
                return Err(Error::circular_dependency(
                    key.type_name(),
                    names.join(" -> "),
                ));
            }
            chain.push((repository_id, key));
            Ok(Self { _private: () })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_CHAIN.with(|chain| {
            chain.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentering_same_key_is_a_cycle() {
        let key = BeanKey::of::<String>();
        let _outer = ResolutionGuard::enter(1, key).expect("first entry must succeed");

        let err = ResolutionGuard::enter(1, key).err().expect("re-entry must fail");
        match err {
            Error::CircularDependency { type_name, chain } => {
                assert!(type_name.contains("String"));
                assert!(chain.contains(" -> "));
            }
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_same_key_in_other_repository_is_not_a_cycle() {
        let key = BeanKey::of::<String>();
        let _outer = ResolutionGuard::enter(1, key).expect("first entry must succeed");
        let _inner = ResolutionGuard::enter(2, key).expect("other repository must be independent");
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let key = BeanKey::of::<u32>();
        {
            let _guard = ResolutionGuard::enter(7, key).expect("entry must succeed");
        }
        let _again = ResolutionGuard::enter(7, key).expect("chain must be clear after drop");
    }
}
