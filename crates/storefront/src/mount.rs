//! Mount scope for view state.
//!
//! A view owns its state through [`Mounted`]. Async work started by the view
//! gets a [`MountHandle`] instead, which holds only a weak reference. When the
//! view is dropped (unmounted), late completions find nothing to update and
//! are discarded without touching state.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// State owned by a mounted view.
#[derive(Debug, Default)]
pub struct Mounted<T> {
    state: Arc<RwLock<T>>,
}

impl<T> Mounted<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
        }
    }

    /// A weak handle for async completions.
    #[must_use]
    pub fn handle(&self) -> MountHandle<T> {
        MountHandle {
            state: Arc::downgrade(&self.state),
        }
    }

    /// Read the current state.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        // A panicking writer leaves the value intact; keep serving it.
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Mutate the state in place.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Clone the current state out.
    #[must_use]
    pub fn snapshot(&self) -> T
    where
        T: Clone,
    {
        self.read().clone()
    }
}

/// Weak handle to a [`Mounted`] value.
#[derive(Debug)]
pub struct MountHandle<T> {
    state: Weak<RwLock<T>>,
}

impl<T> Clone for MountHandle<T> {
    fn clone(&self) -> Self {
        Self {
            state: Weak::clone(&self.state),
        }
    }
}

impl<T> MountHandle<T> {
    /// Returns true while the owning view is still mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.state.strong_count() > 0
    }

    /// Apply `f` to the state if the view is still mounted.
    ///
    /// Returns whether `f` ran.
    pub fn apply(&self, f: impl FnOnce(&mut T)) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let mut guard = state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_while_mounted() {
        let view = Mounted::new(1_u32);
        let handle = view.handle();
        assert!(handle.is_mounted());
        assert!(handle.apply(|n| *n += 1));
        assert_eq!(*view.read(), 2);
    }

    #[test]
    fn test_apply_after_unmount_is_discarded() {
        let view = Mounted::new(vec![1, 2, 3]);
        let handle = view.handle();
        drop(view);

        let mut ran = false;
        let applied = handle.apply(|v| {
            ran = true;
            v.clear();
        });
        assert!(!applied);
        assert!(!ran);
        assert!(!handle.is_mounted());
    }

    #[test]
    fn test_snapshot_and_write() {
        let view = Mounted::new(String::from("a"));
        view.write().push('b');
        assert_eq!(view.snapshot(), "ab");
    }
}
