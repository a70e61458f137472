//! # Release Guard
//!
//! Runs a cleanup action on scope exit unless dismissed. Used to undo a
//! partial native acquisition when a later step of a construction fails.

use core::fmt;

/// Scope guard around a cleanup closure
pub struct ReleaseGuard<F: FnOnce()> {
    release: Option<F>,
}

impl<F: FnOnce()> ReleaseGuard<F> {
    /// Arm a guard
    pub fn new(release: F) -> Self {
        Self {
            release: Some(release),
        }
    }

    /// Disarm; the cleanup will not run
    pub fn dismiss(mut self) {
        self.release = None;
    }
}

impl<F: FnOnce()> Drop for ReleaseGuard<F> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl<F: FnOnce()> fmt::Debug for ReleaseGuard<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_runs_on_drop() {
        let hits = Cell::new(0);
        {
            let _g = ReleaseGuard::new(|| hits.set(hits.get() + 1));
        }
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_dismiss() {
        let hits = Cell::new(0);
        let g = ReleaseGuard::new(|| hits.set(hits.get() + 1));
        g.dismiss();
        assert_eq!(hits.get(), 0);
    }
}
