//! Scoped release actions for multi-step resource acquisition.

/// Runs a release action when dropped, unless it has been disarmed.
///
/// Guards for successive acquisition steps are declared in order, so on an
/// early return they run in reverse: the last resource acquired is the
/// first one released.
pub(crate) struct OnDrop<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> OnDrop<F> {
    #[inline]
    pub fn new(f: F) -> Self {
        Self(Some(f))
    }

    /// Keep the resource: the release action will not run.
    #[inline]
    pub fn disarm(mut self) {
        self.0.take();
    }
}

impl<F: FnOnce()> Drop for OnDrop<F> {
    #[inline]
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f()
        }
    }
}
