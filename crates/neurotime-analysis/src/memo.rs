//! Compute-once storage for analyzer outputs.

use std::sync::OnceLock;

use crate::error::Result;

/// A lazily computed analyzer output.
///
/// The first caller runs the computation; concurrent first callers block until
/// it finishes and then share the stored value. Failures are stored too, so an
/// output is never recomputed.
#[derive(Debug)]
pub(crate) struct Memo<T>(OnceLock<Result<T>>);

impl<T> Memo<T> {
    pub(crate) const fn new() -> Self {
        Self(OnceLock::new())
    }

    pub(crate) fn get_or_compute<F>(&self, compute: F) -> Result<&T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.0.get_or_init(compute).as_ref().map_err(Clone::clone)
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn computes_once() {
        let calls = AtomicUsize::new(0);
        let memo = Memo::new();
        for _ in 0..3 {
            let value = memo
                .get_or_compute(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .unwrap();
            assert_eq!(*value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn errors_are_memoized() {
        let memo: Memo<u8> = Memo::new();
        let first = memo.get_or_compute(|| Err(AnalysisError::degenerate("singular")));
        let second = memo.get_or_compute(|| Ok(1));
        assert_eq!(first.unwrap_err(), second.unwrap_err());
    }

    #[test]
    fn concurrent_first_access_runs_once() {
        let calls = AtomicUsize::new(0);
        let memo = Memo::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let value = memo
                        .get_or_compute(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(vec![1.0, 2.0])
                        })
                        .unwrap();
                    assert_eq!(value.len(), 2);
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
