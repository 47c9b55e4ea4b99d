use rayon::prelude::*;
use thiserror::Error;

/// Errors raised by the dispatcher itself.
///
/// Failures inside the per-element function are never caught here; a panic
/// in the function propagates to the caller and aborts the remaining
/// dispatch, so partial application is a caller-visible outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The local thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// Source and destination slices differ in length.
    #[error("source and destination must have the same length, got {src} and {dst}")]
    SizeMismatch {
        /// Length of the source slice.
        src: usize,
        /// Length of the destination slice.
        dst: usize,
    },
}

/// Controls how a per-element function is executed over a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Run sequentially on the calling thread, in input order.
    #[default]
    Serial,

    /// Use the global rayon thread pool to process elements in parallel.
    ///
    /// No visitation order is guaranteed, but every element's call completes
    /// before the operation returns.
    Parallel,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant
    /// overhead. Use this primarily for benchmarking or specific isolation
    /// needs.
    Fixed(usize),
}

/// Apply `op` once to every element of `items` under the given strategy.
///
/// The function must be safe to invoke concurrently on distinct elements
/// when a parallel strategy is used; nothing but the element itself may be
/// mutated through it. This is a caller obligation, not enforced here.
pub fn execute_mut<T, F>(
    items: &mut [T],
    strategy: ExecutionStrategy,
    op: F,
) -> Result<(), DispatchError>
where
    T: Send,
    F: Fn(&mut T) + Send + Sync,
{
    match strategy {
        ExecutionStrategy::Serial => items.iter_mut().for_each(|item| op(item)),
        ExecutionStrategy::Parallel => items.par_iter_mut().for_each(|item| op(item)),
        ExecutionStrategy::Fixed(n) => {
            let pool = build_pool(n)?;
            pool.install(|| items.par_iter_mut().for_each(|item| op(item)));
        }
    }
    Ok(())
}

/// Trait to execute a (source, destination) operation over slices with a
/// given strategy.
pub trait ExecuteExt<T> {
    /// Apply `op` once to every (source, destination) pair.
    ///
    /// Each source element writes only its own destination slot, which keeps
    /// parallel execution free of shared mutable state. Under
    /// [`ExecutionStrategy::Serial`] pairs are visited in input order.
    ///
    /// # Errors
    ///
    /// [`DispatchError::SizeMismatch`] when the slices differ in length.
    fn execute_with<U, F>(
        &self,
        strategy: ExecutionStrategy,
        dst: &mut [U],
        op: F,
    ) -> Result<(), DispatchError>
    where
        U: Send,
        F: Fn(&T, &mut U) + Send + Sync;
}

impl<T: Sync> ExecuteExt<T> for [T] {
    fn execute_with<U, F>(
        &self,
        strategy: ExecutionStrategy,
        dst: &mut [U],
        op: F,
    ) -> Result<(), DispatchError>
    where
        U: Send,
        F: Fn(&T, &mut U) + Send + Sync,
    {
        if self.len() != dst.len() {
            return Err(DispatchError::SizeMismatch {
                src: self.len(),
                dst: dst.len(),
            });
        }

        match strategy {
            ExecutionStrategy::Serial => {
                self.iter().zip(dst.iter_mut()).for_each(|(s, d)| op(s, d));
            }
            ExecutionStrategy::Parallel => {
                self.par_iter()
                    .zip(dst.par_iter_mut())
                    .for_each(|(s, d)| op(s, d));
            }
            ExecutionStrategy::Fixed(n) => {
                let pool = build_pool(n)?;
                pool.install(|| {
                    self.par_iter()
                        .zip(dst.par_iter_mut())
                        .for_each(|(s, d)| op(s, d));
                });
            }
        }
        Ok(())
    }
}

fn build_pool(n: usize) -> Result<rayon::ThreadPool, DispatchError> {
    if n == 0 {
        return Err(DispatchError::InvalidThreadCount(n));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map_err(|e| DispatchError::ThreadPool(e.to_string()))
}
