//! Bounded local worker pool: parallelises pure-local per-layer computation
//! (default pool size 6) without introducing any extra network round.
//!
//! The pool never introduces a network round and never reorders gates within
//! a layer — it only lets one layer's purely-local masking/prefix-sum work
//! (e.g. masking a large shuffle input vector before the single network
//! round) run across several OS threads instead of inline on the evaluator's
//! task. Built on [`async_scoped`], gated behind a `multi-threading` feature,
//! since the work borrows circuit/preprocessing data that is not `'static`.

#[cfg(feature = "multi-threading")]
use tokio::sync::Semaphore;

/// `threads` permits worth of local parallelism. With the `multi-threading`
/// feature disabled, every method degrades to sequential `map` — correct,
/// just not parallel.
pub struct WorkerPool {
    #[cfg(feature = "multi-threading")]
    permits: Semaphore,
    #[allow(dead_code)]
    threads: usize,
}

impl WorkerPool {
    #[must_use]
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        WorkerPool {
            #[cfg(feature = "multi-threading")]
            permits: Semaphore::new(threads),
            threads,
        }
    }

    /// Applies `f` to every element of `items`, across this pool's bounded
    /// concurrency when the `multi-threading` feature is enabled, and
    /// in-line (but still correct) otherwise. `f` may borrow data local to
    /// the caller's stack frame — each spawned unit completes before this
    /// call returns, so the borrow never escapes past it.
    #[cfg(feature = "multi-threading")]
    pub fn map_borrowed<'env, T, R, F>(&self, items: &'env [T], f: F) -> Vec<R>
    where
        T: Sync + 'env,
        R: Send + 'env,
        F: Fn(&'env T) -> R + Sync + 'env,
    {
        let f = &f;
        let (results, _) = unsafe {
            async_scoped::TokioScope::scope_and_block(|scope| {
                for item in items {
                    scope.spawn(async move {
                        let _permit = self.permits.acquire().await.expect("pool semaphore never closes");
                        f(item)
                    });
                }
            })
        };
        results.into_iter().map(|r| r.expect("spawned local task never panics")).collect()
    }

    #[cfg(not(feature = "multi-threading"))]
    pub fn map_borrowed<'env, T, R, F>(&self, items: &'env [T], f: F) -> Vec<R>
    where
        F: Fn(&'env T) -> R,
    {
        items.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_fallback_preserves_order() {
        let pool = WorkerPool::new(6);
        let items = vec![1, 2, 3, 4];
        let doubled = pool.map_borrowed(&items, |x| x * 2);
        assert_eq!(doubled, vec![2, 4, 6, 8]);
    }
}
