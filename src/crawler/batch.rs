//! Windowed batch execution
//!
//! Items are split into consecutive windows of at most `concurrency` items.
//! Every item of a window runs as its own tokio task, and the whole window is
//! joined before the next one starts:
//!
//! ```text
//! window 1: [a b c d] --join--> window 2: [e f g h] --join--> window 3: [i j]
//! ```
//!
//! This is a barrier, not a pool. One slow item holds back the next window
//! even while the other slots sit idle, and a hung request stalls its window
//! until the HTTP client gives up on it.

use std::future::Future;
use tokio::task::JoinSet;

/// Result of a windowed batch
#[derive(Debug)]
pub struct BatchOutcome<R> {
    /// Worker results, window by window, in item order within each window
    pub results: Vec<R>,

    /// Number of windows dispatched
    pub windows: usize,

    /// Workers that panicked or were cancelled and produced no result
    pub aborted: usize,
}

/// Number of windows needed for `len` items at the given concurrency
pub fn window_count(len: usize, concurrency: usize) -> usize {
    len.div_ceil(concurrency.max(1))
}

/// Runs `worker` over `items`, `concurrency` items at a time
///
/// # Arguments
///
/// * `items` - The inputs, consumed in order
/// * `concurrency` - Window size; values below 1 are treated as 1
/// * `worker` - Builds the future processing one item
///
/// # Returns
///
/// A [`BatchOutcome`] with one result per worker that finished. A worker that
/// panics only loses its own slot; its siblings still complete.
pub async fn run_windowed<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    worker: F,
) -> BatchOutcome<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
{
    let concurrency = concurrency.max(1);
    let mut outcome = BatchOutcome {
        results: Vec::with_capacity(items.len()),
        windows: 0,
        aborted: 0,
    };

    let mut pending = items.into_iter().peekable();
    while pending.peek().is_some() {
        let window: Vec<T> = pending.by_ref().take(concurrency).collect();
        outcome.windows += 1;
        tracing::trace!("Dispatching window {} ({} items)", outcome.windows, window.len());

        let mut tasks = JoinSet::new();
        for (index, item) in window.into_iter().enumerate() {
            let future = worker(item);
            tasks.spawn(async move { (index, future.await) });
        }

        let mut finished = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => finished.push(pair),
                Err(e) => {
                    outcome.aborted += 1;
                    tracing::warn!("Worker in window {} aborted: {}", outcome.windows, e);
                }
            }
        }

        finished.sort_by_key(|(index, _)| *index);
        outcome
            .results
            .extend(finished.into_iter().map(|(_, result)| result));
    }

    outcome
}
