use rayon::prelude::*;
use wheels_pipeline::CancellationToken;

use crate::{OperationError, Result};

/// Runs `task` over `items` on a pool of at most `jobs` threads. Results
/// keep the order of `items`; the first error wins and stops queued work.
/// Cancellation is checked before each item starts.
pub(crate) fn run_bounded<T, R, F>(
    jobs: usize,
    items: &[T],
    cancel: &CancellationToken,
    task: F,
) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync + Send,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.clamp(1, items.len()))
        .build()?
        .install(|| {
            items
                .par_iter()
                .map(|item| {
                    if cancel.is_cancelled() {
                        return Err(OperationError::Cancelled);
                    }
                    task(item)
                })
                .collect::<Result<Vec<_>>>()
        })
}
