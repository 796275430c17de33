//! Order-preserving bounded concurrency

use futures::future::join_all;
use librarian_eval_core::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Runs `mapper` over `items` with at most `limit` calls in flight.
///
/// `results[i]` always corresponds to `items[i]`. With `limit <= 1` items are
/// processed strictly one after another. Otherwise `min(limit, items.len())`
/// workers claim indices from a shared counter and write each result into its
/// own slot. No retries are made; the mapper is expected to capture its own
/// failures in `R`.
pub async fn run_ordered<'a, T, R, F, Fut>(items: &'a [T], limit: usize, mapper: F) -> Result<Vec<R>>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
{
    if limit <= 1 || items.len() <= 1 {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(mapper(item).await);
        }
        return Ok(results);
    }

    let next_index = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<R>>> = Mutex::new((0..items.len()).map(|_| None).collect());
    let worker_count = limit.min(items.len());

    let (next_index, slots_ref, mapper) = (&next_index, &slots, &mapper);
    let workers = (0..worker_count).map(|_| async move {
        loop {
            let index = next_index.fetch_add(1, Ordering::SeqCst);
            let Some(item) = items.get(index) else {
                break;
            };
            let result = mapper(item).await;
            slots_ref.lock().await[index] = Some(result);
        }
    });
    join_all(workers).await;

    slots
        .into_inner()
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| Error::internal(format!("no result recorded for item {index}")))
        })
        .collect()
}
