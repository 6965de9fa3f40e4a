//! Fixed-size concurrent batches with a pause between them.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use prospect_core::BatchSettings;
use tracing::debug;

/// Apply `f` to every item. Items within a batch run concurrently; batches
/// run one after another with `delay_ms` between them. Output order matches
/// input order.
pub async fn run_batched<I, T, F, Fut>(items: Vec<I>, settings: &BatchSettings, f: F) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T>,
{
    let batch_size = settings.batch_size.max(1);
    let delay = Duration::from_millis(settings.delay_ms);
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut remaining = items.into_iter().peekable();
    let mut batch_no = 0usize;

    while remaining.peek().is_some() {
        if batch_no > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let batch: Vec<I> = remaining.by_ref().take(batch_size).collect();
        debug!(
            "Batch {}: {} items ({} of {} done)",
            batch_no + 1,
            batch.len(),
            results.len(),
            total
        );
        results.extend(join_all(batch.into_iter().map(&f)).await);
        batch_no += 1;
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Instant;

    #[tokio::test]
    async fn test_preserves_order_across_batches() {
        let settings = BatchSettings {
            batch_size: 3,
            delay_ms: 0,
        };
        let out = run_batched((0..8).collect(), &settings, |i: u32| async move { i * 10 }).await;
        assert_eq!(out, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[tokio::test]
    async fn test_delay_between_batches_only() {
        let settings = BatchSettings {
            batch_size: 2,
            delay_ms: 20,
        };
        let started = Instant::now();
        let seen = Mutex::new(Vec::new());
        run_batched(vec![1, 2, 3, 4, 5], &settings, |i: i32| {
            seen.lock().push(i);
            async {}
        })
        .await;
        // Three batches, two pauses.
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(seen.lock().len(), 5);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out: Vec<u8> = run_batched(Vec::new(), &BatchSettings::default(), |i: u8| async move { i }).await;
        assert!(out.is_empty());
    }
}
