//! Bounded worker pool
//!
//! A fixed number of tokio tasks drain a shared task channel; results flow
//! back over a completion channel to the caller, which observes them in
//! completion order.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::error;

/// Run `work` over `items` on at most `max_workers` concurrent tasks.
///
/// `on_complete(result, completed, total)` runs on the calling task once
/// per finished item, in completion order. Results are returned in the
/// same order. An item whose task panics produces no result; the panic is
/// logged and the remaining workers drain the channel.
pub async fn run_bounded<T, R, F, Fut, C>(
    items: Vec<T>,
    max_workers: usize,
    work: F,
    mut on_complete: C,
) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    C: FnMut(&R, usize, usize),
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let (task_tx, task_rx) = mpsc::channel(total);
    for item in items {
        // Capacity equals the item count, so this never waits
        if task_tx.send(item).await.is_err() {
            break;
        }
    }
    drop(task_tx);

    let task_rx = Arc::new(Mutex::new(task_rx));
    let work = Arc::new(work);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    let workers = max_workers.clamp(1, total);
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let task_rx = task_rx.clone();
        let done_tx = done_tx.clone();
        let work = work.clone();
        handles.push(tokio::spawn(async move {
            loop {
                let next = task_rx.lock().await.recv().await;
                let Some(item) = next else {
                    break;
                };
                let result = work(item).await;
                if done_tx.send(result).is_err() {
                    break;
                }
            }
        }));
    }
    drop(done_tx);

    let mut results = Vec::with_capacity(total);
    while let Some(result) = done_rx.recv().await {
        on_complete(&result, results.len() + 1, total);
        results.push(result);
    }

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Worker task terminated abnormally");
        }
    }

    results
}
