//! Fixed-size worker pool over a shared queue.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::prelude::*;

/// Feed `items` through a bounded channel to `num_workers` spawned workers
/// and join them all, returning the first error.
///
/// Workers race freely over the shared queue with no ordering guarantee. A
/// failed worker stops consuming but does not cancel the others; they drain
/// the remaining items before the error is surfaced, and the caller treats
/// the run as failed as a whole.
pub async fn process_all<T, F, Fut>(items: Vec<T>, num_workers: usize, handler: F) -> Result<()>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let num_workers = num_workers.max(1);
    let (tx, rx) = mpsc::channel::<T>(num_workers);
    let rx = Arc::new(Mutex::new(rx));

    let mut workers = Vec::with_capacity(num_workers);
    for _ in 0..num_workers {
        let rx = Arc::clone(&rx);
        let handler = handler.clone();
        workers.push(tokio::spawn(async move {
            loop {
                let item = rx.lock().await.recv().await;
                match item {
                    Some(item) => handler(item).await?,
                    None => return Ok(()),
                }
            }
        }));
    }

    let feeder = tokio::spawn(async move {
        for item in items {
            if tx.send(item).await.is_err() {
                // Every worker has stopped; nothing left to feed.
                break;
            }
        }
    });

    let mut result = Ok(());
    for worker in workers {
        let worker_result = match worker.await {
            Ok(worker_result) => worker_result,
            Err(err) => Err(err.into()),
        };
        if result.is_ok() {
            result = worker_result;
        }
    }
    feeder.await?;
    result
}
