//! Bounded worker pool draining one shared task queue per round
//!
//! Workers check the cancellation token only between tasks. A task that is
//! already running when the deadline fires runs to completion and its result
//! is kept, so a round may overrun its deadline by up to one task.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Shared stop flag observed by workers at safe points
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the stop signal
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Test whether the stop signal was raised
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Results of one drained queue
#[derive(Debug)]
pub struct RoundOutcome<R> {
    /// Results in order of completion
    pub results: Vec<R>,
    /// Tasks never started because the stop signal was raised
    pub unstarted: usize,
    /// Whether the deadline fired before the queue was empty
    pub cancelled: bool,
}

/// Fixed number of workers executing independent tasks in parallel
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool; a count of 0 is raised to 1
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of workers
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Execute tasks until the queue is empty or the deadline fires
    ///
    /// Without a deadline every task is executed. The companion timer is
    /// dismissed as soon as all workers have joined.
    pub fn run<T, R, F>(&self, tasks: Vec<T>, deadline: Option<Duration>, execute: F) -> RoundOutcome<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let token = CancellationToken::new();
        let queue = Mutex::new(VecDeque::from(tasks));
        let (result_tx, result_rx) = mpsc::channel();
        let worker_count = self.workers.min(queue_len(&queue)).max(1);

        thread::scope(|scope| {
            let (dismiss_tx, dismiss_rx) = mpsc::channel::<()>();
            if let Some(limit) = deadline {
                let timer_token = token.clone();
                scope.spawn(move || {
                    if let Err(RecvTimeoutError::Timeout) = dismiss_rx.recv_timeout(limit) {
                        debug!("Round deadline of {:.3}s reached, stopping workers", limit.as_secs_f64());
                        timer_token.cancel();
                    }
                });
            }

            let handles: Vec<_> = (0..worker_count)
                .map(|_| {
                    let sink = result_tx.clone();
                    let token = &token;
                    let queue = &queue;
                    let execute = &execute;
                    scope.spawn(move || {
                        while !token.is_cancelled() {
                            let next = match queue.lock() {
                                Ok(mut pending) => pending.pop_front(),
                                Err(_poisoned) => None,
                            };
                            let Some(task) = next else {
                                break;
                            };
                            if sink.send(execute(task)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                if handle.join().is_err() {
                    warn!("Worker panicked, its current task produced no result");
                }
            }
            drop(dismiss_tx);
        });
        drop(result_tx);

        let results: Vec<R> = result_rx.into_iter().collect();
        let unstarted = queue_len(&queue);
        RoundOutcome {
            results,
            unstarted,
            cancelled: token.is_cancelled() && unstarted > 0,
        }
    }
}

fn queue_len<T>(queue: &Mutex<VecDeque<T>>) -> usize {
    queue.lock().map_or(0, |pending| pending.len())
}
