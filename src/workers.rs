//! Background thread pool for asset fetching and frame decoding.
//!
//! Jobs flow through a single crossbeam channel shared by a fixed set of
//! worker threads. The epoch mechanism cancels stale requests: each job
//! captures its owner's epoch cell and the value it was enqueued under, and
//! a job whose cell has moved on is skipped at execution time. Owners bump
//! only their own cell, so rebinds and disposal abandon that owner's
//! in-flight prefetches without touching anyone else's jobs on the shared
//! pool, and without joining on them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::trace;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size worker pool with epoch-based cancellation.
pub struct Workers {
    tx: Option<Sender<Job>>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl Workers {
    /// Spawn `num_threads` workers.
    pub fn new(num_threads: usize) -> Self {
        let (tx, rx): (Sender<Job>, Receiver<Job>) = unbounded();
        let mut handles = Vec::with_capacity(num_threads.max(1));

        for worker_id in 0..num_threads.max(1) {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("scrubba-worker-{}", worker_id))
                .spawn(move || {
                    trace!("worker {} started", worker_id);
                    // Channel closes when Workers drops its sender
                    while let Ok(job) = rx.recv() {
                        job();
                    }
                    trace!("worker {} stopped", worker_id);
                })
                .expect("failed to spawn worker thread");
            handles.push(handle);
        }

        trace!("workers initialized: {} threads", num_threads.max(1));

        Self {
            tx: Some(tx),
            handles,
        }
    }

    /// Run a closure on a worker thread, unconditionally.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Box::new(f));
        }
    }

    /// Run a closure on a worker thread only if the owner's epoch cell still
    /// holds `expected` at execution time. The check happens when a worker
    /// picks the job up, not at enqueue time, so the owner bumping its cell
    /// cancels everything it still has queued. Other owners' cells are
    /// unaffected; cancellation is scoped to the cell, not the pool.
    pub fn execute_with_epoch<F>(&self, epoch: &Arc<AtomicU64>, expected: u64, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let cell = Arc::clone(epoch);
        self.execute(move || {
            if cell.load(Ordering::Relaxed) == expected {
                f();
            }
            // Stale epoch: skip silently, the request was superseded
        });
    }
}

impl Drop for Workers {
    fn drop(&mut self) {
        // Closing the channel lets idle workers exit their recv loop
        self.tx = None;

        let deadline = Instant::now() + Duration::from_millis(500);
        let handles = std::mem::take(&mut self.handles);
        for handle in handles {
            while !handle.is_finished() {
                if Instant::now() >= deadline {
                    trace!("worker shutdown deadline reached, detaching");
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
            let _ = handle.join();
        }
        trace!("all workers stopped");
    }
}
