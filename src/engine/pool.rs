//! Named worker pool with one-shot result handles.

use crossbeam::channel::{self, Receiver, TryRecvError};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::JobError;

/// Worker threads for impulse response and convolution jobs.
///
/// Jobs are queued first-in first-out, so a job that blocks on a handle
/// returned by an earlier [`JobPool::spawn`] only ever waits on work that
/// has already been picked up by another worker.
pub struct JobPool {
    pool: ThreadPool,
}

impl JobPool {
    /// `threads == 0` lets rayon pick one thread per core.
    pub fn new(threads: usize) -> Result<Self, JobError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("room-worker-{}", i))
            .panic_handler(|_| log::error!("Worker job panicked"))
            .build()
            .map_err(|e| JobError::PoolBuild(e.to_string()))?;
        log::info!("Worker pool started with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn spawn<T, F>(&self, job: F) -> JobHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);
        self.pool.spawn_fifo(move || {
            // Receiver gone means the batch was superseded
            let _ = tx.send(job());
        });
        JobHandle {
            rx,
            result: None,
            taken: false,
        }
    }
}

/// Result of a job spawned on a [`JobPool`].
///
/// Dropping the handle detaches the job: it still runs, its result is
/// discarded.
pub struct JobHandle<T> {
    rx: Receiver<T>,
    result: Option<Result<T, JobError>>,
    taken: bool,
}

impl<T> JobHandle<T> {
    fn poll(&mut self) {
        if self.taken || self.result.is_some() {
            return;
        }
        match self.rx.try_recv() {
            Ok(value) => self.result = Some(Ok(value)),
            Err(TryRecvError::Disconnected) => self.result = Some(Err(JobError::Disconnected)),
            Err(TryRecvError::Empty) => {}
        }
    }

    /// True once the job has produced a value or died.
    pub fn is_finished(&mut self) -> bool {
        self.poll();
        self.taken || self.result.is_some()
    }

    /// Take the result if the job is done, without blocking. Yields the
    /// result at most once.
    pub fn try_take(&mut self) -> Option<Result<T, JobError>> {
        self.poll();
        let result = self.result.take();
        self.taken |= result.is_some();
        result
    }

    /// Block until the job is done.
    pub fn wait(mut self) -> Result<T, JobError> {
        if self.taken {
            return Err(JobError::Disconnected);
        }
        match self.result.take() {
            Some(result) => result,
            None => self.rx.recv().map_err(|_| JobError::Disconnected),
        }
    }
}
