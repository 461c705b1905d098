use crate::raytracer::error::RenderResult;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use tracing::error;

#[derive(Debug, Default)]
struct ActiveTasks {
    count: Mutex<usize>,
    idle: Condvar,
}

impl ActiveTasks {
    fn add(&self, n: usize) {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += n;
    }

    fn done(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn get(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_idle(&self) {
        let count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        let _idle = self
            .idle
            .wait_while(count, |n| *n > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// Marks one broadcast task finished when dropped, including during unwinding.
struct TaskGuard(Arc<ActiveTasks>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.done();
    }
}

/// Fixed-size pool of persistent render threads.
///
/// Each [`RenderPool::launch`] runs the job exactly once on every thread, passing the
/// thread's index as the worker id, so ids are stable for the job's lifetime.
pub struct RenderPool {
    pool: ThreadPool,
    active: Arc<ActiveTasks>,
}

impl RenderPool {
    /// Builds the pool. `None` uses one thread per available core.
    pub fn new(threads: Option<usize>) -> RenderResult<Self> {
        let mut builder = ThreadPoolBuilder::new()
            .thread_name(|i| format!("render-{i}"))
            .panic_handler(|_| error!("render task panicked outside the worker loop"));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }

        Ok(Self {
            pool: builder.build()?,
            active: Arc::new(ActiveTasks::default()),
        })
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Worker jobs that have been launched and not yet returned.
    pub fn active_tasks(&self) -> usize {
        self.active.get()
    }

    /// Runs `job(worker_id)` once on every pool thread without waiting for it.
    pub fn launch<F>(&self, job: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        // Counted up front so a join racing the broadcast cannot see zero.
        self.active.add(self.thread_count());
        let active = Arc::clone(&self.active);
        self.pool.spawn_broadcast(move |ctx| {
            let _guard = TaskGuard(Arc::clone(&active));
            job(ctx.index());
        });
    }

    /// Blocks until every launched job has returned.
    pub fn join_all(&self) {
        self.active.wait_idle();
    }
}
