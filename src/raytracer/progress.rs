use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
struct Timing {
    started: Instant,
    finished: Option<Instant>,
}

/// Work-unit progress counter polled by a reporter thread.
///
/// Render workers only ever call [`ProgressMonitor::update_inc`], which is a single
/// atomic increment; nothing here blocks a worker on the reporter.
#[derive(Debug)]
pub struct ProgressMonitor {
    total: AtomicU64,
    completed: AtomicU64,
    in_progress: AtomicBool,
    timing: Mutex<Timing>,
}

impl Default for ProgressMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            in_progress: AtomicBool::new(false),
            timing: Mutex::new(Timing {
                started: Instant::now(),
                finished: None,
            }),
        }
    }

    pub fn reset(&self, total_units: u64) {
        *self.timing.lock().unwrap_or_else(PoisonError::into_inner) = Timing {
            started: Instant::now(),
            finished: None,
        };
        self.total.store(total_units, Ordering::Release);
        self.completed.store(0, Ordering::Release);
        self.in_progress.store(true, Ordering::Release);
    }

    #[inline]
    pub fn update_inc(&self) {
        self.completed.fetch_add(1, Ordering::AcqRel);
    }

    pub fn finish(&self) {
        self.timing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finished = Some(Instant::now());
        self.in_progress.store(false, Ordering::Release);
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub fn completed_units(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    pub fn total_units(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    pub fn progress(&self) -> f32 {
        let total = self.total_units();
        if total == 0 {
            return if self.in_progress() { 0.0 } else { 1.0 };
        }
        (self.completed_units() as f64 / total as f64).min(1.0) as f32
    }

    pub fn elapsed_time(&self) -> Duration {
        let timing = *self.timing.lock().unwrap_or_else(PoisonError::into_inner);
        match timing.finished {
            Some(end) => end - timing.started,
            None => timing.started.elapsed(),
        }
    }

    /// Linear extrapolation from the current rate; `None` before the first unit lands.
    pub fn remaining_time(&self) -> Option<Duration> {
        if !self.in_progress() {
            return Some(Duration::ZERO);
        }
        let progress = self.progress() as f64;
        if progress <= 0.0 {
            return None;
        }
        let elapsed = self.elapsed_time().as_secs_f64();
        Some(Duration::from_secs_f64(elapsed * (1.0 - progress) / progress))
    }
}
