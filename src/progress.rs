//! Progress and cooperative cancellation shared between caller and worker.
//!
//! The matcher advances one step per scanned (template, orientation) pair and
//! polls the cancellation flag after every coarse candidate, after every hill
//! climb and between pairs. Share the state through an `Arc` to drive a run on
//! a worker thread while another thread polls or cancels it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Thread-safe progress counter and cancellation flag.
#[derive(Debug, Default)]
pub struct MatchProgress {
    cancelled: AtomicBool,
    done: AtomicUsize,
    total: AtomicUsize,
}

impl MatchProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the running scan stop at its next poll point.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Completed steps.
    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Total steps of the current run; zero before a run starts.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.done().min(total) as f64) / total as f64
    }

    /// Starts a new run of `total` steps. The cancellation flag is kept.
    pub(crate) fn begin(&self, total: usize) {
        self.done.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub(crate) fn step(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::MatchProgress;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fraction_tracks_steps() {
        let progress = MatchProgress::new();
        assert_eq!(progress.fraction(), 0.0);
        progress.begin(4);
        progress.step();
        assert_eq!(progress.fraction(), 0.25);
        assert!(!progress.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_across_threads() {
        let progress = Arc::new(MatchProgress::new());
        let worker = {
            let progress = Arc::clone(&progress);
            thread::spawn(move || {
                while !progress.is_cancelled() {
                    thread::yield_now();
                }
                progress.step();
            })
        };
        progress.cancel();
        worker.join().unwrap();
        assert_eq!(progress.done(), 1);
    }
}
