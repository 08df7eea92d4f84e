//! A rayon-backed worker pool for independent, indexed work items.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Resolves a requested worker count: `0` means one worker per available core.
pub(crate) fn resolve_jobs(n_jobs: usize) -> usize {
    if n_jobs == 0 {
        std::thread::available_parallelism().map_or(1, core::num::NonZeroUsize::get)
    } else {
        n_jobs
    }
}

/// Runs `work(i)` for every `i in 0..n_items` on a pool of up to `n_jobs`
/// threads.
///
/// Every task claims the next index from a shared ticket counter, so items
/// start in index order whichever rayon worker picks the task up. Once
/// `deadline` passes no further tickets are claimed, and the returned flag
/// reports whether any item was skipped. Claimed items always finish, so
/// the items that ran form a prefix. Slot `i` of the returned vector holds
/// the output of item `i`, or `None` if it never ran.
///
/// # Errors
///
/// Returns [`Error::WorkerPool`] if the thread pool cannot be built.
pub(crate) fn run_indexed<T, F>(
    n_items: usize,
    n_jobs: usize,
    deadline: Option<Instant>,
    work: F,
) -> Result<(Vec<Option<T>>, bool)>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let results: Mutex<Vec<Option<T>>> = Mutex::new((0..n_items).map(|_| None).collect());
    let next = AtomicUsize::new(0);
    let timed_out = AtomicBool::new(false);

    let run_one = |_: usize| {
        if timed_out.load(Ordering::Acquire) {
            return;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            timed_out.store(true, Ordering::Release);
            return;
        }
        let i = next.fetch_add(1, Ordering::AcqRel);
        let output = work(i);
        results.lock()[i] = Some(output);
    };

    let n_workers = resolve_jobs(n_jobs).min(n_items).max(1);
    if n_workers == 1 {
        (0..n_items).for_each(run_one);
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;
        pool.install(|| (0..n_items).into_par_iter().for_each(run_one));
    }

    Ok((results.into_inner(), timed_out.into_inner()))
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;

    #[test]
    fn test_every_item_runs_once() {
        let (out, timed_out) = run_indexed(50, 4, None, |i| i * 2).unwrap();
        assert!(!timed_out);
        let out: Vec<usize> = out.into_iter().map(Option::unwrap).collect();
        assert_eq!(out, (0..50).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_items() {
        let (out, timed_out) = run_indexed(0, 3, None, |i| i).unwrap();
        assert!(out.is_empty());
        assert!(!timed_out);
    }

    #[test]
    fn test_worker_count_is_bounded() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        run_indexed(24, 3, None, |_| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            active.fetch_sub(1, Ordering::SeqCst);
        })
        .unwrap();
        assert!(peak.into_inner() <= 3);
    }

    #[test]
    fn test_deadline_skips_remaining() {
        let deadline = Instant::now() + Duration::from_millis(20);
        let (out, timed_out) = run_indexed(100, 1, Some(deadline), |i| {
            std::thread::sleep(Duration::from_millis(5));
            i
        })
        .unwrap();
        assert!(timed_out);
        let done = out.iter().filter(|o| o.is_some()).count();
        assert!(done > 0 && done < 100, "{done} items ran");
        // items run in order, so completed ones form a prefix
        assert!(out[..done].iter().all(Option::is_some));
    }

    #[test]
    fn test_deadline_keeps_prefix_on_many_workers() {
        let deadline = Instant::now() + Duration::from_millis(25);
        let (out, timed_out) = run_indexed(400, 4, Some(deadline), |i| {
            std::thread::sleep(Duration::from_millis(3));
            i
        })
        .unwrap();
        assert!(timed_out);
        let done = out.iter().filter(|o| o.is_some()).count();
        assert!(done < 400, "{done} items ran");
        assert!(out[..done].iter().all(Option::is_some));
        assert!(out[done..].iter().all(Option::is_none));
    }
}
