//! Fork-join fan-out over independent work items.
//!
//! `threads == 1` runs sequentially on the caller's thread, `threads == 0` uses
//! rayon's global pool, anything else gets a dedicated pool of that size.
//! Output order always matches input order.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

pub(crate) fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|f| f.load(Ordering::Relaxed))
}

/// Map `f` over `items`, skipping items once `cancel` is raised.
///
/// Skipped items come back as `None`; an item that started always completes.
pub(crate) fn fan_out<T, R, F>(
    items: &[T],
    threads: usize,
    cancel: Option<&AtomicBool>,
    f: F,
) -> Result<Vec<Option<R>>, rayon::ThreadPoolBuildError>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    let guarded = |item: &T| (!is_cancelled(cancel)).then(|| f(item));

    match threads {
        1 => Ok(items.iter().map(guarded).collect()),
        0 => Ok(items.par_iter().map(guarded).collect()),
        n => {
            let tp = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            Ok(tp.install(|| items.par_iter().map(guarded).collect()))
        }
    }
}
