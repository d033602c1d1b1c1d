//! Parallel-for dispatch over a known index range.
//!
//! A dispatch models one compute pass: invocations are data-independent and
//! unordered, and the call returns only once every invocation has finished,
//! so each call site doubles as a full-group barrier. With the `rayon`
//! feature disabled, every dispatch runs serially on the calling thread.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Invokes `f` once per index in `0..count`.
pub fn par_for(count: u32, f: impl Fn(u32) + Send + Sync) {
    #[cfg(feature = "rayon")]
    {
        (0..count).into_par_iter().for_each(f);
    }

    #[cfg(not(feature = "rayon"))]
    {
        (0..count).for_each(f);
    }
}

/// Invokes `f` once per index in `0..count` and collects the results.
pub fn par_map<T>(count: u32, f: impl Fn(u32) -> T + Send + Sync) -> Vec<T>
where
    T: Send,
{
    #[cfg(feature = "rayon")]
    {
        (0..count).into_par_iter().map(f).collect()
    }

    #[cfg(not(feature = "rayon"))]
    {
        (0..count).map(f).collect()
    }
}

/// Invokes `f` once per item; each invocation exclusively owns its item.
pub fn par_for_each_mut<T>(items: &mut [T], f: impl Fn(usize, &mut T) + Send + Sync)
where
    T: Send,
{
    #[cfg(feature = "rayon")]
    {
        items
            .par_iter_mut()
            .enumerate()
            .for_each(|(idx, item)| f(idx, item));
    }

    #[cfg(not(feature = "rayon"))]
    {
        items
            .iter_mut()
            .enumerate()
            .for_each(|(idx, item)| f(idx, item));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn par_for_visits_every_index() {
        let hits = AtomicU32::new(0);

        par_for(1000, |_| {
            hits.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(hits.load(Ordering::Relaxed), 1000);
    }

    #[test]
    fn par_map_preserves_order() {
        let out = par_map(100, |idx| idx * 2);

        assert_eq!(out[0], 0);
        assert_eq!(out[50], 100);
        assert_eq!(out[99], 198);
    }

    #[test]
    fn par_for_each_mut_owns_items() {
        let mut items = vec![0u32; 64];

        par_for_each_mut(&mut items, |idx, item| {
            *item = idx as u32 + 1;
        });

        assert!(items.iter().enumerate().all(|(idx, item)| *item == idx as u32 + 1));
    }
}
