//! Static partitioning of the loop nest and the worker pool that runs it.
//!
//! Work is divided once, before any element is touched: each work unit is a
//! set of rectangular iteration regions of the loop nest, and no two units
//! share a destination element. Units are handed to a fixed-size thread pool;
//! the call returns only after every unit has finished.

use std::ops::Range;

use smallvec::{smallvec, SmallVec};

use crate::plan::{LoopNode, ParallelStrategy};

/// Iteration range per loop level, outermost first.
pub type Region = SmallVec<[Range<usize>; 8]>;

/// Work assigned to one thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    regions: SmallVec<[Region; 3]>,
}

impl WorkUnit {
    /// Rectangular iteration regions, in visiting order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Number of loop-nest iterations (tiles, not elements) in this unit.
    pub fn iterations(&self) -> usize {
        self.regions
            .iter()
            .map(|r| r.iter().map(|range| range.len()).product::<usize>())
            .sum()
    }
}

/// Split `0..n` into at most `parts` contiguous chunks whose lengths differ
/// by at most one; the first `n % parts` chunks get the extra iteration.
pub fn split_even(n: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.min(n);
    if parts == 0 {
        return Vec::new();
    }
    let q = n / parts;
    let r = n % parts;
    let mut start = 0;
    (0..parts)
        .map(|k| {
            let len = q + usize::from(k < r);
            let chunk = start..start + len;
            start += len;
            chunk
        })
        .collect()
}

/// Divide the loop nest into work units according to `strategy`.
///
/// Axes named by the strategy that are not part of the nest fall back to a
/// single unit.
pub fn partition(
    nodes: &[LoopNode],
    strategy: ParallelStrategy,
    num_threads: usize,
) -> Vec<WorkUnit> {
    let full: Region = nodes.iter().map(|n| 0..n.iterations()).collect();
    let whole = || {
        vec![WorkUnit {
            regions: smallvec![full.clone()],
        }]
    };
    let position = |axis: usize| nodes.iter().position(|n| n.axis == axis);

    if num_threads <= 1 {
        return whole();
    }
    match strategy {
        ParallelStrategy::Sequential => whole(),
        ParallelStrategy::Split { axis } => {
            let Some(p) = position(axis) else {
                return whole();
            };
            split_even(nodes[p].iterations(), num_threads)
                .into_iter()
                .map(|chunk| {
                    let mut region = full.clone();
                    region[p] = chunk;
                    WorkUnit {
                        regions: smallvec![region],
                    }
                })
                .collect()
        }
        ParallelStrategy::Flatten { outer, inner } => {
            let (Some(p), Some(q)) = (position(outer), position(inner)) else {
                return whole();
            };
            if p == q {
                return whole();
            }
            let nq = nodes[q].iterations();
            let total = nodes[p].iterations() * nq;
            split_even(total, num_threads)
                .into_iter()
                .map(|chunk| WorkUnit {
                    regions: flatten_chunk(&full, p, q, nq, chunk),
                })
                .collect()
        }
    }
}

/// Cover the flattened index range `chunk` of axes `p` (slow) and `q` (fast)
/// with at most three rectangles: a partial first row, full rows, and a
/// partial last row.
fn flatten_chunk(
    full: &Region,
    p: usize,
    q: usize,
    nq: usize,
    chunk: Range<usize>,
) -> SmallVec<[Region; 3]> {
    let mut regions = SmallVec::new();
    let mut rect = |rows: Range<usize>, cols: Range<usize>| {
        if rows.is_empty() || cols.is_empty() {
            return;
        }
        let mut region = full.clone();
        region[p] = rows;
        region[q] = cols;
        regions.push(region);
    };

    let (r0, c0) = (chunk.start / nq, chunk.start % nq);
    let (r1, c1) = (chunk.end / nq, chunk.end % nq);
    if r0 == r1 {
        rect(r0..r0 + 1, c0..c1);
    } else {
        let first_full = if c0 > 0 {
            rect(r0..r0 + 1, c0..nq);
            r0 + 1
        } else {
            r0
        };
        rect(first_full..r1, 0..nq);
        if c1 > 0 {
            rect(r1..r1 + 1, 0..c1);
        }
    }
    regions
}

/// A raw pointer wrapper that is `Send` + `Sync`.
///
/// # Safety
/// The caller must guarantee that the pointed-to data is valid for the
/// lifetime of any parallel operation and that different threads write
/// to disjoint elements.
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    pub(crate) fn as_ptr(self) -> *mut T {
        self.0
    }

    pub(crate) fn as_const(self) -> *const T {
        self.0 as *const T
    }
}

/// Fixed-size pool that runs work units.
///
/// Without the `parallel` feature, or when the pool cannot be created,
/// every unit runs on the calling thread.
pub struct Workers {
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Workers {
    /// Pool with `num_threads` threads; no pool at all for one thread.
    pub fn new(num_threads: usize) -> Self {
        #[cfg(feature = "parallel")]
        if num_threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()
            {
                Ok(pool) => return Self { pool: Some(pool) },
                Err(err) => log::warn!(
                    "failed to build a {num_threads}-thread pool ({err}); running sequentially"
                ),
            }
        }
        #[cfg(not(feature = "parallel"))]
        let _ = num_threads;
        Self::sequential()
    }

    /// Runs everything on the calling thread.
    pub fn sequential() -> Self {
        Self {
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    /// Threads available to [`Workers::run`].
    pub fn num_threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            return pool.current_num_threads();
        }
        1
    }

    /// Run `f` once per unit and wait for all of them.
    pub fn run<F>(&self, units: &[WorkUnit], f: F)
    where
        F: Fn(&WorkUnit) + Sync,
    {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            if units.len() > 1 {
                let f = &f;
                pool.scope(|s| {
                    for unit in units {
                        s.spawn(move |_| f(unit));
                    }
                });
                return;
            }
        }
        units.iter().for_each(f);
    }
}

impl std::fmt::Debug for Workers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workers")
            .field("num_threads", &self.num_threads())
            .finish()
    }
}
