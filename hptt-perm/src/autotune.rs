//! Empirical plan selection.
//!
//! Candidates are generated around the default plan in phases (loop orders,
//! then block sizes, then parallel strategies, then their combinations) and
//! each one is timed on the caller's real buffers. Every candidate computes
//! the same result, so the destination is correct whichever plan ran last.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::element::TransposeElement;
use crate::error::{Operand, Result};
use crate::execute::{check_len, execute_in};
use crate::plan::{ExecutionPlan, ParallelStrategy, PlanBuilder, PlanChoice};
use crate::scheduler::Workers;

/// Largest fused rank for which every loop order is a candidate.
const EXHAUSTIVE_ORDER_RANK: usize = 6;

/// Default search time of [`SelectionMethod::Crazy`].
pub const CRAZY_TIME_LIMIT: Duration = Duration::from_secs(10);

/// How hard to search for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionMethod {
    /// Plan builder default; nothing is timed and no data is touched.
    #[default]
    Estimate,
    /// A small set of loop orders and block sizes, each timed once.
    Measure,
    /// Loop orders, block sizes and parallel strategies, best of several runs.
    Patient,
    /// Every candidate the builder can produce, within [`CRAZY_TIME_LIMIT`].
    Crazy,
}

impl SelectionMethod {
    fn explores_strategies(self) -> bool {
        matches!(self, SelectionMethod::Patient | SelectionMethod::Crazy)
    }
}

/// Limits of one tuning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuningConfig {
    /// Upper bound on the number of candidate plans.
    pub max_candidates: usize,
    /// Executions per candidate; the fastest counts.
    pub repetitions: usize,
    /// Stop starting new candidates once this much time has been spent.
    /// At least one candidate always runs.
    pub time_limit: Option<Duration>,
}

impl TuningConfig {
    pub fn for_method(method: SelectionMethod) -> Self {
        let (max_candidates, repetitions, time_limit) = match method {
            SelectionMethod::Estimate => (1, 1, None),
            SelectionMethod::Measure => (8, 1, None),
            SelectionMethod::Patient => (64, 3, None),
            SelectionMethod::Crazy => (usize::MAX, 5, Some(CRAZY_TIME_LIMIT)),
        };
        Self {
            max_candidates,
            repetitions,
            time_limit,
        }
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self::for_method(SelectionMethod::default())
    }
}

/// Outcome of [`tune`].
#[derive(Debug, Clone)]
pub struct TuningReport {
    /// The fastest plan (or the default plan, see `fallback`).
    pub plan: ExecutionPlan,
    /// Best observed time per measured candidate, in the order they ran.
    pub timings: Vec<(PlanChoice, Duration)>,
    /// No candidate produced a usable timing; `plan` is the default plan.
    pub fallback: bool,
}

/// Ordered, duplicate-free, bounded list of candidates.
struct CandidateSet {
    cap: usize,
    seen: HashSet<PlanChoice>,
    items: Vec<PlanChoice>,
}

impl CandidateSet {
    fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.cap
    }

    /// Returns false once the set is full.
    fn push(&mut self, choice: PlanChoice) -> bool {
        if self.is_full() {
            return false;
        }
        if self.seen.insert(choice.clone()) {
            self.items.push(choice);
        }
        !self.is_full()
    }
}

/// All orderings of `items`, in lexicographic order of positions.
fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for (k, &first) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(k);
        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            out.push(tail);
        }
    }
    out
}

fn loop_orders(builder: &PlanBuilder, method: SelectionMethod) -> Vec<Vec<usize>> {
    let mut orders = builder.heuristic_loop_orders();
    let rank = builder.dims().len();
    if method.explores_strategies() && rank <= EXHAUSTIVE_ORDER_RANK {
        let mut seen: HashSet<Vec<usize>> = orders.iter().cloned().collect();
        for order in permutations(&(0..rank).collect::<Vec<_>>()) {
            if seen.insert(order.clone()) {
                orders.push(order);
            }
        }
    }
    orders
}

/// Candidate parameters for `method`, the default choice first.
pub fn candidate_choices(
    builder: &PlanBuilder,
    method: SelectionMethod,
    max_candidates: usize,
) -> Vec<PlanChoice> {
    let default = builder.default_choice();
    let mut set = CandidateSet::new(max_candidates);
    if !set.push(default.clone()) || method == SelectionMethod::Estimate {
        return set.items;
    }

    let orders = loop_orders(builder, method);
    let blocks = builder.block_candidates();
    let with_default_strategy = |loop_order: &[usize], block_a: usize, block_b: usize| {
        let nodes = builder.make_nodes(loop_order, block_a, block_b);
        PlanChoice {
            loop_order: loop_order.to_vec(),
            block_a,
            block_b,
            strategy: builder.default_strategy(&nodes),
        }
    };

    // Loop orders with default blocks.
    for order in &orders {
        if !set.push(with_default_strategy(order, default.block_a, default.block_b)) {
            return set.items;
        }
    }
    // Block sizes with the default order.
    for &(block_a, block_b) in &blocks {
        if !set.push(with_default_strategy(&default.loop_order, block_a, block_b)) {
            return set.items;
        }
    }
    if !method.explores_strategies() {
        return set.items;
    }

    // Thread partitionings of the default nest.
    let nodes = builder.make_nodes(&default.loop_order, default.block_a, default.block_b);
    for strategy in builder.strategy_candidates(&nodes) {
        if !set.push(PlanChoice {
            strategy,
            ..default.clone()
        }) {
            return set.items;
        }
    }
    // Everything together.
    for order in &orders {
        for &(block_a, block_b) in &blocks {
            let nodes = builder.make_nodes(order, block_a, block_b);
            for strategy in builder.strategy_candidates(&nodes) {
                let choice = PlanChoice {
                    loop_order: order.clone(),
                    block_a,
                    block_b,
                    strategy,
                };
                if !set.push(choice) {
                    return set.items;
                }
            }
        }
    }
    set.items
}

/// Copy of the destination's logical elements, used to undo timed runs
/// when `beta != 0`.
///
/// Values are copied verbatim rather than through the arithmetic path, so
/// a restore is bit-exact for every element type.
struct DstSnapshot<T> {
    values: Vec<T>,
    dims: Vec<usize>,
    strides: Vec<isize>,
}

impl<T: TransposeElement> DstSnapshot<T> {
    fn capture(plan: &ExecutionPlan, b: &[T]) -> Self {
        let dims = plan.dims().to_vec();
        let strides = plan.dst_strides().to_vec();
        let mut values = Vec::with_capacity(plan.total_len());
        for_each_offset(&dims, &strides, |off| values.push(b[off]));
        Self {
            values,
            dims,
            strides,
        }
    }

    fn restore(&self, b: &mut [T]) {
        let mut values = self.values.iter();
        for_each_offset(&self.dims, &self.strides, |off| {
            if let Some(&v) = values.next() {
                b[off] = v;
            }
        });
    }
}

/// Visit every element offset of a strided tensor, first axis fastest.
fn for_each_offset(dims: &[usize], strides: &[isize], mut f: impl FnMut(usize)) {
    let total: usize = dims.iter().product();
    let mut idx = vec![0usize; dims.len()];
    let mut off: isize = 0;
    for _ in 0..total {
        f(off as usize);
        for k in 0..dims.len() {
            idx[k] += 1;
            off += strides[k];
            if idx[k] < dims[k] {
                break;
            }
            off -= strides[k] * dims[k] as isize;
            idx[k] = 0;
        }
    }
}

/// Pool for a [`tune_in`] run: one thread unless some candidate can split
/// the nest.
pub fn tuning_workers(builder: &PlanBuilder, method: SelectionMethod) -> Workers {
    let parallel = match method {
        SelectionMethod::Estimate => false,
        SelectionMethod::Measure => builder.default_choice().strategy != ParallelStrategy::Sequential,
        SelectionMethod::Patient | SelectionMethod::Crazy => true,
    };
    if parallel {
        Workers::new(builder.num_threads())
    } else {
        Workers::sequential()
    }
}

/// Time candidate plans on the real buffers and return the fastest.
///
/// On return `b` holds exactly one application of
/// `b = alpha * op(permute(a)) + beta * b`, whatever the method.
/// With [`SelectionMethod::Estimate`] nothing runs and `b` is untouched.
#[allow(clippy::too_many_arguments)]
pub fn tune<T: TransposeElement>(
    builder: &PlanBuilder,
    a: &[T],
    b: &mut [T],
    alpha: T,
    beta: T,
    conj: bool,
    method: SelectionMethod,
    config: &TuningConfig,
) -> Result<TuningReport> {
    let workers = tuning_workers(builder, method);
    tune_in(builder, a, b, alpha, beta, conj, method, config, &workers)
}

/// Like [`tune`], timing every candidate on an existing pool.
#[allow(clippy::too_many_arguments)]
pub fn tune_in<T: TransposeElement>(
    builder: &PlanBuilder,
    a: &[T],
    b: &mut [T],
    alpha: T,
    beta: T,
    conj: bool,
    method: SelectionMethod,
    config: &TuningConfig,
    workers: &Workers,
) -> Result<TuningReport> {
    let default_plan = builder.default_plan();
    check_len(Operand::Source, a.len(), default_plan.src_extent())?;
    check_len(Operand::Destination, b.len(), default_plan.dst_extent())?;

    if method == SelectionMethod::Estimate {
        log::debug!("estimated plan: {default_plan}");
        return Ok(TuningReport {
            plan: default_plan,
            timings: Vec::new(),
            fallback: false,
        });
    }

    let choices = candidate_choices(builder, method, config.max_candidates);
    let snapshot = (!<T as num_traits::Zero>::is_zero(&beta))
        .then(|| DstSnapshot::capture(&default_plan, b));
    let started = Instant::now();

    let mut runs = 0usize;
    let mut timings = Vec::new();
    let mut best: Option<(Duration, ExecutionPlan)> = None;
    for choice in choices {
        if let Some(limit) = config.time_limit {
            if runs > 0 && started.elapsed() >= limit {
                log::trace!("time limit reached after {} candidates", timings.len());
                break;
            }
        }
        let Some(plan) = builder.build(&choice) else {
            log::trace!("skipping unbuildable candidate {choice:?}");
            continue;
        };

        let mut fastest: Option<Duration> = None;
        for _ in 0..config.repetitions.max(1) {
            if let Some(snapshot) = &snapshot {
                if runs > 0 {
                    snapshot.restore(b);
                }
            }
            let t0 = Instant::now();
            execute_in(&plan, a, b, alpha, beta, conj, workers)?;
            let elapsed = t0.elapsed();
            runs += 1;
            if !elapsed.is_zero() {
                fastest = Some(fastest.map_or(elapsed, |f| f.min(elapsed)));
            }
        }

        match fastest {
            Some(time) => {
                log::trace!("candidate {plan}: {time:?}");
                if best.as_ref().map_or(true, |(t, _)| time < *t) {
                    best = Some((time, plan));
                }
                timings.push((choice, time));
            }
            None => log::trace!("candidate {plan} too fast to time; skipped"),
        }
    }

    if runs == 0 {
        execute_in(&default_plan, a, b, alpha, beta, conj, workers)?;
    }

    let report = match best {
        Some((time, plan)) => {
            log::debug!(
                "autotune ({method:?}) picked {plan} at {time:?} out of {} candidates",
                timings.len()
            );
            TuningReport {
                plan,
                timings,
                fallback: false,
            }
        }
        None => {
            log::debug!("autotune ({method:?}) measured nothing; using {default_plan}");
            TuningReport {
                plan: default_plan,
                timings,
                fallback: true,
            }
        }
    };
    Ok(report)
}
