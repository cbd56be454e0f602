//! Plan construction for blocked tensor transposition.
//!
//! Bilateral fusion → identify stride-1 dims → select the kernel variant →
//! compute loop order and block sizes → derive the parallel strategy.
//!
//! The loop nest contains every fused axis. The two kernel axes (stride-1 in
//! source and in destination) advance by their block size and hand the
//! current tile extent to the leaf; every other axis advances by one. Any
//! ordering of the nest visits every element exactly once, which is what lets
//! the autotuner reorder loops freely.

use std::fmt;

use crate::element::TransposeElement;
use crate::error::{HpttError, Operand, Result};
use crate::fuse::fuse_dims_bilateral;
use crate::scheduler::{partition, WorkUnit};
use crate::shape::CanonicalShape;
use crate::{BLOCK_MEMORY_SIZE, CACHE_LINE_SIZE, MINTHREADLENGTH};

/// Tuning knobs of the plan builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanConfig {
    /// Byte budget for one source tile plus one destination tile.
    pub tile_budget: usize,
    /// Minimum element count for the default plan to use more than one thread.
    pub min_parallel_len: usize,
    /// Drop size-1 axes before planning.
    pub elide_unit_axes: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            tile_budget: BLOCK_MEMORY_SIZE / 2,
            min_parallel_len: MINTHREADLENGTH,
            elide_unit_axes: true,
        }
    }
}

/// Leaf kernel selected at plan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelVariant {
    /// Source and destination share their stride-1 axis: strided line update.
    Copy {
        /// The shared stride-1 dimension.
        inner_dim: usize,
    },
    /// dim_A != dim_B, both with unit stride: 2D micro-kernel transpose.
    Transpose {
        /// Dimension with smallest |src_stride| (stride-1 in source).
        dim_a: usize,
        /// Dimension with smallest |dst_stride| (stride-1 in dest).
        dim_b: usize,
    },
    /// dim_A != dim_B, but one of them has a non-unit stride.
    Strided { dim_a: usize, dim_b: usize },
    /// Rank 0: single element update.
    Scalar,
}

impl fmt::Display for KernelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelVariant::Copy { inner_dim } => write!(f, "copy(inner={inner_dim})"),
            KernelVariant::Transpose { dim_a, dim_b } => {
                write!(f, "transpose(a={dim_a}, b={dim_b})")
            }
            KernelVariant::Strided { dim_a, dim_b } => write!(f, "strided(a={dim_a}, b={dim_b})"),
            KernelVariant::Scalar => write!(f, "scalar"),
        }
    }
}

/// What a loop level iterates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisRole {
    /// Axis outside the kernel tile; advances by one.
    Outer,
    /// Source stride-1 axis (or the shared axis of a copy); advances by `block_a`.
    KernelA,
    /// Destination stride-1 axis; advances by `block_b`.
    KernelB,
}

/// One loop level of the execution nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopNode {
    /// Fused axis this level iterates.
    pub axis: usize,
    pub role: AxisRole,
    /// Extent of the axis (loop runs over 0..end).
    pub end: usize,
    /// Step per iteration.
    pub inc: usize,
    /// Source stride for this dimension.
    pub lda: isize,
    /// Destination stride for this dimension.
    pub ldb: isize,
}

impl LoopNode {
    /// Number of iterations of this level (the last one may be partial).
    pub fn iterations(&self) -> usize {
        self.end.div_ceil(self.inc)
    }
}

/// How the loop nest is divided among threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParallelStrategy {
    /// One work unit covering the whole nest.
    Sequential,
    /// Contiguous chunks of one axis's iterations.
    Split { axis: usize },
    /// Contiguous chunks of the flattened iterations of two axes.
    Flatten { outer: usize, inner: usize },
}

impl fmt::Display for ParallelStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParallelStrategy::Sequential => write!(f, "sequential"),
            ParallelStrategy::Split { axis } => write!(f, "split(axis {axis})"),
            ParallelStrategy::Flatten { outer, inner } => {
                write!(f, "flatten(axes {outer}x{inner})")
            }
        }
    }
}

/// The free parameters of a plan: what the autotuner varies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanChoice {
    /// Fused axes, outermost loop first.
    pub loop_order: Vec<usize>,
    pub block_a: usize,
    pub block_b: usize,
    pub strategy: ParallelStrategy,
}

/// Complete, immutable execution plan.
///
/// Holds no reference to data buffers; one plan can execute any number of
/// transpositions with the shape it was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    dims: Vec<usize>,
    src_strides: Vec<isize>,
    dst_strides: Vec<isize>,
    variant: KernelVariant,
    loop_order: Vec<usize>,
    nodes: Vec<LoopNode>,
    block_a: usize,
    block_b: usize,
    strategy: ParallelStrategy,
    num_threads: usize,
    min_parallel_len: usize,
    elem_size: usize,
}

impl ExecutionPlan {
    /// Fused dimensions (after bilateral fusion).
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Fused source strides.
    pub fn src_strides(&self) -> &[isize] {
        &self.src_strides
    }

    /// Fused destination strides.
    pub fn dst_strides(&self) -> &[isize] {
        &self.dst_strides
    }

    pub fn variant(&self) -> KernelVariant {
        self.variant
    }

    /// Fused axes, outermost loop first.
    pub fn loop_order(&self) -> &[usize] {
        &self.loop_order
    }

    /// Loop levels, outermost first.
    pub fn nodes(&self) -> &[LoopNode] {
        &self.nodes
    }

    pub fn block_a(&self) -> usize {
        self.block_a
    }

    pub fn block_b(&self) -> usize {
        self.block_b
    }

    pub fn strategy(&self) -> ParallelStrategy {
        self.strategy
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Number of elements transposed.
    pub fn total_len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Smallest source buffer length this plan may touch.
    pub fn src_extent(&self) -> usize {
        extent(&self.dims, &self.src_strides)
    }

    /// Smallest destination buffer length this plan may touch.
    pub fn dst_extent(&self) -> usize {
        extent(&self.dims, &self.dst_strides)
    }

    /// Partition of the loop nest for this plan's thread count.
    pub fn work_units(&self) -> Vec<WorkUnit> {
        partition(&self.nodes, self.strategy, self.num_threads)
    }

    /// Same loop order, default parallel strategy for another thread count.
    ///
    /// Copy plans also re-derive their line block, since splitting the
    /// line is how a copy with no outer axis goes parallel.
    pub fn with_threads(&self, num_threads: usize) -> Result<Self> {
        if num_threads == 0 {
            return Err(HpttError::InvalidThreadCount);
        }
        let mut plan = Self {
            num_threads,
            ..self.clone()
        };
        if let KernelVariant::Copy { inner_dim } = self.variant {
            plan.block_a = copy_line_block(
                &self.dims,
                inner_dim,
                num_threads,
                self.min_parallel_len,
                self.elem_size,
            );
            for node in &mut plan.nodes {
                if node.role == AxisRole::KernelA {
                    node.inc = plan.block_a;
                }
            }
        }
        plan.strategy = default_strategy(
            &plan.nodes,
            num_threads,
            plan.total_len(),
            plan.min_parallel_len,
        );
        Ok(plan)
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} loops=[", self.variant)?;
        for (k, node) in self.nodes.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            match node.role {
                AxisRole::Outer => write!(f, "{}:{}", node.axis, node.end)?,
                AxisRole::KernelA => write!(f, "{}a:{}/{}", node.axis, node.end, node.inc)?,
                AxisRole::KernelB => write!(f, "{}b:{}/{}", node.axis, node.end, node.inc)?,
            }
        }
        write!(f, "] threads={} {}", self.num_threads, self.strategy)
    }
}

/// Builds plans for one fused shape, element type and thread count.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    dims: Vec<usize>,
    src_strides: Vec<isize>,
    dst_strides: Vec<isize>,
    variant: KernelVariant,
    micro: usize,
    elem_size: usize,
    num_threads: usize,
    config: PlanConfig,
}

impl PlanBuilder {
    /// Planner for a validated shape.
    pub fn new<T: TransposeElement>(
        shape: &CanonicalShape,
        num_threads: usize,
        config: &PlanConfig,
    ) -> Result<Self> {
        Self::from_strides::<T>(
            shape.dims(),
            shape.src_strides(),
            shape.dst_strides(),
            num_threads,
            config,
        )
    }

    /// Planner for raw per-axis extents and strides (in elements).
    pub fn from_strides<T: TransposeElement>(
        dims: &[usize],
        src_strides: &[isize],
        dst_strides: &[isize],
        num_threads: usize,
        config: &PlanConfig,
    ) -> Result<Self> {
        if num_threads == 0 {
            return Err(HpttError::InvalidThreadCount);
        }
        for (what, len) in [
            ("src_strides", src_strides.len()),
            ("dst_strides", dst_strides.len()),
        ] {
            if len != dims.len() {
                return Err(HpttError::RankMismatch {
                    what,
                    expected: dims.len(),
                    found: len,
                });
            }
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(HpttError::ZeroSize { axis });
        }
        check_strides(Operand::Source, dims, src_strides, false)?;
        check_strides(Operand::Destination, dims, dst_strides, true)?;

        let (dims, src_strides, dst_strides) = fuse_dims_bilateral(dims, src_strides, dst_strides);
        let variant = select_variant(&dims, &src_strides, &dst_strides);

        Ok(Self {
            dims,
            src_strides,
            dst_strides,
            variant,
            micro: T::MICRO,
            elem_size: std::mem::size_of::<T>(),
            num_threads,
            config: config.clone(),
        })
    }

    /// Fused dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn variant(&self) -> KernelVariant {
        self.variant
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn total_len(&self) -> usize {
        self.dims.iter().product()
    }

    /// The plan the builder picks without measuring anything.
    pub fn default_plan(&self) -> ExecutionPlan {
        self.assemble(&self.default_choice())
    }

    /// Build a plan from explicit parameters; `None` if they do not fit this shape.
    pub fn build(&self, choice: &PlanChoice) -> Option<ExecutionPlan> {
        self.is_valid(choice).then(|| self.assemble(choice))
    }

    pub fn default_choice(&self) -> PlanChoice {
        let loop_order = self.default_loop_order();
        let (block_a, block_b) = self.default_blocks();
        let nodes = self.make_nodes(&loop_order, block_a, block_b);
        let strategy = self.default_strategy(&nodes);
        PlanChoice {
            loop_order,
            block_a,
            block_b,
            strategy,
        }
    }

    /// Outer axes by decreasing size (largest outermost), kernel axes innermost.
    pub fn default_loop_order(&self) -> Vec<usize> {
        let rank = self.dims.len();
        match self.variant {
            KernelVariant::Scalar => Vec::new(),
            KernelVariant::Copy { inner_dim } => {
                let mut order: Vec<usize> = (0..rank).filter(|&d| d != inner_dim).collect();
                order.sort_by(|&x, &y| {
                    self.dims[y].cmp(&self.dims[x]).then(
                        self.dst_strides[y]
                            .unsigned_abs()
                            .cmp(&self.dst_strides[x].unsigned_abs()),
                    )
                });
                order.push(inner_dim);
                order
            }
            KernelVariant::Transpose { dim_a, dim_b } | KernelVariant::Strided { dim_a, dim_b } => {
                let mut order: Vec<usize> = (0..rank)
                    .filter(|&d| d != dim_a && d != dim_b)
                    .collect();
                order.sort_by(|&x, &y| {
                    self.dims[y]
                        .cmp(&self.dims[x])
                        .then(self.stride_cost(y).cmp(&self.stride_cost(x)))
                });
                order.push(dim_b);
                order.push(dim_a);
                order
            }
        }
    }

    /// Loop orders worth timing besides the default.
    pub fn heuristic_loop_orders(&self) -> Vec<Vec<usize>> {
        let default = self.default_loop_order();
        let mut orders = vec![default.clone()];
        match self.variant {
            KernelVariant::Scalar => {}
            KernelVariant::Copy { inner_dim } => {
                let outer = &default[..default.len() - 1];

                // Largest destination stride outermost: sequential writes.
                let mut by_dst = outer.to_vec();
                by_dst.sort_by(|&x, &y| {
                    self.dst_strides[y]
                        .unsigned_abs()
                        .cmp(&self.dst_strides[x].unsigned_abs())
                });
                by_dst.push(inner_dim);
                orders.push(by_dst);

                let mut by_src = outer.to_vec();
                by_src.sort_by(|&x, &y| {
                    self.src_strides[y]
                        .unsigned_abs()
                        .cmp(&self.src_strides[x].unsigned_abs())
                });
                by_src.push(inner_dim);
                orders.push(by_src);

                let mut reversed: Vec<usize> = outer.iter().rev().copied().collect();
                reversed.push(inner_dim);
                orders.push(reversed);
            }
            KernelVariant::Transpose { dim_a, dim_b } | KernelVariant::Strided { dim_a, dim_b } => {
                let outer = &default[..default.len() - 2];

                let mut by_cost = outer.to_vec();
                by_cost.sort_by(|&x, &y| self.stride_cost(y).cmp(&self.stride_cost(x)));
                by_cost.extend([dim_b, dim_a]);
                orders.push(by_cost);

                let mut swapped = outer.to_vec();
                swapped.extend([dim_a, dim_b]);
                orders.push(swapped);

                let mut hoisted = vec![dim_b];
                hoisted.extend_from_slice(outer);
                hoisted.push(dim_a);
                orders.push(hoisted);

                let mut reversed: Vec<usize> = outer.iter().rev().copied().collect();
                reversed.extend([dim_b, dim_a]);
                orders.push(reversed);
            }
        }
        dedup_preserving_order(orders)
    }

    /// Default `(block_a, block_b)`.
    ///
    /// For transposes: the largest power-of-two multiple of the micro-tile up
    /// to `4 * MICRO` whose source and destination tiles fit the tile budget,
    /// clamped to the smallest micro multiple that covers each axis.
    /// For copies: see `copy_line_block`.
    pub fn default_blocks(&self) -> (usize, usize) {
        match self.variant {
            KernelVariant::Scalar => (1, 1),
            KernelVariant::Copy { inner_dim } => (
                copy_line_block(
                    &self.dims,
                    inner_dim,
                    self.num_threads,
                    self.config.min_parallel_len,
                    self.elem_size,
                ),
                1,
            ),
            KernelVariant::Transpose { dim_a, dim_b } | KernelVariant::Strided { dim_a, dim_b } => {
                let mut block = self.micro * 4;
                while block > self.micro && 2 * block * block * self.elem_size > self.config.tile_budget
                {
                    block /= 2;
                }
                (
                    clamp_block(block, self.dims[dim_a], self.micro),
                    clamp_block(block, self.dims[dim_b], self.micro),
                )
            }
        }
    }

    /// Block pairs worth timing, default first.
    pub fn block_candidates(&self) -> Vec<(usize, usize)> {
        let default = self.default_blocks();
        let mut blocks = vec![default];
        if let KernelVariant::Transpose { dim_a, dim_b } | KernelVariant::Strided { dim_a, dim_b } =
            self.variant
        {
            let limit = BLOCK_MEMORY_SIZE * 8;
            for fa in [1, 2, 4, 8, 16] {
                for fb in [1, 2, 4, 8, 16] {
                    let ba = clamp_block(self.micro * fa, self.dims[dim_a], self.micro);
                    let bb = clamp_block(self.micro * fb, self.dims[dim_b], self.micro);
                    if 2 * ba * bb * self.elem_size <= limit {
                        blocks.push((ba, bb));
                    }
                }
            }
        }
        dedup_preserving_order(blocks)
    }

    /// Default strategy for `nodes` at this builder's thread count.
    pub fn default_strategy(&self, nodes: &[LoopNode]) -> ParallelStrategy {
        default_strategy(
            nodes,
            self.num_threads,
            self.total_len(),
            self.config.min_parallel_len,
        )
    }

    /// Parallel strategies worth timing for `nodes`, default first.
    pub fn strategy_candidates(&self, nodes: &[LoopNode]) -> Vec<ParallelStrategy> {
        let mut strategies = vec![self.default_strategy(nodes)];
        if self.num_threads <= 1 {
            return strategies;
        }
        strategies.push(ParallelStrategy::Sequential);
        let ranked = ranked_parallel_axes(nodes);
        for &axis in &ranked {
            strategies.push(ParallelStrategy::Split { axis });
        }
        let top = &ranked[..ranked.len().min(3)];
        for (i, &outer) in top.iter().enumerate() {
            for &inner in &top[i + 1..] {
                strategies.push(ParallelStrategy::Flatten { outer, inner });
            }
        }
        dedup_preserving_order(strategies)
    }

    /// Loop levels for a loop order and block pair (assumed valid).
    pub fn make_nodes(&self, loop_order: &[usize], block_a: usize, block_b: usize) -> Vec<LoopNode> {
        loop_order
            .iter()
            .map(|&axis| {
                let role = self.role_of(axis);
                let inc = match role {
                    AxisRole::Outer => 1,
                    AxisRole::KernelA => block_a,
                    AxisRole::KernelB => block_b,
                };
                LoopNode {
                    axis,
                    role,
                    end: self.dims[axis],
                    inc,
                    lda: self.src_strides[axis],
                    ldb: self.dst_strides[axis],
                }
            })
            .collect()
    }

    fn role_of(&self, axis: usize) -> AxisRole {
        match self.variant {
            KernelVariant::Copy { inner_dim } if axis == inner_dim => AxisRole::KernelA,
            KernelVariant::Transpose { dim_a, .. } | KernelVariant::Strided { dim_a, .. }
                if axis == dim_a =>
            {
                AxisRole::KernelA
            }
            KernelVariant::Transpose { dim_b, .. } | KernelVariant::Strided { dim_b, .. }
                if axis == dim_b =>
            {
                AxisRole::KernelB
            }
            _ => AxisRole::Outer,
        }
    }

    fn stride_cost(&self, axis: usize) -> usize {
        self.src_strides[axis].unsigned_abs() + self.dst_strides[axis].unsigned_abs()
    }

    fn is_valid(&self, choice: &PlanChoice) -> bool {
        let rank = self.dims.len();
        if choice.loop_order.len() != rank || choice.block_a == 0 || choice.block_b == 0 {
            return false;
        }
        let mut seen = vec![false; rank];
        for &axis in &choice.loop_order {
            if axis >= rank || seen[axis] {
                return false;
            }
            seen[axis] = true;
        }
        match choice.strategy {
            ParallelStrategy::Sequential => true,
            ParallelStrategy::Split { axis } => axis < rank,
            ParallelStrategy::Flatten { outer, inner } => {
                outer < rank && inner < rank && outer != inner
            }
        }
    }

    fn assemble(&self, choice: &PlanChoice) -> ExecutionPlan {
        let nodes = self.make_nodes(&choice.loop_order, choice.block_a, choice.block_b);
        let plan = ExecutionPlan {
            dims: self.dims.clone(),
            src_strides: self.src_strides.clone(),
            dst_strides: self.dst_strides.clone(),
            variant: self.variant,
            loop_order: choice.loop_order.clone(),
            nodes,
            block_a: choice.block_a,
            block_b: choice.block_b,
            strategy: choice.strategy,
            num_threads: self.num_threads,
            min_parallel_len: self.config.min_parallel_len,
            elem_size: self.elem_size,
        };
        log::trace!("assembled plan {plan}");
        plan
    }
}

/// Find the dimension with the smallest absolute stride among non-trivial dims.
fn find_stride1_dim(dims: &[usize], strides: &[isize]) -> usize {
    dims.iter()
        .zip(strides.iter())
        .enumerate()
        .filter(|(_, (&d, _))| d > 1)
        .min_by_key(|(_, (_, &s))| s.unsigned_abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn select_variant(dims: &[usize], src_strides: &[isize], dst_strides: &[isize]) -> KernelVariant {
    if dims.is_empty() {
        return KernelVariant::Scalar;
    }
    let dim_a = find_stride1_dim(dims, src_strides);
    let dim_b = find_stride1_dim(dims, dst_strides);
    if dim_a == dim_b {
        KernelVariant::Copy { inner_dim: dim_a }
    } else if src_strides[dim_a] == 1 && dst_strides[dim_b] == 1 {
        KernelVariant::Transpose { dim_a, dim_b }
    } else {
        KernelVariant::Strided { dim_a, dim_b }
    }
}

/// Line block of a copy: the whole line, or one cache-line-aligned chunk
/// per thread when the line is the only axis there is to split.
fn copy_line_block(
    dims: &[usize],
    inner_dim: usize,
    num_threads: usize,
    min_parallel_len: usize,
    elem_size: usize,
) -> usize {
    let n = dims[inner_dim];
    let has_outer_work = dims
        .iter()
        .enumerate()
        .any(|(d, &size)| d != inner_dim && size > 1);
    let total: usize = dims.iter().product();
    if num_threads > 1 && !has_outer_work && total >= min_parallel_len {
        let align = (CACHE_LINE_SIZE / elem_size).max(1);
        round_up(n.div_ceil(num_threads), align).min(n)
    } else {
        n
    }
}

/// Axes with at least two iterations: outer axes first, then kernel axes,
/// each group by decreasing iteration count.
fn ranked_parallel_axes(nodes: &[LoopNode]) -> Vec<usize> {
    let mut outer: Vec<&LoopNode> = nodes
        .iter()
        .filter(|n| n.role == AxisRole::Outer && n.iterations() >= 2)
        .collect();
    let mut kernel: Vec<&LoopNode> = nodes
        .iter()
        .filter(|n| n.role != AxisRole::Outer && n.iterations() >= 2)
        .collect();
    outer.sort_by(|x, y| y.iterations().cmp(&x.iterations()));
    kernel.sort_by(|x, y| y.iterations().cmp(&x.iterations()));
    outer.into_iter().chain(kernel).map(|n| n.axis).collect()
}

/// Split the largest axis into one chunk per thread; when it has fewer
/// iterations than threads, flatten it with the next largest.
fn default_strategy(
    nodes: &[LoopNode],
    num_threads: usize,
    total_len: usize,
    min_parallel_len: usize,
) -> ParallelStrategy {
    if num_threads <= 1 || total_len < min_parallel_len {
        return ParallelStrategy::Sequential;
    }
    let ranked = ranked_parallel_axes(nodes);
    let Some(&first) = ranked.first() else {
        return ParallelStrategy::Sequential;
    };
    let iterations = |axis: usize| {
        nodes
            .iter()
            .find(|n| n.axis == axis)
            .map_or(1, LoopNode::iterations)
    };
    match ranked.get(1) {
        Some(&second) if iterations(first) < num_threads => ParallelStrategy::Flatten {
            outer: first,
            inner: second,
        },
        _ => ParallelStrategy::Split { axis: first },
    }
}

/// Reject strides the loop nest cannot walk inside one slice.
///
/// Strides must be non-negative and the extent must fit in `isize`. With
/// `disjoint`, axes sorted by stride must each step past everything the
/// smaller-stride axes span, so that every index tuple owns its element.
fn check_strides(operand: Operand, dims: &[usize], strides: &[isize], disjoint: bool) -> Result<()> {
    let invalid = || HpttError::InvalidStrides {
        operand,
        dims: dims.to_vec(),
        strides: strides.to_vec(),
    };
    if strides.iter().any(|&s| s < 0) {
        return Err(invalid());
    }
    let last = dims
        .iter()
        .zip(strides)
        .try_fold(0usize, |acc, (&d, &s)| {
            (d - 1).checked_mul(s as usize)?.checked_add(acc)
        })
        .ok_or(HpttError::OffsetOverflow)?;
    if last >= isize::MAX as usize {
        return Err(HpttError::OffsetOverflow);
    }
    if disjoint {
        let mut axes: Vec<(usize, usize)> = dims
            .iter()
            .zip(strides)
            .filter(|(&d, _)| d > 1)
            .map(|(&d, &s)| (s as usize, d))
            .collect();
        axes.sort_unstable();
        let mut span = 1usize;
        for (stride, dim) in axes {
            if stride < span {
                return Err(invalid());
            }
            span = stride * dim;
        }
    }
    Ok(())
}

fn extent(dims: &[usize], strides: &[isize]) -> usize {
    1 + dims
        .iter()
        .zip(strides)
        .map(|(&d, &s)| (d - 1) * s.unsigned_abs())
        .sum::<usize>()
}

fn round_up(n: usize, multiple: usize) -> usize {
    n.div_ceil(multiple) * multiple
}

fn clamp_block(block: usize, size: usize, micro: usize) -> usize {
    block.min(round_up(size, micro)).max(1)
}

fn dedup_preserving_order<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
