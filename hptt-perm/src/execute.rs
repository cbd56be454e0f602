//! Execution engine: recursive loop nest dispatching to the macro-kernels.
//!
//! Each work unit walks its regions of the loop nest. Outer levels advance
//! both pointers by the axis stride; kernel levels advance by a whole block
//! and record the tile extent (shorter on the last, partial block). The leaf
//! hands the tile to the kernel selected at plan time.

use std::ops::Range;

use hptt_traits::{Conj, ElementOp, Identity};

use crate::element::TransposeElement;
use crate::error::{HpttError, Operand, Result};
use crate::macro_kernel::{line_update, macro_kernel, macro_kernel_strided};
use crate::micro_kernel::update_element;
use crate::plan::{AxisRole, ExecutionPlan, KernelVariant, LoopNode};
use crate::scheduler::{SendPtr, WorkUnit, Workers};

/// Execute `b = alpha * op(permute(a)) + beta * b` with a fresh worker pool.
///
/// `op` is complex conjugation when `conj` is set (a no-op for real types).
/// When `beta` is zero, `b` is write-only: its prior contents, even NaN,
/// never reach the result.
pub fn execute<T: TransposeElement>(
    plan: &ExecutionPlan,
    a: &[T],
    b: &mut [T],
    alpha: T,
    beta: T,
    conj: bool,
) -> Result<()> {
    let units = plan.work_units();
    let workers = Workers::new(units.len().min(plan.num_threads()));
    execute_units(plan, &units, a, b, alpha, beta, conj, &workers)
}

/// Like [`execute`], reusing an existing pool.
pub fn execute_in<T: TransposeElement>(
    plan: &ExecutionPlan,
    a: &[T],
    b: &mut [T],
    alpha: T,
    beta: T,
    conj: bool,
    workers: &Workers,
) -> Result<()> {
    let units = plan.work_units();
    execute_units(plan, &units, a, b, alpha, beta, conj, workers)
}

#[allow(clippy::too_many_arguments)]
fn execute_units<T: TransposeElement>(
    plan: &ExecutionPlan,
    units: &[WorkUnit],
    a: &[T],
    b: &mut [T],
    alpha: T,
    beta: T,
    conj: bool,
    workers: &Workers,
) -> Result<()> {
    check_len(Operand::Source, a.len(), plan.src_extent())?;
    check_len(Operand::Destination, b.len(), plan.dst_extent())?;

    let beta_zero = <T as num_traits::Zero>::is_zero(&beta);
    match (conj, beta_zero) {
        (false, true) => run::<T, Identity, true>(plan, units, a, b, alpha, beta, workers),
        (false, false) => run::<T, Identity, false>(plan, units, a, b, alpha, beta, workers),
        (true, true) => run::<T, Conj, true>(plan, units, a, b, alpha, beta, workers),
        (true, false) => run::<T, Conj, false>(plan, units, a, b, alpha, beta, workers),
    }
    Ok(())
}

pub(crate) fn check_len(operand: Operand, len: usize, required: usize) -> Result<()> {
    if len < required {
        return Err(HpttError::BufferTooSmall {
            operand,
            len,
            required,
        });
    }
    Ok(())
}

fn run<T: TransposeElement, Op: ElementOp<T>, const BETA_ZERO: bool>(
    plan: &ExecutionPlan,
    units: &[WorkUnit],
    a: &[T],
    b: &mut [T],
    alpha: T,
    beta: T,
    workers: &Workers,
) {
    let src = SendPtr(a.as_ptr() as *mut T);
    let dst = SendPtr(b.as_mut_ptr());
    let leaf = Leaf::new(plan, alpha, beta);
    let nodes = plan.nodes();

    workers.run(units, |unit| {
        for region in unit.regions() {
            // SAFETY: the buffers cover the plan's extents (checked above) and
            // work units never share a destination element.
            unsafe {
                walk::<T, Op, BETA_ZERO>(&leaf, nodes, region, src.as_const(), dst.as_ptr(), 1, 1);
            }
        }
    });
}

/// Per-plan constants of the leaf kernel.
struct Leaf<T> {
    variant: KernelVariant,
    /// Source stride along dim_B.
    lda: isize,
    /// Destination stride along dim_A.
    ldb: isize,
    /// Source stride along dim_A (the shared axis for copies).
    src_step: isize,
    /// Destination stride along dim_B (the shared axis for copies).
    dst_step: isize,
    alpha: T,
    beta: T,
}

impl<T: TransposeElement> Leaf<T> {
    fn new(plan: &ExecutionPlan, alpha: T, beta: T) -> Self {
        let src = plan.src_strides();
        let dst = plan.dst_strides();
        let (lda, ldb, src_step, dst_step) = match plan.variant() {
            KernelVariant::Copy { inner_dim } => (0, 0, src[inner_dim], dst[inner_dim]),
            KernelVariant::Transpose { dim_a, dim_b } | KernelVariant::Strided { dim_a, dim_b } => {
                (src[dim_b], dst[dim_a], src[dim_a], dst[dim_b])
            }
            KernelVariant::Scalar => (0, 0, 0, 0),
        };
        Self {
            variant: plan.variant(),
            lda,
            ldb,
            src_step,
            dst_step,
            alpha,
            beta,
        }
    }

    /// Update one tile of `ext_a × ext_b` elements.
    #[inline(always)]
    unsafe fn apply<Op: ElementOp<T>, const BETA_ZERO: bool>(
        &self,
        src: *const T,
        dst: *mut T,
        ext_a: usize,
        ext_b: usize,
    ) {
        match self.variant {
            KernelVariant::Copy { .. } => line_update::<T, Op, BETA_ZERO>(
                src,
                dst,
                ext_a,
                self.src_step,
                self.dst_step,
                self.alpha,
                self.beta,
            ),
            KernelVariant::Transpose { .. } => macro_kernel::<T, Op, BETA_ZERO>(
                src, self.lda, ext_a, dst, self.ldb, ext_b, self.alpha, self.beta,
            ),
            KernelVariant::Strided { .. } => macro_kernel_strided::<T, Op, BETA_ZERO>(
                src,
                self.src_step,
                self.lda,
                ext_a,
                dst,
                self.dst_step,
                self.ldb,
                ext_b,
                self.alpha,
                self.beta,
            ),
            KernelVariant::Scalar => {
                update_element::<T, Op, BETA_ZERO>(src, dst, self.alpha, self.beta)
            }
        }
    }
}

/// Recursive loop nest over `ranges` (iteration indices per level).
///
/// Kernel axes are ordinary levels, so they may appear anywhere in the order.
#[allow(clippy::too_many_arguments)]
unsafe fn walk<T: TransposeElement, Op: ElementOp<T>, const BETA_ZERO: bool>(
    leaf: &Leaf<T>,
    nodes: &[LoopNode],
    ranges: &[Range<usize>],
    src: *const T,
    dst: *mut T,
    ext_a: usize,
    ext_b: usize,
) {
    let Some((node, rest)) = nodes.split_first() else {
        leaf.apply::<Op, BETA_ZERO>(src, dst, ext_a, ext_b);
        return;
    };
    let range = ranges[0].clone();
    let inner = &ranges[1..];
    let step_src = node.lda * node.inc as isize;
    let step_dst = node.ldb * node.inc as isize;

    let mut s = src.offset(range.start as isize * step_src);
    let mut d = dst.offset(range.start as isize * step_dst);
    for it in range {
        let extent = node.inc.min(node.end - it * node.inc);
        match node.role {
            AxisRole::Outer => walk::<T, Op, BETA_ZERO>(leaf, rest, inner, s, d, ext_a, ext_b),
            AxisRole::KernelA => walk::<T, Op, BETA_ZERO>(leaf, rest, inner, s, d, extent, ext_b),
            AxisRole::KernelB => walk::<T, Op, BETA_ZERO>(leaf, rest, inner, s, d, ext_a, extent),
        }
        s = s.wrapping_offset(step_src);
        d = d.wrapping_offset(step_dst);
    }
}
