//! High-performance tensor transposition.
//!
//! Computes `B = alpha * op(permute(A)) + beta * B` for dense or sub-tensor
//! operands of `f32`, `f64`, `Complex32` and `Complex64`, where `op` is the
//! identity or complex conjugation.
//!
//! Permutations follow the HPTT convention: `perm[k]` is the axis of `A`
//! that becomes axis `k` of `B`, so `size_b[k] = size_a[perm[k]]`.
//!
//! # Entry points
//!
//! - [`Transpose`]: validated, reusable handle owning a plan and a worker pool.
//! - [`tensor_transpose`]: one-shot generic call with a [`SelectionMethod`].
//! - `{s,d,c,z}_tensor_transpose[_auto_tune_measure|_auto_tune_patient]`:
//!   typed calls with HPTT's argument order.
//!
//! # Example
//!
//! ```rust
//! use hptt_rs::{Transpose, TransposeDesc};
//!
//! // A is 2 x 3 (column-major); B = A^T is 3 x 2.
//! let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let mut b = [0.0; 6];
//! let desc = TransposeDesc::<f64>::new(&[1, 0], &[2, 3]);
//! let t = Transpose::new(&desc).unwrap();
//! t.execute(&a, &mut b).unwrap();
//! assert_eq!(b, [1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
//! ```
//!
//! Logging goes through the `log` facade: `debug` for chosen plans,
//! `trace` for autotuning candidates.

pub mod transpose;
mod typed;

pub use hptt_perm::{
    CanonicalShape, ExecutionPlan, HpttError, KernelVariant, Layout, Operand, ParallelStrategy,
    PlanConfig, Result, SelectionMethod, ShapeRequest, TransposeElement, TuningConfig,
    TuningReport,
};
pub use hptt_traits::{Conj, ElementOp, Identity, ScalarBase};
pub use transpose::{Transpose, TransposeDesc};
pub use typed::*;

/// One-shot transposition with the plan chosen by `method`.
///
/// With [`SelectionMethod::Estimate`] the default plan runs once; the other
/// methods time candidate plans on `a` and `b` first. Either way `b` ends
/// up holding exactly one application of the update.
pub fn tensor_transpose<T: TransposeElement>(
    desc: &TransposeDesc<'_, T>,
    a: &[T],
    b: &mut [T],
    method: SelectionMethod,
) -> Result<()> {
    match method {
        SelectionMethod::Estimate => Transpose::new(desc)?.execute(a, b),
        _ => Transpose::autotune(desc, method, a, b).map(|_| ()),
    }
}
