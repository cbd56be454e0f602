//! Micro-kernel trait and the scalar update shared by every kernel path.
//!
//! The micro-kernel is the innermost building block: an N×N transpose of a
//! register-sized tile where N = REGISTER_BYTES / sizeof(T).

use hptt_traits::{ElementOp, ScalarBase};

pub mod scalar;

/// Width in bytes of the vector registers the tile sizes are derived from.
pub const REGISTER_BYTES: usize = 32;

/// Architecture-specific N×N transpose micro-kernel with scale-accumulate.
///
/// A micro-kernel updates a MICRO × MICRO tile:
///   `dst[i + j*ldb] = alpha * op(src[i*lda + j]) + beta * dst[i + j*ldb]`
/// for i,j in 0..MICRO. With `BETA_ZERO` the destination is never read.
pub trait MicroKernel<T: ScalarBase> {
    /// Micro-tile side length.
    /// e.g. 4 for f64, 8 for f32, 2 for Complex64.
    const MICRO: usize;

    /// Default macro-tile side length = MICRO * 4.
    const BLOCK: usize;

    /// Update a full MICRO × MICRO tile.
    ///
    /// # Safety
    /// - `src` must be readable for MICRO elements along stride-1 and MICRO rows of stride `lda`
    /// - `dst` must be writable for MICRO elements along stride-1 and MICRO rows of stride `ldb`
    unsafe fn transpose_micro<Op: ElementOp<T>, const BETA_ZERO: bool>(
        src: *const T,
        lda: isize,
        dst: *mut T,
        ldb: isize,
        alpha: T,
        beta: T,
    );
}

/// Marker type for scalar (non-intrinsic) micro-kernels.
pub struct ScalarKernel;

/// `*dst = alpha * op(*src) + beta * *dst`, skipping the read when `BETA_ZERO`.
///
/// Every kernel path funnels through this function, so the value written
/// for an element does not depend on which kernel (or plan) produced it.
///
/// # Safety
/// `src` must be readable and `dst` writable.
#[inline(always)]
pub unsafe fn update_element<T: ScalarBase, Op: ElementOp<T>, const BETA_ZERO: bool>(
    src: *const T,
    dst: *mut T,
    alpha: T,
    beta: T,
) {
    let value = alpha * Op::apply(*src);
    if BETA_ZERO {
        dst.write(value);
    } else {
        *dst = value + beta * *dst;
    }
}
