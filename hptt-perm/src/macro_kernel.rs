//! Macro-kernels: one tile of the loop nest's leaf.
//!
//! A macro-kernel call handles a tile of up to BLOCK_A × BLOCK_B elements,
//! invoking the micro-kernel for full MICRO × MICRO sub-tiles and scalar
//! loops for edge remainders. The micro-kernel itself never sees a partial
//! tile.

use crate::element::TransposeElement;
use crate::micro_kernel::{update_element, MicroKernel};
use hptt_traits::ElementOp;

/// Scalar update of an `extent_a × extent_b` sub-tile at element offset `(i, j)`.
#[inline(always)]
#[allow(clippy::too_many_arguments)]
unsafe fn edge_tile<T: TransposeElement, Op: ElementOp<T>, const BETA_ZERO: bool>(
    src: *const T,
    lda: isize,
    dst: *mut T,
    ldb: isize,
    (i, j): (isize, isize),
    (extent_a, extent_b): (usize, usize),
    alpha: T,
    beta: T,
) {
    for jj in 0..extent_b as isize {
        for ii in 0..extent_a as isize {
            update_element::<T, Op, BETA_ZERO>(
                src.offset((i + ii) + (j + jj) * lda),
                dst.offset((j + jj) + (i + ii) * ldb),
                alpha,
                beta,
            );
        }
    }
}

/// Update a tile of `block_a × block_b` elements with unit inner strides.
///
/// - `src` points to A[0,0] of the tile. A's stride-1 dimension is along dim_A.
/// - `lda` is A's stride along dim_B (the non-stride-1 dim in source).
/// - `dst` points to B[0,0] of the tile. B's stride-1 dimension is along dim_B.
/// - `ldb` is B's stride along dim_A (the non-stride-1 dim in dest).
///
/// The update: `B[j + i*ldb] = alpha * op(A[i + j*lda]) + beta * B[j + i*ldb]`
/// where i iterates along dim_A (0..block_a) and j along dim_B (0..block_b).
///
/// # Safety
/// src/dst must be valid for the given block sizes and strides.
#[inline]
#[allow(clippy::too_many_arguments)]
pub unsafe fn macro_kernel<T: TransposeElement, Op: ElementOp<T>, const BETA_ZERO: bool>(
    src: *const T,
    lda: isize,
    block_a: usize,
    dst: *mut T,
    ldb: isize,
    block_b: usize,
    alpha: T,
    beta: T,
) {
    let micro = T::MICRO;

    let full_a = block_a / micro;
    let rem_a = block_a % micro;
    let full_b = block_b / micro;
    let rem_b = block_b % micro;

    for jb in 0..full_b {
        let j = (jb * micro) as isize;
        for ia in 0..full_a {
            let i = (ia * micro) as isize;
            <T::Kernel as MicroKernel<T>>::transpose_micro::<Op, BETA_ZERO>(
                src.offset(i + j * lda),
                lda,
                dst.offset(j + i * ldb),
                ldb,
                alpha,
                beta,
            );
        }
        // Remainder along dim_A (right edge)
        if rem_a > 0 {
            let i = (full_a * micro) as isize;
            edge_tile::<T, Op, BETA_ZERO>(src, lda, dst, ldb, (i, j), (rem_a, micro), alpha, beta);
        }
    }

    // Remainder along dim_B (bottom edge), including the corner
    if rem_b > 0 {
        let j = (full_b * micro) as isize;
        edge_tile::<T, Op, BETA_ZERO>(src, lda, dst, ldb, (0, j), (block_a, rem_b), alpha, beta);
    }
}

/// Tile update for layouts without a unit-stride axis on one side.
///
/// Arises when the leading axis of a sub-tensor has size 1 and is elided,
/// leaving the smallest remaining stride larger than one. Same element
/// mapping as [`macro_kernel`] with explicit inner strides `src_a`
/// (A along dim_A) and `dst_b` (B along dim_B).
///
/// # Safety
/// src/dst must be valid for the given block sizes and strides.
#[inline]
#[allow(clippy::too_many_arguments)]
pub unsafe fn macro_kernel_strided<T: TransposeElement, Op: ElementOp<T>, const BETA_ZERO: bool>(
    src: *const T,
    src_a: isize,
    lda: isize,
    block_a: usize,
    dst: *mut T,
    dst_b: isize,
    ldb: isize,
    block_b: usize,
    alpha: T,
    beta: T,
) {
    for i in 0..block_a as isize {
        for j in 0..block_b as isize {
            update_element::<T, Op, BETA_ZERO>(
                src.offset(i * src_a + j * lda),
                dst.offset(j * dst_b + i * ldb),
                alpha,
                beta,
            );
        }
    }
}

/// Line update along an axis that is the stride-1 axis of both tensors.
///
/// Pure copies (`alpha == 1`, `beta == 0`, no conjugation) of contiguous
/// lines go through `copy_nonoverlapping`.
///
/// # Safety
/// src/dst must be valid for `count` elements at the given strides, and
/// must not overlap.
#[inline(always)]
pub unsafe fn line_update<T: TransposeElement, Op: ElementOp<T>, const BETA_ZERO: bool>(
    src: *const T,
    dst: *mut T,
    count: usize,
    src_stride: isize,
    dst_stride: isize,
    alpha: T,
    beta: T,
) {
    if BETA_ZERO
        && Op::IS_IDENTITY
        && src_stride == 1
        && dst_stride == 1
        && alpha == <T as num_traits::One>::one()
    {
        std::ptr::copy_nonoverlapping(src, dst, count);
    } else if src_stride == 1 && dst_stride == 1 {
        for k in 0..count {
            update_element::<T, Op, BETA_ZERO>(src.add(k), dst.add(k), alpha, beta);
        }
    } else {
        let mut s = src;
        let mut d = dst;
        for _ in 0..count {
            update_element::<T, Op, BETA_ZERO>(s, d, alpha, beta);
            s = s.offset(src_stride);
            d = d.offset(dst_stride);
        }
    }
}
