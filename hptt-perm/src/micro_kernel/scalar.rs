//! Generic scalar micro-kernel implementations.
//!
//! These use simple nested loops over compile-time tile sizes that LLVM
//! unrolls and auto-vectorizes. One impl per supported element type; the
//! tile side is chosen so one tile row fills a 32-byte register.

use super::{update_element, MicroKernel, ScalarKernel, REGISTER_BYTES};
use hptt_traits::ElementOp;
use num_complex::{Complex32, Complex64};

macro_rules! impl_scalar_kernel {
    ($($t:ty),*) => {
        $(
            impl MicroKernel<$t> for ScalarKernel {
                const MICRO: usize = REGISTER_BYTES / std::mem::size_of::<$t>();
                const BLOCK: usize = REGISTER_BYTES / std::mem::size_of::<$t>() * 4;

                #[inline(always)]
                unsafe fn transpose_micro<Op: ElementOp<$t>, const BETA_ZERO: bool>(
                    src: *const $t,
                    lda: isize,
                    dst: *mut $t,
                    ldb: isize,
                    alpha: $t,
                    beta: $t,
                ) {
                    const N: isize = (REGISTER_BYTES / std::mem::size_of::<$t>()) as isize;
                    for j in 0..N {
                        for i in 0..N {
                            update_element::<$t, Op, BETA_ZERO>(
                                src.offset(i * lda + j),
                                dst.offset(i + j * ldb),
                                alpha,
                                beta,
                            );
                        }
                    }
                }
            }
        )*
    };
}

impl_scalar_kernel!(f32, f64, Complex32, Complex64);
