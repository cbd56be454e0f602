//! Binding between element types and their micro-kernels.

use crate::micro_kernel::{MicroKernel, ScalarKernel};
use hptt_traits::{ElementOpApply, ScalarBase};
use num_complex::{Complex32, Complex64};

/// An element type the engine can transpose.
///
/// Implemented for the four numeric types of the public interface
/// (`f32`, `f64`, `Complex32`, `Complex64`).
pub trait TransposeElement: ScalarBase + ElementOpApply {
    /// Micro-kernel used for full tiles of this type.
    type Kernel: MicroKernel<Self>;

    /// Micro-tile side length of [`Self::Kernel`].
    const MICRO: usize = <Self::Kernel as MicroKernel<Self>>::MICRO;

    /// Default macro-tile side length of [`Self::Kernel`].
    const BLOCK: usize = <Self::Kernel as MicroKernel<Self>>::BLOCK;
}

impl TransposeElement for f32 {
    type Kernel = ScalarKernel;
}

impl TransposeElement for f64 {
    type Kernel = ScalarKernel;
}

impl TransposeElement for Complex32 {
    type Kernel = ScalarKernel;
}

impl TransposeElement for Complex64 {
    type Kernel = ScalarKernel;
}
