//! Typed entry points, one family per element type.
//!
//! Each family has three call forms: direct execution with the default
//! plan, and execution after a Measure or Patient plan search. Arguments
//! follow HPTT's argument order; the rank is the permutation's length.

use hptt_perm::{Layout, Result, SelectionMethod, ShapeRequest, TransposeElement};
use num_complex::{Complex32, Complex64};

use crate::transpose::TransposeDesc;

#[allow(clippy::too_many_arguments)]
fn run<T: TransposeElement>(
    perm: &[usize],
    alpha: T,
    conj_a: bool,
    a: &[T],
    size_a: &[usize],
    outer_size_a: Option<&[usize]>,
    beta: T,
    b: &mut [T],
    outer_size_b: Option<&[usize]>,
    num_threads: usize,
    use_row_major: bool,
    method: SelectionMethod,
) -> Result<()> {
    let desc = TransposeDesc {
        request: ShapeRequest {
            perm,
            size_a,
            outer_size_a,
            outer_size_b,
            layout: if use_row_major {
                Layout::RowMajor
            } else {
                Layout::ColMajor
            },
        },
        alpha,
        beta,
        conj: conj_a,
        num_threads,
        config: Default::default(),
    };
    crate::tensor_transpose(&desc, a, b, method)
}

macro_rules! real_entry_points {
    ($t:ty, $direct:ident, $measure:ident, $patient:ident) => {
        real_entry_points!(@one $t, $direct, SelectionMethod::Estimate);
        real_entry_points!(@one $t, $measure, SelectionMethod::Measure);
        real_entry_points!(@one $t, $patient, SelectionMethod::Patient);
    };
    (@one $t:ty, $name:ident, $method:expr) => {
        #[doc = concat!("`B = alpha * permute(A) + beta * B` for `", stringify!($t), "` (", stringify!($method), ").")]
        #[allow(clippy::too_many_arguments)]
        pub fn $name(
            perm: &[usize],
            alpha: $t,
            a: &[$t],
            size_a: &[usize],
            outer_size_a: Option<&[usize]>,
            beta: $t,
            b: &mut [$t],
            outer_size_b: Option<&[usize]>,
            num_threads: usize,
            use_row_major: bool,
        ) -> Result<()> {
            run(
                perm,
                alpha,
                false,
                a,
                size_a,
                outer_size_a,
                beta,
                b,
                outer_size_b,
                num_threads,
                use_row_major,
                $method,
            )
        }
    };
}

macro_rules! complex_entry_points {
    ($t:ty, $direct:ident, $measure:ident, $patient:ident) => {
        complex_entry_points!(@one $t, $direct, SelectionMethod::Estimate);
        complex_entry_points!(@one $t, $measure, SelectionMethod::Measure);
        complex_entry_points!(@one $t, $patient, SelectionMethod::Patient);
    };
    (@one $t:ty, $name:ident, $method:expr) => {
        #[doc = concat!("`B = alpha * op(permute(A)) + beta * B` for `", stringify!($t), "` (", stringify!($method), "); `op` conjugates when `conj_a` is set.")]
        #[allow(clippy::too_many_arguments)]
        pub fn $name(
            perm: &[usize],
            alpha: $t,
            conj_a: bool,
            a: &[$t],
            size_a: &[usize],
            outer_size_a: Option<&[usize]>,
            beta: $t,
            b: &mut [$t],
            outer_size_b: Option<&[usize]>,
            num_threads: usize,
            use_row_major: bool,
        ) -> Result<()> {
            run(
                perm,
                alpha,
                conj_a,
                a,
                size_a,
                outer_size_a,
                beta,
                b,
                outer_size_b,
                num_threads,
                use_row_major,
                $method,
            )
        }
    };
}

real_entry_points!(
    f32,
    s_tensor_transpose,
    s_tensor_transpose_auto_tune_measure,
    s_tensor_transpose_auto_tune_patient
);
real_entry_points!(
    f64,
    d_tensor_transpose,
    d_tensor_transpose_auto_tune_measure,
    d_tensor_transpose_auto_tune_patient
);
complex_entry_points!(
    Complex32,
    c_tensor_transpose,
    c_tensor_transpose_auto_tune_measure,
    c_tensor_transpose_auto_tune_patient
);
complex_entry_points!(
    Complex64,
    z_tensor_transpose,
    z_tensor_transpose_auto_tune_measure,
    z_tensor_transpose_auto_tune_patient
);

