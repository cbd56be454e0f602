//! Element-wise operations applied to source elements before scaling.
//!
//! The complex entry points accept a `conjA` flag. Rather than testing that
//! flag once per element, the engine is monomorphized over an operation
//! marker type: [`Identity`] leaves the element alone, [`Conj`] conjugates
//! it. The flag is inspected exactly once, at dispatch time.
//!
//! `Identity` implements `ElementOp<T>` for any `T: Copy`. `Conj` requires
//! `T: ElementOpApply`, whose default implementation is the identity, so
//! real types conjugate to themselves.

use num_complex::Complex;
use num_traits::Num;

/// Trait for types that support conjugation.
///
/// Real-valued types can use the default:
/// ```ignore
/// impl ElementOpApply for MyReal {}
/// ```
pub trait ElementOpApply: Copy {
    #[inline(always)]
    fn conj(self) -> Self {
        self
    }
}

macro_rules! impl_element_op_apply_real {
    ($($t:ty),*) => {
        $(impl ElementOpApply for $t {})*
    };
}

impl_element_op_apply_real!(f32, f64);

impl<T: Num + Copy + Clone + std::ops::Neg<Output = T>> ElementOpApply for Complex<T> {
    #[inline(always)]
    fn conj(self) -> Self {
        Complex::conj(&self)
    }
}

/// Identity operation: f(x) = x
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

/// Complex conjugate operation: f(x) = conj(x)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conj;

/// An operation applied to each source element on its way to the destination.
pub trait ElementOp<T>: Copy + Default + Send + Sync + 'static {
    /// Whether this operation is the identity (no-op).
    const IS_IDENTITY: bool = false;

    /// Apply the operation to a value.
    fn apply(value: T) -> T;
}

impl<T: Copy> ElementOp<T> for Identity {
    const IS_IDENTITY: bool = true;

    #[inline(always)]
    fn apply(value: T) -> T {
        value
    }
}

impl<T: ElementOpApply> ElementOp<T> for Conj {
    #[inline(always)]
    fn apply(value: T) -> T {
        value.conj()
    }
}
