//! Scalar type bounds for the scale-accumulate update.

use std::fmt::Debug;

/// Arithmetic bounds every transposable element satisfies.
///
/// The engine only ever forms `alpha * x` and `alpha * x + beta * y`, so
/// `Mul`, `Add` and `Zero` (to detect the `beta == 0` fast path) are all it
/// asks for. `Send + Sync` lets source and destination buffers be shared
/// across the worker threads of one call.
pub trait ScalarBase:
    Copy
    + Send
    + Sync
    + Debug
    + std::ops::Mul<Output = Self>
    + std::ops::Add<Output = Self>
    + num_traits::Zero
    + num_traits::One
    + PartialEq
    + 'static
{
}

impl<T> ScalarBase for T where
    T: Copy
        + Send
        + Sync
        + Debug
        + std::ops::Mul<Output = T>
        + std::ops::Add<Output = T>
        + num_traits::Zero
        + num_traits::One
        + PartialEq
        + 'static
{
}
