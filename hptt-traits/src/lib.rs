//! Shared traits for the hptt-rs crates.
//!
//! This crate holds the element-type capabilities the transposition engine
//! needs (`ScalarBase` for the `alpha * op(a) + beta * b` update,
//! `ElementOpApply` for conjugation) and the type-level element operations
//! that select conjugation at compile time.
//!
//! Callers that want to transpose their own scalar types depend on this
//! crate only, implement the traits, and pass the type to `hptt-perm`.

pub mod element_op;
pub mod scalar;

pub use element_op::{Conj, ElementOp, ElementOpApply, Identity};
pub use scalar::ScalarBase;
