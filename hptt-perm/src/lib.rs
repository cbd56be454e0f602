//! High-performance tensor transposition: `B = alpha * op(permute(A)) + beta * B`.
//!
//! The engine sits behind the typed entry points of `hptt-rs`:
//!
//! ```text
//! shape -> plan (fuse, kernel variant, loop order, blocks, strategy)
//!       -> [autotune: candidates -> execute -> timer]
//!       -> execute -> scheduler -> macro_kernel -> micro_kernel
//! ```
//!
//! Plans hold no reference to data and may be reused for any number of
//! executions on tensors of the shape they were built for.

pub mod autotune;
pub mod element;
pub mod error;
pub mod execute;
pub mod fuse;
pub mod macro_kernel;
pub mod micro_kernel;
pub mod plan;
pub mod scheduler;
pub mod shape;

pub use autotune::{
    candidate_choices, tune, tune_in, tuning_workers, SelectionMethod, TuningConfig, TuningReport,
    CRAZY_TIME_LIMIT,
};
pub use element::TransposeElement;
pub use error::{HpttError, Operand, Result};
pub use execute::{execute, execute_in};
pub use plan::{
    AxisRole, ExecutionPlan, KernelVariant, LoopNode, ParallelStrategy, PlanBuilder, PlanChoice,
    PlanConfig,
};
pub use scheduler::{partition, split_even, Region, WorkUnit, Workers};
pub use shape::{CanonicalShape, Layout, ShapeRequest};

// Constants
/// L1 budget in bytes for the blocking heuristics.
pub const BLOCK_MEMORY_SIZE: usize = 32 * 1024;
pub const CACHE_LINE_SIZE: usize = 64;
/// Minimum elements for the default plan to use more than one thread.
pub const MINTHREADLENGTH: usize = 1 << 15;
