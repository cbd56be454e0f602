//! Argument errors reported before any data is touched.

/// Which tensor an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// The source tensor `A`.
    Source,
    /// The destination tensor `B`.
    Destination,
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Source => write!(f, "A"),
            Operand::Destination => write!(f, "B"),
        }
    }
}

/// Errors that can occur while validating a transposition request.
///
/// Every variant is a caller-input error (the `InvalidArgument` category):
/// the engine has no I/O and no transient failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HpttError {
    /// A per-axis array does not have one entry per axis.
    #[error("rank mismatch for {what}: expected {expected} entries, got {found}")]
    RankMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// An axis of the source tensor has size zero.
    #[error("size of axis {axis} must be positive")]
    ZeroSize { axis: usize },

    /// The permutation is not a bijection on `0..dim`.
    #[error("invalid permutation {perm:?}")]
    InvalidPermutation { perm: Vec<usize> },

    /// An outer size is smaller than the extent it must contain.
    #[error("outer size {outer} of axis {axis} of {operand} is smaller than its size {size}")]
    OuterSizeTooSmall {
        operand: Operand,
        axis: usize,
        outer: usize,
        size: usize,
    },

    /// The thread count is zero.
    #[error("number of threads must be positive")]
    InvalidThreadCount,

    /// A buffer is too short for the tensor described by its outer sizes.
    #[error("buffer for {operand} holds {len} elements but {required} are required")]
    BufferTooSmall {
        operand: Operand,
        len: usize,
        required: usize,
    },

    /// Strides that are negative, or destination strides under which two
    /// index tuples share an element.
    #[error("invalid strides {strides:?} for {operand} with dims {dims:?}")]
    InvalidStrides {
        operand: Operand,
        dims: Vec<usize>,
        strides: Vec<isize>,
    },

    /// The tensor is too large to address with `isize` offsets.
    #[error("offset overflow while computing tensor extent")]
    OffsetOverflow,
}

impl HpttError {
    /// Whether this error belongs to the `InvalidArgument` category.
    ///
    /// Always true; kept so callers can match the category without
    /// enumerating variants.
    pub fn is_invalid_argument(&self) -> bool {
        true
    }
}

/// Result type for transposition operations.
pub type Result<T> = std::result::Result<T, HpttError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = HpttError::OuterSizeTooSmall {
            operand: Operand::Destination,
            axis: 2,
            outer: 3,
            size: 4,
        };
        assert_eq!(
            err.to_string(),
            "outer size 3 of axis 2 of B is smaller than its size 4"
        );
        assert!(err.is_invalid_argument());
        assert_eq!(
            HpttError::InvalidThreadCount.to_string(),
            "number of threads must be positive"
        );
    }
}
