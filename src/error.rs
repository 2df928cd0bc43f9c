//! Error types for axfold

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using axfold's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in axfold operations
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Shapes cannot be broadcast together
    #[error("Cannot broadcast shapes {lhs:?} and {rhs:?}")]
    BroadcastError {
        /// Left-hand side shape
        lhs: Vec<usize>,
        /// Right-hand side shape
        rhs: Vec<usize>,
    },

    /// Invalid dimension index
    #[error("Invalid dimension {dim} for tensor with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension
        dim: isize,
        /// Number of dimensions
        ndim: usize,
    },

    /// The same axis appears more than once in a reduction axis set
    #[error("Duplicate axis {axis} in reduction axes {axes:?}")]
    DuplicateAxis {
        /// The repeated axis
        axis: usize,
        /// The full axis list as given
        axes: Vec<usize>,
    },

    /// Output shape is not the input shape with the reduced axes removed (or kept as 1)
    #[error(
        "Invalid reduction shape: input {input:?} reduced over {axes:?} cannot produce output {output:?} (keepdims allowed: {keepdims})"
    )]
    InvalidReductionShape {
        /// Input shape
        input: Vec<usize>,
        /// Reduced axes
        axes: Vec<usize>,
        /// Candidate output shape
        output: Vec<usize>,
        /// Whether reduced axes may be kept with size 1
        keepdims: bool,
    },

    /// Positional reduction over an axis of length zero
    #[error("Cannot compute '{op}' over zero-length axis {axis} of shape {shape:?}")]
    EmptyReduction {
        /// The operation name
        op: &'static str,
        /// The empty axis
        axis: usize,
        /// Input shape
        shape: Vec<usize>,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Device mismatch between operands
    #[error("Device mismatch: {lhs} and {rhs} are not compatible")]
    DeviceMismatch {
        /// Name of the first device
        lhs: String,
        /// Name of the second device
        rhs: String,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// No kernel is registered under the requested operation
    #[error("No reduction kernel registered for '{name}'")]
    OpNotRegistered {
        /// The operation name that was looked up
        name: String,
    },

    /// The global operation registry was installed twice
    #[error("Operation registry is already installed")]
    RegistryAlreadyInstalled,
}

impl Error {
    /// Create a broadcast error
    pub fn broadcast(lhs: &[usize], rhs: &[usize]) -> Self {
        Self::BroadcastError {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create an invalid reduction shape error
    pub fn invalid_reduction_shape(
        input: &[usize],
        axes: &[usize],
        output: &[usize],
        keepdims: bool,
    ) -> Self {
        Self::InvalidReductionShape {
            input: input.to_vec(),
            axes: axes.to_vec(),
            output: output.to_vec(),
            keepdims,
        }
    }
}
