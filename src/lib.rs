//! Strided buffer descriptors, a cache-blocked N-dimensional traversal engine,
//! and a dtype-dispatch layer over a catalog of numeric kernels.
//!
//! The crate is organised bottom-up:
//!
//! - [`StridedSlice`] / [`StridedSliceMut`] and [`NdView`] / [`NdViewMut`]: borrowed
//!   descriptors (length or shape, stride(s), offset, [`Order`]) over caller-owned buffers.
//! - The traversal engine ([`unary_into`], [`binary_into`], [`nullary_into`],
//!   [`mask_unary_into`]): visits every element of one or more N-d views with loop
//!   interchange driven by the output's [`Order`], fusion of contiguous levels, and
//!   cache blocking.
//! - [`Dispatcher`] / [`DispatchTable`]: resolves a kernel from the runtime [`DType`]s of
//!   its arguments, falling back to a generic element operation run through the engine.
//! - Kernels: BLAS-style routines in [`blas`] and scalar special functions in [`special`].
//!
//! # Calling conventions
//!
//! Every strided routine comes in two forms. The simple form takes `(N, x, stride_x, ...)`
//! and derives the starting offset from the stride (a negative stride starts at the end of
//! the buffer). The `_ndarray` form takes an explicit offset for every array.
//!
//! ```rust
//! use strided_dispatch::blas;
//!
//! let x = [4.0, 2.0, -3.0];
//! let y = [2.0, 6.0, -1.0];
//! assert_eq!(blas::ddot(3, &x, 1, &y, 1), 23.0);
//!
//! // Same elements of `y`, visited back to front from an explicit offset.
//! let y_rev = [-1.0, 6.0, 2.0];
//! assert_eq!(blas::ddot_ndarray(3, &x, 1, 0, &y_rev, -1, 2), 23.0);
//! ```
//!
//! # Dispatch
//!
//! ```rust
//! use strided_dispatch::{ops, Buffer, BufferMut};
//!
//! let x = [-1.0f64, 2.0, -3.0];
//! let mut out = [0.0f64; 3];
//! let abs = ops::abs();
//! abs.call(3, &[(Buffer::from(&x[..]), 1)], &mut [(BufferMut::from(&mut out[..]), 1)])
//!     .unwrap();
//! assert_eq!(out, [1.0, 2.0, 3.0]);
//! ```
//!
//! # Cache Optimization
//!
//! N-d traversal follows a fuse/order/block pipeline:
//! - The loop order comes from the output's memory order (row-major iterates the last
//!   dimension fastest, column-major the first)
//! - Levels that are contiguous for every array are fused into one
//! - Levels are blocked into tiles fitting L1 cache ([`BLOCK_MEMORY_SIZE`] = 32KB)

mod block;
pub mod blas;
pub mod dispatch;
mod dtype;
mod fuse;
pub mod index;
mod kernel;
mod map;
pub mod ops;
mod order;
pub mod special;
pub mod strided;
pub mod view;

// ============================================================================
// Element types
// ============================================================================
pub use dtype::{Buffer, BufferMut, DType, Element};

// ============================================================================
// Descriptors
// ============================================================================
pub use order::Order;
pub use view::{NdView, NdViewMut, StridedArray, StridedSlice, StridedSliceMut};

// ============================================================================
// Traversal engine
// ============================================================================
pub use map::{binary_into, mask_unary_into, nullary_into, to_vec, unary_into};

// ============================================================================
// Dispatch
// ============================================================================
pub use dispatch::{
    DispatchTable, DispatchTableBuilder, Dispatcher, ElementFn, KernelFn, NdArg, NdArgMut,
    StridedArg, StridedArgMut,
};

// ============================================================================
// Index utilities
// ============================================================================
pub use index::IndexMode;

// ============================================================================
// Constants
// ============================================================================

/// Block memory size for cache-optimized iteration (L1 cache target).
///
/// N-d traversal is blocked into tiles that fit within this size.
/// Default: 32KB (typical L1 data cache size).
pub const BLOCK_MEMORY_SIZE: usize = 32 * 1024;

/// Cache line size in bytes.
///
/// Used for memory region calculations in block size computation.
pub const CACHE_LINE_SIZE: usize = 64;

// ============================================================================
// Error types
// ============================================================================

/// Errors raised while validating descriptors or resolving kernels.
///
/// Numeric edge values (NaN, signed zero, infinities) are results, never errors.
#[derive(Debug, thiserror::Error)]
pub enum StridedError {
    /// Wrong number of array arguments for an operation.
    #[error("invalid argument count: expected {expected}, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A buffer is too short for the requested length, stride and offset.
    #[error("insufficient elements in argument {arg}: requires {required}, buffer has {actual}")]
    InsufficientElements {
        arg: usize,
        required: usize,
        actual: usize,
    },

    /// An index is outside `[0, len)` under the requested index mode.
    #[error("index {index} out of bounds for length {len} (argument {arg})")]
    IndexOutOfBounds { arg: usize, index: isize, len: usize },

    /// No dispatch table entry matches and no fallback is registered.
    #[error("unsupported dtype signature ({signature}) for `{name}`")]
    UnsupportedDType { name: String, signature: String },

    /// A dtype name string did not match any known dtype.
    #[error("unknown dtype `{0}`")]
    UnknownDType(String),

    /// An order name string was neither `row-major` nor `column-major`.
    #[error("unknown order `{0}`")]
    UnknownOrder(String),

    /// A kernel received a buffer of a dtype it was not registered for.
    #[error("dtype mismatch: expected {expected}, got {actual}")]
    DTypeMismatch { expected: DType, actual: DType },

    /// Array shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// Integer overflow while computing an element offset.
    #[error("offset overflow while computing element index")]
    OffsetOverflow,

    /// Raw bytes could not be viewed as elements of the requested dtype.
    #[error("cannot view bytes as {dtype}: {reason:?}")]
    ByteCast {
        dtype: DType,
        reason: bytemuck::PodCastError,
    },
}

/// Result type for strided operations.
pub type Result<T> = std::result::Result<T, StridedError>;
