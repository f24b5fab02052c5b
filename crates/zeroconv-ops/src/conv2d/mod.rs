//! Direct 2D convolution
//!
//! Convolves batched multi-channel tensors with a bank of filters, without
//! im2col buffers or padded input copies: padding is resolved virtually at
//! read time and each parallel variant writes straight into the final
//! output allocation.
//!
//! The variants differ only in scheduling. [`conv2d_naive`] runs a plain
//! loop nest on the calling thread and acts as the oracle; the
//! `conv2d_parallel_*` functions split one output axis into contiguous
//! chunks, one worker per chunk; [`conv2d`] picks the axis and worker
//! count automatically. All of them reduce every output element in the
//! same order, so their results are bitwise identical.

/// Convolution geometry and parameters
mod geometry;
pub use geometry::*;

/// Sequential reference implementation
mod naive;
pub use naive::*;

/// Thread dispatch over one output axis
mod dispatch;
pub use dispatch::*;

/// Automatic partition selection
mod schedule;
pub use schedule::*;

mod worker;
