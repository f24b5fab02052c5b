#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `zeroconv-tensor` provides the dense tensor container used by the direct
//! convolution kernels in `zeroconv-ops`. Tensors are rank 3 `(C, H, W)` or
//! rank 4 `(E, C, H, W)`, stored row-major in a single exclusively owned
//! buffer, with an indexing contract designed for convolution:
//!
//! - **Checked access**: [`tensor::Tensor::get3`] / [`tensor::Tensor::get4`]
//!   validate every coordinate and report out-of-range access as an error.
//! - **Padding-aware access**: [`tensor::Tensor::get_padded`] resolves the
//!   implicit zero border of a padded convolution without ever materializing
//!   a padded copy of the input.
//!
//! Storage is never shared between two live tensors: cloning deep-copies the
//! buffer. The convolution dispatchers rely on this exclusivity to hand out
//! disjoint mutable regions of an output buffer across worker threads.
//!
//! # Quick Start
//!
//! ```rust
//! use zeroconv_tensor::{Tensor, TensorShape};
//!
//! // A 1x3x3 tensor filled with a deterministic pattern.
//! let t = Tensor::<f32>::from_shape_fn(TensorShape::chw(1, 3, 3), |[_, _, h, w]| {
//!     (h * 3 + w) as f32
//! })
//! .unwrap();
//!
//! assert_eq!(t.get3(0, 1, 2), Ok(&5.0));
//! assert!(t.get3(0, 3, 0).is_err());
//!
//! // Coordinates inside the padding border read as zero.
//! assert_eq!(t.get_padded(0, 0, -1, 0, 1), 0.0);
//! ```

/// Shape module containing the dimension metadata type.
pub mod shape;

/// Storage module containing the exclusive raw-buffer implementation.
pub mod storage;

/// Tensor module containing the main tensor implementation and error types.
pub mod tensor;

pub use crate::shape::TensorShape;
pub use crate::storage::{StorageError, TensorStorage};
pub use crate::tensor::{Tensor, TensorError};
