#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// direct 2D convolution module.
pub mod conv2d;

/// Error types for the ops module.
pub mod error;

/// output comparison metrics module.
pub mod metrics;

pub use crate::error::ConvError;
