use thiserror::Error;

use zeroconv_tensor::TensorError;

/// Errors that can occur during convolution.
///
/// Geometry and parameter errors are reported before the output tensor is
/// allocated and before any worker thread is spawned.
#[derive(Error, Debug, PartialEq)]
pub enum ConvError {
    /// Underlying tensor operation failed.
    #[error("Tensor error: {0}")]
    TensorError(#[from] TensorError),

    /// Kernel input channels do not match the input tensor channels.
    #[error("Channel mismatch: kernel expects {kernel} input channels, but the input has {input}")]
    ChannelMismatch {
        /// Input channels the kernel was built for.
        kernel: usize,
        /// Channels the input tensor actually has.
        input: usize,
    },

    /// The kernel tensor does not have the expected rank.
    #[error("Kernel must be rank 4 (Co x C x Kh x Kw), got rank {0}")]
    KernelRank(usize),

    /// The requested stride is invalid.
    #[error("stride must be > 0, got {0}")]
    InvalidStride(usize),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    ThreadPoolBuild(String),

    /// The two tensors being compared do not have the same shape.
    #[error("Shape mismatch: {0} vs {1}")]
    ShapeMismatch(String, String),

    /// The kernel does not fit into the padded input even once.
    #[error("Empty output: kernel {kernel_h}x{kernel_w} does not fit in padded input {padded_h}x{padded_w}")]
    EmptyOutput {
        /// Kernel height.
        kernel_h: usize,
        /// Kernel width.
        kernel_w: usize,
        /// Input height including padding on both sides.
        padded_h: usize,
        /// Input width including padding on both sides.
        padded_w: usize,
    },
}
