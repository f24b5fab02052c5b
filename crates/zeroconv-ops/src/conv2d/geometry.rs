use zeroconv_tensor::TensorShape;

use crate::error::ConvError;

/// A trait to define the element types direct convolution operates on.
pub trait ConvElement:
    Copy
    + Send
    + Sync
    + num_traits::Zero
    + std::ops::Mul<Output = Self>
    + std::ops::AddAssign
    + 'static
{
}

/// Implement the `ConvElement` trait for the supported types.
impl ConvElement for u8 {}
impl ConvElement for u16 {}
impl ConvElement for u32 {}
impl ConvElement for u64 {}
impl ConvElement for i8 {}
impl ConvElement for i16 {}
impl ConvElement for i32 {}
impl ConvElement for i64 {}
impl ConvElement for f32 {}
impl ConvElement for f64 {}

/// Stride and zero padding applied to both spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvParams {
    /// Step between successive kernel placements, for rows and columns alike.
    pub stride: usize,
    /// Width of the zero border added on every spatial side of the input.
    pub padding: usize,
}

impl Default for ConvParams {
    /// Dense convolution: unit stride, no padding.
    fn default() -> Self {
        Self {
            stride: 1,
            padding: 0,
        }
    }
}

impl ConvParams {
    /// Creates parameters with the given stride and padding.
    pub fn new(stride: usize, padding: usize) -> Self {
        Self { stride, padding }
    }
}

/// Computes the output shape of a convolution, validating its geometry.
///
/// The output extent along each spatial axis is
/// `(extent + 2 * padding - kernel_extent) / stride + 1`, truncated.
/// The output keeps the input's rank: rank-3 inputs produce `(Co, Ho, Wo)`
/// outputs and rank-4 inputs `(E, Co, Ho, Wo)`, where `Co` is the number
/// of kernel filters.
///
/// Every convolution entry point validates through this function before
/// the output is allocated and before any worker thread is spawned.
///
/// # Errors
///
/// Returns an error if the stride is zero, the kernel is not rank 4, the
/// kernel's input channels disagree with the input tensor, or the kernel
/// does not fit into the padded input even once.
///
/// # Example
///
/// ```
/// use zeroconv_ops::conv2d::{conv_output_shape, ConvParams};
/// use zeroconv_tensor::TensorShape;
///
/// let out = conv_output_shape(
///     &TensorShape::chw(1, 4, 4),
///     &TensorShape::echw(1, 1, 3, 3),
///     ConvParams::default(),
/// )
/// .unwrap();
/// assert_eq!(out, TensorShape::chw(1, 2, 2));
/// ```
pub fn conv_output_shape(
    input: &TensorShape,
    kernel: &TensorShape,
    params: ConvParams,
) -> Result<TensorShape, ConvError> {
    if params.stride == 0 {
        return Err(ConvError::InvalidStride(params.stride));
    }
    if kernel.rank() != 4 {
        return Err(ConvError::KernelRank(kernel.rank()));
    }
    if kernel.channels != input.channels {
        return Err(ConvError::ChannelMismatch {
            kernel: kernel.channels,
            input: input.channels,
        });
    }
    let padded_h = input.height + 2 * params.padding;
    let padded_w = input.width + 2 * params.padding;
    if kernel.height > padded_h || kernel.width > padded_w {
        return Err(ConvError::EmptyOutput {
            kernel_h: kernel.height,
            kernel_w: kernel.width,
            padded_h,
            padded_w,
        });
    }
    let out_h = (padded_h - kernel.height) / params.stride + 1;
    let out_w = (padded_w - kernel.width) / params.stride + 1;
    Ok(if input.rank() == 3 {
        TensorShape::chw(kernel.batch, out_h, out_w)
    } else {
        TensorShape::echw(input.batch, kernel.batch, out_h, out_w)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_shape_basic() -> Result<(), ConvError> {
        let input = TensorShape::chw(1, 4, 4);
        let kernel = TensorShape::echw(1, 1, 3, 3);
        assert_eq!(
            conv_output_shape(&input, &kernel, ConvParams::default())?,
            TensorShape::chw(1, 2, 2)
        );
        assert_eq!(
            conv_output_shape(&input, &kernel, ConvParams::new(1, 1))?,
            TensorShape::chw(1, 4, 4)
        );
        Ok(())
    }

    #[test]
    fn test_output_shape_stride_floors() -> Result<(), ConvError> {
        let input = TensorShape::chw(1, 7, 5);
        let kernel = TensorShape::echw(1, 1, 3, 2);
        assert_eq!(
            conv_output_shape(&input, &kernel, ConvParams::new(2, 0))?,
            TensorShape::chw(1, 3, 2)
        );
        Ok(())
    }

    #[test]
    fn test_output_shape_kernel_fills_input() -> Result<(), ConvError> {
        let input = TensorShape::chw(3, 4, 4);
        let kernel = TensorShape::echw(2, 3, 4, 4);
        assert_eq!(
            conv_output_shape(&input, &kernel, ConvParams::default())?,
            TensorShape::chw(2, 1, 1)
        );
        Ok(())
    }

    #[test]
    fn test_output_shape_batched() -> Result<(), ConvError> {
        let input = TensorShape::echw(2, 3, 8, 8);
        let kernel = TensorShape::echw(4, 3, 3, 3);
        assert_eq!(
            conv_output_shape(&input, &kernel, ConvParams::default())?,
            TensorShape::echw(2, 4, 6, 6)
        );
        Ok(())
    }

    #[test]
    fn test_output_shape_rejects_stride_zero() {
        let result = conv_output_shape(
            &TensorShape::chw(1, 4, 4),
            &TensorShape::echw(1, 1, 3, 3),
            ConvParams::new(0, 0),
        );
        assert_eq!(result, Err(ConvError::InvalidStride(0)));
    }

    #[test]
    fn test_output_shape_rejects_kernel_rank() {
        let result = conv_output_shape(
            &TensorShape::chw(1, 4, 4),
            &TensorShape::chw(1, 3, 3),
            ConvParams::default(),
        );
        assert_eq!(result, Err(ConvError::KernelRank(3)));
    }

    #[test]
    fn test_output_shape_rejects_channel_mismatch() {
        let result = conv_output_shape(
            &TensorShape::chw(3, 4, 4),
            &TensorShape::echw(1, 2, 3, 3),
            ConvParams::default(),
        );
        assert_eq!(
            result,
            Err(ConvError::ChannelMismatch {
                kernel: 2,
                input: 3
            })
        );
    }

    #[test]
    fn test_output_shape_rejects_oversized_kernel() {
        let input = TensorShape::chw(1, 2, 2);
        let kernel = TensorShape::echw(1, 1, 3, 3);
        assert_eq!(
            conv_output_shape(&input, &kernel, ConvParams::default()),
            Err(ConvError::EmptyOutput {
                kernel_h: 3,
                kernel_w: 3,
                padded_h: 2,
                padded_w: 2
            })
        );
        // one ring of padding makes the same kernel fit again
        assert_eq!(
            conv_output_shape(&input, &kernel, ConvParams::new(1, 1)),
            Ok(TensorShape::chw(1, 2, 2))
        );
    }
}
