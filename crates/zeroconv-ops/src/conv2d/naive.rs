use zeroconv_tensor::Tensor;

use crate::error::ConvError;

use super::geometry::{conv_output_shape, ConvElement, ConvParams};
use super::worker::accumulate_field;

/// Convolves `input` with `kernel` on the calling thread.
///
/// Plain loop nest over batch, filter, output row and output column,
/// pushing results in flat order. No threads are spawned and no output
/// element is written through a raw pointer, which makes this variant the
/// oracle the parallel variants are checked against.
///
/// # Errors
///
/// Returns an error if the convolution geometry is invalid; see
/// [`conv_output_shape`].
///
/// # Example
///
/// ```
/// use zeroconv_ops::conv2d::{conv2d_naive, ConvParams};
/// use zeroconv_tensor::{Tensor, TensorShape};
///
/// let input = Tensor::from_shape_val(TensorShape::chw(1, 4, 4), 1.0f32).unwrap();
/// let kernel = Tensor::from_shape_val(TensorShape::echw(1, 1, 3, 3), 1.0f32).unwrap();
/// let out = conv2d_naive(&input, &kernel, ConvParams::default()).unwrap();
/// assert_eq!(out.as_slice(), &[9.0, 9.0, 9.0, 9.0]);
/// ```
pub fn conv2d_naive<T: ConvElement>(
    input: &Tensor<T>,
    kernel: &Tensor<T>,
    params: ConvParams,
) -> Result<Tensor<T>, ConvError> {
    let out_shape = conv_output_shape(&input.shape, &kernel.shape, params)?;
    let mut data = Vec::with_capacity(out_shape.numel());
    for e in 0..out_shape.batch {
        for co in 0..out_shape.channels {
            for ho in 0..out_shape.height {
                for wo in 0..out_shape.width {
                    data.push(accumulate_field(input, kernel, params, e, co, ho, wo));
                }
            }
        }
    }
    Ok(Tensor::from_shape_vec(out_shape, data)?)
}
