use zeroconv_tensor::Tensor;

use crate::error::ConvError;

/// Compute the largest absolute difference between two tensors.
///
/// $ d = \max_{i} |a_i - b_i| $
///
/// The workhorse for comparing convolution outputs: variants of the same
/// convolution are bitwise identical, so the distance between them is
/// exactly zero.
///
/// # Arguments
///
/// * `a` - The first tensor.
/// * `b` - The second tensor, with the same shape as `a`.
///
/// # Errors
///
/// Returns an error if the two tensors have different shapes.
///
/// # Example
///
/// ```
/// use zeroconv_ops::metrics::max_abs_diff;
/// use zeroconv_tensor::{Tensor, TensorShape};
///
/// let a = Tensor::from_shape_vec(TensorShape::chw(1, 1, 3), vec![1.0f32, 2.0, 3.0]).unwrap();
/// let b = Tensor::from_shape_vec(TensorShape::chw(1, 1, 3), vec![1.0f32, 2.5, 2.0]).unwrap();
///
/// assert_eq!(max_abs_diff(&a, &b).unwrap(), 1.0);
/// ```
pub fn max_abs_diff(a: &Tensor<f32>, b: &Tensor<f32>) -> Result<f32, ConvError> {
    if a.shape != b.shape {
        return Err(ConvError::ShapeMismatch(
            a.shape.to_string(),
            b.shape.to_string(),
        ));
    }

    Ok(a.as_slice()
        .iter()
        .zip(b.as_slice().iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f32, f32::max))
}

/// Compute the mean squared error (MSE) between two tensors.
///
/// $ MSE = \frac{1}{n} \sum_{i=1}^{n} (a_i - b_i)^2 $
///
/// where `n` is the number of elements.
///
/// # Arguments
///
/// * `a` - The first tensor.
/// * `b` - The second tensor, with the same shape as `a`.
///
/// # Errors
///
/// Returns an error if the two tensors have different shapes.
///
/// # Example
///
/// ```
/// use zeroconv_ops::metrics::mse;
/// use zeroconv_tensor::{Tensor, TensorShape};
///
/// let a = Tensor::from_shape_vec(TensorShape::chw(1, 2, 2), vec![0.0f32, 1.0, 2.0, 3.0]).unwrap();
/// let b = Tensor::from_shape_vec(TensorShape::chw(1, 2, 2), vec![0.0f32, 3.0, 2.0, 3.0]).unwrap();
///
/// assert_eq!(mse(&a, &b).unwrap(), 1.0);
/// ```
pub fn mse(a: &Tensor<f32>, b: &Tensor<f32>) -> Result<f32, ConvError> {
    if a.shape != b.shape {
        return Err(ConvError::ShapeMismatch(
            a.shape.to_string(),
            b.shape.to_string(),
        ));
    }

    let sum = a
        .as_slice()
        .iter()
        .zip(b.as_slice().iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>();

    Ok(sum / (a.numel() as f32))
}
