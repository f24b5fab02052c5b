use zeroconv_tensor::{Tensor, TensorShape};

use crate::error::ConvError;

use super::dispatch::{conv2d_partitioned, PartitionAxis};
use super::geometry::{conv_output_shape, ConvElement, ConvParams};

/// Picks the partition axis with the largest extent in the output shape.
///
/// Ties go to the earlier axis in batch, channel, row order: a worker that
/// owns whole batch samples touches the most contiguous memory, whole
/// filters the next most.
pub fn select_axis(shape: &TensorShape) -> PartitionAxis {
    let mut best = PartitionAxis::Batch;
    for axis in [PartitionAxis::Channel, PartitionAxis::Row] {
        if axis.extent(shape) > best.extent(shape) {
            best = axis;
        }
    }
    best
}

/// Picks the partition axis and worker count for the given output shape.
///
/// The axis with the largest extent wins and the worker count is the
/// thread budget capped by that extent. Pure: the same shape and budget
/// always produce the same plan.
pub fn select_partition(shape: &TensorShape, thread_budget: usize) -> (PartitionAxis, usize) {
    let axis = select_axis(shape);
    (axis, thread_budget.min(axis.extent(shape)))
}

/// Convolves `input` with `kernel`, choosing the partition automatically.
///
/// The thread budget is the hardware's available parallelism; the
/// partition axis and the worker count follow [`select_partition`].
///
/// # Errors
///
/// Returns an error if the convolution geometry is invalid; see
/// [`conv_output_shape`].
///
/// # Example
///
/// ```
/// use zeroconv_ops::conv2d::{conv2d, ConvParams};
/// use zeroconv_tensor::{Tensor, TensorShape};
///
/// let input = Tensor::from_shape_val(TensorShape::chw(1, 4, 4), 1.0f32).unwrap();
/// let kernel = Tensor::from_shape_val(TensorShape::echw(1, 1, 3, 3), 1.0f32).unwrap();
///
/// let out = conv2d(&input, &kernel, ConvParams::new(1, 1)).unwrap();
/// assert_eq!(out.shape, TensorShape::chw(1, 4, 4));
/// // corners see a 2x2 patch of the input, the center the full 3x3
/// assert_eq!(*out.get3(0, 0, 0).unwrap(), 4.0);
/// assert_eq!(*out.get3(0, 1, 1).unwrap(), 9.0);
/// ```
pub fn conv2d<T: ConvElement>(
    input: &Tensor<T>,
    kernel: &Tensor<T>,
    params: ConvParams,
) -> Result<Tensor<T>, ConvError> {
    let thread_budget = std::thread::available_parallelism().map_or(1, |n| n.get());
    conv2d_with_threads(input, kernel, params, thread_budget)
}

/// Convolves `input` with `kernel` with an explicit thread budget.
///
/// The partition axis follows [`select_partition`]; at most
/// `num_threads` workers are used, fewer when the chosen axis is shorter
/// than the budget.
///
/// # Errors
///
/// Returns an error if the convolution geometry is invalid or
/// `num_threads` is zero.
pub fn conv2d_with_threads<T: ConvElement>(
    input: &Tensor<T>,
    kernel: &Tensor<T>,
    params: ConvParams,
    num_threads: usize,
) -> Result<Tensor<T>, ConvError> {
    let out_shape = conv_output_shape(&input.shape, &kernel.shape, params)?;
    if num_threads == 0 {
        return Err(ConvError::InvalidThreadCount(num_threads));
    }
    let (axis, num_threads) = select_partition(&out_shape, num_threads);
    log::debug!(
        "conv2d: auto-selected the {:?} axis for output {}",
        axis,
        out_shape
    );
    conv2d_partitioned(input, kernel, params, out_shape, axis, num_threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    use super::super::naive::conv2d_naive;

    #[test]
    fn test_select_axis_largest_extent() {
        assert_eq!(select_axis(&TensorShape::chw(2, 16, 8)), PartitionAxis::Row);
        assert_eq!(
            select_axis(&TensorShape::echw(8, 2, 4, 4)),
            PartitionAxis::Batch
        );
        assert_eq!(
            select_axis(&TensorShape::echw(2, 8, 4, 4)),
            PartitionAxis::Channel
        );
    }

    #[test]
    fn test_select_axis_tie_breaks_in_axis_order() {
        assert_eq!(
            select_axis(&TensorShape::echw(4, 4, 4, 2)),
            PartitionAxis::Batch
        );
        assert_eq!(
            select_axis(&TensorShape::echw(1, 4, 4, 2)),
            PartitionAxis::Channel
        );
    }

    #[test]
    fn test_select_partition_caps_at_extent() {
        let shape = TensorShape::echw(2, 3, 4, 50);
        assert_eq!(select_partition(&shape, 16), (PartitionAxis::Row, 4));
        assert_eq!(select_partition(&shape, 2), (PartitionAxis::Row, 2));
    }

    #[test]
    fn test_conv2d_matches_naive() -> Result<(), ConvError> {
        let mut rng = StdRng::seed_from_u64(21);
        let input = Tensor::<f32>::rand_with(TensorShape::echw(2, 3, 7, 6), &mut rng)?;
        let kernel = Tensor::<f32>::rand_with(TensorShape::echw(5, 3, 3, 2), &mut rng)?;
        let params = ConvParams::new(1, 1);
        let expected = conv2d_naive(&input, &kernel, params)?;
        let out = conv2d(&input, &kernel, params)?;
        assert_eq!(out.shape, expected.shape);
        assert_eq!(out.as_slice(), expected.as_slice());
        Ok(())
    }

    #[test]
    fn test_conv2d_with_threads_sweep() -> Result<(), ConvError> {
        let mut rng = StdRng::seed_from_u64(22);
        let input = Tensor::<f32>::rand_with(TensorShape::chw(2, 9, 4), &mut rng)?;
        let kernel = Tensor::<f32>::rand_with(TensorShape::echw(3, 2, 2, 2), &mut rng)?;
        let params = ConvParams::default();
        let expected = conv2d_naive(&input, &kernel, params)?;
        for num_threads in 1..=10 {
            let out = conv2d_with_threads(&input, &kernel, params, num_threads)?;
            assert_eq!(out.as_slice(), expected.as_slice());
        }
        Ok(())
    }

    #[test]
    fn test_conv2d_with_threads_rejects_zero() -> Result<(), ConvError> {
        let input = Tensor::<f32>::zeros(TensorShape::chw(1, 4, 4))?;
        let kernel = Tensor::<f32>::zeros(TensorShape::echw(1, 1, 3, 3))?;
        let result = conv2d_with_threads(&input, &kernel, ConvParams::default(), 0);
        assert_eq!(result.err(), Some(ConvError::InvalidThreadCount(0)));
        Ok(())
    }
}
