use std::ops::Range;

use zeroconv_tensor::{Tensor, TensorShape};

use crate::error::ConvError;

use super::geometry::{conv_output_shape, ConvElement, ConvParams};
use super::worker::{conv_range, OutputRegion};

/// The output axis a convolution is partitioned along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionAxis {
    /// Split the batch axis; each worker takes a contiguous run of samples.
    Batch,
    /// Split the output channel axis; each worker takes a contiguous run
    /// of filters.
    Channel,
    /// Split the output row axis; each worker takes a contiguous band of
    /// rows.
    Row,
}

impl PartitionAxis {
    /// Extent of this axis in the given output shape.
    pub fn extent(&self, shape: &TensorShape) -> usize {
        match self {
            Self::Batch => shape.batch,
            Self::Channel => shape.channels,
            Self::Row => shape.height,
        }
    }
}

/// Splits `len` items into at most `chunks` contiguous ranges.
///
/// Range sizes differ by at most one and earlier ranges take the
/// remainder. Empty ranges are never produced: asking for more chunks
/// than items yields `len` single-item ranges.
pub(super) fn split_ranges(len: usize, chunks: usize) -> Vec<Range<usize>> {
    let base = len / chunks;
    let remainder = len % chunks;
    let mut ranges = Vec::with_capacity(chunks.min(len));
    let mut start = 0;
    for i in 0..chunks {
        let end = start + base + usize::from(i < remainder);
        if start < end {
            ranges.push(start..end);
        }
        start = end;
    }
    ranges
}

/// Convolves with the output partitioned along `axis` across worker
/// threads.
///
/// `out_shape` must come from [`conv_output_shape`] for the same input,
/// kernel and parameters; each entry point validates the geometry exactly
/// once and hands the shape down. Allocates the output uninitialized,
/// splits the axis into contiguous chunks and runs one worker per chunk
/// on a local thread pool. The pool lives for this call only. Each worker
/// writes a disjoint region of the output, so by the time the scope joins
/// every element has been written exactly once.
pub(super) fn conv2d_partitioned<T: ConvElement>(
    input: &Tensor<T>,
    kernel: &Tensor<T>,
    params: ConvParams,
    out_shape: TensorShape,
    axis: PartitionAxis,
    num_threads: usize,
) -> Result<Tensor<T>, ConvError> {
    if num_threads == 0 {
        return Err(ConvError::InvalidThreadCount(num_threads));
    }
    let num_threads = num_threads.min(axis.extent(&out_shape));

    log::debug!(
        "conv2d: splitting the {:?} axis of {} across {} threads",
        axis,
        out_shape,
        num_threads
    );

    // SAFETY: the workers spawned below cover the partitioned axis without
    // gaps and sweep every other axis fully, so each output element is
    // written exactly once before the scope joins
    let mut output = unsafe { Tensor::uninitialized(out_shape) }?;
    let region = OutputRegion::new(&mut output);

    let ranges = split_ranges(axis.extent(&out_shape), num_threads);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| ConvError::ThreadPoolBuild(e.to_string()))?;

    pool.scope(move |s| {
        for range in ranges {
            s.spawn(move |_| {
                let (batches, channels, rows) = match axis {
                    PartitionAxis::Batch => (range, 0..out_shape.channels, 0..out_shape.height),
                    PartitionAxis::Channel => (0..out_shape.batch, range, 0..out_shape.height),
                    PartitionAxis::Row => (0..out_shape.batch, 0..out_shape.channels, range),
                };
                conv_range(
                    input, kernel, params, region, out_shape, batches, channels, rows,
                );
            });
        }
    });

    Ok(output)
}

/// Convolves `input` with `kernel`, splitting output rows across
/// `num_threads` workers.
///
/// Each worker computes a contiguous band of output rows for every batch
/// sample and filter. Rows are the widest axis on typical inputs, which
/// makes this the default split for single-sample workloads.
///
/// # Errors
///
/// Returns an error if the convolution geometry is invalid or
/// `num_threads` is zero. Thread counts above the number of output rows
/// are clamped.
///
/// # Example
///
/// ```
/// use zeroconv_ops::conv2d::{conv2d_parallel_rows, ConvParams};
/// use zeroconv_tensor::{Tensor, TensorShape};
///
/// let input = Tensor::from_shape_val(TensorShape::chw(1, 4, 4), 1.0f32).unwrap();
/// let kernel = Tensor::from_shape_val(TensorShape::echw(1, 1, 3, 3), 1.0f32).unwrap();
/// let out = conv2d_parallel_rows(&input, &kernel, ConvParams::default(), 2).unwrap();
/// assert_eq!(out.as_slice(), &[9.0, 9.0, 9.0, 9.0]);
/// ```
pub fn conv2d_parallel_rows<T: ConvElement>(
    input: &Tensor<T>,
    kernel: &Tensor<T>,
    params: ConvParams,
    num_threads: usize,
) -> Result<Tensor<T>, ConvError> {
    let out_shape = conv_output_shape(&input.shape, &kernel.shape, params)?;
    conv2d_partitioned(input, kernel, params, out_shape, PartitionAxis::Row, num_threads)
}

/// Convolves `input` with `kernel`, splitting output channels across
/// `num_threads` workers.
///
/// Each worker applies a contiguous run of kernel filters to the whole
/// input. A good split when the filter count dominates the output shape.
///
/// # Errors
///
/// Returns an error if the convolution geometry is invalid or
/// `num_threads` is zero. Thread counts above the number of filters are
/// clamped.
pub fn conv2d_parallel_channels<T: ConvElement>(
    input: &Tensor<T>,
    kernel: &Tensor<T>,
    params: ConvParams,
    num_threads: usize,
) -> Result<Tensor<T>, ConvError> {
    let out_shape = conv_output_shape(&input.shape, &kernel.shape, params)?;
    conv2d_partitioned(input, kernel, params, out_shape, PartitionAxis::Channel, num_threads)
}

/// Convolves `input` with `kernel`, splitting the batch across
/// `num_threads` workers.
///
/// Each worker convolves a contiguous run of batch samples end to end.
/// The natural split for large batches; rank-3 inputs have a batch of
/// one, which clamps this variant to a single worker.
///
/// # Errors
///
/// Returns an error if the convolution geometry is invalid or
/// `num_threads` is zero. Thread counts above the batch size are clamped.
pub fn conv2d_parallel_batch<T: ConvElement>(
    input: &Tensor<T>,
    kernel: &Tensor<T>,
    params: ConvParams,
    num_threads: usize,
) -> Result<Tensor<T>, ConvError> {
    let out_shape = conv_output_shape(&input.shape, &kernel.shape, params)?;
    conv2d_partitioned(input, kernel, params, out_shape, PartitionAxis::Batch, num_threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    use super::super::naive::conv2d_naive;

    #[test]
    fn test_split_ranges_even() {
        assert_eq!(split_ranges(8, 4), vec![0..2, 2..4, 4..6, 6..8]);
    }

    #[test]
    fn test_split_ranges_remainder_to_front() {
        assert_eq!(split_ranges(10, 4), vec![0..3, 3..6, 6..8, 8..10]);
    }

    #[test]
    fn test_split_ranges_more_chunks_than_items() {
        assert_eq!(split_ranges(3, 5), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_split_ranges_partition_law() {
        for len in 1..=12 {
            for chunks in 1..=len {
                let ranges = split_ranges(len, chunks);
                assert_eq!(ranges.len(), chunks);
                // contiguous cover of 0..len
                assert_eq!(ranges[0].start, 0);
                assert_eq!(ranges[ranges.len() - 1].end, len);
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }
                // sizes differ by at most one, larger chunks first
                for pair in ranges.windows(2) {
                    let (a, b) = (pair[0].len(), pair[1].len());
                    assert!(a == b || a == b + 1);
                }
            }
        }
    }

    fn random_case() -> (Tensor<f32>, Tensor<f32>) {
        let mut rng = StdRng::seed_from_u64(99);
        let input = Tensor::rand_with(TensorShape::echw(3, 2, 6, 5), &mut rng)
            .expect("valid shape");
        let kernel = Tensor::rand_with(TensorShape::echw(4, 2, 3, 3), &mut rng)
            .expect("valid shape");
        (input, kernel)
    }

    #[test]
    fn test_parallel_rows_matches_naive() -> Result<(), ConvError> {
        let (input, kernel) = random_case();
        let params = ConvParams::new(1, 1);
        let expected = conv2d_naive(&input, &kernel, params)?;
        for num_threads in 1..=7 {
            let out = conv2d_parallel_rows(&input, &kernel, params, num_threads)?;
            assert_eq!(out.shape, expected.shape);
            assert_eq!(out.as_slice(), expected.as_slice());
        }
        Ok(())
    }

    #[test]
    fn test_parallel_channels_matches_naive() -> Result<(), ConvError> {
        let (input, kernel) = random_case();
        let params = ConvParams::new(2, 0);
        let expected = conv2d_naive(&input, &kernel, params)?;
        for num_threads in 1..=5 {
            let out = conv2d_parallel_channels(&input, &kernel, params, num_threads)?;
            assert_eq!(out.as_slice(), expected.as_slice());
        }
        Ok(())
    }

    #[test]
    fn test_parallel_batch_matches_naive() -> Result<(), ConvError> {
        let (input, kernel) = random_case();
        let params = ConvParams::default();
        let expected = conv2d_naive(&input, &kernel, params)?;
        for num_threads in 1..=4 {
            let out = conv2d_parallel_batch(&input, &kernel, params, num_threads)?;
            assert_eq!(out.as_slice(), expected.as_slice());
        }
        Ok(())
    }

    #[test]
    fn test_partitioned_takes_validated_shape() -> Result<(), ConvError> {
        // the core receives the shape its caller validated instead of
        // recomputing it
        let (input, kernel) = random_case();
        let params = ConvParams::new(1, 1);
        let out_shape = conv_output_shape(&input.shape, &kernel.shape, params)?;
        let expected = conv2d_naive(&input, &kernel, params)?;
        let out =
            conv2d_partitioned(&input, &kernel, params, out_shape, PartitionAxis::Channel, 3)?;
        assert_eq!(out.shape, out_shape);
        assert_eq!(out.as_slice(), expected.as_slice());
        Ok(())
    }

    #[test]
    fn test_parallel_rejects_zero_threads() {
        let (input, kernel) = random_case();
        let result = conv2d_parallel_rows(&input, &kernel, ConvParams::default(), 0);
        assert_eq!(result.err(), Some(ConvError::InvalidThreadCount(0)));
    }

    #[test]
    fn test_parallel_thread_surplus_is_clamped() -> Result<(), ConvError> {
        let (input, kernel) = random_case();
        let params = ConvParams::default();
        let expected = conv2d_naive(&input, &kernel, params)?;
        // far more threads than output rows still computes the same result
        let out = conv2d_parallel_rows(&input, &kernel, params, 64)?;
        assert_eq!(out.as_slice(), expected.as_slice());
        Ok(())
    }

    #[test]
    fn test_parallel_validates_before_spawning() {
        let (input, _) = random_case();
        let bad_kernel = Tensor::from_shape_val(TensorShape::echw(1, 9, 3, 3), 1.0f32)
            .expect("valid shape");
        let result = conv2d_parallel_batch(&input, &bad_kernel, ConvParams::default(), 4);
        assert_eq!(
            result.err(),
            Some(ConvError::ChannelMismatch { kernel: 9, input: 2 })
        );
    }
}
