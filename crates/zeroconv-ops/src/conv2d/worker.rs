use std::ops::Range;

use zeroconv_tensor::{Tensor, TensorShape};

use super::geometry::{ConvElement, ConvParams};

/// Unsynchronized write handle over a pre-allocated output buffer.
///
/// Workers receive a copy of the handle and write their results through
/// raw offsets. There is no locking: correctness relies on the dispatcher
/// handing each worker a disjoint set of flat offsets.
pub(super) struct OutputRegion<T> {
    ptr: *mut T,
    len: usize,
}

impl<T> OutputRegion<T> {
    /// Wraps the output tensor's buffer.
    ///
    /// The tensor must outlive every worker holding a copy of the handle;
    /// the scoped dispatch below guarantees this.
    pub(super) fn new(output: &mut Tensor<T>) -> Self {
        Self {
            ptr: output.as_mut_ptr(),
            len: output.numel(),
        }
    }

    /// Writes `value` at the given flat offset.
    ///
    /// # Safety
    ///
    /// - `offset` must be less than the buffer length.
    /// - No other thread may read or write the same offset concurrently.
    #[inline]
    pub(super) unsafe fn write(&self, offset: usize, value: T) {
        debug_assert!(offset < self.len, "offset {} beyond region {}", offset, self.len);
        // SAFETY: offset < len per the contract, and the buffer stays
        // allocated for the handle's lifetime
        unsafe { self.ptr.add(offset).write(value) };
    }
}

impl<T> Clone for OutputRegion<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for OutputRegion<T> {}

// SAFETY: OutputRegion<T> is Send when T is Send because:
// - it carries only a pointer and a length, never a value of T
// - writes move values of T into the buffer, which is sound to do from
//   another thread for T: Send
// - disjointness of concurrent writes is the write() caller's contract
unsafe impl<T: Send> Send for OutputRegion<T> {}

/// Accumulates the full receptive field of one output element.
///
/// `(e, co, ho, wo)` are output coordinates; the window anchor in input
/// space is `(ho * stride - padding, wo * stride - padding)`. The
/// reduction runs input channels outermost, then kernel rows, then kernel
/// columns. Every convolution variant funnels through this helper, so all
/// of them accumulate in the same order and produce bitwise-equal results.
#[inline]
pub(super) fn accumulate_field<T: ConvElement>(
    input: &Tensor<T>,
    kernel: &Tensor<T>,
    params: ConvParams,
    e: usize,
    co: usize,
    ho: usize,
    wo: usize,
) -> T {
    let pad = params.padding;
    let h0 = (ho * params.stride) as isize - pad as isize;
    let w0 = (wo * params.stride) as isize - pad as isize;
    let mut acc = T::zero();
    for c in 0..input.shape.channels {
        for kh in 0..kernel.shape.height {
            for kw in 0..kernel.shape.width {
                let x = input.get_padded(e, c, h0 + kh as isize, w0 + kw as isize, pad);
                // SAFETY: co < kernel filters and (c, kh, kw) iterate the
                // kernel's own extents
                let k = unsafe { *kernel.get_unchecked(co, c, kh, kw) };
                acc += x * k;
            }
        }
    }
    acc
}

/// Computes every output element whose coordinates fall inside the given
/// batch, channel and row ranges, sweeping all columns.
///
/// Exactly one of the ranges is a worker's sub-range; the other two span
/// their full axes. The loop nest keeps each kernel filter live for its
/// whole spatial sweep and walks the output width innermost, so
/// consecutive writes land on consecutive flat offsets.
pub(super) fn conv_range<T: ConvElement>(
    input: &Tensor<T>,
    kernel: &Tensor<T>,
    params: ConvParams,
    region: OutputRegion<T>,
    out_shape: TensorShape,
    batches: Range<usize>,
    channels: Range<usize>,
    rows: Range<usize>,
) {
    for e in batches {
        for co in channels.clone() {
            for ho in rows.clone() {
                for wo in 0..out_shape.width {
                    let value = accumulate_field(input, kernel, params, e, co, ho, wo);
                    // SAFETY: (e, co, ho, wo) is in bounds for out_shape,
                    // and the dispatcher hands each worker disjoint ranges
                    // so no offset is written twice
                    unsafe { region.write(out_shape.offset(e, co, ho, wo), value) };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroconv_tensor::TensorError;

    #[test]
    fn test_region_write_all_offsets() -> Result<(), TensorError> {
        let mut out = Tensor::<f32>::zeros(TensorShape::chw(1, 2, 2))?;
        let region = OutputRegion::new(&mut out);
        for i in 0..4 {
            // SAFETY: i < 4 and writes are sequential on one thread
            unsafe { region.write(i, i as f32) };
        }
        assert_eq!(out.as_slice(), &[0.0, 1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_accumulate_field_window_sum() -> Result<(), TensorError> {
        // 2-channel input of ones against a 2x2 kernel of ones sums the
        // whole window: 2 channels * 4 taps
        let input = Tensor::from_shape_val(TensorShape::chw(2, 3, 3), 1.0f32)?;
        let kernel = Tensor::from_shape_val(TensorShape::echw(1, 2, 2, 2), 1.0f32)?;
        let acc = accumulate_field(&input, &kernel, ConvParams::default(), 0, 0, 0, 0);
        assert_eq!(acc, 8.0);
        Ok(())
    }

    #[test]
    fn test_accumulate_field_padding_contributes_zero() -> Result<(), TensorError> {
        let input = Tensor::from_shape_val(TensorShape::chw(1, 2, 2), 3.0f32)?;
        let kernel = Tensor::from_shape_val(TensorShape::echw(1, 1, 3, 3), 1.0f32)?;
        // anchor (-1, -1): only the 2x2 interior overlaps the input
        let acc = accumulate_field(&input, &kernel, ConvParams::new(1, 1), 0, 0, 0, 0);
        assert_eq!(acc, 12.0);
        Ok(())
    }

    #[test]
    fn test_conv_range_writes_full_output() -> Result<(), TensorError> {
        let input = Tensor::from_shape_fn(TensorShape::chw(1, 3, 3), |[_, _, h, w]| {
            (h * 3 + w) as f32
        })?;
        let kernel = Tensor::from_shape_val(TensorShape::echw(1, 1, 2, 2), 1.0f32)?;
        let out_shape = TensorShape::chw(1, 2, 2);
        let mut out = Tensor::<f32>::zeros(out_shape)?;
        let region = OutputRegion::new(&mut out);
        conv_range(
            &input,
            &kernel,
            ConvParams::default(),
            region,
            out_shape,
            0..1,
            0..1,
            0..2,
        );
        // each output is the sum of a 2x2 window of 0..8
        assert_eq!(out.as_slice(), &[8.0, 12.0, 20.0, 24.0]);
        Ok(())
    }
}
