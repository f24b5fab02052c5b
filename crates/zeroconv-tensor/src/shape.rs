use std::fmt;

/// Dimension metadata for a batched multi-channel tensor.
///
/// Dimensions are ordered `(batch, channels, height, width)`. The rank
/// recorded at construction distinguishes rank-3 `(C, H, W)` tensors from
/// rank-4 `(E, C, H, W)` ones; rank-3 shapes carry an implicit batch of 1 so
/// that the flat memory layout is uniform across ranks.
///
/// # Memory Layout
///
/// Tensors are row-major (C-contiguous) with the width dimension varying
/// fastest, so the flat offset of `(e, c, h, w)` is
/// `((e * C + c) * H + h) * W + w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorShape {
    /// Number of batch elements (1 for rank-3 shapes).
    pub batch: usize,
    /// Number of channels.
    pub channels: usize,
    /// Number of rows.
    pub height: usize,
    /// Number of columns.
    pub width: usize,
    rank: usize,
}

impl TensorShape {
    /// Creates a rank-3 `(C, H, W)` shape with an implicit batch of 1.
    pub fn chw(channels: usize, height: usize, width: usize) -> Self {
        Self {
            batch: 1,
            channels,
            height,
            width,
            rank: 3,
        }
    }

    /// Creates a rank-4 `(E, C, H, W)` shape.
    pub fn echw(batch: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            batch,
            channels,
            height,
            width,
            rank: 4,
        }
    }

    /// Returns the rank the shape was constructed with (3 or 4).
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Returns the total number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.batch * self.channels * self.height * self.width
    }

    /// Returns true if any dimension is zero.
    #[inline]
    pub fn has_zero_dim(&self) -> bool {
        self.batch == 0 || self.channels == 0 || self.height == 0 || self.width == 0
    }

    /// Returns the flat row-major offset of `(e, c, h, w)`.
    ///
    /// The coordinates are not validated; callers are expected to have
    /// checked them against the shape.
    #[inline]
    pub fn offset(&self, e: usize, c: usize, h: usize, w: usize) -> usize {
        ((e * self.channels + c) * self.height + h) * self.width + w
    }

    /// Returns the row-major strides `(batch, channels, height, width)`.
    ///
    /// The offset of `(e, c, h, w)` equals the dot product of the
    /// coordinates with these strides.
    ///
    /// # Example
    ///
    /// ```
    /// use zeroconv_tensor::TensorShape;
    ///
    /// let shape = TensorShape::echw(2, 3, 4, 5);
    /// assert_eq!(shape.strides(), [60, 20, 5, 1]);
    /// ```
    #[inline]
    pub fn strides(&self) -> [usize; 4] {
        [
            self.channels * self.height * self.width,
            self.height * self.width,
            self.width,
            1,
        ]
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rank == 3 {
            write!(f, "{}x{}x{}", self.channels, self.height, self.width)
        } else {
            write!(
                f,
                "{}x{}x{}x{}",
                self.batch, self.channels, self.height, self.width
            )
        }
    }
}
