use thiserror::Error;

use crate::shape::TensorShape;
use crate::storage::{StorageError, TensorStorage};

/// Error type for tensor operations.
#[derive(Error, Debug, PartialEq)]
pub enum TensorError {
    /// Tensor shape does not match the provided data.
    ///
    /// The product of the shape dimensions must equal the number of elements
    /// in the data exactly.
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on shape.
        expected: usize,
        /// Actual number of elements in the data.
        actual: usize,
    },

    /// A tensor shape with a zero dimension was requested.
    ///
    /// Every live tensor owns a non-empty buffer, so zero-sized shapes are
    /// rejected at construction.
    #[error("Invalid tensor shape {shape}: every dimension must be non-zero")]
    ZeroDim {
        /// The rejected shape, formatted as `CxHxW` or `ExCxHxW`.
        shape: String,
    },

    /// Index exceeds tensor bounds.
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted.
        index: usize,
        /// The size of the dimension being indexed.
        size: usize,
    },

    /// An accessor of the wrong arity was used for the tensor's rank.
    ///
    /// Rank-3 tensors are indexed with `(c, h, w)` and rank-4 tensors with
    /// `(e, c, h, w)`; the two accessor families do not cross over.
    #[error("Rank mismatch: tensor has rank {tensor}, accessor takes rank {accessor}")]
    RankMismatch {
        /// The rank of the tensor being accessed.
        tensor: usize,
        /// The rank the accessor expects.
        accessor: usize,
    },

    /// Underlying storage operation failed.
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl TensorError {
    /// Creates an InvalidShape error with clear context.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Creates an IndexOutOfBounds error with clear context.
    pub fn index_out_of_bounds(index: usize, size: usize) -> Self {
        Self::IndexOutOfBounds { index, size }
    }

    /// Creates a ZeroDim error for the given shape.
    pub fn zero_dim(shape: &TensorShape) -> Self {
        Self::ZeroDim {
            shape: shape.to_string(),
        }
    }

    /// Creates a RankMismatch error with clear context.
    pub fn rank_mismatch(tensor: usize, accessor: usize) -> Self {
        Self::RankMismatch { tensor, accessor }
    }
}

/// Rejects shapes no live tensor may have.
fn check_shape(shape: &TensorShape) -> Result<(), TensorError> {
    if shape.has_zero_dim() {
        return Err(TensorError::zero_dim(shape));
    }
    Ok(())
}

/// A dense rank-3 or rank-4 array with exclusively owned data.
///
/// `Tensor` combines an exclusively owned storage buffer with
/// [`TensorShape`] metadata. The buffer is row-major `(E, C, H, W)` with an
/// implicit batch of 1 for rank-3 tensors, so the flat offset arithmetic is
/// uniform across ranks.
///
/// Every live tensor is valid: constructors reject zero-sized shapes and
/// data/shape length disagreements, and ownership guarantees the buffer is
/// released exactly once. Cloning deep-copies the buffer.
///
/// # Examples
///
/// ```
/// use zeroconv_tensor::{Tensor, TensorShape};
///
/// let data: Vec<u8> = vec![1, 2, 3, 4, 5, 6];
/// let t = Tensor::from_shape_vec(TensorShape::chw(1, 2, 3), data).unwrap();
/// assert_eq!(t.get3(0, 1, 2), Ok(&6));
/// ```
pub struct Tensor<T> {
    /// The storage of the tensor.
    pub storage: TensorStorage<T>,
    /// The shape of the tensor.
    pub shape: TensorShape,
}

impl<T> Tensor<T> {
    /// Creates a new `Tensor` with the given shape and data.
    ///
    /// # Arguments
    ///
    /// * `shape` - The shape of the tensor.
    /// * `data` - A vector containing the data of the tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape has a zero dimension or the number of
    /// elements in the data does not match the shape.
    ///
    /// # Example
    ///
    /// ```
    /// use zeroconv_tensor::{Tensor, TensorShape};
    ///
    /// let data: Vec<u8> = vec![1, 2, 3, 4];
    /// let t = Tensor::from_shape_vec(TensorShape::chw(1, 2, 2), data).unwrap();
    /// assert_eq!(t.numel(), 4);
    /// ```
    pub fn from_shape_vec(shape: TensorShape, data: Vec<T>) -> Result<Self, TensorError> {
        check_shape(&shape)?;
        let numel = shape.numel();
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        let storage = TensorStorage::from_vec(data)?;
        Ok(Self { storage, shape })
    }

    /// Creates a new `Tensor` with the given shape, filled with a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape has a zero dimension or allocation
    /// fails.
    pub fn from_shape_val(shape: TensorShape, value: T) -> Result<Self, TensorError>
    where
        T: Clone,
    {
        check_shape(&shape)?;
        let data = vec![value; shape.numel()];
        let storage = TensorStorage::from_vec(data)?;
        Ok(Self { storage, shape })
    }

    /// Creates a new `Tensor` with the given shape, filled with zeros.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape has a zero dimension or allocation
    /// fails.
    pub fn zeros(shape: TensorShape) -> Result<Self, TensorError>
    where
        T: Clone + num_traits::Zero,
    {
        Self::from_shape_val(shape, T::zero())
    }

    /// Creates a new `Tensor` with the given shape and a function to
    /// generate the data.
    ///
    /// The function is called with the `[e, c, h, w]` coordinates of each
    /// element, with `e` fixed to 0 for rank-3 shapes.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape has a zero dimension or allocation
    /// fails.
    ///
    /// # Example
    ///
    /// ```
    /// use zeroconv_tensor::{Tensor, TensorShape};
    ///
    /// let t = Tensor::from_shape_fn(TensorShape::chw(1, 2, 2), |[_, _, h, w]| {
    ///     (h * 2 + w) as u8
    /// })
    /// .unwrap();
    /// assert_eq!(t.as_slice(), &[0, 1, 2, 3]);
    /// ```
    pub fn from_shape_fn<F>(shape: TensorShape, f: F) -> Result<Self, TensorError>
    where
        F: Fn([usize; 4]) -> T,
    {
        check_shape(&shape)?;
        let mut data = Vec::with_capacity(shape.numel());
        for e in 0..shape.batch {
            for c in 0..shape.channels {
                for h in 0..shape.height {
                    for w in 0..shape.width {
                        data.push(f([e, c, h, w]));
                    }
                }
            }
        }
        let storage = TensorStorage::from_vec(data)?;
        Ok(Self { storage, shape })
    }

    /// Creates a new `Tensor` with the given shape and unspecified contents.
    ///
    /// The allocation is not initialized, so constructing the tensor costs
    /// no per-element work. Convolution outputs are allocated this way and
    /// every element is then written exactly once by the workers.
    ///
    /// # Safety
    ///
    /// Every element must be written before it is read.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape has a zero dimension or allocation
    /// fails.
    pub unsafe fn uninitialized(shape: TensorShape) -> Result<Self, TensorError>
    where
        T: Copy,
    {
        check_shape(&shape)?;
        // SAFETY: forwarded to the caller, who must write every element
        // before reading it
        let storage = unsafe { TensorStorage::new_uninit(shape.numel()) }?;
        Ok(Self { storage, shape })
    }

    /// Creates a new `Tensor` with the given shape and random contents.
    ///
    /// Uses the thread-local generator; see [`Tensor::rand_with`] for a
    /// seedable variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape has a zero dimension or allocation
    /// fails.
    pub fn rand(shape: TensorShape) -> Result<Self, TensorError>
    where
        rand::distr::StandardUniform: rand::distr::Distribution<T>,
    {
        Self::rand_with(shape, &mut rand::rng())
    }

    /// Creates a new `Tensor` with the given shape, drawing contents from
    /// the provided generator.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape has a zero dimension or allocation
    /// fails.
    ///
    /// # Example
    ///
    /// ```
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use zeroconv_tensor::{Tensor, TensorShape};
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t = Tensor::<f32>::rand_with(TensorShape::chw(3, 4, 4), &mut rng).unwrap();
    /// assert_eq!(t.numel(), 48);
    /// ```
    pub fn rand_with<R>(shape: TensorShape, rng: &mut R) -> Result<Self, TensorError>
    where
        R: rand::Rng,
        rand::distr::StandardUniform: rand::distr::Distribution<T>,
    {
        check_shape(&shape)?;
        let data: Vec<T> = (0..shape.numel()).map(|_| rng.random()).collect();
        let storage = TensorStorage::from_vec(data)?;
        Ok(Self { storage, shape })
    }

    /// Returns the number of elements in the tensor.
    #[inline]
    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    /// Returns the rank of the tensor (3 or 4).
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Returns the tensor data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    /// Returns the tensor data as a mutable slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    /// Returns the pointer to the tensor data.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_ptr()
    }

    /// Returns the mutable pointer to the tensor data.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.storage.as_mut_ptr()
    }

    /// Consumes the tensor and returns the data as a vector.
    pub fn into_vec(self) -> Vec<T> {
        self.storage.into_vec()
    }

    /// Validates `(e, c, h, w)` against the shape, dimension by dimension.
    fn check_coords(&self, e: usize, c: usize, h: usize, w: usize) -> Result<(), TensorError> {
        if e >= self.shape.batch {
            return Err(TensorError::index_out_of_bounds(e, self.shape.batch));
        }
        if c >= self.shape.channels {
            return Err(TensorError::index_out_of_bounds(c, self.shape.channels));
        }
        if h >= self.shape.height {
            return Err(TensorError::index_out_of_bounds(h, self.shape.height));
        }
        if w >= self.shape.width {
            return Err(TensorError::index_out_of_bounds(w, self.shape.width));
        }
        Ok(())
    }

    /// Gets the element at `(c, h, w)` of a rank-3 tensor, checking bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor is not rank 3 or a coordinate is out
    /// of bounds.
    ///
    /// # Example
    ///
    /// ```
    /// use zeroconv_tensor::{Tensor, TensorShape};
    ///
    /// let t = Tensor::from_shape_vec(TensorShape::chw(1, 2, 2), vec![1, 2, 3, 4]).unwrap();
    /// assert_eq!(t.get3(0, 0, 1), Ok(&2));
    /// assert!(t.get3(0, 2, 0).is_err());
    /// ```
    pub fn get3(&self, c: usize, h: usize, w: usize) -> Result<&T, TensorError> {
        if self.rank() != 3 {
            return Err(TensorError::rank_mismatch(self.rank(), 3));
        }
        self.check_coords(0, c, h, w)?;
        Ok(&self.as_slice()[self.shape.offset(0, c, h, w)])
    }

    /// Gets the element at `(e, c, h, w)` of a rank-4 tensor, checking
    /// bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor is not rank 4 or a coordinate is out
    /// of bounds.
    pub fn get4(&self, e: usize, c: usize, h: usize, w: usize) -> Result<&T, TensorError> {
        if self.rank() != 4 {
            return Err(TensorError::rank_mismatch(self.rank(), 4));
        }
        self.check_coords(e, c, h, w)?;
        Ok(&self.as_slice()[self.shape.offset(e, c, h, w)])
    }

    /// Gets a mutable reference to the element at `(c, h, w)` of a rank-3
    /// tensor, checking bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor is not rank 3 or a coordinate is out
    /// of bounds.
    pub fn get3_mut(&mut self, c: usize, h: usize, w: usize) -> Result<&mut T, TensorError> {
        if self.rank() != 3 {
            return Err(TensorError::rank_mismatch(self.rank(), 3));
        }
        self.check_coords(0, c, h, w)?;
        let offset = self.shape.offset(0, c, h, w);
        Ok(&mut self.as_slice_mut()[offset])
    }

    /// Gets a mutable reference to the element at `(e, c, h, w)` of a
    /// rank-4 tensor, checking bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor is not rank 4 or a coordinate is out
    /// of bounds.
    pub fn get4_mut(
        &mut self,
        e: usize,
        c: usize,
        h: usize,
        w: usize,
    ) -> Result<&mut T, TensorError> {
        if self.rank() != 4 {
            return Err(TensorError::rank_mismatch(self.rank(), 4));
        }
        self.check_coords(e, c, h, w)?;
        let offset = self.shape.offset(e, c, h, w);
        Ok(&mut self.as_slice_mut()[offset])
    }

    /// Gets the element at `(e, c, h, w)` without checking bounds.
    ///
    /// # Safety
    ///
    /// All four coordinates must be in bounds for the tensor's shape, with
    /// `e` equal to 0 for rank-3 tensors.
    #[inline]
    pub unsafe fn get_unchecked(&self, e: usize, c: usize, h: usize, w: usize) -> &T {
        // SAFETY: the caller guarantees the coordinates are in bounds, so
        // the flat offset is < numel
        unsafe { self.as_slice().get_unchecked(self.shape.offset(e, c, h, w)) }
    }

    /// Reads the element at `(e, c, h, w)`, resolving the zero border of a
    /// padded convolution.
    ///
    /// `h` and `w` may fall in `[-padding, dim + padding)`: coordinates
    /// inside the logical buffer read the stored element, coordinates inside
    /// the padding border read as zero. The zero is returned by value, so
    /// the border can never be written through. Callers use this only on
    /// convolution inputs, never outputs.
    ///
    /// Coordinates beyond even the padded range are a geometry bug in the
    /// caller: they trip a debug assertion, and in release builds the call
    /// returns zero without touching memory.
    ///
    /// # Panics
    ///
    /// Panics if `e` or `c` is out of bounds; padding never applies to the
    /// batch and channel axes.
    #[inline]
    pub fn get_padded(&self, e: usize, c: usize, h: isize, w: isize, padding: usize) -> T
    where
        T: Copy + num_traits::Zero,
    {
        assert!(
            e < self.shape.batch && c < self.shape.channels,
            "batch/channel ({}, {}) out of bounds for {}",
            e,
            c,
            self.shape
        );
        let pad = padding as isize;
        debug_assert!(
            h >= -pad && h < self.shape.height as isize + pad,
            "row {} outside the padded range of {}",
            h,
            self.shape
        );
        debug_assert!(
            w >= -pad && w < self.shape.width as isize + pad,
            "col {} outside the padded range of {}",
            w,
            self.shape
        );
        if h < 0 || w < 0 || h >= self.shape.height as isize || w >= self.shape.width as isize {
            return T::zero();
        }
        // SAFETY: all four coordinates were checked against the shape above
        unsafe {
            *self
                .as_slice()
                .get_unchecked(self.shape.offset(e, c, h as usize, w as usize))
        }
    }

    /// Applies a function to each element of the tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation of the result fails.
    pub fn map<U, F>(&self, f: F) -> Result<Tensor<U>, TensorError>
    where
        F: Fn(&T) -> U,
    {
        let data: Vec<U> = self.as_slice().iter().map(f).collect();
        let storage = TensorStorage::from_vec(data)?;
        Ok(Tensor {
            storage,
            shape: self.shape,
        })
    }
}

impl<T: Clone> Clone for Tensor<T> {
    /// Deep-copies the tensor, including its storage.
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            shape: self.shape,
        }
    }
}
