//! Exclusive raw-buffer storage for tensor data.
//!
//! Each `TensorStorage` owns its allocation outright: cloning copies the
//! buffer and dropping frees it exactly once. There is no reference counting
//! and no views — a buffer is never aliased between two live tensors. The
//! convolution dispatchers rely on this to hand disjoint mutable regions of
//! an output buffer to worker threads without any aliasing hazard.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use thiserror::Error;

/// Errors produced by storage allocation and conversion.
#[derive(Error, Debug, PartialEq)]
pub enum StorageError {
    /// The requested layout is invalid for the target platform.
    #[error("Invalid memory layout: {0}")]
    LayoutError(#[from] std::alloc::LayoutError),

    /// The allocator returned a null pointer.
    #[error("Allocation returned a null pointer")]
    NullPointer,

    /// A zero-sized buffer was requested.
    #[error("Storage must hold at least one element")]
    ZeroSize,
}

/// An exclusively owned, heap-allocated buffer of elements of type `T`.
///
/// # Thread Safety
///
/// `TensorStorage` is `Send + Sync` when `T` is. Shared references only
/// permit reads; mutation goes through `&mut self`, which the borrow checker
/// keeps exclusive.
///
/// # Memory Management
///
/// The buffer is released when the storage is dropped. Constructors reject
/// zero-sized buffers, so `ptr` always refers to a live allocation.
///
/// The storage is intended for plain-old-data element types: dropping it
/// releases the memory but never runs element destructors, because elements
/// created through [`TensorStorage::new_uninit`] may never have been
/// initialized. Use [`TensorStorage::into_vec`] to recover a vector that
/// drops its elements normally.
pub struct TensorStorage<T> {
    /// The pointer to the buffer, which must be non-null.
    ptr: NonNull<T>,
    /// The number of elements in the buffer.
    len: usize,
    /// The memory layout used for allocation.
    layout: Layout,
}

impl<T> TensorStorage<T> {
    /// Creates storage by taking over the buffer of a vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector holds no elements, the element type
    /// is zero-sized, or the layout cannot be computed.
    pub fn from_vec(value: Vec<T>) -> Result<Self, StorageError> {
        // The length is what counts: a vector with spare capacity but no
        // elements is still an empty buffer.
        if value.is_empty() {
            return Err(StorageError::ZeroSize);
        }
        // The layout mirrors the vector's full allocation (capacity, not
        // length), so the buffer can be released in `Drop` without tracking
        // capacity separately.
        let layout = Layout::array::<T>(value.capacity())?;
        if layout.size() == 0 {
            // zero-sized element types never allocate
            return Err(StorageError::ZeroSize);
        }
        let mut value = std::mem::ManuallyDrop::new(value);
        let len = value.len();
        let ptr = NonNull::new(value.as_mut_ptr()).ok_or(StorageError::NullPointer)?;
        Ok(Self { ptr, len, layout })
    }

    /// Allocates storage for `len` elements without initializing them.
    ///
    /// # Safety
    ///
    /// Every element must be written before it is read. Reading an element
    /// that was never written is undefined behavior; the caller takes over
    /// the role of the initializer.
    pub unsafe fn new_uninit(len: usize) -> Result<Self, StorageError> {
        let layout = Layout::array::<T>(len)?;
        if layout.size() == 0 {
            return Err(StorageError::ZeroSize);
        }
        // SAFETY: layout has a non-zero size (checked above)
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw as *mut T).ok_or(StorageError::NullPointer)?;
        Ok(Self { ptr, len, layout })
    }

    /// Returns the pointer to the buffer.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns the mutable pointer to the buffer.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns the storage data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: ptr is valid for len elements and properly aligned
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the storage data as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: ptr is valid for len elements and &mut self guarantees
        // exclusive access to the exclusively owned buffer
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the number of elements in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer holds no elements.
    ///
    /// Always false for a live storage; constructors reject empty buffers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the memory layout of the allocation.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Consumes the storage and returns the data as a vector.
    pub fn into_vec(self) -> Vec<T> {
        let this = std::mem::ManuallyDrop::new(self);
        let capacity = this.layout.size() / std::mem::size_of::<T>();
        // SAFETY: ptr, len and capacity describe the allocation made in
        // `from_vec` or `new_uninit`; wrapping self in ManuallyDrop prevents
        // a double free
        unsafe { Vec::from_raw_parts(this.ptr.as_ptr(), this.len, capacity) }
    }
}

// SAFETY: TensorStorage can be sent between threads because:
// - the buffer is exclusively owned (no shared reference count)
// - T: Send allows the elements to move with it
unsafe impl<T: Send> Send for TensorStorage<T> {}

// SAFETY: TensorStorage can be shared between threads because:
// - shared references only expose reads of the buffer
// - mutation requires &mut self, which the borrow checker keeps exclusive
// - T: Sync allows concurrent reads of the elements
unsafe impl<T: Sync> Sync for TensorStorage<T> {}

impl<T> Drop for TensorStorage<T> {
    fn drop(&mut self) {
        // SAFETY: ptr and layout were created together during allocation and
        // this storage is the sole owner of the buffer
        unsafe { alloc::dealloc(self.ptr.as_ptr() as *mut u8, self.layout) }
    }
}

impl<T: Clone> Clone for TensorStorage<T> {
    /// Copies the buffer. Storage is exclusively owned, so cloning always
    /// duplicates the memory.
    fn clone(&self) -> Self {
        Self::from_vec(self.as_slice().to_vec())
            .expect("re-allocating an existing buffer cannot fail")
    }
}

impl<T> std::fmt::Debug for TensorStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorStorage")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("layout", &self.layout)
            .finish()
    }
}
