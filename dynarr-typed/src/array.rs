use dynarr_common::alloc::{alloc_block, free_block, realloc_block};
use dynarr_common::growth::{adjusted_capacity, align_up, grown_capacity, required_capacity};
use dynarr_common::{ArrayConfig, Error, Result};
use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

/// Metadata stored at the front of the block.
#[repr(C)]
struct Header {
    len: usize,
    cap: usize,
    increment: usize,
}

/// TypedArray is a growable array whose metadata and elements
/// live in one allocation:
///
/// ```text
/// +-----+-----+-----------+---------+---------+-----+
/// | len | cap | increment | elem[0] | elem[1] | ... |
/// +-----+-----+-----------+---------+---------+-----+
/// ```
///
/// The handle itself is a single pointer to the header.
/// Growth and adjustment reallocate the whole block, so metadata
/// and elements always move together. Element pointer is derived
/// from the header pointer on every access and never cached.
///
/// Capacity grows by a fixed `increment` when a push overflows,
/// and is only reduced by an explicit call to [`TypedArray::adjust`].
pub struct TypedArray<T> {
    ptr: NonNull<Header>,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send> Send for TypedArray<T> {}
unsafe impl<T: Sync> Sync for TypedArray<T> {}

impl<T> TypedArray<T> {
    /// Byte offset of first element from start of the block.
    const DATA_OFFSET: usize = align_up(size_of::<Header>(), align_of::<T>());

    /// Create an array with default capacity and increment.
    #[inline]
    pub fn new() -> Result<Self> {
        Self::with_config(&ArrayConfig::default())
    }

    /// Create an array with given capacity.
    /// Increment is set to 2.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_config(&ArrayConfig::default().with_capacity(capacity))
    }

    /// Create an array with given capacity and increment.
    #[inline]
    pub fn with_increment(capacity: usize, increment: usize) -> Result<Self> {
        Self::with_config(&ArrayConfig::new(capacity, increment))
    }

    pub fn with_config(config: &ArrayConfig) -> Result<Self> {
        config.validate()?;
        let layout = Self::layout(config.capacity)?;
        let ptr = alloc_block(layout)?.cast::<Header>();
        // SAFETY:
        //
        // block is freshly allocated, and large and aligned enough for header.
        unsafe {
            ptr.as_ptr().write(Header {
                len: 0,
                cap: config.capacity,
                increment: config.increment,
            });
        }
        Ok(TypedArray {
            ptr,
            _marker: PhantomData,
        })
    }

    /// Returns number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.header().len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns number of allocated element slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.header().cap
    }

    #[inline]
    pub fn increment(&self) -> usize {
        self.header().increment
    }

    /// Append an element at the end.
    ///
    /// If the array is full, capacity grows by increment and the
    /// whole block is reallocated.
    pub fn push(&mut self, elem: T) -> Result<()> {
        let len = self.len();
        self.reserve_one()?;
        // SAFETY:
        //
        // len < capacity is ensured by reserve_one().
        unsafe {
            self.data_ptr().add(len).write(elem);
        }
        self.header_mut().len = len + 1;
        Ok(())
    }

    /// Insert an element at given position, shifting all elements
    /// after it to the right.
    ///
    /// `index == len` is the same as push.
    pub fn insert(&mut self, index: usize, elem: T) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(Error::IndexOutOfBound { index, len });
        }
        self.reserve_one()?;
        // SAFETY:
        //
        // index <= len < capacity, so both source and target ranges
        // are within allocated slots.
        unsafe {
            let p = self.data_ptr().add(index);
            if index < len {
                ptr::copy(p, p.add(1), len - index);
            }
            p.write(elem);
        }
        self.header_mut().len = len + 1;
        Ok(())
    }

    /// Remove and return the element at given position, shifting
    /// all elements after it to the left.
    ///
    /// Capacity is never changed. Call [`TypedArray::adjust`] after
    /// large removals to release memory.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfBound { index, len });
        }
        // SAFETY:
        //
        // index < len, the value is moved out and its slot is
        // overwritten by the tail segment or excluded by length.
        let value = unsafe {
            let p = self.data_ptr().add(index);
            let value = p.read();
            if index < len - 1 {
                ptr::copy(p.add(1), p, len - index - 1);
            }
            value
        };
        self.header_mut().len = len - 1;
        Ok(value)
    }

    /// Remove and return the last element.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.header_mut().len = len - 1;
        // SAFETY:
        //
        // slot at len - 1 was initialized and is now excluded by length.
        Some(unsafe { self.data_ptr().add(len - 1).read() })
    }

    /// Shrink or grow capacity to the smallest multiple of increment
    /// that holds all elements.
    /// Calling it repeatedly without other changes is no-op.
    pub fn adjust(&mut self) -> Result<()> {
        let cap = adjusted_capacity(self.len(), self.increment())?;
        if cap != self.capacity() {
            self.realloc_to(cap)?;
        }
        Ok(())
    }

    /// Append all elements of the iterator, growing capacity
    /// by increment steps.
    ///
    /// Capacity for the iterator's lower size bound is reserved up front.
    /// If a later growth fails, elements appended before the failure
    /// stay in the array.
    pub fn extend_from_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) -> Result<()> {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let n = self
            .len()
            .checked_add(lower)
            .ok_or(Error::CapacityOverflow)?;
        let cap = required_capacity(self.capacity(), self.increment(), n)?;
        if cap != self.capacity() {
            self.realloc_to(cap)?;
        }
        for elem in iter {
            self.push(elem)?;
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<&T> {
        let len = self.len();
        self.as_slice()
            .get(index)
            .ok_or(Error::IndexOutOfBound { index, len })
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len();
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(Error::IndexOutOfBound { index, len })
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY:
        //
        // first len slots are always initialized, and data pointer is
        // non-null and aligned even if no element is allocated.
        unsafe { std::slice::from_raw_parts(self.data_ptr(), self.len()) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY:
        //
        // same as as_slice(), and self is exclusively borrowed.
        unsafe { std::slice::from_raw_parts_mut(self.data_ptr(), self.len()) }
    }

    /// Release the array and all its elements.
    #[inline]
    pub fn delete(self) {
        drop(self)
    }

    #[inline]
    fn header(&self) -> &Header {
        // SAFETY:
        //
        // header is written at creation and the pointer always
        // tracks the latest block.
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    fn header_mut(&mut self) -> &mut Header {
        // SAFETY:
        //
        // same as header().
        unsafe { self.ptr.as_mut() }
    }

    #[inline]
    fn data_ptr(&self) -> *mut T {
        // SAFETY:
        //
        // block is at least DATA_OFFSET bytes because it always contains
        // header padded to element alignment.
        unsafe { (self.ptr.as_ptr() as *mut u8).add(Self::DATA_OFFSET) as *mut T }
    }

    #[inline]
    fn layout(cap: usize) -> Result<Layout> {
        let (layout, offset) = Layout::new::<Header>().extend(Layout::array::<T>(cap)?)?;
        debug_assert_eq!(Self::DATA_OFFSET, offset);
        Ok(layout)
    }

    #[inline]
    fn reserve_one(&mut self) -> Result<()> {
        if self.len() < self.capacity() {
            return Ok(());
        }
        let cap = grown_capacity(self.capacity(), self.increment())?;
        self.realloc_to(cap)
    }

    fn realloc_to(&mut self, cap: usize) -> Result<()> {
        debug_assert!(cap >= self.len());
        let old_cap = self.capacity();
        let old_layout = Self::layout(old_cap)?;
        let new_layout = Self::layout(cap)?;
        // SAFETY:
        //
        // block was allocated with old layout, and its pointer is
        // replaced with the new one right after the call.
        let ptr = unsafe { realloc_block(self.ptr.cast(), old_layout, new_layout.size())? };
        self.ptr = ptr.cast();
        self.header_mut().cap = cap;
        log::trace!(
            "typed array of {} reallocated, capacity {} -> {}",
            std::any::type_name::<T>(),
            old_cap,
            cap
        );
        Ok(())
    }
}

impl<T> Drop for TypedArray<T> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY:
        //
        // live elements are dropped exactly once, then the block is
        // released with the layout it was allocated with.
        unsafe {
            ptr::drop_in_place(self.as_mut_slice());
            if let Ok(layout) = Self::layout(self.capacity()) {
                free_block(self.ptr.cast(), layout);
            }
        }
    }
}

impl<T> Deref for TypedArray<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for TypedArray<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for TypedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
