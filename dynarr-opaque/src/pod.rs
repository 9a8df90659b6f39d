//! Typed access to opaque arrays.
//!
//! Element zero is aligned to [`ALIGNMENT`], and each element starts at a
//! multiple of stride, so an array whose stride equals the size of a
//! plain-old-data type can be viewed as a slice of that type in place.
use crate::array::OpaqueArray;
use bytemuck::Pod;
use dynarr_common::alloc::ALIGNMENT;
use dynarr_common::{Error, Result};
use std::mem::{align_of, size_of};

impl OpaqueArray {
    /// Insert a value at given position.
    #[inline]
    pub fn push_value_at<T: Pod>(&mut self, index: usize, value: T) -> Result<()> {
        self.check_type::<T>()?;
        self.push_at(index, bytemuck::bytes_of(&value))
    }

    #[inline]
    pub fn push_value<T: Pod>(&mut self, value: T) -> Result<()> {
        self.push_value_at(self.len(), value)
    }

    #[inline]
    pub fn push_value_front<T: Pod>(&mut self, value: T) -> Result<()> {
        self.push_value_at(0, value)
    }

    /// Remove and return the value at given position.
    #[inline]
    pub fn pop_value_at<T: Pod>(&mut self, index: usize) -> Result<T> {
        self.check_type::<T>()?;
        let mut value = T::zeroed();
        self.pop_at(index, Some(bytemuck::bytes_of_mut(&mut value)))?;
        Ok(value)
    }

    #[inline]
    pub fn pop_value<T: Pod>(&mut self) -> Result<T> {
        let index = self
            .len()
            .checked_sub(1)
            .ok_or(Error::IndexOutOfBound { index: 0, len: 0 })?;
        self.pop_value_at(index)
    }

    #[inline]
    pub fn pop_value_front<T: Pod>(&mut self) -> Result<T> {
        self.pop_value_at(0)
    }

    /// View live elements as a slice of T.
    #[inline]
    pub fn as_slice<T: Pod>(&self) -> Result<&[T]> {
        self.check_type::<T>()?;
        bytemuck::try_cast_slice(self.as_bytes())
            .map_err(|_| Error::InvalidArgument("cannot cast element bytes"))
    }

    #[inline]
    pub fn as_mut_slice<T: Pod>(&mut self) -> Result<&mut [T]> {
        self.check_type::<T>()?;
        bytemuck::try_cast_slice_mut(self.as_bytes_mut())
            .map_err(|_| Error::InvalidArgument("cannot cast element bytes"))
    }

    #[inline]
    fn check_type<T>(&self) -> Result<()> {
        let stride = self.stride();
        if size_of::<T>() != stride {
            return Err(Error::StrideMismatch {
                expected: stride,
                actual: size_of::<T>(),
            });
        }
        if align_of::<T>() > ALIGNMENT {
            return Err(Error::InvalidArgument("element alignment exceeds 16 bytes"));
        }
        Ok(())
    }
}
