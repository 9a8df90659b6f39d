//! Typed dynamic array.
//!
//! [`TypedArray`] keeps its length, capacity and increment in a small
//! header at the front of the same block that stores elements, so the
//! array handle is one pointer wide.
//!
//! ```
//! use dynarr_typed::TypedArray;
//!
//! let mut arr = TypedArray::with_capacity(2).unwrap();
//! arr.push(1).unwrap();
//! arr.push(2).unwrap();
//! arr.push(3).unwrap();
//! assert_eq!(4, arr.capacity());
//! assert_eq!(1, arr.remove_at(0).unwrap());
//! arr.adjust().unwrap();
//! assert_eq!(2, arr.capacity());
//! assert_eq!(&[2, 3], &arr[..]);
//! ```
mod array;

pub use array::TypedArray;
pub use dynarr_common::{ArrayConfig, Error, Result};
