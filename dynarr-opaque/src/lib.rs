//! Type-erased dynamic array.
//!
//! [`OpaqueArray`] stores element size as a runtime stride, and keeps
//! its metadata in a hidden header right before element zero. Elements
//! are moved in and out as raw bytes, or as plain-old-data values
//! through the typed helpers.
//!
//! ```
//! use dynarr_opaque::OpaqueArray;
//!
//! let mut arr = OpaqueArray::new::<i32>().unwrap();
//! for v in [10, 20, 30] {
//!     arr.push_value(v).unwrap();
//! }
//! assert_eq!(4, arr.capacity());
//! assert_eq!(Ok(20), arr.pop_value_at::<i32>(1));
//! assert_eq!(Ok(&[10, 30][..]), arr.as_slice::<i32>());
//! ```
mod array;
mod header;
mod pod;

pub use array::OpaqueArray;
pub use dynarr_common::{ArrayConfig, Error, Result};
pub use header::{Field, HEADER_SIZE};
