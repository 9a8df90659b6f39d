//! Capacity policy shared by both array engines.
//!
//! Capacity moves in fixed steps of `increment`: it grows by exactly
//! one step when a push overflows, and shrinks only on an explicit
//! adjust, to the smallest multiple of `increment` that still holds
//! all live elements.
use crate::error::{Error, Result};

/// Returns capacity after one growth step.
#[inline]
pub fn grown_capacity(capacity: usize, increment: usize) -> Result<usize> {
    capacity
        .checked_add(increment)
        .ok_or(Error::CapacityOverflow)
}

/// Returns the smallest `capacity + increment * k` which is
/// not less than `n`.
#[inline]
pub fn required_capacity(capacity: usize, increment: usize, n: usize) -> Result<usize> {
    if n <= capacity {
        return Ok(capacity);
    }
    if increment == 0 {
        return Err(Error::InvalidArgument("increment must be positive"));
    }
    let steps = (n - capacity).div_ceil(increment);
    steps
        .checked_mul(increment)
        .and_then(|v| v.checked_add(capacity))
        .ok_or(Error::CapacityOverflow)
}

/// Returns the adjusted capacity for given length.
///
/// The formula is `len - 1 - (len - 1) % increment + increment`,
/// which rounds length up to next multiple of increment.
/// Empty array keeps one bucket.
#[inline]
pub fn adjusted_capacity(len: usize, increment: usize) -> Result<usize> {
    if increment == 0 {
        return Err(Error::InvalidArgument("increment must be positive"));
    }
    if len == 0 {
        return Ok(increment);
    }
    let last = len - 1;
    (last - last % increment)
        .checked_add(increment)
        .ok_or(Error::CapacityOverflow)
}

/// Align value to given power of two.
#[inline]
pub const fn align_up(v: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (v + align - 1) & !(align - 1)
}
