//! Shared workloads for benchmarks and examples.
use dynarr_common::{ArrayConfig, Result};
use dynarr_opaque::OpaqueArray;
use dynarr_typed::TypedArray;
use std::time::Duration;

/// Value pushed at position i by all workloads.
#[inline]
pub fn value_at(i: usize) -> i32 {
    ((i + 1) * 2) as i32
}

/// Push n values into a typed array created with given config.
pub fn fill_typed(config: &ArrayConfig, n: usize) -> Result<TypedArray<i32>> {
    let mut arr = TypedArray::with_config(config)?;
    for i in 0..n {
        arr.push(value_at(i))?;
    }
    Ok(arr)
}

/// Push n values into an opaque array created with given config.
pub fn fill_opaque(config: &ArrayConfig, n: usize) -> Result<OpaqueArray> {
    let mut arr = OpaqueArray::with_config::<i32>(config)?;
    for i in 0..n {
        arr.push_value(value_at(i))?;
    }
    Ok(arr)
}

/// One-line summary of typed array metadata.
pub fn typed_details<T>(arr: &TypedArray<T>) -> String {
    format!(
        "length={} capacity={} increment={}",
        arr.len(),
        arr.capacity(),
        arr.increment()
    )
}

/// One-line summary of opaque array metadata.
pub fn opaque_details(arr: &OpaqueArray) -> String {
    format!(
        "length={} capacity={} increment={} stride={}",
        arr.len(),
        arr.capacity(),
        arr.increment(),
        arr.stride()
    )
}

/// Average duration of given number of rounds.
/// Zero rounds is treated as one.
#[inline]
pub fn average(total: Duration, times: usize) -> Duration {
    let nanos = total.as_nanos() / times.max(1) as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
