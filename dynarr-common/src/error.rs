use std::alloc::LayoutError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("insufficient memory({0})")]
    InsufficientMemory(usize),
    #[error("capacity overflow")]
    CapacityOverflow,
    #[error("index out of bound({index}), length is {len}")]
    IndexOutOfBound { index: usize, len: usize },
    #[error("stride mismatch, expected {expected} but got {actual}")]
    StrideMismatch { expected: usize, actual: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl From<LayoutError> for Error {
    #[inline]
    fn from(_src: LayoutError) -> Self {
        Error::CapacityOverflow
    }
}
