use crate::error::{Error, Result};

/// Creation parameters of an array.
///
/// `capacity` is the number of element slots allocated up front.
/// `increment` is the step used both to grow capacity when it is
/// exhausted, and to compute the adjusted capacity after removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayConfig {
    pub capacity: usize,
    pub increment: usize,
}

impl ArrayConfig {
    pub const DEFAULT_CAPACITY: usize = 2;
    pub const DEFAULT_INCREMENT: usize = 2;

    #[inline]
    pub const fn new(capacity: usize, increment: usize) -> Self {
        ArrayConfig {
            capacity,
            increment,
        }
    }

    #[inline]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[inline]
    pub const fn with_increment(mut self, increment: usize) -> Self {
        self.increment = increment;
        self
    }

    /// Check that the config can be used to create an array.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.increment == 0 {
            return Err(Error::InvalidArgument("increment must be positive"));
        }
        Ok(())
    }
}

impl Default for ArrayConfig {
    #[inline]
    fn default() -> Self {
        ArrayConfig::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_INCREMENT)
    }
}
