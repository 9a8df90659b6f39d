//! Common building blocks of dynarr.
//!
//! Both array engines allocate a single block holding metadata
//! followed by element storage, and share the same capacity policy.
pub mod alloc;
pub mod config;
pub mod error;
pub mod growth;

pub use config::ArrayConfig;
pub use error::{Error, Result};
