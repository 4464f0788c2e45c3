//! Utility modules

pub mod backoff;
pub mod names;
