//! Type definitions for zaptec-reporter

mod api;
mod error;
mod usage;

pub use api::*;
pub use error::*;
pub use usage::*;
