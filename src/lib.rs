pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod stats;

pub use error::{PipelineError, Result};
