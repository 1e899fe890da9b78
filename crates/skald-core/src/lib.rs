pub mod config;
pub mod error;
pub mod hash;
pub mod ids;
pub mod redact;
pub mod tokens;
pub mod types;

pub use error::PipelineError;
pub use types::*;
