//! ReelCues Core Engine
//!
//! Caption segmentation, post-processing, caption file formats and the
//! settings that drive them.

pub mod captions;
pub mod fs;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
