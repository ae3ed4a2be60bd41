//! Platform detection module
//!
//! Derives the immutable [`PlatformDescriptor`] (OS family plus OS and process
//! bitness) that decides which installation locations are worth probing.

mod detection;
mod error;

pub use detection::{DefaultPlatformDetector, OsFamily, PlatformDescriptor, PlatformDetector};
pub use error::PlatformError;
