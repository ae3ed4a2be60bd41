use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Platform '{0}' is not supported (expected windows, linux or macos)")]
    UnsupportedPlatform(String),
}
