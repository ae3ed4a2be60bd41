pub mod commands;
pub mod config;
pub mod finder;
pub mod platform;
pub mod runtime;
