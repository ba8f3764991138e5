//! Shared error and configuration types for the cvbench workspace

pub mod config;
pub mod error;

pub use config::{ChartConfig, ClientConfig, ServerConfig, ViewerConfig};
pub use error::{Result, ViewerError};
