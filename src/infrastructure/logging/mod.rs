//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - stderr output, pretty or JSON
//! - optional rolling JSON log file
//! - Secret scrubbing

pub mod config;
pub mod logger;
pub mod secret_scrubbing;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
pub use secret_scrubbing::{ScrubbingMakeWriter, SecretScrubber};
