//! Logging utilities.
//!
//! Library code only uses the `log` facade; binaries and tests install the
//! `env_logger` backend through [`init_logging`].

mod init;

pub use init::{init_logging, LoggingConfig};
