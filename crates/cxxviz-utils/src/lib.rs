//! # cxxviz utilities
//!
//! Logging setup shared by the cxxviz binary and by debugger hosts that embed
//! the visualizers.

pub mod logging;

pub use logging::{
    init_logging, init_logging_for_host, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};
