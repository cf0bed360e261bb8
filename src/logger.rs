//! Areq's global logging system.
//!
//! Areq uses the standard [log](https://docs.rs/log/0.4.14/log/) crate, with the
//! [simple_logger](https://docs.rs/simple_logger/1.13.0/simple_logger/) implementation, to enable
//! logging in the entire application.
//!
//! This module only provides an encapsulation of their initialization.

use areq::configuration::LogLevel;
use log::Level;
use log::SetLoggerError;

pub struct Logger {}

impl Logger {
    /// Initialize the global logger with the given level. It must only be used once, since all
    /// subsequent calls will result in a failure.
    pub fn initialize(level: LogLevel) -> Result<(), SetLoggerError> {
        match level {
            LogLevel::Off => Ok(()),
            LogLevel::Error => simple_logger::init_with_level(Level::Error),
            LogLevel::Warn => simple_logger::init_with_level(Level::Warn),
            LogLevel::Info => simple_logger::init_with_level(Level::Info),
            LogLevel::Debug => simple_logger::init_with_level(Level::Debug),
            LogLevel::Trace => simple_logger::init_with_level(Level::Trace),
        }
    }
}
