//! Diagnostics - console logger

pub mod console_logger;

pub use console_logger::ConsoleLogger;
