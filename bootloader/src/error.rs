//! Board stage error handling
//!
//! This module defines the error types used throughout the board stage
//! for consistent error reporting. None of these errors stop the boot:
//! every caller has a degraded path and only logs what went wrong.

use core::fmt;

/// Board stage error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// Tag list from the primary bootloader cannot be trusted
    MalformedTags {
        /// Kind of the offending tag
        kind: u32,
        /// Byte offset of the offending tag from the list base
        offset: usize,
    },
    /// A tag header declares a size smaller than the header itself
    InvalidTag {
        kind: u32,
        offset: usize,
    },
    /// Walk hit the tag count or byte span limit before the terminator
    TagListTooLong,

    /// Memory errors
    OutOfMemory,

    /// Next-stage parameter buffer is full
    ParamsOverflow {
        needed: usize,
        available: usize,
    },

    /// Boot environment errors
    EnvFull,
    InvalidEnvKey,

    /// Device tree / GPIO errors
    MissingDocument,
    UnresolvedBinding(&'static str),
    InvalidGpioSpec,
    GpioRequestFailed(i32),
    GpioReadFailed(i32),

    /// Diagnostics
    LoggerAlreadySet,
}

impl BootError {
    /// Convert to an error code suitable for a console report
    pub fn as_error_code(&self) -> u32 {
        match self {
            BootError::MalformedTags { .. } => 0x1000,
            BootError::InvalidTag { .. } => 0x1001,
            BootError::TagListTooLong => 0x1002,
            BootError::OutOfMemory => 0x2002,
            BootError::ParamsOverflow { .. } => 0x2100,
            BootError::EnvFull => 0xA100,
            BootError::InvalidEnvKey => 0xA101,
            BootError::MissingDocument => 0x6100,
            BootError::UnresolvedBinding(_) => 0x6101,
            BootError::InvalidGpioSpec => 0x6102,
            BootError::GpioRequestFailed(_) => 0x6103,
            BootError::GpioReadFailed(_) => 0x6104,
            BootError::LoggerAlreadySet => 0xE100,
        }
    }

    /// Get a human-readable description of the error
    pub fn description(&self) -> &'static str {
        match self {
            BootError::MalformedTags { .. } => "Invalid atags provided by primary bootloader",
            BootError::InvalidTag { .. } => "Tag size smaller than tag header",
            BootError::TagListTooLong => "Tag list is not terminated within limits",
            BootError::OutOfMemory => "Out of memory",
            BootError::ParamsOverflow { .. } => "Boot parameter buffer overflow",
            BootError::EnvFull => "Boot environment is full",
            BootError::InvalidEnvKey => "Invalid environment variable name",
            BootError::MissingDocument => "No device tree available",
            BootError::UnresolvedBinding(name) => name,
            BootError::InvalidGpioSpec => "Malformed gpios property",
            BootError::GpioRequestFailed(_) => "GPIO request rejected",
            BootError::GpioReadFailed(_) => "GPIO read failed",
            BootError::LoggerAlreadySet => "Logger already installed",
        }
    }

    /// Check if the boot can continue with reduced functionality
    pub fn is_recoverable(&self) -> bool {
        match self {
            BootError::ParamsOverflow { .. } => false,
            _ => true,
        }
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::MalformedTags { kind, offset } | BootError::InvalidTag { kind, offset } => {
                write!(
                    f,
                    "BootError: {}: tag {:#x} at offset {:#x} (code: {:#x})",
                    self.description(),
                    kind,
                    offset,
                    self.as_error_code()
                )
            }
            BootError::ParamsOverflow { needed, available } => write!(
                f,
                "BootError: {}: need {} bytes, {} left (code: {:#x})",
                self.description(),
                needed,
                available,
                self.as_error_code()
            ),
            BootError::GpioRequestFailed(ret) | BootError::GpioReadFailed(ret) => write!(
                f,
                "BootError: {}: {} (code: {:#x})",
                self.description(),
                ret,
                self.as_error_code()
            ),
            _ => write!(f, "BootError: {} (code: {:#x})", self.description(), self.as_error_code()),
        }
    }
}

/// Result type used throughout the board stage
pub type Result<T = ()> = core::result::Result<T, BootError>;
