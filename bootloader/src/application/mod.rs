//! Application layer - board hooks driven by the loader

pub mod board_context;

pub use board_context::{BoardContext, FirmwareHandoff, MiscInitReport};
