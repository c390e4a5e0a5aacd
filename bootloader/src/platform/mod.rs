//! Platform - clock gating, DRAM probe, board descriptor

pub mod board;
pub mod dram;
pub mod prcc;

pub use board::BoardInfo;
pub use dram::{MemoryWindow, get_ram_size};
pub use prcc::RegisterBus;
