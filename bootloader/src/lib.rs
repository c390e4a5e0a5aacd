//! NOS Board Stage Library
//!
//! Board support for the hand-off between the vendor primary bootloader and
//! the secondary loader on ST-Ericsson U8500 phones ("nypon").
//!
//! Two subsystems run back to back during post-relocation init:
//! - the key boot selector samples the volume keys described by the device
//!   tree and rewrites `bootcmd` / `preboot`;
//! - the tag pipeline copies the legacy ATAG list of the primary bootloader,
//!   minus the tags regenerated downstream, and publishes `serial#`.
//!
//! At hand-off the retained tags are spliced into the next-stage ATAG list.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// ============================================================================
// MODULE HIERARCHY
// ============================================================================

/// Board configuration and limits
pub mod config;

/// Error types shared by every subsystem
pub mod error;

/// Boot protocol - legacy ATAG list model and codec
pub mod protocol;

/// Kernel interface - next-stage parameter block output
pub mod kernel_if;

/// Boot stage - environment, serial extraction, tag pipeline, key selection
pub mod boot_stage;

/// Device capabilities - device tree queries and GPIO lines
pub mod drivers;

/// Platform - clock gating, DRAM probe, board descriptor
pub mod platform;

/// Application layer - board context threaded through the boot sequence
pub mod application;

/// Diagnostics - console logger
pub mod diagnostics;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use application::board_context::{BoardContext, FirmwareHandoff, MiscInitReport};
pub use boot_stage::environment::{BootEnv, EnvStore};
pub use boot_stage::key_select::{KeyBootSelector, KeyOverrides};
pub use boot_stage::tag_pipeline::{IngestOutcome, TagPipeline};
pub use config::BoardConfig;
pub use error::{BootError, Result};
pub use kernel_if::param_cursor::ParamCursor;
pub use protocol::atag::TagList;
