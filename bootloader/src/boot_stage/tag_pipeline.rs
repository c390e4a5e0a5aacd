//! Legacy tag pipeline
//!
//! The vendor kernel still boots from ATAGs and needs the long list the
//! primary bootloader built, but not the core/initrd/end tags, which are
//! generated again at hand-off. During misc init the kept tags are copied
//! out of the primary bootloader's list (publishing `serial#` on the way);
//! at hand-off the copy is appended to the next-stage list.

use super::environment::BootEnv;
use super::serial;
use crate::config::BoardConfig;
use crate::error::{BootError, Result};
use crate::kernel_if::param_cursor::ParamCursor;
use crate::protocol::atag::{ATAG_SERIAL, TagList};
use crate::protocol::tag_codec;
use alloc::vec::Vec;

/// Result of a successful [`TagPipeline::ingest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Every tag was filtered out; nothing to emit
    Empty,
    /// `len` bytes of tags retained for hand-off
    Retained { len: usize },
    /// The copy buffer could not be allocated; the tags are dropped
    Degraded { requested: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotIngested,
    Empty,
    Retained,
    Degraded,
    Malformed,
}

pub struct TagPipeline {
    retained: Option<Vec<u8>>,
    state: PipelineState,
    copy_budget: usize,
}

impl TagPipeline {
    pub fn new() -> Self {
        Self::from_config(&BoardConfig::default())
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            retained: None,
            state: PipelineState::NotIngested,
            copy_budget: config.tag_copy_budget,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn retained(&self) -> Option<&[u8]> {
        self.retained.as_deref()
    }

    /// Filter `source` and keep a copy of the surviving tags
    ///
    /// A list that does not start with a core tag, or that cannot be walked
    /// to its terminator, is reported and nothing is retained.
    pub fn ingest<E: BootEnv + ?Sized>(&mut self, source: &TagList<'_>, env: &mut E) -> Result<IngestOutcome> {
        self.retained = None;

        let measured = tag_codec::measure_with(source, |tag| {
            if tag.kind() != ATAG_SERIAL {
                return;
            }
            if let Some(Err(err)) = serial::publish_from_tag(&mut *env, tag) {
                log::warn!("Failed to set serial#: {}", err);
            }
        });

        let total = match measured {
            Ok(total) => total,
            Err(err) => {
                log::error!("Invalid atags provided by primary bootloader: {}", err);
                self.state = PipelineState::Malformed;
                return Err(err);
            }
        };

        if total == 0 {
            log::debug!("atags: nothing to copy");
            self.state = PipelineState::Empty;
            return Ok(IngestOutcome::Empty);
        }

        let Some(mut buf) = allocate(total, self.copy_budget) else {
            log::error!("Failed to allocate {} bytes for atags copy: {}", total, BootError::OutOfMemory);
            self.state = PipelineState::Degraded;
            return Ok(IngestOutcome::Degraded { requested: total });
        };

        if let Err(err) = tag_codec::copy_filtered(source, &mut buf) {
            log::error!("atags copy failed: {}", err);
            self.state = PipelineState::Malformed;
            return Err(err);
        }

        log::info!("atags: retained {} bytes from primary bootloader", total);
        self.retained = Some(buf);
        self.state = PipelineState::Retained;
        Ok(IngestOutcome::Retained { len: total })
    }

    /// Append the retained tags at `cursor`; returns the bytes written
    ///
    /// Without a retained copy this is a no-op.
    pub fn emit(&self, cursor: &mut ParamCursor<'_>) -> Result<usize> {
        let Some(buf) = self.retained.as_deref() else {
            return Ok(0);
        };
        cursor.append(buf)?;
        Ok(buf.len())
    }
}

impl Default for TagPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Zeroed buffer of exactly `len` bytes, or `None` if the budget or the
/// heap refuses it
fn allocate(len: usize, budget: usize) -> Option<Vec<u8>> {
    if len > budget {
        return None;
    }
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).ok()?;
    buf.resize(len, 0);
    Some(buf)
}
