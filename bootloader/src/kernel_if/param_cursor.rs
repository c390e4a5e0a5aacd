// Write cursor over the next-stage boot parameter buffer

use crate::error::{BootError, Result};

/// Appends raw bytes to the parameter block handed to the next stage
///
/// The cursor never frames anything itself; callers own the list layout.
pub struct ParamCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ParamCursor<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current write offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Copy `bytes` at the cursor and advance past them
    pub fn append(&mut self, bytes: &[u8]) -> Result {
        let available = self.remaining();
        if bytes.len() > available {
            return Err(BootError::ParamsOverflow {
                needed: bytes.len(),
                available,
            });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    pub fn append_u32(&mut self, word: u32) -> Result {
        self.append(&word.to_ne_bytes())
    }
}
