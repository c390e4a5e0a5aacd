//! ATAG List Writer
//!
//! Frames the tag list passed to the next stage: a core tag first, the end
//! tag last, and whatever the board adds in between. The fragment retained
//! from the primary bootloader is spliced in through [`AtagWriter::cursor`].

use super::param_cursor::ParamCursor;
use crate::error::Result;
use crate::protocol::atag::{
    ATAG_CMDLINE, ATAG_CORE, ATAG_INITRD2, ATAG_MEM, ATAG_NONE, ATAG_REVISION, ATAG_SERIAL, CoreTag,
    MemTag, SerialNumber, TAG_HEADER_BYTES, TAG_HEADER_WORDS,
};

pub struct AtagWriter<'c, 'a> {
    cursor: &'c mut ParamCursor<'a>,
    start: usize,
}

impl<'c, 'a> AtagWriter<'c, 'a> {
    /// Begin a list at the cursor with a core tag
    pub fn start(cursor: &'c mut ParamCursor<'a>, core: CoreTag) -> Result<Self> {
        let start = cursor.position();
        let mut writer = Self { cursor, start };
        writer.tag(ATAG_CORE, &[core.flags, core.page_size, core.root_dev])?;
        Ok(writer)
    }

    fn tag(&mut self, kind: u32, payload: &[u32]) -> Result {
        self.cursor.append_u32(TAG_HEADER_WORDS + payload.len() as u32)?;
        self.cursor.append_u32(kind)?;
        for &word in payload {
            self.cursor.append_u32(word)?;
        }
        Ok(())
    }

    pub fn mem(&mut self, mem: MemTag) -> Result {
        self.tag(ATAG_MEM, &[mem.size, mem.start])
    }

    pub fn serial(&mut self, serial: SerialNumber) -> Result {
        self.tag(ATAG_SERIAL, &[serial.low, serial.high])
    }

    pub fn revision(&mut self, rev: u32) -> Result {
        self.tag(ATAG_REVISION, &[rev])
    }

    /// Initrd location as `INITRD2` (physical start, size)
    pub fn initrd(&mut self, start: u32, end: u32) -> Result {
        self.tag(ATAG_INITRD2, &[start, end.saturating_sub(start)])
    }

    /// NUL terminated command line, padded to a word; blank lines are skipped
    pub fn cmdline(&mut self, cmdline: &str) -> Result {
        let text = cmdline.trim_start_matches(' ');
        if text.is_empty() {
            return Ok(());
        }

        let bytes = text.len() + 1;
        let words = (TAG_HEADER_BYTES + bytes).div_ceil(4);
        self.cursor.append_u32(words as u32)?;
        self.cursor.append_u32(ATAG_CMDLINE)?;
        self.cursor.append(text.as_bytes())?;
        let pad = words * 4 - TAG_HEADER_BYTES - text.len();
        self.cursor.append(&[0u8; 4][..pad])
    }

    /// Cursor positioned after the last tag, for splicing raw fragments
    pub fn cursor(&mut self) -> &mut ParamCursor<'a> {
        self.cursor
    }

    /// Close the list with the end tag; returns the list length in bytes
    pub fn finish(self) -> Result<usize> {
        self.cursor.append_u32(0)?;
        self.cursor.append_u32(ATAG_NONE)?;
        Ok(self.cursor.position() - self.start)
    }
}
