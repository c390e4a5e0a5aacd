// Legacy ARM boot tag (ATAG) structures and parsing

use crate::config::{DEFAULT_MAX_TAG_SPAN, DEFAULT_MAX_TAGS};
use crate::error::{BootError, Result};
use arrayvec::ArrayString;
use core::fmt::Write;
use static_assertions::{assert_eq_align, assert_eq_size};

/// Tag header as laid out by the primary bootloader: size first, then kind
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    /// Record size in 32-bit words, header included
    pub size: u32,
    pub tag: u32,
}

assert_eq_size!(TagHeader, [u32; 2]);
assert_eq_align!(TagHeader, u32);

pub const TAG_HEADER_WORDS: u32 = 2;
pub const TAG_HEADER_BYTES: usize = 8;

pub const ATAG_NONE: u32 = 0x0000_0000;
pub const ATAG_CORE: u32 = 0x5441_0001;
pub const ATAG_MEM: u32 = 0x5441_0002;
pub const ATAG_VIDEOTEXT: u32 = 0x5441_0003;
pub const ATAG_RAMDISK: u32 = 0x5441_0004;
pub const ATAG_INITRD: u32 = 0x5441_0005;
pub const ATAG_INITRD2: u32 = 0x5442_0005;
pub const ATAG_SERIAL: u32 = 0x5441_0006;
pub const ATAG_REVISION: u32 = 0x5441_0007;
pub const ATAG_VIDEOLFB: u32 = 0x5441_0008;
pub const ATAG_CMDLINE: u32 = 0x5441_0009;

/// Board serial number carried by `ATAG_SERIAL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialNumber {
    pub high: u32,
    pub low: u32,
}

impl SerialNumber {
    pub const fn new(high: u32, low: u32) -> Self {
        Self { high, low }
    }

    /// Render as 16 lowercase hex digits, high word first
    pub fn to_hex(&self) -> ArrayString<16> {
        let mut out = ArrayString::new();
        // 2 x 8 digits always fit
        let _ = write!(out, "{:08x}{:08x}", self.high, self.low);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoreTag {
    pub flags: u32,
    pub page_size: u32,
    pub root_dev: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemTag {
    pub size: u32,
    pub start: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitrdTag {
    pub start: u32,
    pub size: u32,
}

/// Decoded view of a tag payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPayload<'a> {
    Core(CoreTag),
    Mem(MemTag),
    Initrd(InitrdTag),
    Serial(SerialNumber),
    Revision(u32),
    /// Command line bytes up to (not including) the NUL
    Cmdline(&'a [u8]),
    /// Unrecognized kind, or a recognized kind with a truncated payload
    Other(&'a [u8]),
}

/// Borrowed view of one tag inside a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRef<'a> {
    offset: usize,
    header: TagHeader,
    record: &'a [u8],
}

impl<'a> TagRef<'a> {
    pub fn kind(&self) -> u32 {
        self.header.tag
    }

    pub fn size_words(&self) -> u32 {
        self.header.size
    }

    pub fn header(&self) -> TagHeader {
        self.header
    }

    /// Byte offset of the tag from the list base
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Full record, header included, exactly `size_words * 4` bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.record
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.record[TAG_HEADER_BYTES..]
    }

    pub fn decode(&self) -> TagPayload<'a> {
        let payload = self.payload();
        let decoded = match self.kind() {
            ATAG_CORE if payload.is_empty() => Some(TagPayload::Core(CoreTag::default())),
            ATAG_CORE => read_words::<3>(payload).map(|[flags, page_size, root_dev]| {
                TagPayload::Core(CoreTag { flags, page_size, root_dev })
            }),
            ATAG_MEM => read_words::<2>(payload).map(|[size, start]| TagPayload::Mem(MemTag { size, start })),
            ATAG_INITRD | ATAG_INITRD2 => read_words::<2>(payload)
                .map(|[start, size]| TagPayload::Initrd(InitrdTag { start, size })),
            // Payload order is low word, then high word
            ATAG_SERIAL => {
                read_words::<2>(payload).map(|[low, high]| TagPayload::Serial(SerialNumber { high, low }))
            }
            ATAG_REVISION => read_words::<1>(payload).map(|[rev]| TagPayload::Revision(rev)),
            ATAG_CMDLINE => {
                let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
                Some(TagPayload::Cmdline(&payload[..end]))
            }
            _ => None,
        };
        decoded.unwrap_or(TagPayload::Other(payload))
    }
}

fn read_words<const N: usize>(bytes: &[u8]) -> Option<[u32; N]> {
    if bytes.len() < N * 4 {
        return None;
    }
    let mut words = [0u32; N];
    for (i, word) in words.iter_mut().enumerate() {
        *word = read_u32(bytes, i * 4)?;
    }
    Some(words)
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn read_header(bytes: &[u8], at: usize) -> Option<TagHeader> {
    Some(TagHeader {
        size: read_u32(bytes, at)?,
        tag: read_u32(bytes, at + 4)?,
    })
}

/// Read-only view of a tag list handed over by the primary bootloader
///
/// The list carries no overall length; the walk relies on each tag's size
/// and on the terminator. `max_tags` and the slice length bound it.
#[derive(Debug, Clone, Copy)]
pub struct TagList<'a> {
    bytes: &'a [u8],
    max_tags: usize,
}

impl<'a> TagList<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_limits(bytes, DEFAULT_MAX_TAGS, DEFAULT_MAX_TAG_SPAN)
    }

    pub fn with_limits(bytes: &'a [u8], max_tags: usize, max_span: usize) -> Self {
        let span = core::cmp::min(bytes.len(), max_span);
        Self {
            bytes: &bytes[..span],
            max_tags,
        }
    }

    /// Build a list view from the raw address left by the primary bootloader
    ///
    /// Headers are walked to find the terminator; the view ends right after
    /// it, or at `max_span` if none is found. Iteration stops with
    /// [`BootError::TagListTooLong`] after `max_tags` tags.
    ///
    /// # Safety
    /// - `base` must be 4-byte aligned and either null or point to readable
    ///   memory of at least `max_span` bytes
    /// - that memory must not be written while the returned list is alive
    pub unsafe fn from_raw(base: *const u8, max_tags: usize, max_span: usize) -> TagList<'a> {
        if base.is_null() {
            return Self::with_limits(&[], max_tags, max_span);
        }

        let mut offset = 0usize;
        let span = loop {
            if offset + TAG_HEADER_BYTES > max_span {
                break max_span;
            }
            let words = unsafe { base.add(offset) } as *const u32;
            let (size, tag) = unsafe { (words.read_unaligned(), words.add(1).read_unaligned()) };
            if size == 0 || tag == ATAG_NONE || size < TAG_HEADER_WORDS {
                break offset + TAG_HEADER_BYTES;
            }
            match (size as usize).checked_mul(4).and_then(|len| offset.checked_add(len)) {
                Some(next) if next <= max_span => offset = next,
                _ => break max_span,
            }
        };

        let bytes = unsafe { core::slice::from_raw_parts(base, span) };
        Self::with_limits(bytes, max_tags, max_span)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Header of the first tag, whatever its kind
    pub fn first_header(&self) -> Result<TagHeader> {
        read_header(self.bytes, 0).ok_or(BootError::MalformedTags { kind: ATAG_NONE, offset: 0 })
    }

    pub fn iter(&self) -> TagIter<'a> {
        TagIter {
            bytes: self.bytes,
            offset: 0,
            remaining: self.max_tags,
            done: false,
        }
    }
}

/// Walks a tag list; stops at the terminator or at the first structural error
pub struct TagIter<'a> {
    bytes: &'a [u8],
    offset: usize,
    remaining: usize,
    done: bool,
}

impl<'a> TagIter<'a> {
    fn fail(&mut self, err: BootError) -> Option<Result<TagRef<'a>>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<'a> Iterator for TagIter<'a> {
    type Item = Result<TagRef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(header) = read_header(self.bytes, self.offset) else {
            return self.fail(BootError::TagListTooLong);
        };

        if header.size == 0 || header.tag == ATAG_NONE {
            self.done = true;
            return None;
        }
        if header.size < TAG_HEADER_WORDS {
            return self.fail(BootError::InvalidTag {
                kind: header.tag,
                offset: self.offset,
            });
        }
        if self.remaining == 0 {
            return self.fail(BootError::TagListTooLong);
        }

        let end = (header.size as usize)
            .checked_mul(4)
            .and_then(|len| self.offset.checked_add(len));
        let Some(record) = end.and_then(|end| self.bytes.get(self.offset..end)) else {
            return self.fail(BootError::TagListTooLong);
        };
        let len = record.len();

        let tag = TagRef {
            offset: self.offset,
            header,
            record,
        };
        self.offset += len;
        self.remaining -= 1;
        Some(Ok(tag))
    }
}
