//! Tag list filtering
//!
//! The next stage regenerates the core, initrd and end tags itself, so those
//! are dropped; every other tag is copied verbatim and in order into a
//! fragment that is later spliced into the next-stage list. The fragment has
//! no terminator of its own.

use super::atag::{ATAG_CORE, ATAG_INITRD, ATAG_INITRD2, ATAG_NONE, TagList, TagRef};
use crate::error::{BootError, Result};

/// Filter decision for a tag kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Skip,
    Keep,
}

pub fn classify(kind: u32) -> TagClass {
    match kind {
        ATAG_NONE | ATAG_CORE | ATAG_INITRD | ATAG_INITRD2 => TagClass::Skip,
        _ => TagClass::Keep,
    }
}

/// Reject lists that do not start with a core tag
fn check_first(list: &TagList<'_>) -> Result {
    let first = list.first_header()?;
    if first.tag != ATAG_CORE {
        return Err(BootError::MalformedTags {
            kind: first.tag,
            offset: 0,
        });
    }
    Ok(())
}

/// Bytes needed to hold every kept tag of `list`
pub fn measure(list: &TagList<'_>) -> Result<usize> {
    measure_with(list, |_| {})
}

/// Same as [`measure`], handing every kept tag to `visit` along the way
pub fn measure_with<'a, F>(list: &TagList<'a>, mut visit: F) -> Result<usize>
where
    F: FnMut(&TagRef<'a>),
{
    check_first(list)?;

    let mut total = 0usize;
    for tag in list.iter() {
        let tag = tag?;
        #[cfg(feature = "trace_tags")]
        log::trace!("atag {:#010x} size {} at {:#x}", tag.kind(), tag.size_words(), tag.offset());
        if classify(tag.kind()) == TagClass::Skip {
            continue;
        }
        visit(&tag);
        total += tag.as_bytes().len();
    }
    Ok(total)
}

/// Copy every kept tag of `list` into `dest`, back to back
///
/// Returns the number of bytes written.
pub fn copy_filtered(list: &TagList<'_>, dest: &mut [u8]) -> Result<usize> {
    check_first(list)?;

    let mut written = 0usize;
    for tag in list.iter() {
        let tag = tag?;
        if classify(tag.kind()) == TagClass::Skip {
            continue;
        }
        let record = tag.as_bytes();
        let available = dest.len() - written;
        if record.len() > available {
            return Err(BootError::ParamsOverflow {
                needed: record.len(),
                available,
            });
        }
        dest[written..written + record.len()].copy_from_slice(record);
        written += record.len();
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::atag::{ATAG_CMDLINE, ATAG_MEM, ATAG_REVISION, ATAG_SERIAL, TAG_HEADER_WORDS};
    use alloc::vec;
    use alloc::vec::Vec;

    fn push_tag(out: &mut Vec<u8>, kind: u32, payload: &[u32]) {
        out.extend_from_slice(&(TAG_HEADER_WORDS + payload.len() as u32).to_ne_bytes());
        out.extend_from_slice(&kind.to_ne_bytes());
        for word in payload {
            out.extend_from_slice(&word.to_ne_bytes());
        }
    }

    fn push_end(out: &mut Vec<u8>) {
        out.extend_from_slice(&[0u8; 8]);
    }

    #[test]
    fn skip_set_is_exactly_regenerated_kinds() {
        for kind in [ATAG_NONE, ATAG_CORE, ATAG_INITRD, ATAG_INITRD2] {
            assert_eq!(classify(kind), TagClass::Skip);
        }
        for kind in [ATAG_MEM, ATAG_SERIAL, ATAG_REVISION, ATAG_CMDLINE, 0x4d53_4d00] {
            assert_eq!(classify(kind), TagClass::Keep);
        }
    }

    #[test]
    fn measure_counts_kept_tags_only() {
        let mut bytes = Vec::new();
        push_tag(&mut bytes, ATAG_CORE, &[0, 4096, 0]);
        push_tag(&mut bytes, ATAG_INITRD2, &[0x0100_0000, 0x8000]);
        push_tag(&mut bytes, ATAG_MEM, &[0x1000_0000, 0]);
        push_tag(&mut bytes, ATAG_CMDLINE, &[0, 0, 0]);
        push_end(&mut bytes);

        let list = TagList::new(&bytes);
        assert_eq!(measure(&list), Ok(16 + 20));
    }

    #[test]
    fn copy_keeps_order_and_bytes() {
        let mut bytes = Vec::new();
        push_tag(&mut bytes, ATAG_CORE, &[]);
        let mem_at = bytes.len();
        push_tag(&mut bytes, ATAG_MEM, &[0x1000_0000, 0]);
        push_tag(&mut bytes, ATAG_INITRD, &[1, 2]);
        let rev_at = bytes.len();
        push_tag(&mut bytes, ATAG_REVISION, &[0x10]);
        push_end(&mut bytes);

        let list = TagList::new(&bytes);
        let mut dest = vec![0u8; measure(&list).unwrap()];
        assert_eq!(copy_filtered(&list, &mut dest), Ok(dest.len()));

        let mut expected = Vec::new();
        expected.extend_from_slice(&bytes[mem_at..mem_at + 16]);
        expected.extend_from_slice(&bytes[rev_at..rev_at + 12]);
        assert_eq!(dest, expected);
    }

    #[test]
    fn non_core_first_tag_is_malformed() {
        let mut bytes = Vec::new();
        push_tag(&mut bytes, ATAG_MEM, &[0x1000_0000, 0]);
        push_end(&mut bytes);

        let list = TagList::new(&bytes);
        let err = BootError::MalformedTags { kind: ATAG_MEM, offset: 0 };
        assert_eq!(measure(&list), Err(err));
        assert_eq!(copy_filtered(&list, &mut [0u8; 64]), Err(err));
    }

    #[test]
    fn copy_refuses_short_destination() {
        let mut bytes = Vec::new();
        push_tag(&mut bytes, ATAG_CORE, &[]);
        push_tag(&mut bytes, ATAG_REVISION, &[0x10]);
        push_end(&mut bytes);

        let list = TagList::new(&bytes);
        let mut dest = [0u8; 8];
        assert_eq!(
            copy_filtered(&list, &mut dest),
            Err(BootError::ParamsOverflow { needed: 12, available: 8 })
        );
    }
}
