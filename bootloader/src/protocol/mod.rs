//! Boot protocol layer
//!
//! The primary bootloader on these phones hands over a legacy ARM tag list
//! (ATAGs). This module models that list and the filter applied to it.

pub mod atag;
pub mod tag_codec;

pub use atag::{SerialNumber, TagHeader, TagList, TagPayload, TagRef};
pub use tag_codec::{TagClass, classify, copy_filtered, measure, measure_with};
