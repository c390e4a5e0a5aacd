//! DRAM size probe
//!
//! Finds how much memory is really behind the SDRAM window by writing a
//! marker at every power-of-two word offset and looking for the first one
//! that aliases back onto the base. Every word touched is restored.

use arrayvec::ArrayVec;
use core::ptr::{read_volatile, write_volatile};

pub const WORD_BYTES: usize = core::mem::size_of::<u32>();

/// Word-addressed view of the memory being probed
pub trait MemoryWindow {
    fn read(&mut self, word: usize) -> u32;
    fn write(&mut self, word: usize, value: u32);
}

/// Physical memory starting at `base`
pub struct MmioWindow {
    base: usize,
}

impl MmioWindow {
    /// # Safety
    /// `base` must be word aligned and the probed range must be mapped RAM
    /// that nothing else uses while the probe runs.
    pub unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn ptr(&self, word: usize) -> *mut u32 {
        (self.base + word * WORD_BYTES) as *mut u32
    }
}

impl MemoryWindow for MmioWindow {
    fn read(&mut self, word: usize) -> u32 {
        // SAFETY: upheld by the caller of `MmioWindow::new`
        unsafe { read_volatile(self.ptr(word)) }
    }

    fn write(&mut self, word: usize, value: u32) {
        // SAFETY: upheld by the caller of `MmioWindow::new`
        unsafe { write_volatile(self.ptr(word), value) }
    }
}

fn marker(cnt: usize) -> u32 {
    !(cnt as u32)
}

/// Usable bytes behind `mem`, at most `max_size`
///
/// Returns 0 when the base word does not hold a written value.
pub fn get_ram_size<M: MemoryWindow + ?Sized>(mem: &mut M, max_size: usize) -> usize {
    let words = max_size / WORD_BYTES;
    let mut save: ArrayVec<u32, { usize::BITS as usize }> = ArrayVec::new();

    let mut cnt = words >> 1;
    while cnt > 0 {
        save.push(mem.read(cnt));
        mem.write(cnt, marker(cnt));
        cnt >>= 1;
    }

    let save_base = mem.read(0);
    mem.write(0, 0);

    if mem.read(0) != 0 {
        mem.write(0, save_base);
        let mut cnt = 1;
        while cnt < words {
            if let Some(value) = save.pop() {
                mem.write(cnt, value);
            }
            cnt <<= 1;
        }
        log::error!("dram: base word is not writable");
        return 0;
    }

    let mut cnt = 1;
    while cnt < words {
        let value = mem.read(cnt);
        if let Some(saved) = save.pop() {
            mem.write(cnt, saved);
        }
        if value != marker(cnt) {
            let size = cnt * WORD_BYTES;
            cnt <<= 1;
            while cnt < words {
                if let Some(saved) = save.pop() {
                    mem.write(cnt, saved);
                }
                cnt <<= 1;
            }
            // The base aliases the offset that mismatched and was restored
            // through it; writing save_base here would clobber it.
            log::debug!("dram: {:#x} bytes (aliasing)", size);
            return size;
        }
        cnt <<= 1;
    }

    mem.write(0, save_base);
    max_size
}
