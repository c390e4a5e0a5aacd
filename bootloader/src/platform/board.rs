// Board descriptor handed to the generic loader code

use super::dram::{self, MemoryWindow};
use super::prcc::{self, RegisterBus};

/// Start of the SDRAM window
pub const SDRAM_BASE: usize = 0x0000_0000;
/// Largest SDRAM fitted on this board family (1 GiB)
pub const SDRAM_SIZE: usize = 0x4000_0000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardInfo {
    /// Machine type passed to the kernel in r1
    pub arch_number: u32,
    /// Address of the boot parameter list passed in r2
    pub boot_params: usize,
    pub ram_size: usize,
}

impl BoardInfo {
    /// Ungate peripheral clocks and adopt the firmware's machine id and
    /// parameter address
    pub fn init<B: RegisterBus + ?Sized>(bus: &mut B, machid: u32, atags_addr: usize) -> Self {
        prcc::enable_peripheral_clocks(bus);
        log::info!("board: machid {:#x}, atags at {:#x}", machid, atags_addr);
        Self {
            arch_number: machid,
            boot_params: atags_addr,
            ram_size: 0,
        }
    }

    /// Probe the SDRAM window and record its size
    pub fn probe_ram<M: MemoryWindow + ?Sized>(&mut self, mem: &mut M, max_size: usize) -> usize {
        self.ram_size = dram::get_ram_size(mem, max_size);
        log::info!("DRAM: {} MiB", self.ram_size >> 20);
        self.ram_size
    }
}
