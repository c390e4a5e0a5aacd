// Peripheral clock gating (PRCC units)

use core::ptr::write_volatile;

pub const PRCC_PCKEN: u32 = 0x00;
pub const PRCC_PCKDIS: u32 = 0x04;
pub const PRCC_KCKEN: u32 = 0x08;
pub const PRCC_KCKDIS: u32 = 0x0C;
pub const PRCC_PCKSR: u32 = 0x10;
pub const PRCC_PKCKSR: u32 = 0x14;

const fn bit(n: u32) -> u32 {
    1 << n
}

/// Bus and kernel clock enables for one clock unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockEnable {
    pub base: u32,
    pub pcken: u32,
    pub kcken: u32,
}

// Bus clock bits, per unit
pub const CLK_P1_GPIOCTRL: u32 = bit(9);
pub const CLK_P2_SDI4: u32 = bit(4);
pub const CLK_P2_GPIOCTRL: u32 = bit(11);
pub const CLK_P3_UART2: u32 = bit(6);
pub const CLK_P3_GPIOCTRL: u32 = bit(8);
pub const CLK_P5_USB: u32 = bit(0);
pub const CLK_P5_GPIOCTRL: u32 = bit(1);
pub const CLK_P6_MTU0: u32 = bit(6);

// Kernel clock bits
pub const CLK_SDI4: u32 = bit(2);
pub const CLK_UART2: u32 = bit(6);

/// Peripherals the board stage and the next stage expect clocked
pub const BOARD_CLOCKS: [ClockEnable; 5] = [
    ClockEnable { base: 0x8012_f000, pcken: CLK_P1_GPIOCTRL, kcken: 0 },
    ClockEnable { base: 0x8011_f000, pcken: CLK_P2_SDI4 | CLK_P2_GPIOCTRL, kcken: CLK_SDI4 },
    ClockEnable { base: 0x8000_f000, pcken: CLK_P3_UART2 | CLK_P3_GPIOCTRL, kcken: CLK_UART2 },
    ClockEnable { base: 0xa03f_f000, pcken: CLK_P5_USB | CLK_P5_GPIOCTRL, kcken: 0 },
    ClockEnable { base: 0xa03c_f000, pcken: CLK_P6_MTU0, kcken: 0 },
];

/// 32-bit register writes on the peripheral bus
#[cfg_attr(test, mockall::automock)]
pub trait RegisterBus {
    fn write32(&mut self, addr: u32, value: u32);
}

/// Register bus backed by physical addresses
pub struct MmioBus {
    _private: (),
}

impl MmioBus {
    /// # Safety
    /// Every address later written through this bus must be a mapped,
    /// 4-byte aligned device register.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for MmioBus {
    fn write32(&mut self, addr: u32, value: u32) {
        // SAFETY: upheld by the caller of `MmioBus::new`
        unsafe { write_volatile(addr as usize as *mut u32, value) }
    }
}

/// Enable the clocks in `table`; zero masks are not written
pub fn enable_clocks<B: RegisterBus + ?Sized>(bus: &mut B, table: &[ClockEnable]) -> usize {
    let mut writes = 0;
    for clk in table {
        if clk.pcken != 0 {
            bus.write32(clk.base + PRCC_PCKEN, clk.pcken);
            writes += 1;
        }
        if clk.kcken != 0 {
            bus.write32(clk.base + PRCC_KCKEN, clk.kcken);
            writes += 1;
        }
    }
    log::debug!("prcc: {} clock enable writes", writes);
    writes
}

pub fn enable_peripheral_clocks<B: RegisterBus + ?Sized>(bus: &mut B) -> usize {
    enable_clocks(bus, &BOARD_CLOCKS)
}
