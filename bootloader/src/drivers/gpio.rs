//! GPIO lines
//!
//! Provides:
//! - request flags for a line
//! - decoding of a device tree `gpios` specifier
//! - the controller capability the board stage requests and reads lines through
//! - logical reads honouring active-low lines

use super::device_tree::{DeviceTree, NodeOffset};
use crate::error::{BootError, Result};

bitflags::bitflags! {
    /// Request flags for a GPIO line
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GpioFlags: u32 {
        /// Line is used as an output
        const IS_OUT = 1 << 1;
        /// Line is used as an input
        const IS_IN = 1 << 2;
        /// Logical value is the inverse of the electrical level
        const ACTIVE_LOW = 1 << 3;
    }
}

/// Cells after the phandle in a `gpios` specifier (`<&gpio pin flags>`)
pub const GPIO_CELLS: usize = 2;

/// Flag cell bit marking an active-low line
pub const DT_GPIO_ACTIVE_LOW: u32 = 1;

/// One decoded `gpios` specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioSpec {
    pub phandle: u32,
    pub pin: u32,
    pub flags: u32,
}

impl GpioSpec {
    /// Decode entry `index` of a `gpios` property (big-endian cells)
    pub fn parse(prop: &[u8], index: usize) -> Result<Self> {
        let entry = (1 + GPIO_CELLS) * 4;
        let start = index.checked_mul(entry).ok_or(BootError::InvalidGpioSpec)?;
        let end = start.checked_add(entry).ok_or(BootError::InvalidGpioSpec)?;
        let cells = prop.get(start..end).ok_or(BootError::InvalidGpioSpec)?;
        let cell = |i: usize| u32::from_be_bytes([cells[i * 4], cells[i * 4 + 1], cells[i * 4 + 2], cells[i * 4 + 3]]);
        Ok(Self {
            phandle: cell(0),
            pin: cell(1),
            flags: cell(2),
        })
    }

    pub fn is_active_low(&self) -> bool {
        self.flags & DT_GPIO_ACTIVE_LOW != 0
    }
}

/// A requested line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioDesc {
    pub spec: GpioSpec,
    pub flags: GpioFlags,
}

/// GPIO controller capability
pub trait GpioController {
    /// Claim the line described by `spec` for exclusive use
    fn request(&mut self, spec: &GpioSpec, flags: GpioFlags, label: &str) -> Result<GpioDesc>;

    /// Electrical level of a requested line (`true` = high)
    fn read_level(&mut self, desc: &GpioDesc) -> Result<bool>;
}

/// Logical value of `desc`: `true` means asserted
pub fn get_value<G: GpioController + ?Sized>(gpio: &mut G, desc: &GpioDesc) -> Result<bool> {
    let level = gpio.read_level(desc)?;
    Ok(level ^ desc.flags.contains(GpioFlags::ACTIVE_LOW))
}

/// Request the GPIO named by property `list_name` of `node`
pub fn request_by_name<T, G>(
    tree: &T,
    gpio: &mut G,
    node: NodeOffset,
    list_name: &str,
    index: usize,
    flags: GpioFlags,
    label: &str,
) -> Result<GpioDesc>
where
    T: DeviceTree + ?Sized,
    G: GpioController + ?Sized,
{
    let prop = tree.property(node, list_name).ok_or(BootError::InvalidGpioSpec)?;
    let spec = GpioSpec::parse(prop, index)?;
    let mut flags = flags;
    if spec.is_active_low() {
        flags |= GpioFlags::ACTIVE_LOW;
    }
    gpio.request(&spec, flags, label)
}
