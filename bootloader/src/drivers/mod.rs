//! Device capabilities used by the board stage

pub mod device_tree;
pub mod gpio;

pub use device_tree::{CompatibleNodes, DeviceTree, NodeOffset};
pub use gpio::{GpioController, GpioDesc, GpioFlags, GpioSpec};
