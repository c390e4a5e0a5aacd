//! Key boot selector
//!
//! Volume keys held at power-on pick an alternative boot path:
//! - volume-up rewrites `bootcmd` to boot the recovery image
//! - volume-down rewrites `preboot` to drop into fastboot once
//!
//! The keys are children of `gpio-keys` compatible nodes in the device tree.
//! Both overrides are independent and both fire when both keys are held.

use super::environment::{BootEnv, ENV_BOOTCMD, ENV_PREBOOT};
use crate::config::{BoardConfig, ConfigStr};
use crate::drivers::device_tree::{CompatibleNodes, DeviceTree, NodeOffset};
use crate::drivers::gpio::{self, GpioController, GpioDesc, GpioFlags};
use crate::error::{BootError, Result};

/// Property holding a key's line specifier
const GPIOS_PROP: &str = "gpios";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    VolumeUp,
    VolumeDown,
}

impl KeyRole {
    /// Label the line is requested under
    pub fn label(self) -> &'static str {
        match self {
            KeyRole::VolumeUp => "volume-up",
            KeyRole::VolumeDown => "volume-down",
        }
    }
}

/// Two-slot search state; a slot is filled by the first group that has it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySearch {
    pub volume_up: Option<NodeOffset>,
    pub volume_down: Option<NodeOffset>,
}

impl KeySearch {
    pub fn is_complete(&self) -> bool {
        self.volume_up.is_some() && self.volume_down.is_some()
    }

    pub fn node(&self, role: KeyRole) -> Option<NodeOffset> {
        match role {
            KeyRole::VolumeUp => self.volume_up,
            KeyRole::VolumeDown => self.volume_down,
        }
    }
}

/// A key whose line has been requested as an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioKey {
    pub role: KeyRole,
    pub desc: GpioDesc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpioKeySet {
    pub volume_up: Option<GpioKey>,
    pub volume_down: Option<GpioKey>,
}

/// Which environment overrides were applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyOverrides {
    /// `bootcmd` now boots recovery
    pub recovery: bool,
    /// `preboot` now enters fastboot
    pub fastboot: bool,
}

impl KeyOverrides {
    /// Both keys were held. Nothing arbitrates this: `preboot` runs fastboot
    /// first and `bootcmd` boots recovery if fastboot returns.
    pub fn both(&self) -> bool {
        self.recovery && self.fastboot
    }

    pub fn any(&self) -> bool {
        self.recovery || self.fastboot
    }
}

pub struct KeyBootSelector {
    compatible: ConfigStr,
    volume_up_name: ConfigStr,
    volume_down_name: ConfigStr,
    recovery_bootcmd: ConfigStr,
    fastboot_preboot: ConfigStr,
    max_groups: usize,
}

impl KeyBootSelector {
    pub fn new() -> Self {
        Self::from_config(&BoardConfig::default())
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            compatible: config.keys_compatible,
            volume_up_name: config.volume_up_name,
            volume_down_name: config.volume_down_name,
            recovery_bootcmd: config.recovery_bootcmd,
            fastboot_preboot: config.fastboot_preboot,
            max_groups: config.max_key_groups,
        }
    }

    fn node_name(&self, role: KeyRole) -> &str {
        match role {
            KeyRole::VolumeUp => self.volume_up_name.as_str(),
            KeyRole::VolumeDown => self.volume_down_name.as_str(),
        }
    }

    /// Find the key nodes, first group wins for each key
    ///
    /// Without a device tree both slots stay empty.
    pub fn locate<T: DeviceTree + ?Sized>(&self, tree: Option<&T>) -> KeySearch {
        let mut search = KeySearch::default();
        let Some(tree) = tree else {
            return search;
        };

        for group in CompatibleNodes::new(tree, self.compatible.as_str(), self.max_groups) {
            if search.volume_up.is_none() {
                search.volume_up = tree.subnode(group, self.volume_up_name.as_str());
            }
            if search.volume_down.is_none() {
                search.volume_down = tree.subnode(group, self.volume_down_name.as_str());
            }
            if search.is_complete() {
                break;
            }
        }
        search
    }

    /// Request the line of `role`'s node as an input
    pub fn bind<T, G>(&self, tree: &T, gpio: &mut G, search: &KeySearch, role: KeyRole) -> Result<GpioKey>
    where
        T: DeviceTree + ?Sized,
        G: GpioController + ?Sized,
    {
        let node = search.node(role).ok_or(BootError::UnresolvedBinding(role.label()))?;
        let desc = gpio::request_by_name(tree, gpio, node, GPIOS_PROP, 0, GpioFlags::IS_IN, role.label())?;
        Ok(GpioKey { role, desc })
    }

    /// Bind every located key; failures are logged and leave the key unbound
    pub fn bind_all<T, G>(&self, tree: &T, gpio: &mut G, search: &KeySearch) -> GpioKeySet
    where
        T: DeviceTree + ?Sized,
        G: GpioController + ?Sized,
    {
        let mut bind_one = |role: KeyRole| {
            if search.node(role).is_none() {
                log::debug!("no {} node", self.node_name(role));
                return None;
            }
            match self.bind(tree, &mut *gpio, search, role) {
                Ok(key) => Some(key),
                Err(err) => {
                    log::error!("Failed to request {} GPIO: {}", self.node_name(role), err);
                    None
                }
            }
        };

        GpioKeySet {
            volume_up: bind_one(KeyRole::VolumeUp),
            volume_down: bind_one(KeyRole::VolumeDown),
        }
    }

    /// Sample the keys and apply the overrides of the held ones
    pub fn decide<G, E>(&self, keys: &GpioKeySet, gpio: &mut G, env: &mut E) -> KeyOverrides
    where
        G: GpioController + ?Sized,
        E: BootEnv + ?Sized,
    {
        let mut overrides = KeyOverrides::default();

        if is_pressed(&mut *gpio, keys.volume_up.as_ref()) {
            log::info!("volume-up held, booting recovery");
            overrides.recovery = apply(&mut *env, ENV_BOOTCMD, self.recovery_bootcmd.as_str());
        }
        if is_pressed(gpio, keys.volume_down.as_ref()) {
            log::info!("volume-down held, entering fastboot");
            overrides.fastboot = apply(env, ENV_PREBOOT, self.fastboot_preboot.as_str());
        }
        if overrides.both() {
            log::warn!("both volume keys held, fastboot runs before recovery");
        }
        overrides
    }

    /// Locate, bind and sample the keys in one go
    pub fn run<T, G, E>(&self, tree: Option<&T>, gpio: &mut G, env: &mut E) -> KeyOverrides
    where
        T: DeviceTree + ?Sized,
        G: GpioController + ?Sized,
        E: BootEnv + ?Sized,
    {
        let Some(tree) = tree else {
            return KeyOverrides::default();
        };
        let search = self.locate(Some(tree));
        let keys = self.bind_all(tree, &mut *gpio, &search);
        self.decide(&keys, gpio, env)
    }
}

impl Default for KeyBootSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Unbound keys and failed reads count as released
fn is_pressed<G: GpioController + ?Sized>(gpio: &mut G, key: Option<&GpioKey>) -> bool {
    let Some(key) = key else {
        return false;
    };
    match gpio::get_value(gpio, &key.desc) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("{}: {}", key.role.label(), err);
            false
        }
    }
}

fn apply<E: BootEnv + ?Sized>(env: &mut E, key: &str, value: &str) -> bool {
    match env.set(key, value) {
        Ok(()) => true,
        Err(err) => {
            log::error!("Failed to set {}: {}", key, err);
            false
        }
    }
}
