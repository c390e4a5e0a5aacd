//! Key boot selector integration tests

use mockall::mock;
use mockall::predicate::always;
use nos_board_stage::boot_stage::environment::{ENV_BOOTCMD, ENV_PREBOOT};
use nos_board_stage::drivers::device_tree::{DeviceTree, NodeOffset};
use nos_board_stage::drivers::gpio::{GpioController, GpioDesc, GpioFlags, GpioSpec};
use nos_board_stage::{BootEnv, BootError, EnvStore, KeyBootSelector, KeyOverrides, Result};

mock! {
    pub Gpio {}
    impl GpioController for Gpio {
        fn request(&mut self, spec: &GpioSpec, flags: GpioFlags, label: &str) -> Result<GpioDesc>;
        fn read_level(&mut self, desc: &GpioDesc) -> Result<bool>;
    }
}

const VOL_UP_PIN: u32 = 67;
const VOL_DOWN_PIN: u32 = 91;

struct Node {
    offset: u32,
    name: &'static str,
    gpios: Vec<u8>,
}

/// Flat tree: `gpio-keys` groups, each with key children
struct KeysTree {
    groups: Vec<(u32, Vec<Node>)>,
}

impl DeviceTree for KeysTree {
    fn next_compatible(&self, from: Option<NodeOffset>, compatible: &str) -> Option<NodeOffset> {
        if compatible != "gpio-keys" {
            return None;
        }
        self.groups
            .iter()
            .map(|(offset, _)| NodeOffset(*offset))
            .find(|node| from.is_none_or(|from| *node > from))
    }

    fn subnode(&self, parent: NodeOffset, name: &str) -> Option<NodeOffset> {
        let (_, children) = self.groups.iter().find(|(offset, _)| *offset == parent.0)?;
        children.iter().find(|n| n.name == name).map(|n| NodeOffset(n.offset))
    }

    fn property(&self, node: NodeOffset, name: &str) -> Option<&[u8]> {
        if name != "gpios" {
            return None;
        }
        self.groups
            .iter()
            .flat_map(|(_, children)| children)
            .find(|n| n.offset == node.0)
            .map(|n| n.gpios.as_slice())
    }
}

fn gpios(pin: u32, dt_flags: u32) -> Vec<u8> {
    [0x20u32, pin, dt_flags].iter().flat_map(|w| w.to_be_bytes()).collect()
}

fn phone_tree(up_flags: u32) -> KeysTree {
    KeysTree {
        groups: vec![(
            0x100,
            vec![
                Node { offset: 0x140, name: "volume-up", gpios: gpios(VOL_UP_PIN, up_flags) },
                Node { offset: 0x180, name: "volume-down", gpios: gpios(VOL_DOWN_PIN, 0) },
            ],
        )],
    }
}

/// Controller that grants every request; `held` pins read high
fn controller(held: &'static [u32]) -> MockGpio {
    let mut gpio = MockGpio::new();
    gpio.expect_request()
        .returning(|spec, flags, _| Ok(GpioDesc { spec: *spec, flags }));
    gpio.expect_read_level()
        .returning(move |desc| Ok(held.contains(&desc.spec.pin)));
    gpio
}

#[test]
fn volume_up_selects_recovery_only() {
    let mut env = EnvStore::new();
    env.set(ENV_BOOTCMD, "run bootcmd_mmc").unwrap();
    let overrides = KeyBootSelector::new().run(Some(&phone_tree(0)), &mut controller(&[VOL_UP_PIN]), &mut env);

    assert_eq!(overrides, KeyOverrides { recovery: true, fastboot: false });
    assert_eq!(env.get(ENV_BOOTCMD), Some("run recoverybootcmd"));
    assert_eq!(env.get(ENV_PREBOOT), None);
}

#[test]
fn volume_down_selects_fastboot_only() {
    let mut env = EnvStore::new();
    env.set(ENV_BOOTCMD, "run bootcmd_mmc").unwrap();
    let overrides = KeyBootSelector::new().run(Some(&phone_tree(0)), &mut controller(&[VOL_DOWN_PIN]), &mut env);

    assert_eq!(overrides, KeyOverrides { recovery: false, fastboot: true });
    assert_eq!(env.get(ENV_BOOTCMD), Some("run bootcmd_mmc"));
    assert_eq!(env.get(ENV_PREBOOT), Some("setenv preboot; run fastbootcmd"));
}

#[test]
fn both_keys_fire_both_overrides() {
    let mut env = EnvStore::new();
    let overrides =
        KeyBootSelector::new().run(Some(&phone_tree(0)), &mut controller(&[VOL_UP_PIN, VOL_DOWN_PIN]), &mut env);

    assert!(overrides.both());
    assert_eq!(env.get(ENV_BOOTCMD), Some("run recoverybootcmd"));
    assert_eq!(env.get(ENV_PREBOOT), Some("setenv preboot; run fastbootcmd"));
}

#[test]
fn released_keys_leave_environment_alone() {
    let mut env = EnvStore::new();
    let overrides = KeyBootSelector::new().run(Some(&phone_tree(0)), &mut controller(&[]), &mut env);
    assert!(!overrides.any());
    assert!(env.is_empty());
}

#[test]
fn active_low_key_reads_pressed_at_low_level() {
    let mut env = EnvStore::new();
    // volume-up is active low and its line reads low
    let overrides = KeyBootSelector::new().run(Some(&phone_tree(1)), &mut controller(&[]), &mut env);
    assert_eq!(overrides, KeyOverrides { recovery: true, fastboot: false });
}

#[test]
fn failed_request_leaves_key_unbound() {
    let mut gpio = MockGpio::new();
    gpio.expect_request()
        .withf(|_, _, label| label == "volume-up")
        .returning(|_, _, _| Err(BootError::GpioRequestFailed(-16)));
    gpio.expect_request()
        .withf(|_, _, label| label == "volume-down")
        .returning(|spec, flags, _| Ok(GpioDesc { spec: *spec, flags }));
    gpio.expect_read_level()
        .withf(|desc| desc.spec.pin == VOL_DOWN_PIN)
        .times(1)
        .returning(|_| Ok(true));

    let mut env = EnvStore::new();
    let overrides = KeyBootSelector::new().run(Some(&phone_tree(0)), &mut gpio, &mut env);
    assert_eq!(overrides, KeyOverrides { recovery: false, fastboot: true });
    assert_eq!(env.get(ENV_BOOTCMD), None);
}

#[test]
fn read_failure_counts_as_released() {
    let mut gpio = MockGpio::new();
    gpio.expect_request()
        .returning(|spec, flags, _| Ok(GpioDesc { spec: *spec, flags }));
    gpio.expect_read_level()
        .with(always())
        .times(2)
        .returning(|_| Err(BootError::GpioReadFailed(-5)));

    let mut env = EnvStore::new();
    let overrides = KeyBootSelector::new().run(Some(&phone_tree(0)), &mut gpio, &mut env);
    assert!(!overrides.any());
    assert!(env.is_empty());
}

#[test]
fn missing_key_nodes_are_never_requested() {
    let tree = KeysTree {
        groups: vec![(0x100, vec![Node { offset: 0x140, name: "power", gpios: gpios(3, 0) }])],
    };
    let mut gpio = MockGpio::new();
    gpio.expect_request().times(0);
    gpio.expect_read_level().times(0);

    let mut env = EnvStore::new();
    let overrides = KeyBootSelector::new().run(Some(&tree), &mut gpio, &mut env);
    assert_eq!(overrides, KeyOverrides::default());
    assert!(env.is_empty());
}

#[test]
fn keys_split_across_groups_are_found() {
    let tree = KeysTree {
        groups: vec![
            (0x100, vec![Node { offset: 0x140, name: "volume-down", gpios: gpios(VOL_DOWN_PIN, 0) }]),
            (0x200, vec![Node { offset: 0x240, name: "volume-up", gpios: gpios(VOL_UP_PIN, 0) }]),
        ],
    };
    let search = KeyBootSelector::new().locate(Some(&tree));
    assert_eq!(search.volume_down, Some(NodeOffset(0x140)));
    assert_eq!(search.volume_up, Some(NodeOffset(0x240)));
}

#[test]
fn no_device_tree_skips_key_selection() {
    let mut gpio = MockGpio::new();
    gpio.expect_request().times(0);
    gpio.expect_read_level().times(0);

    let mut env = EnvStore::new();
    let selector = KeyBootSelector::new();
    assert_eq!(selector.locate(None::<&KeysTree>), Default::default());
    assert!(!selector.run(None::<&KeysTree>, &mut gpio, &mut env).any());
}
