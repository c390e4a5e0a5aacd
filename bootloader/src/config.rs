// Board configuration and runtime limits

use arrayvec::ArrayString;
use log::LevelFilter;

/// Longest environment value or device tree name the config can hold
pub const CONFIG_STR_MAX: usize = 64;

pub type ConfigStr = ArrayString<CONFIG_STR_MAX>;

/// Largest ATAG list walked from the primary bootloader (64 KiB)
pub const DEFAULT_MAX_TAG_SPAN: usize = 0x1_0000;
pub const DEFAULT_MAX_TAGS: usize = 1024;
pub const DEFAULT_MAX_KEY_GROUPS: usize = 16;
pub const DEFAULT_MAX_ENV_ENTRIES: usize = 256;

pub struct BoardConfig {
    pub verbosity: u32,
    /// Compatible string of the digital input groups to search
    pub keys_compatible: ConfigStr,
    pub volume_up_name: ConfigStr,
    pub volume_down_name: ConfigStr,
    /// `bootcmd` written when volume-up is held
    pub recovery_bootcmd: ConfigStr,
    /// `preboot` written when volume-down is held
    pub fastboot_preboot: ConfigStr,
    pub max_tags: usize,
    pub max_tag_span: usize,
    /// Upper bound for the retained tag copy; larger copies degrade
    pub tag_copy_budget: usize,
    pub max_key_groups: usize,
    pub max_env_entries: usize,
}

impl BoardConfig {
    pub fn new() -> Self {
        Self {
            verbosity: 1, // INFO level
            keys_compatible: config_str("gpio-keys"),
            volume_up_name: config_str("volume-up"),
            volume_down_name: config_str("volume-down"),
            recovery_bootcmd: config_str("run recoverybootcmd"),
            fastboot_preboot: config_str("setenv preboot; run fastbootcmd"),
            max_tags: DEFAULT_MAX_TAGS,
            max_tag_span: DEFAULT_MAX_TAG_SPAN,
            tag_copy_budget: DEFAULT_MAX_TAG_SPAN,
            max_key_groups: DEFAULT_MAX_KEY_GROUPS,
            max_env_entries: DEFAULT_MAX_ENV_ENTRIES,
        }
    }

    pub fn with_verbosity(mut self, level: u32) -> Self {
        self.verbosity = level;
        self
    }

    /// Map verbosity onto a `log` filter (0 = errors only, 4+ = trace)
    pub fn level_filter(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Error,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn with_tag_limits(mut self, max_tags: usize, max_tag_span: usize) -> Self {
        self.max_tags = max_tags;
        self.max_tag_span = max_tag_span;
        self
    }

    pub fn with_tag_copy_budget(mut self, budget: usize) -> Self {
        self.tag_copy_budget = budget;
        self
    }

    pub fn with_max_key_groups(mut self, groups: usize) -> Self {
        self.max_key_groups = groups;
        self
    }

    pub fn with_max_env_entries(mut self, entries: usize) -> Self {
        self.max_env_entries = entries;
        self
    }

    /// Override the recovery `bootcmd`; values longer than
    /// [`CONFIG_STR_MAX`] are rejected and the old value is kept
    pub fn with_recovery_bootcmd(mut self, cmd: &str) -> Self {
        if let Ok(value) = ArrayString::from(cmd) {
            self.recovery_bootcmd = value;
        }
        self
    }

    pub fn with_fastboot_preboot(mut self, cmd: &str) -> Self {
        if let Ok(value) = ArrayString::from(cmd) {
            self.fastboot_preboot = value;
        }
        self
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn config_str(s: &str) -> ConfigStr {
    let mut out = ArrayString::new();
    // Built-in defaults are all far below CONFIG_STR_MAX
    let _ = out.try_push_str(s);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_board_behaviour() {
        let config = BoardConfig::default();
        assert_eq!(config.keys_compatible.as_str(), "gpio-keys");
        assert_eq!(config.recovery_bootcmd.as_str(), "run recoverybootcmd");
        assert_eq!(config.fastboot_preboot.as_str(), "setenv preboot; run fastbootcmd");
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn verbosity_maps_to_level_filter() {
        assert_eq!(BoardConfig::new().with_verbosity(0).level_filter(), LevelFilter::Error);
        assert_eq!(BoardConfig::new().with_verbosity(2).level_filter(), LevelFilter::Debug);
        assert_eq!(BoardConfig::new().with_verbosity(7).level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn oversized_override_keeps_previous_value() {
        let long = "x".repeat(CONFIG_STR_MAX + 1);
        let config = BoardConfig::new().with_recovery_bootcmd(&long);
        assert_eq!(config.recovery_bootcmd.as_str(), "run recoverybootcmd");

        let config = BoardConfig::new().with_recovery_bootcmd("run altbootcmd");
        assert_eq!(config.recovery_bootcmd.as_str(), "run altbootcmd");
    }
}
