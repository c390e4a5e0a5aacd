//! Boot environment
//!
//! Key/value store read later by the boot script interpreter. The board
//! stage only checks for `serial#` and writes `serial#`, `bootcmd` and
//! `preboot`; everything else passes through untouched.

use crate::config::{BoardConfig, DEFAULT_MAX_ENV_ENTRIES};
use crate::error::{BootError, Result};
use alloc::string::{String, ToString};
use hashbrown::HashMap;

pub const ENV_SERIAL: &str = "serial#";
pub const ENV_BOOTCMD: &str = "bootcmd";
pub const ENV_PREBOOT: &str = "preboot";

/// Access to the boot environment
pub trait BootEnv {
    fn get(&self, key: &str) -> Option<&str>;

    /// Set `key`; an empty value deletes it, as `setenv key` does
    fn set(&mut self, key: &str, value: &str) -> Result;

    /// Returns whether `key` existed
    fn remove(&mut self, key: &str) -> bool;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory environment with a fixed entry limit
pub struct EnvStore {
    vars: HashMap<String, String>,
    max_entries: usize,
}

impl EnvStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENV_ENTRIES)
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::with_capacity(config.max_env_entries)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            vars: HashMap::new(),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Load a default environment blob: `key=value` records separated by
    /// NUL, ending at a double NUL or at the end of the blob
    ///
    /// Later records override earlier ones. Records without `=` or with
    /// invalid UTF-8 or a bad name are skipped. Returns the number of records
    /// applied.
    pub fn import_defaults(&mut self, blob: &[u8]) -> Result<usize> {
        let mut applied = 0;
        for record in blob.split(|&b| b == 0) {
            if record.is_empty() {
                break;
            }
            let Ok(text) = core::str::from_utf8(record) else {
                log::warn!("env: skipping non-UTF-8 record");
                continue;
            };
            let Some((key, value)) = text.split_once('=') else {
                log::warn!("env: skipping record without '=': {}", text);
                continue;
            };
            match self.set(key, value) {
                Ok(()) => applied += 1,
                Err(BootError::InvalidEnvKey) => log::warn!("env: skipping record with bad name: {}", text),
                Err(err) => return Err(err),
            }
        }
        Ok(applied)
    }
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::new()
    }
}

fn valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(|c: char| c == '=' || c == '\0')
}

impl BootEnv for EnvStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: &str) -> Result {
        if !valid_key(key) {
            return Err(BootError::InvalidEnvKey);
        }
        if value.is_empty() {
            self.vars.remove(key);
            return Ok(());
        }
        if let Some(slot) = self.vars.get_mut(key) {
            slot.clear();
            slot.push_str(value);
            return Ok(());
        }
        if self.vars.len() >= self.max_entries {
            return Err(BootError::EnvFull);
        }
        self.vars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> bool {
        self.vars.remove(key).is_some()
    }
}
