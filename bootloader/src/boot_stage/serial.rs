// Board serial number extraction from ATAG_SERIAL

use super::environment::{BootEnv, ENV_SERIAL};
use crate::error::Result;
use crate::protocol::atag::{SerialNumber, TagPayload, TagRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// `serial#` was already set and is left alone
    AlreadySet,
}

/// Write `serial#` unless it already exists
pub fn maybe_publish<E: BootEnv + ?Sized>(env: &mut E, serial: &SerialNumber) -> Result<PublishOutcome> {
    if env.contains(ENV_SERIAL) {
        return Ok(PublishOutcome::AlreadySet);
    }

    let text = serial.to_hex();
    env.set(ENV_SERIAL, text.as_str())?;
    log::debug!("serial# = {}", text);
    Ok(PublishOutcome::Published)
}

/// Publish the serial carried by `tag`, if it is a well-formed serial tag
pub fn publish_from_tag<E: BootEnv + ?Sized>(env: &mut E, tag: &TagRef<'_>) -> Option<Result<PublishOutcome>> {
    match tag.decode() {
        TagPayload::Serial(serial) => Some(maybe_publish(env, &serial)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot_stage::environment::EnvStore;

    #[test]
    fn first_writer_wins() {
        let mut env = EnvStore::new();
        let first = SerialNumber::new(0x1, 0xABCD_EF00);
        assert_eq!(maybe_publish(&mut env, &first), Ok(PublishOutcome::Published));
        assert_eq!(env.get(ENV_SERIAL), Some("00000001abcdef00"));

        let second = SerialNumber::new(0xdead, 0xbeef);
        assert_eq!(maybe_publish(&mut env, &second), Ok(PublishOutcome::AlreadySet));
        assert_eq!(env.get(ENV_SERIAL), Some("00000001abcdef00"));
    }

    #[test]
    fn preexisting_value_is_kept() {
        let mut env = EnvStore::new();
        env.set(ENV_SERIAL, "factory").unwrap();
        assert_eq!(
            maybe_publish(&mut env, &SerialNumber::new(2, 3)),
            Ok(PublishOutcome::AlreadySet)
        );
        assert_eq!(env.get(ENV_SERIAL), Some("factory"));
    }
}
