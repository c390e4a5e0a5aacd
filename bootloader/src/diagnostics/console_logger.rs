//! Console logging backend
//!
//! Forwards `log` records to a character sink (the debug UART once the
//! board has one) as `[LEVEL target] message` lines.

use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

use crate::error::{BootError, Result};

pub struct ConsoleLogger<W> {
    sink: Mutex<W>,
    level: LevelFilter,
}

impl<W: Write + Send> ConsoleLogger<W> {
    pub const fn new(sink: W, level: LevelFilter) -> Self {
        Self {
            sink: Mutex::new(sink),
            level,
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Run `f` with the sink locked
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut *self.sink.lock())
    }
}

impl<W: Write + Send + 'static> ConsoleLogger<W> {
    /// Register as the global logger; only the first call succeeds
    pub fn install(&'static self) -> Result {
        log::set_logger(self).map_err(|_| BootError::LoggerAlreadySet)?;
        log::set_max_level(self.level);
        Ok(())
    }
}

impl<W: Write + Send> Log for ConsoleLogger<W> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut sink = self.sink.lock();
        // A sink that cannot take the line has nowhere to report it either
        let _ = write!(sink, "[{} {}] {}\r\n", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use log::Level;

    fn emit(logger: &ConsoleLogger<String>, level: Level, msg: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .target("nypon")
                .args(format_args!("{}", msg))
                .build(),
        );
    }

    #[test]
    fn formats_lines_and_filters_by_level() {
        let logger = ConsoleLogger::new(String::new(), LevelFilter::Info);
        emit(&logger, Level::Error, "Invalid atags provided by primary bootloader");
        emit(&logger, Level::Debug, "hidden");
        emit(&logger, Level::Info, "DRAM: 1024 MiB");

        logger.with_sink(|out| {
            assert_eq!(
                out.as_str(),
                "[ERROR nypon] Invalid atags provided by primary bootloader\r\n[INFO nypon] DRAM: 1024 MiB\r\n"
            );
        });
    }

    static CONSOLE: ConsoleLogger<String> = ConsoleLogger::new(String::new(), LevelFilter::Info);

    #[test]
    fn second_install_is_rejected() {
        assert_eq!(CONSOLE.install(), Ok(()));
        assert_eq!(CONSOLE.install(), Err(BootError::LoggerAlreadySet));

        log::warn!(target: "nypon", "Failed to request volume-up GPIO");
        CONSOLE.with_sink(|out| assert!(out.contains("[WARN nypon] Failed to request volume-up GPIO\r\n")));
    }
}
