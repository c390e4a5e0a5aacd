//! Board context - state carried through the board hooks
//!
//! The loader calls into the board at fixed points:
//! 1. `board_init` - clocks on, firmware hand-off recorded
//! 2. `dram_init` - SDRAM probed
//! 3. `misc_init` - key selection, then the tag pipeline
//! 4. `setup_board_tags` - retained tags spliced into the next-stage list
//!
//! Nothing here aborts the boot: failures are logged and the stage goes on
//! with less.

use crate::boot_stage::environment::{BootEnv, EnvStore};
use crate::boot_stage::key_select::{KeyBootSelector, KeyOverrides};
use crate::boot_stage::tag_pipeline::{IngestOutcome, TagPipeline};
use crate::config::BoardConfig;
use crate::diagnostics::console_logger::ConsoleLogger;
use crate::drivers::device_tree::DeviceTree;
use crate::drivers::gpio::GpioController;
use crate::error::Result;
use crate::kernel_if::param_cursor::ParamCursor;
use crate::platform::board::{BoardInfo, SDRAM_SIZE};
use crate::platform::dram::MemoryWindow;
use crate::platform::prcc::RegisterBus;
use crate::protocol::atag::TagList;

/// Values the primary bootloader left in registers at entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirmwareHandoff {
    /// Machine type (r1)
    pub machid: u32,
    /// Physical address of its ATAG list (r2)
    pub atags_addr: usize,
}

/// What `misc_init` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiscInitReport {
    pub keys: KeyOverrides,
    /// `None` when no tag list was supplied
    pub tags: Option<Result<IngestOutcome>>,
}

pub struct BoardContext {
    config: BoardConfig,
    info: BoardInfo,
    selector: KeyBootSelector,
    pipeline: TagPipeline,
    overrides: KeyOverrides,
}

impl BoardContext {
    pub fn new(config: BoardConfig) -> Self {
        let selector = KeyBootSelector::from_config(&config);
        let pipeline = TagPipeline::from_config(&config);
        Self {
            config,
            info: BoardInfo::default(),
            selector,
            pipeline,
            overrides: KeyOverrides::default(),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn info(&self) -> &BoardInfo {
        &self.info
    }

    pub fn pipeline(&self) -> &TagPipeline {
        &self.pipeline
    }

    pub fn overrides(&self) -> KeyOverrides {
        self.overrides
    }

    /// Empty boot environment sized by the configured entry limit
    pub fn new_env(&self) -> EnvStore {
        EnvStore::from_config(&self.config)
    }

    /// Console logger over `sink` at the configured verbosity
    pub fn console<W: core::fmt::Write + Send>(&self, sink: W) -> ConsoleLogger<W> {
        ConsoleLogger::new(sink, self.config.level_filter())
    }

    pub fn board_init<B: RegisterBus + ?Sized>(&mut self, bus: &mut B, handoff: FirmwareHandoff) -> &BoardInfo {
        let ram_size = self.info.ram_size;
        self.info = BoardInfo::init(bus, handoff.machid, handoff.atags_addr);
        self.info.ram_size = ram_size;
        &self.info
    }

    pub fn dram_init<M: MemoryWindow + ?Sized>(&mut self, mem: &mut M) -> usize {
        self.info.probe_ram(mem, SDRAM_SIZE)
    }

    /// The primary bootloader's tag list at `boot_params`
    ///
    /// # Safety
    /// `boot_params` must point to readable memory covering at least the
    /// configured maximum tag span, or be 0.
    pub unsafe fn firmware_tags(&self) -> TagList<'static> {
        let base = self.info.boot_params as *const u8;
        // SAFETY: forwarded to the caller
        unsafe { TagList::from_raw(base, self.config.max_tags, self.config.max_tag_span) }
    }

    /// Sample the boot keys, then copy the kept tags of `source`
    ///
    /// Keys go first so a recovery or fastboot request is honoured even
    /// when the tag list turns out to be broken.
    pub fn misc_init<T, G, E>(
        &mut self,
        source: Option<&TagList<'_>>,
        tree: Option<&T>,
        gpio: &mut G,
        env: &mut E,
    ) -> MiscInitReport
    where
        T: DeviceTree + ?Sized,
        G: GpioController + ?Sized,
        E: BootEnv + ?Sized,
    {
        self.overrides = self.selector.run(tree, gpio, &mut *env);

        let tags = source.map(|list| self.pipeline.ingest(list, &mut *env));
        if tags.is_none() {
            log::warn!("no atags from primary bootloader");
        }

        MiscInitReport {
            keys: self.overrides,
            tags,
        }
    }

    /// Append the retained tags to the next-stage list at `cursor`
    pub fn setup_board_tags(&self, cursor: &mut ParamCursor<'_>) -> Result<usize> {
        self.pipeline.emit(cursor).inspect_err(|err| {
            log::error!("Failed to pass atags: {}", err);
        })
    }
}

impl Default for BoardContext {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}
