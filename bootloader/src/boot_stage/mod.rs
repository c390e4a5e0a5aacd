//! Boot Stage - environment, serial extraction, tag pipeline, key selection

pub mod environment;
pub mod key_select;
pub mod serial;
pub mod tag_pipeline;

// Re-export commonly used types
pub use environment::{BootEnv, EnvStore};
pub use key_select::{KeyBootSelector, KeyOverrides, KeySearch};
pub use tag_pipeline::{IngestOutcome, PipelineState, TagPipeline};
