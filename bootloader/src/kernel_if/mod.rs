//! Kernel Interface - next-stage boot parameter block

pub mod atag_writer;
pub mod param_cursor;

pub use atag_writer::AtagWriter;
pub use param_cursor::ParamCursor;
