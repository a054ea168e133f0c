//! Finding sinks used by the `enumerate` command.

pub mod console;
pub mod files;
pub mod plain;

pub use console::ConsoleSink;
pub use files::{ReportFiles, ReportFormat};
pub use plain::{PlainMode, PlainSink};
