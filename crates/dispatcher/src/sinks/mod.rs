//! Sink implementations
//!
//! Contains IndexSink, LogSink, and FileSink.

mod file;
mod index;
mod log;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::index::{DocIndex, IndexHandle, IndexSink};
pub use self::log::LogSink;
