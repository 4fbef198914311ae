//! # Dispatcher
//!
//! 批次输出模块。
//!
//! 负责：
//! - 提供文档索引 sink 与调试用 sink
//! - Fan-out 到多个 sinks
//! - 隔离失败的 sink，不影响其他 sink

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use contracts::{Batch, BatchSink};
pub use dispatcher::{create_dispatcher, create_sink, Dispatcher, DispatcherBuilder};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{DocIndex, FileSink, FileSinkConfig, IndexHandle, IndexSink, LogSink};
