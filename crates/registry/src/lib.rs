//! # Registry
//!
//! Deferred registration between documentation fragments and the index.
//!
//! Responsibilities:
//! - Accept batches from any number of independently loaded producers
//! - Buffer them, in submission order, until the single sink attaches
//! - Flush on attach, forward afterwards, reject a second sink
//!
//! ## Usage Example
//!
//! ```ignore
//! use registry::global;
//!
//! // fragment side, at load time
//! global::submit(batch)?;
//!
//! // viewer side, once the index exists
//! let report = global::attach_sink(index_sink)?;
//! ```

pub mod global;
mod registry;
mod stats;

pub use contracts::{Batch, BatchSink, Delivery, FlushReport, RegistryError};
pub use registry::DeferredRegistry;
pub use stats::{RegistryStats, RegistryStatsSnapshot};
