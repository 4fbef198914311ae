//! # Ingestion
//!
//! Fragment ingestion module.
//!
//! Responsibilities:
//! - Discover fragment files under a directory (`.js` scripts and `.json`)
//! - Extract the `[key, payload]` entries array from each fragment
//! - Build a `Batch` under the configured duplicate-key policy
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{discover, FragmentLoader};
//!
//! let loader = FragmentLoader::default();
//! for path in discover(root)? {
//!     let fragment = loader.load_in(root, &path)?;
//!     registry.submit(fragment.batch)?;
//! }
//! ```

mod decode;
mod error;
mod format;
mod loader;

// Re-exports
pub use decode::decode_entries;
pub use error::{IngestionError, Result};
pub use format::{extract_entries, parse_trailer, FragmentFormat, FragmentTrailer};
pub use loader::{discover, fragment_name, Fragment, FragmentLoader};
