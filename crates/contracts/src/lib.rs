//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Delivery Model
//! - Producers (documentation fragments) hand over one [`Batch`] each
//! - A single [`BatchSink`] consumes every batch exactly once, in submission order

mod batch;
mod blueprint;
mod delivery;
mod error;
mod sink;

pub use batch::*;
pub use blueprint::*;
pub use delivery::*;
pub use error::*;
pub use sink::*;
