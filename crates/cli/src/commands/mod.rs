//! Command implementations.

mod info;
mod inspect;
mod run;
mod validate;

pub use info::run_info;
pub use inspect::run_inspect;
pub use run::run_pipeline;
pub use validate::run_validate;
