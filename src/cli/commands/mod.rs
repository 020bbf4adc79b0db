//! CLI command implementations.

mod analyze;
mod catalog;
mod provider;

pub use analyze::{cmd_analyze, AnalyzeArgs};
pub use catalog::cmd_catalog_list;
pub use provider::cmd_provider;
