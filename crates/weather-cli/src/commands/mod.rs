//! Command implementations for the CLI.

mod data;
mod ingest;
mod logs;
mod maintenance;
mod query;
mod write;

pub use data::{cmd_export, cmd_import};
pub use ingest::cmd_ingest;
pub use logs::cmd_logs;
pub use maintenance::{cmd_config, cmd_rebuild, cmd_stats};
pub use query::cmd_query;
pub use write::{cmd_delete, cmd_fix, cmd_save};
