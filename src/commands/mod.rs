//! Command implementations
//!
//! Each module corresponds to a subcommand in the CLI.

pub mod export;
pub mod token;

// Re-export commonly used types
pub use export::{report_lines as export_report, run as export_run, ExportArgs};
pub use token::{auth_url as token_auth_url, from_redirect as token_from_redirect};
