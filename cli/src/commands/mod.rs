//! Command implementations for blogctl.
//!
//! Each subcommand group lives in its own module.

pub mod accounts;
pub mod info;
pub mod posts;
pub mod tags;

pub use accounts::run_accounts;
pub use info::run_info;
pub use posts::{run_comment, run_delete, run_edit, run_posts, run_publish, run_show};
pub use tags::{run_sweep, run_tags};
