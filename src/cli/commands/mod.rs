//! Command implementations

pub mod clear;
pub mod completions;
pub mod dashboard;
pub mod filters;
pub mod import;
pub mod init;
pub mod list;
pub mod new;
pub mod show;
pub mod sync;
pub mod watch;
