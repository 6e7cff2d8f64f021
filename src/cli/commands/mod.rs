//! Command implementations

pub mod analyze;
pub mod classify;
pub mod common;
pub mod completions;
pub mod config;
pub mod init;
pub mod list;
pub mod summary;
pub mod template;
