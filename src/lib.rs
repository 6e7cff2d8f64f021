//! hreach: hole reachability analysis
//!
//! Flags holes whose length-to-radius ratio makes them unreachable for
//! standard tooling, rolls the result up to per-object warnings and errors,
//! and summarizes a batch of parts.

pub mod analysis;
pub mod cli;
pub mod core;
pub mod yaml;
