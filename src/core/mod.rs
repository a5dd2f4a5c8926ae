//! Core run logic
//!
//! This module contains:
//! - Run configuration built once from the command line
//! - Source file discovery for single-file and batch runs
//! - Destination path derivation

pub mod config;
mod naming;
mod scanning;

pub use config::{CliArgs, RunConfig};
pub use naming::{normalize_suffix, output_name, DEFAULT_SUFFIX};
pub use scanning::select_files;
