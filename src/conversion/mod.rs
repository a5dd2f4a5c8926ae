//! Audio conversion module
//!
//! Drives decoded PCM to its destination: written as-is, or transcoded by
//! ffmpeg. Single files go through `run_task`; directory trees through
//! `run_batch`.

mod batch;
mod ffmpeg;
mod pipeline;

pub use batch::run_batch;
pub use pipeline::{run_task, FileTask, TaskError};

#[cfg(test)]
pub use pipeline::Stage;
