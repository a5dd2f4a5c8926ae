//! Batch runs over a directory tree
//!
//! A failing file is logged and recorded, then the walk moves on.

use std::path::PathBuf;

use super::pipeline::{run_task, FileTask, Outcome, TaskError};
use crate::audio::Decoder;
use crate::core::{select_files, RunConfig};

/// Outcomes of a batch run, in the order files were visited
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Destinations that were written
    pub fn succeeded(&self) -> impl Iterator<Item = &PathBuf> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }
}

/// Decode every file under `config.input` whose name matches the pattern
///
/// Without a pattern this degenerates to a single task on `config.input`,
/// still treated as a batch member.
pub fn run_batch(config: &RunConfig, decoder: &dyn Decoder) -> BatchReport {
    let mut report = BatchReport::default();

    for path in select_files(&config.input, config.pattern.as_ref()) {
        let outcome = run_task(&FileTask::batch(path), config, decoder);
        if let Err(e) = &outcome {
            log::error!("{} [{}]: {}", e.path().display(), e.stage(), e);
        }
        report.outcomes.push(outcome);
    }

    log::info!(
        "{} files, {} succeeded, {} failed",
        report.total(),
        report.succeeded().count(),
        report.failed().count()
    );
    report
}
