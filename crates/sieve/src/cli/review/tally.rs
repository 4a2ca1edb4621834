//! Running counts for the review summary.

use console::Style;
use sieve_core::{Decision, JobOutcome};
use tokio::sync::mpsc::UnboundedReceiver;

/// Decisions made and commits finished during one review.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub kept: u64,
    pub modified: u64,
    pub discarded: u64,
    pub skipped: u64,
    pub written: u64,
    pub failed: u64,
}

impl Tally {
    pub fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Keep => self.kept += 1,
            Decision::Modify => self.modified += 1,
            Decision::Discard => self.discarded += 1,
        }
    }

    /// Count one finished commit, echoing failures.
    pub fn absorb(&mut self, outcome: &JobOutcome) {
        match &outcome.result {
            Ok(committed) => {
                self.written += 1;
                tracing::debug!("Wrote {:?}", committed.processed);
            }
            Err(e) => {
                self.failed += 1;
                let err = Style::new().for_stderr().red();
                eprintln!("  {} {}: {e}", err.apply_to("✗"), outcome.source.display());
            }
        }
    }

    /// Count every outcome already delivered, without waiting.
    pub fn drain(&mut self, outcomes: &mut UnboundedReceiver<JobOutcome>) {
        while let Ok(outcome) = outcomes.try_recv() {
            self.absorb(&outcome);
        }
    }

    pub fn accepted(&self) -> u64 {
        self.kept + self.modified
    }

    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("  ====================================");
        eprintln!("               Summary");
        eprintln!("  ====================================");
        eprintln!("    Kept:         {:>8}", self.kept);
        eprintln!("    Modify:       {:>8}", self.modified);
        eprintln!("    Discarded:    {:>8}", self.discarded);
        if self.skipped > 0 {
            eprintln!("    Skipped:      {:>8}", self.skipped);
        }
        eprintln!("    ------------------------------------");
        eprintln!("    Written:      {:>8}", self.written);
        if self.failed > 0 {
            eprintln!("    Failed:       {:>8}", self.failed);
        }
        eprintln!("  ====================================");
        eprintln!();
    }
}
