//! Review queue: the candidate list and cursor the reviewer walks through.
//!
//! Only the review thread touches the queue. Decisions advance the cursor
//! immediately; whatever background work a decision triggers has no say in
//! when the next candidate comes up.

use std::path::{Path, PathBuf};

use crate::error::PipelineResult;
use crate::pipeline::FileDiscovery;
use crate::types::Decision;

/// Where the review stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// No folder loaded yet
    Idle,
    /// Cursor points at a candidate
    Reviewing,
    /// Every candidate has been decided (or skipped)
    Exhausted,
}

/// A decision the queue accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decided {
    pub path: PathBuf,
    pub decision: Decision,
    /// Cursor position the decision was made at
    pub index: usize,
}

/// Ordered candidates of one folder plus the review cursor.
#[derive(Debug, Default)]
pub struct ReviewQueue {
    discovery: FileDiscovery,
    folder: Option<PathBuf>,
    candidates: Vec<PathBuf>,
    cursor: usize,
}

impl ReviewQueue {
    pub fn new(discovery: FileDiscovery) -> Self {
        Self {
            discovery,
            ..Self::default()
        }
    }

    /// Replace the candidate list with the contents of `folder` and rewind.
    ///
    /// On error the previous folder and position are kept.
    pub fn load_folder(&mut self, folder: &Path) -> PipelineResult<usize> {
        let found = self.discovery.discover(folder)?;
        self.candidates = found.into_iter().map(|f| f.path).collect();
        self.folder = Some(folder.to_path_buf());
        self.cursor = 0;
        tracing::info!(
            "Loaded {} candidates from {:?}",
            self.candidates.len(),
            folder
        );
        Ok(self.candidates.len())
    }

    pub fn state(&self) -> ReviewState {
        match self.folder {
            None => ReviewState::Idle,
            Some(_) if self.cursor < self.candidates.len() => ReviewState::Reviewing,
            Some(_) => ReviewState::Exhausted,
        }
    }

    /// Candidate under the cursor, if reviewing.
    pub fn current(&self) -> Option<&Path> {
        self.candidates.get(self.cursor).map(PathBuf::as_path)
    }

    /// Folder the candidates came from.
    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates not yet decided.
    pub fn remaining(&self) -> usize {
        self.candidates.len().saturating_sub(self.cursor)
    }

    /// Record a decision on the current candidate and advance by one.
    ///
    /// A no-op returning `None` unless the queue is reviewing.
    pub fn decide(&mut self, decision: Decision) -> Option<Decided> {
        let path = self.current()?.to_path_buf();
        let index = self.cursor;
        self.cursor += 1;
        Some(Decided {
            path,
            decision,
            index,
        })
    }

    /// Step past a candidate that cannot be shown, without a decision.
    pub fn skip_current(&mut self) -> Option<PathBuf> {
        let path = self.current()?.to_path_buf();
        self.cursor += 1;
        Some(path)
    }
}
