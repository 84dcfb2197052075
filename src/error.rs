use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Run-level failure. Any of these aborts the whole pipeline.
#[derive(Debug, Error)]
pub enum FengenError {
    #[error("failed to open '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),

    #[error("invalid input pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("no PGN files found in '{}'", .0.display())]
    NoInputs(PathBuf),

    #[error("{0} stage panicked")]
    StagePanicked(&'static str),

    #[error("run cancelled")]
    Cancelled,
}

/// Reasons a single game is dropped. These never stop a run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("empty tags")]
    EmptyTags,

    #[error("missing Result tag")]
    MissingResult,

    #[error("bad game result '{0}'")]
    BadResult(String),

    #[error("inconsistent moves and comments: {moves} moves, {comments} comments")]
    MoveCommentMismatch { moves: usize, comments: usize },

    #[error("ply {ply}: {source}")]
    Comment {
        ply: usize,
        #[source]
        source: CommentError,
    },

    #[error("no moves")]
    NoMoves,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommentError {
    #[error("malformed comment '{0}'")]
    Malformed(String),

    #[error("bad score '{0}' in comment")]
    Score(String),

    #[error("bad depth '{0}' in comment")]
    Depth(String),
}

/// Keeps the first fatal error reported by any stage; later ones are dropped.
#[derive(Debug, Default)]
pub struct FirstError(Mutex<Option<FengenError>>);

impl FirstError {
    /// Returns `true` when `err` became the run's error.
    pub fn record(&self, err: FengenError) -> bool {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        true
    }

    pub fn take(&self) -> Option<FengenError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
