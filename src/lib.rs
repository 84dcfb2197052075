//! Extracts labeled training positions from engine-annotated PGN files.
//!
//! Raw game records flow from [`reader`] through per-worker
//! [`filter::Analyzer`]s into the [`writer`], wired together by
//! [`pipeline::run`].

pub mod cancel;
pub mod comment;
pub mod config;
pub mod error;
pub mod filter;
pub mod game;
pub mod log;
pub mod moves;
pub mod pipeline;
pub mod quiet;
pub mod reader;
pub mod types;
pub mod writer;

pub use cancel::Cancellation;
pub use config::{PipelineConfig, Settings};
pub use error::{CommentError, FengenError, GameError};
pub use filter::{Analyzer, Classifier};
pub use pipeline::{RunSummary, run, run_to_path};
pub use quiet::{MaterialQuiescence, QuietOracle};
pub use types::{Comment, Game, GameResult, Item, PositionInfo, Score, SkipReason, Tag};
