use std::path::{Path, PathBuf};
use std::thread;

use crate::quiet::DEFAULT_QUIET_DEPTH;

/// Capacity of both pipeline queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

const CHESS_DIR: &str = "chess";
const INPUT_DIR: &str = "pgn";
const OUTPUT_FILE: &str = "fengen.txt";

/// Run settings as resolved from defaults and the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub threads: usize,
    pub quiet_depth: u32,
}

impl Settings {
    /// Defaults rooted at `<home>/chess`.
    pub fn under(home: &Path) -> Self {
        let chess_dir = home.join(CHESS_DIR);
        Self {
            input_dir: chess_dir.join(INPUT_DIR),
            output_path: chess_dir.join(OUTPUT_FILE),
            threads: Self::default_threads(),
            quiet_depth: DEFAULT_QUIET_DEPTH,
        }
    }

    /// Half of the available hardware threads, at least one.
    pub fn default_threads() -> usize {
        let available = thread::available_parallelism().map_or(1, |n| n.get());
        (available / 2).max(1)
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            threads: self.threads,
            ..PipelineConfig::default()
        }
    }
}

/// Orchestrator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Analyzer workers. Zero is treated as one.
    pub threads: usize,
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threads: Settings::default_threads(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}
