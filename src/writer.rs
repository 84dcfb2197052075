use crossbeam_channel::Receiver;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::cancel::Cancellation;
use crate::error::FengenError;
use crate::types::{Game, SkipReason};

const PROGRESS_EVERY_GAMES: usize = 1000;

/// Counters kept by the sink while it writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub games: usize,
    pub positions: usize,
    pub skipped: [usize; SkipReason::ALL.len()],
}

impl SinkStats {
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped[reason.index()]
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.iter().sum()
    }
}

/// Writes `fen;score;outcome` lines, one per retained position.
pub struct DatasetWriter<W: Write> {
    out: W,
    stats: SinkStats,
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stats: SinkStats::default(),
        }
    }

    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }

    pub fn write_game(&mut self, game: &Game) -> Result<(), FengenError> {
        for info in game.position_infos() {
            writeln!(self.out, "{info}").map_err(FengenError::Write)?;
            self.stats.positions += 1;
        }
        for reason in game.items().iter().filter_map(|item| item.skip) {
            self.stats.skipped[reason.index()] += 1;
        }

        self.stats.games += 1;
        if self.stats.games.is_multiple_of(PROGRESS_EVERY_GAMES) {
            log::info!(
                "Saved {} games, {} positions",
                self.stats.games,
                self.stats.positions
            );
        }
        Ok(())
    }

    /// Flushes the output; a failed flush is a write failure.
    pub fn finish(mut self) -> Result<SinkStats, FengenError> {
        self.out.flush().map_err(FengenError::Write)?;
        log::info!(
            "Saved {} games, {} positions, skipped {}",
            self.stats.games,
            self.stats.positions,
            self.stats.skipped_total()
        );
        Ok(self.stats)
    }

    fn into_inner(self) -> W {
        self.out
    }
}

fn drain<W: Write>(
    games: &Receiver<Game>,
    writer: &mut DatasetWriter<W>,
    cancel: &Cancellation,
) -> Result<(), FengenError> {
    while let Some(game) = cancel.recv(games)? {
        writer.write_game(&game)?;
    }
    Ok(())
}

/// Sink stage: drains `games` into `out` until the queue closes.
pub fn write_games<W: Write>(
    games: &Receiver<Game>,
    out: W,
    cancel: &Cancellation,
) -> Result<SinkStats, FengenError> {
    let mut writer = DatasetWriter::new(out);
    drain(games, &mut writer, cancel)?;
    writer.finish()
}

/// Like [`write_games`], creating the output file inside the stage so the
/// handle lives no longer than the stage itself.
///
/// Lines still buffered when the stage fails or is cancelled are discarded
/// rather than flushed.
pub fn write_games_to_path(
    games: &Receiver<Game>,
    path: &Path,
    cancel: &Cancellation,
) -> Result<SinkStats, FengenError> {
    cancel.check()?;
    let file = File::create(path).map_err(FengenError::Write)?;
    let mut writer = DatasetWriter::new(BufWriter::new(file));

    match drain(games, &mut writer, cancel) {
        Ok(()) => writer.finish(),
        Err(err) => {
            let (_file, _unflushed) = writer.into_inner().into_parts();
            Err(err)
        }
    }
}
