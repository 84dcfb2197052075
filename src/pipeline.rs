use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;

use crate::cancel::Cancellation;
use crate::config::PipelineConfig;
use crate::error::{FengenError, FirstError};
use crate::filter::Analyzer;
use crate::quiet::QuietOracle;
use crate::reader::read_sources;
use crate::types::{Game, SkipReason};
use crate::writer::{SinkStats, write_games, write_games_to_path};

/// Totals of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Raw records produced by the source stage.
    pub games_read: usize,
    pub games_rejected: usize,
    pub games_written: usize,
    pub positions_written: usize,
    pub skipped: [usize; SkipReason::ALL.len()],
}

impl RunSummary {
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped[reason.index()]
    }

    fn log(&self) {
        log::info!(
            "Read {} games, rejected {}, wrote {} games with {} positions",
            self.games_read,
            self.games_rejected,
            self.games_written,
            self.positions_written
        );
        for reason in SkipReason::ALL {
            log::info!("  skipped {}: {}", reason, self.skipped(reason));
        }
    }
}

#[derive(Debug, Default)]
struct WorkerStats {
    analyzed: usize,
    rejected: usize,
}

/// Runs source, analyzers and sink over `inputs`, writing to `sink`.
///
/// `new_oracle` is called once per worker. The first fatal error of any
/// stage cancels the others and becomes the result of the run.
pub fn run<W, Q, F>(
    config: &PipelineConfig,
    inputs: &[PathBuf],
    sink: W,
    new_oracle: F,
    cancel: &Cancellation,
) -> Result<RunSummary, FengenError>
where
    W: Write + Send,
    Q: QuietOracle,
    F: Fn() -> Q + Sync,
{
    execute(config, inputs, new_oracle, cancel, move |games, cancel| {
        write_games(games, sink, cancel)
    })
}

/// Like [`run`], writing to a file created by the sink stage.
pub fn run_to_path<Q, F>(
    config: &PipelineConfig,
    inputs: &[PathBuf],
    output: &Path,
    new_oracle: F,
    cancel: &Cancellation,
) -> Result<RunSummary, FengenError>
where
    Q: QuietOracle,
    F: Fn() -> Q + Sync,
{
    execute(config, inputs, new_oracle, cancel, |games, cancel| {
        write_games_to_path(games, output, cancel)
    })
}

fn execute<Q, F, S>(
    config: &PipelineConfig,
    inputs: &[PathBuf],
    new_oracle: F,
    cancel: &Cancellation,
    sink: S,
) -> Result<RunSummary, FengenError>
where
    Q: QuietOracle,
    F: Fn() -> Q + Sync,
    S: FnOnce(&Receiver<Game>, &Cancellation) -> Result<SinkStats, FengenError> + Send,
{
    let threads = config.threads.max(1);
    let capacity = config.queue_capacity.max(1);
    log::debug!("pipeline starting: {} files, {} workers", inputs.len(), threads);

    let errors = FirstError::default();
    let (record_tx, record_rx) = bounded::<String>(capacity);
    let (game_tx, game_rx) = bounded::<Game>(capacity);

    let (read, workers, written) = thread::scope(|scope| {
        let errors = &errors;
        let new_oracle = &new_oracle;

        let source = scope.spawn(move || {
            let read = run_stage("source", errors, cancel, || {
                read_sources(inputs, &record_tx, cancel)
            });
            if read.is_some() {
                log::debug!("pipeline draining: source exhausted");
            }
            read
        });

        let analyzers: Vec<_> = (0..threads)
            .map(|worker| {
                let records = record_rx.clone();
                let games = game_tx.clone();
                scope.spawn(move || {
                    run_stage("analyzer", errors, cancel, || {
                        analyze_records(worker, &records, &games, new_oracle(), cancel)
                    })
                })
            })
            .collect();
        // The output queue closes once every analyzer has dropped its sender.
        drop(game_tx);
        drop(record_rx);

        let writer = scope.spawn(move || {
            run_stage("sink", errors, cancel, || sink(&game_rx, cancel))
        });
        log::debug!("pipeline streaming");

        let read = join_stage("source", source, errors, cancel);
        let workers: Vec<_> = analyzers
            .into_iter()
            .map(|handle| join_stage("analyzer", handle, errors, cancel))
            .collect();
        let written = join_stage("sink", writer, errors, cancel);
        (read, workers, written)
    });

    if let Some(err) = errors.take() {
        log::debug!("pipeline failed: {err}");
        return Err(err);
    }

    let mut summary = RunSummary {
        games_read: read.unwrap_or_default(),
        ..RunSummary::default()
    };
    for stats in workers.into_iter().flatten() {
        summary.games_rejected += stats.rejected;
    }
    if let Some(stats) = written {
        summary.games_written = stats.games;
        summary.positions_written = stats.positions;
        summary.skipped = stats.skipped;
    }

    log::debug!("pipeline done");
    summary.log();
    Ok(summary)
}

/// Analyzer stage: turns raw records into classified games.
///
/// Rejected games are logged and dropped; only queue failures end the stage
/// early.
fn analyze_records<Q: QuietOracle>(
    worker: usize,
    records: &Receiver<String>,
    games: &Sender<Game>,
    oracle: Q,
    cancel: &Cancellation,
) -> Result<WorkerStats, FengenError> {
    let mut analyzer = Analyzer::new(oracle);
    let mut stats = WorkerStats::default();

    while let Some(record) = cancel.recv(records)? {
        stats.analyzed += 1;
        match analyzer.analyze(&record) {
            Ok(game) => {
                if game.retained().next().is_none() {
                    log::debug!(
                        "worker {worker}: no usable positions in '{}'",
                        game.tag("Event").unwrap_or("?")
                    );
                }
                cancel.send(games, game)?;
            }
            Err(err) => {
                stats.rejected += 1;
                log::warn!("worker {worker}: skipping game: {err}");
            }
        }
    }

    log::debug!(
        "worker {worker}: analyzed {} records, rejected {}",
        stats.analyzed,
        stats.rejected
    );
    Ok(stats)
}

/// Runs one stage body, turning a panic into [`FengenError::StagePanicked`].
///
/// A failure is recorded before the stage's queue ends are dropped, so the
/// stages it unblocks cannot report first.
fn run_stage<T>(
    name: &'static str,
    errors: &FirstError,
    cancel: &Cancellation,
    body: impl FnOnce() -> Result<T, FengenError>,
) -> Option<T> {
    let result = panic::catch_unwind(AssertUnwindSafe(body))
        .unwrap_or(Err(FengenError::StagePanicked(name)));
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            fail(name, err, errors, cancel);
            None
        }
    }
}

fn join_stage<T>(
    name: &'static str,
    handle: thread::ScopedJoinHandle<'_, Option<T>>,
    errors: &FirstError,
    cancel: &Cancellation,
) -> Option<T> {
    handle.join().unwrap_or_else(|_| {
        fail(name, FengenError::StagePanicked(name), errors, cancel);
        None
    })
}

fn fail(name: &str, err: FengenError, errors: &FirstError, cancel: &Cancellation) {
    if matches!(err, FengenError::Cancelled) {
        log::debug!("{name} stage cancelled");
    } else {
        log::error!("{name} stage failed: {err}");
    }
    if errors.record(err) {
        cancel.cancel();
    }
}
