use crossbeam_channel::Sender;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::cancel::Cancellation;
use crate::error::FengenError;

type PgnInput = Box<dyn Read + Send>;

/// Empty lines seen since the last record that end a game: one separates
/// the tag header from the movetext, the next closes the record.
const RECORD_SEPARATORS: usize = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CompressionMode {
    Plain,
    Zstd,
}

impl CompressionMode {
    fn for_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }
}

/// Sorted `*.pgn` and `*.pgn.zst` files directly inside `folder`.
pub fn discover_inputs(folder: &Path) -> Result<Vec<PathBuf>, FengenError> {
    let mut paths = Vec::new();
    for suffix in ["*.pgn", "*.pgn.zst"] {
        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&folder.to_string_lossy()),
            suffix
        );
        paths.extend(
            glob::glob(&pattern)?
                .filter_map(|entry| entry.ok())
                .filter(|path| path.is_file()),
        );
    }
    paths.sort();

    if paths.is_empty() {
        return Err(FengenError::NoInputs(folder.to_path_buf()));
    }
    Ok(paths)
}

fn open_input_stream(path: &Path) -> Result<PgnInput, FengenError> {
    let file = File::open(path).map_err(|source| FengenError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    match CompressionMode::for_path(path) {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as PgnInput)
            .map_err(|source| FengenError::Open {
                path: path.to_path_buf(),
                source,
            }),
    }
}

/// Splits a PGN stream into raw game records and hands each to `emit`.
///
/// Non-empty lines accumulate into the current record. Empty lines seen
/// while a record is open are counted; the second one flushes the record.
/// A record still pending at end of input is flushed too. Lines are decoded
/// lossily, so stray non-UTF-8 bytes only affect the game they appear in.
pub fn split_records<R, F>(mut input: R, mut emit: F) -> Result<(), SplitError>
where
    R: BufRead,
    F: FnMut(String) -> Result<(), FengenError>,
{
    let mut record = String::new();
    let mut empty_lines = 0usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).map_err(SplitError::Read)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(trim_line_ending(&buf));

        if line.trim().is_empty() {
            if record.is_empty() {
                continue;
            }
            empty_lines += 1;
            if empty_lines >= RECORD_SEPARATORS {
                emit(std::mem::take(&mut record)).map_err(SplitError::Emit)?;
                empty_lines = 0;
            }
        } else {
            record.push_str(&line);
            record.push('\n');
        }
    }

    if !record.is_empty() {
        emit(record).map_err(SplitError::Emit)?;
    }
    Ok(())
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error(transparent)]
    Emit(FengenError),
}

impl SplitError {
    fn into_fengen(self, path: &Path) -> FengenError {
        match self {
            Self::Read(source) => FengenError::Read {
                path: path.to_path_buf(),
                source,
            },
            Self::Emit(err) => err,
        }
    }
}

/// Source stage: streams records of every file, in order, into `records`.
///
/// Each file is open only while it is being read. Returns the number of
/// records emitted.
pub fn read_sources(
    paths: &[PathBuf],
    records: &Sender<String>,
    cancel: &Cancellation,
) -> Result<usize, FengenError> {
    let mut emitted = 0usize;

    for path in paths {
        cancel.check()?;
        log::debug!("reading '{}'", path.display());

        let input = BufReader::new(open_input_stream(path)?);
        split_records(input, |record| {
            cancel.send(records, record)?;
            emitted += 1;
            Ok(())
        })
        .map_err(|err| err.into_fengen(path))?;
    }

    Ok(emitted)
}
