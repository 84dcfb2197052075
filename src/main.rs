use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use fengen::reader::discover_inputs;
use fengen::{Cancellation, MaterialQuiescence, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder with PGN files (*.pgn, *.pgn.zst) [default: ~/chess/pgn]
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output dataset file [default: ~/chess/fengen.txt]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Analyzer worker threads [default: half of the available cores]
    #[arg(long)]
    threads: Option<usize>,

    /// Ply budget of the quiet-position capture search
    #[arg(long, default_value_t = fengen::quiet::DEFAULT_QUIET_DEPTH)]
    quiet_depth: u32,
}

impl Cli {
    fn into_settings(self) -> Result<Settings> {
        let home = std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from);
        let mut settings = match home {
            Some(home) => Settings::under(&home),
            None if self.input.is_some() && self.output.is_some() => {
                Settings::under(&PathBuf::new())
            }
            None => anyhow::bail!("HOME is not set; pass --input and --output"),
        };

        if let Some(input) = self.input {
            settings.input_dir = input;
        }
        if let Some(output) = self.output {
            settings.output_path = output;
        }
        if let Some(threads) = self.threads {
            settings.threads = threads.max(1);
        }
        settings.quiet_depth = self.quiet_depth;
        Ok(settings)
    }
}

fn run() -> Result<()> {
    let settings = Cli::parse().into_settings()?;
    log::info!("{settings:?}");

    let inputs = discover_inputs(&settings.input_dir)?;
    log::info!("Found {} PGN files", inputs.len());

    let cancel = Cancellation::new();
    let handler = cancel.clone();
    ctrlc::set_handler(move || {
        log::warn!("Interrupted, stopping");
        handler.cancel();
    })
    .context("Failed to set Ctrl-C handler")?;

    let quiet_depth = settings.quiet_depth;
    fengen::run_to_path(
        &settings.pipeline(),
        &inputs,
        &settings.output_path,
        || MaterialQuiescence::new(quiet_depth),
        &cancel,
    )
    .with_context(|| {
        format!(
            "extracting positions into '{}'",
            settings.output_path.display()
        )
    })?;
    Ok(())
}

fn main() -> ExitCode {
    fengen::log::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
