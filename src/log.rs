use env_logger::{Builder, Env, Target};

/// Environment variable holding the log filter, e.g. `FENGEN_LOG=debug`.
pub const LOG_ENV: &str = "FENGEN_LOG";

const DEFAULT_FILTER: &str = "info";

/// Installs the stderr logger. Safe to call more than once; only the first
/// call has an effect.
pub fn init() {
    let _ = Builder::from_env(Env::new().filter_or(LOG_ENV, DEFAULT_FILTER))
        .target(Target::Stderr)
        .format_target(false)
        .try_init();
}
