//! Diagnostic logging setup.
//!
//! Logs go to stderr, or to the file given with `--log`. The filter comes
//! from `PARLEY_LOG` using the usual `tracing_subscriber` directive syntax and
//! defaults to `warn`. Secrets are never logged.

use std::error::Error;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "PARLEY_LOG";
const DEFAULT_FILTER: &str = "warn";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false);

    let result = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };
    result.map_err(|err| err as Box<dyn Error>)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_on_init() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("parley.log");
        // Another test may already have installed a global subscriber.
        let _ = init(Some(&path));
        assert!(path.exists());
    }

    #[test]
    fn unwritable_log_path_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("parley.log");
        assert!(init(Some(&path)).is_err());
    }
}
