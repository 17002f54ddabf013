//! CLI errors and their exit codes.
//!
//! | code | meaning |
//! |------|---------|
//! | 0    | success |
//! | 2    | argument parse error (raised by clap before `run`) |
//! | 10   | engine: unknown engine, invalid params, source does not fit |
//! | 11   | I/O: seed file read, snapshot or contour write |
//! | 12   | input: bad `--params` JSON, bad colour, malformed seed file |
//! | 13   | serialization of JSON output |

use metaballs_core::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(EngineError),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Serialization(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

/// Engine I/O failures and bad colours are reported under their own codes;
/// everything else is an engine error.
impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Io(msg) => CliError::Io(msg),
            EngineError::InvalidColor(msg) => CliError::Input(format!("invalid color: {msg}")),
            other => CliError::Engine(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_kind() {
        let codes = [
            CliError::Engine(EngineError::InvalidDimensions).exit_code(),
            CliError::Io("write".into()).exit_code(),
            CliError::Input("params".into()).exit_code(),
            CliError::Serialization("json".into()).exit_code(),
        ];
        assert_eq!(codes, [10, 11, 12, 13]);
    }

    #[test]
    fn engine_io_becomes_cli_io() {
        let err = CliError::from(EngineError::Io("snapshot: disk full".into()));
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn invalid_color_becomes_input() {
        let err = CliError::from(EngineError::InvalidColor("#12".into()));
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().contains("#12"));
    }

    #[test]
    fn param_errors_stay_engine_errors() {
        let err = CliError::from(EngineError::InvalidGridSize(-1.2));
        assert_eq!(err.exit_code(), 10);
        assert!(err.to_string().contains("-1.2"));
    }

    #[test]
    fn std_io_error_becomes_cli_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "seed.json missing");
        let err = CliError::from(io);
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("seed.json"));
    }

    #[test]
    fn malformed_json_becomes_serialization() {
        let bad = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        assert_eq!(CliError::from(bad).exit_code(), 13);
    }
}
