use std::path::PathBuf;

use flexwm_runtime::{ConfigError, ServiceError, TreeError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_INPUT: i32 = 3;
pub const EXIT_SERVICE: i32 = 4;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad tree snapshot in {}: {source}", path.display())]
    Tree {
        path: PathBuf,
        #[source]
        source: TreeError,
    },

    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => EXIT_CONFIG,
            Self::ReadInput { .. } | Self::Tree { .. } => EXIT_INPUT,
            Self::Service(_) => EXIT_SERVICE,
            Self::Io(_) => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_category() {
        let config = CliError::Config(ConfigError::Validation(vec!["x".into()]));
        assert_eq!(config.exit_code(), EXIT_CONFIG);

        let input = CliError::ReadInput {
            path: PathBuf::from("events.jsonl"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(input.exit_code(), EXIT_INPUT);
        assert!(input.to_string().starts_with("failed to read events.jsonl"));

        assert_eq!(CliError::Service(ServiceError::Closed).exit_code(), EXIT_SERVICE);
        let io = CliError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert_eq!(io.exit_code(), EXIT_FAILURE);
    }
}
