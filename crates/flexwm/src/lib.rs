#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod serve;

pub use cli::{run, run_from_env};
pub use error::{CliError, Result};
