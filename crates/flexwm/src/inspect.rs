//! Read-only commands: `outline` and `check-config`.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use flexwm_runtime::{FlexConfig, TreeNode, outline};

use crate::error::{CliError, Result};
use crate::serve::open_input;

#[derive(Debug, Clone, Args)]
pub struct OutlineArgs {
    /// JSON tree snapshot (`-` for stdin).
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct CheckConfigArgs {
    /// TOML or JSON configuration file.
    #[arg(long)]
    pub config: PathBuf,
}

pub fn run_outline(args: OutlineArgs) -> Result<()> {
    let text = outline_of(open_input(&args.input)?, &args.input)?;
    io::stdout().write_all(text.as_bytes())?;
    Ok(())
}

pub(crate) fn outline_of(input: impl BufRead, path: &Path) -> Result<String> {
    let tree = TreeNode::from_reader(input).map_err(|source| CliError::Tree {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(outline(&tree))
}

pub fn run_check_config(args: CheckConfigArgs) -> Result<()> {
    let report = check_config(&args.config)?;
    io::stdout().write_all(report.as_bytes())?;
    Ok(())
}

/// Load and validate a config file, describing the derived thresholds.
pub(crate) fn check_config(path: &Path) -> Result<String> {
    let config = FlexConfig::load(path)?;
    let sizings = config.to_sizings()?;
    let retry = config.retry_policy();
    Ok(format!(
        "{}: ok\n\
         soft_min_flex = {}\n\
         hard_min_flex = {}\n\
         max_flex = {}\n\
         soft_min_unflex = {}\n\
         hard_min_unflex = {}\n\
         percent_scale = {}\n\
         max_retries = {}\n\
         max_retry_delay_ms = {}\n",
        path.display(),
        sizings.soft_min_flex,
        sizings.hard_min_flex,
        sizings.max_flex,
        sizings.soft_min_unflex,
        sizings.hard_min_unflex,
        config.render.percent_scale,
        retry.max_retries,
        retry.total_max_delay().as_millis(),
    ))
}
