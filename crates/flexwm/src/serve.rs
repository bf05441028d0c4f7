//! `flexwm serve`: notifications in, resize commands out.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use flexwm_runtime::{
    FlexConfig, FlexService, Notification, ResizeRenderer, ServiceHandle, ServiceStats, WriterSink,
};

use crate::error::{CliError, Result};
use crate::logging;

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// TOML or JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Newline-delimited JSON notifications (`-` for stdin).
    #[arg(long, default_value = "-")]
    pub input: PathBuf,
}

pub(crate) fn load_config(path: Option<&Path>) -> Result<FlexConfig> {
    match path {
        Some(path) => Ok(FlexConfig::load(path)?),
        None => Ok(FlexConfig::default()),
    }
}

pub(crate) fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).map_err(|source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

pub fn run_serve(args: ServeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    logging::init(&config.log.filter);
    let input = open_input(&args.input)?;
    let (stats, _) = serve_stream(&config, input, &args.input, io::stdout())?;
    tracing::info!(
        processed = stats.processed,
        failed = stats.failed,
        commands = stats.commands,
        "input closed"
    );
    Ok(())
}

/// Feed every notification in `input` through a service worker writing to
/// `output`. Blank lines are ignored and malformed lines skipped.
///
/// Returns the service counters and the output once the input is exhausted
/// and every queued pass has finished.
pub fn serve_stream<W: Write + Send + 'static>(
    config: &FlexConfig,
    input: impl BufRead,
    input_path: &Path,
    output: W,
) -> Result<(ServiceStats, W)> {
    let renderer = ResizeRenderer::new(WriterSink::new(output))
        .with_percent_scale(config.render.percent_scale)
        .with_retry(config.retry_policy());
    let service = FlexService::new(config.to_sizings()?, renderer);
    let handle = ServiceHandle::spawn(service)?;

    let mut skipped = 0usize;
    for (idx, line) in input.lines().enumerate() {
        let line = line.map_err(|source| CliError::ReadInput {
            path: input_path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Notification>(&line) {
            Ok(notification) => handle.submit(notification)?,
            Err(err) => {
                skipped += 1;
                tracing::warn!(line = idx + 1, %err, "skipping malformed notification");
            }
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "some notifications were malformed");
    }

    let service = handle.shutdown()?;
    let stats = service.stats();
    let output = service.into_renderer().into_sink().into_inner();
    Ok((stats, output))
}
