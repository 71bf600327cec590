//! streamchain - line-oriented stream processing from the command line
//!
//! Reads a file or stdin, splits it into records and runs them through the
//! stages selected on the command line before writing to a file or stdout.

use anyhow::Context;
use clap::Parser;
use regex::Regex;
use serde_json::Value;
use std::cell::RefCell;
use std::convert::Infallible;
use std::path::PathBuf;
use std::rc::Rc;
use streamchain::{
    config::{self, StreamConfig},
    convert, Chunk, Delimiter, Reader, StageOptions, StreamExt, StreamRef, StreamResult,
    ThroughFn, Writer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "streamchain")]
#[command(about = "Split, filter and reshape line-oriented streams", long_about = None)]
struct Cli {
    /// Input file (stdin when omitted)
    input: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Literal delimiter to split on instead of line breaks
    #[arg(long)]
    split: Option<String>,

    /// Regex delimiter to split on
    #[arg(long, conflicts_with = "split")]
    split_regex: Option<String>,

    /// Parse every piece as a JSON record
    #[arg(long)]
    json: bool,

    /// Extract this key from every record (implies --json)
    #[arg(long)]
    pluck: Option<String>,

    /// Keep only pieces matching this regex
    #[arg(long)]
    grep: Option<String>,

    /// Group records into arrays of this size
    #[arg(long)]
    batch: Option<String>,

    /// Separator written between output pieces in data mode
    #[arg(long)]
    separator: Option<String>,

    /// Append to the output file instead of truncating it
    #[arg(long)]
    append: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StreamConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StreamConfig::load_or_default(),
    };

    let _log_guard = init_logging(&config, cli.log_file.as_ref())?;
    tracing::info!("Starting streamchain");
    if let Some(path) = config::config_path() {
        tracing::debug!("Default config location: {}", path.display());
    }

    let outcome: Rc<RefCell<Option<StreamResult<()>>>> = Rc::new(RefCell::new(None));
    build_pipeline(&cli, &config, outcome.clone())?;

    let tasks = streamchain::run();
    tracing::debug!("Pipeline drained after {} tasks", tasks);

    let result = outcome.borrow_mut().take();
    match result {
        Some(Ok(())) => {
            tracing::info!("Done");
            Ok(())
        }
        Some(Err(e)) => Err(e).context("Pipeline failed"),
        None => anyhow::bail!("Pipeline stalled before completing"),
    }
}

fn init_logging(
    config: &StreamConfig,
    log_file: Option<&PathBuf>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;
            let appender = tracing_appender::rolling::never(
                dir.unwrap_or_else(|| std::path::Path::new(".")),
                name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn build_pipeline(
    cli: &Cli,
    config: &StreamConfig,
    outcome: Rc<RefCell<Option<StreamResult<()>>>>,
) -> anyhow::Result<()> {
    let source = match &cli.input {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            convert(Reader::with_chunk_size(file, config.read_chunk_size))
        }
        None => convert(Reader::with_chunk_size(std::io::stdin(), config.read_chunk_size)),
    };

    let delimiter = match (&cli.split, &cli.split_regex) {
        (Some(literal), _) => Some(Delimiter::from(literal.as_str())),
        (None, Some(pattern)) => Some(Delimiter::Pattern(
            Regex::new(pattern).with_context(|| format!("Invalid split pattern {pattern:?}"))?,
        )),
        (None, None) => None,
    };
    let mut node: StreamRef = source.split(delimiter)?;

    if let Some(pattern) = &cli.grep {
        let re = Regex::new(pattern).with_context(|| format!("Invalid grep pattern {pattern:?}"))?;
        node = node.filter_sync(move |chunk| Ok::<_, Infallible>(re.is_match(&chunk.to_text())))?;
    }

    if cli.json || cli.pluck.is_some() {
        node = node.through_with(parse_json(), StageOptions::readable_object_mode(true))?;
    }

    if let Some(key) = &cli.pluck {
        node = node.pluck(Some(key.as_str()))?;
    }

    if let Some(size) = &cli.batch {
        node = node.batch(size.as_str())?;
    }

    // Records are written one per line; raw pieces need an explicit separator.
    if !node.is_readable_object_mode() {
        let separator = cli.separator.clone().map(Chunk::from);
        node = node.intersperse(separator)?;
    }

    let report = move |res: StreamResult<()>| *outcome.borrow_mut() = Some(res);
    match &cli.output {
        Some(path) => {
            let mut options = config.file_sink.clone();
            options.append |= cli.append;
            node.into_file_with(path, options, report)?;
        }
        None => {
            let sink = node.pipe(Writer::new(std::io::stdout()))?;
            sink.core().on_complete(report);
        }
    }

    let chain = node.chain_view();
    tracing::debug!("Pipeline tail: {:?}", chain.names());
    Ok(())
}

/// Parse each piece as JSON. Blank pieces are dropped.
fn parse_json() -> ThroughFn {
    ThroughFn::data(|bytes, _encoding, done| {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            done.ok();
            return;
        }
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => done.emit(value),
            Err(e) => done.fail(e.into()),
        }
    })
}
