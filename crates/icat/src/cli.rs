//! The `icat` command

use crate::{IcatConfig, Session};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use icat_graphics::Passthrough;
use icat_placement::{parse_cell_count, ChatBuffer};
use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Parser, Debug)]
#[command(
    name = "icat",
    version,
    about = "Show images inline in a kitty-compatible terminal"
)]
pub struct Args {
    /// Images to display
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Number of columns to display each image in
    #[arg(long, value_parser = cell_count)]
    pub columns: Option<u16>,

    /// Number of rows to display each image in
    #[arg(long, value_parser = cell_count)]
    pub rows: Option<u16>,

    /// Print the placeholder lines before the image has been transmitted;
    /// requires both --columns and --rows
    #[arg(long, requires_all = ["columns", "rows"])]
    pub print_immediately: bool,

    /// Wrap graphics commands for tmux
    #[arg(long, value_enum)]
    pub passthrough: Option<Passthrough>,

    /// Terminal device to write graphics commands to
    #[arg(long)]
    pub tty: Option<PathBuf>,

    /// Seconds to wait for one image before giving up
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Configuration from the environment with command line overrides
    pub fn config(&self) -> IcatConfig {
        let mut config = IcatConfig::from_env();
        if let Some(passthrough) = self.passthrough {
            config = config.with_passthrough(passthrough);
        }
        if let Some(tty) = &self.tty {
            config = config.with_device(tty.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_job_timeout(Duration::from_secs(secs.max(1)));
        }
        config
    }
}

fn cell_count(value: &str) -> Result<u16, String> {
    parse_cell_count(value).map_err(|e| e.to_string())
}

/// Placeholder lines go to `out`, errors to stderr. Both count as failures
/// for the exit status.
struct ConsoleBuffer<W: Write> {
    out: RefCell<W>,
    failures: Cell<usize>,
}

impl ConsoleBuffer<io::Stdout> {
    fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleBuffer<W> {
    fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
            failures: Cell::new(0),
        }
    }

    fn failures(&self) -> usize {
        self.failures.get()
    }

    fn record_failure(&self) {
        self.failures.set(self.failures.get() + 1);
    }
}

impl<W: Write> ChatBuffer for ConsoleBuffer<W> {
    fn print_line(&self, line: &str) {
        let mut out = self.out.borrow_mut();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!("Could not print placeholder line: {}", e);
            self.record_failure();
        }
    }

    fn print_error(&self, message: &str) {
        self.record_failure();
        eprintln!("{message}");
    }
}

fn init_logging(level: LogLevel, log_file: Option<&Path>) -> Result<()> {
    let level = match level {
        LogLevel::Trace => tracing::Level::TRACE,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Error => tracing::Level::ERROR,
    };

    let builder = tracing_subscriber::fmt().with_max_level(level);
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

pub async fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.log_level, args.log_file.as_deref())?;

    let config = args.config();
    debug!("Using {:?}", config);

    let buffer = Rc::new(ConsoleBuffer::stdout());
    let mut session = Session::new(config);

    for file in &args.files {
        match session.show(
            Rc::clone(&buffer),
            file,
            args.columns,
            args.rows,
            args.print_immediately,
        ) {
            Ok(outcome) => debug!("{}: {:?}", file.display(), outcome),
            Err(e) => buffer.print_error(&e.report_line("displaying image")),
        }
        // Keep output in argument order
        session.run_until_idle().await;
    }

    if buffer.failures() > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
