//! Session configuration

use icat_graphics::Passthrough;
use icat_placement::DEFAULT_ROWS;
use icat_tty::CONTROLLING_TERMINAL;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Upper bound on one background job
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcatConfig {
    pub job_timeout: Duration,
    /// Rows used when a request gives neither columns nor rows
    pub default_rows: u16,
    /// Terminal device graphics commands are written to
    pub device: PathBuf,
    pub passthrough: Passthrough,
}

impl Default for IcatConfig {
    fn default() -> Self {
        Self {
            job_timeout: DEFAULT_JOB_TIMEOUT,
            default_rows: DEFAULT_ROWS,
            device: PathBuf::from(CONTROLLING_TERMINAL),
            passthrough: Passthrough::Detect,
        }
    }
}

impl IcatConfig {
    /// Defaults overridden by `ICAT_TIMEOUT_SECS`, `ICAT_DEFAULT_ROWS`,
    /// `ICAT_TTY` and `ICAT_PASSTHROUGH`. Unparseable values are ignored
    /// with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup("ICAT_TIMEOUT_SECS") {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.job_timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring ICAT_TIMEOUT_SECS={:?}", value),
            }
        }

        if let Some(value) = lookup("ICAT_DEFAULT_ROWS") {
            match icat_placement::parse_cell_count(value.trim()) {
                Ok(rows) => config.default_rows = rows,
                Err(e) => warn!("Ignoring ICAT_DEFAULT_ROWS: {}", e),
            }
        }

        if let Some(value) = lookup("ICAT_TTY") {
            if !value.is_empty() {
                config.device = PathBuf::from(value);
            }
        }

        if let Some(value) = lookup("ICAT_PASSTHROUGH") {
            match value.parse() {
                Ok(mode) => config.passthrough = mode,
                Err(e) => warn!("Ignoring ICAT_PASSTHROUGH: {}", e),
            }
        }

        config
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn with_default_rows(mut self, rows: u16) -> Self {
        self.default_rows = rows;
        self
    }

    pub fn with_device(mut self, device: impl Into<PathBuf>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_passthrough(mut self, passthrough: Passthrough) -> Self {
        self.passthrough = passthrough;
        self
    }
}
