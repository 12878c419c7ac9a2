use eyre::Result;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    prelude::*,
    Layer,
};

/// Logging level. A "higher level" means more will be logged.
#[derive(Default, Debug, Clone, Copy, serde::Deserialize, PartialOrd, Ord, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    /// No output at all
    Off = 0,
    /// Unreachable node and failed submission tasks only
    Error = 1,
    /// Also transactions rejected by the node
    Warn = 2,
    /// Also loaded participants and accepted transactions
    Debug = 4,
    /// Also every signed transaction and HTTP client internals
    Trace = 5,
    /// Startup, batch progress and summary reports. Unknown names fall back
    /// to this level.
    #[serde(other)]
    #[default]
    Info = 3,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> LevelFilter {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
            Level::Info => LevelFilter::INFO,
        }
    }
}

/// Output format of the stdout log layer
#[derive(Default, Debug, Clone, Copy, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    /// Multi-line, human oriented
    Pretty,
    /// One JSON object per event
    Json,
    /// Abbreviated single line
    Compact,
    /// Default single line format
    #[serde(other)]
    #[default]
    Full,
}

/// Configuration for the tracing subscriber installed by diagnostics tools
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct TracingConfig {
    /// Log output format
    #[serde(default)]
    pub fmt: Style,
    /// Log level
    #[serde(default)]
    pub level: Level,
}

impl TracingConfig {
    /// Attempt to instantiate and register a tracing subscriber setup from
    /// settings.
    pub fn start_tracing(&self) -> Result<()> {
        let mut target_layer = Targets::new().with_default(self.level);
        if self.level < Level::Trace {
            // only show these debug and trace logs at trace level
            target_layer = target_layer.with_target("hyper", Level::Info);
            target_layer = target_layer.with_target("reqwest", Level::Info);
            target_layer = target_layer.with_target("ethers_providers", Level::Info);
        }

        let fmt_layer = match self.fmt {
            Style::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
            Style::Json => tracing_subscriber::fmt::layer().json().boxed(),
            Style::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
            Style::Full => tracing_subscriber::fmt::layer().boxed(),
        };
        let err_layer = tracing_error::ErrorLayer::default();

        tracing_subscriber::Registry::default()
            .with(target_layer)
            .with(fmt_layer)
            .with(err_layer)
            .try_init()?;
        tracing::debug!(level = ?self.level, fmt = ?self.fmt, "Tracing started");
        Ok(())
    }
}
