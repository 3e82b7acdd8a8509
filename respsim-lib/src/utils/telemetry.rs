use std::{io::IsTerminal as _, path::Path, sync::Mutex};

use rama::{
    error::{BoxError, ErrorContext as _},
    telemetry::tracing::{
        self,
        metadata::LevelFilter,
        subscriber::{
            EnvFilter, fmt, fmt::writer::BoxMakeWriter, layer::SubscriberExt as _,
            util::SubscriberInitExt as _,
        },
    },
};

#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig<'a> {
    /// Debug instead of Info as default level.
    pub verbose: bool,
    /// Human readable multi-line output.
    pub pretty: bool,
    /// Append to this file instead of writing to stderr.
    pub output: Option<&'a Path>,
}

/// Configures structured logging with runtime control via `RUST_LOG` environment variable.
///
/// Defaults to INFO level, DEBUG when verbose.
/// Use `RUST_LOG=respsim_lib=trace` to see per-chunk stream decisions.
pub fn init_tracing(cfg: Option<TelemetryConfig<'_>>) -> Result<(), BoxError> {
    let cfg = cfg.unwrap_or_default();

    let directive = if cfg.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
    .into();
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let (writer, ansi) = match cfg.output {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .context("open tracing output file")
                .with_context_debug_field("path", || path.to_owned())?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (
            BoxMakeWriter::new(std::io::stderr),
            std::io::stderr().is_terminal(),
        ),
    };

    if cfg.pretty {
        tracing::subscriber::registry()
            .with(fmt::layer().pretty().with_ansi(ansi).with_writer(writer))
            .with(env_filter)
            .try_init()
            .context("init pretty tracing subscriber")?;
    } else {
        tracing::subscriber::registry()
            .with(fmt::layer().with_ansi(ansi).with_writer(writer))
            .with(env_filter)
            .try_init()
            .context("init tracing subscriber")?;
    }

    tracing::info!("Tracing is set up");
    Ok(())
}
