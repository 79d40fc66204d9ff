//! linewatch: open a serial line and report counter continuity until stopped.
//!
//! Exit status: 0 after a requested shutdown, 1 if the monitor could not
//! start, 2 if the line failed while monitoring.

mod args;
mod logging;
mod report;

use anyhow::Context;
use clap::Parser;
use linewatch_core::monitor::{ContinuityMonitor, MonitorError};
use linewatch_core::settings::MonitorSettings;
use linewatch_core::transport::{list_ports, SerialTransport};
use std::io;
use std::process::ExitCode;
use std::thread;
use tokio_util::sync::CancellationToken;

use args::Args;
use logging::prelude::*;
use report::Reporter;

const EXIT_LINE_FAILED: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    if args.list_ports {
        for port in list_ports().context("Failed to enumerate serial ports")? {
            match &port.description {
                Some(description) => println!("{}\t{}", port.path, description),
                None => println!("{}", port.path),
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut settings = MonitorSettings::load_or_default(args.config.as_deref())
        .context("Failed to load settings")?;
    args.apply(&mut settings);

    if let Some(path) = &args.write_config {
        settings
            .save(path)
            .context("Failed to write settings")?;
        info!("Wrote settings to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let transport = SerialTransport::new(settings.port.clone());
    transport
        .open()
        .with_context(|| format!("Failed to open {}", settings.port.path))?;

    let cancel = CancellationToken::new();
    watch_signals(cancel.clone())?;

    let mut reporter = Reporter::new(io::stdout().lock(), settings.show_heartbeats, args.timestamps);
    let mut monitor = ContinuityMonitor::with_cancellation(&transport, cancel.clone());
    let mut code = ExitCode::SUCCESS;

    for item in monitor.by_ref() {
        match item {
            Ok(event) => reporter.report(&event).context("Failed to write report")?,
            Err(e) if e.is_fatal() => {
                reporter.finish()?;
                if is_line_failure(&e, cancel.is_cancelled()) {
                    error!("{}", e);
                    code = ExitCode::from(EXIT_LINE_FAILED);
                } else {
                    debug!("{} while shutting down", e);
                }
            }
            Err(e) => {
                reporter.finish()?;
                warn!("{}", e);
            }
        }
    }
    reporter.finish()?;

    info!("Stopped: {}", monitor.stats());
    transport.close();
    Ok(code)
}

/// A fatal error only counts as a line failure if no shutdown was requested;
/// a signal arriving mid-read ends that read with a timeout.
fn is_line_failure(err: &MonitorError, shutting_down: bool) -> bool {
    err.is_fatal() && !shutting_down
}

/// Cancel `token` on SIGINT/SIGTERM (Ctrl-C elsewhere).
///
/// Runs a small runtime on its own thread; the monitor notices the
/// cancellation after its current read returns.
fn watch_signals(token: CancellationToken) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start signal runtime")?;

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            runtime.block_on(async {
                shutdown_requested().await;
                info!("Shutting down.");
                token.cancel();
            })
        })
        .context("Failed to spawn signal thread")?;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_requested() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
        (Ok(mut sigint), Ok(mut sigterm)) => {
            tokio::select! {
                _ = sigint.recv() => {},
                _ = sigterm.recv() => {},
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!("Can't install signal handlers: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_requested() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Can't install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linewatch_core::transport::TransportError;

    #[test]
    fn test_timeout_during_shutdown_is_not_a_line_failure() {
        let err = MonitorError::from(TransportError::ReadTimeout);
        assert!(is_line_failure(&err, false));
        assert!(!is_line_failure(&err, true));
    }

    #[test]
    fn test_invalid_digit_is_never_a_line_failure() {
        let err = MonitorError::InvalidDigit { high: b'G', low: b'0' };
        assert!(!is_line_failure(&err, false));
    }
}
