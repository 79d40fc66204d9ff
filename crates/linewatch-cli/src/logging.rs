//! Provide tracing, tailored to this program.
//!
//! `main` calls [`init`] once at startup. Log output goes to stderr so that
//! stdout carries only the monitor report.

use std::io;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise each `-v` raises the default level
/// from INFO to DEBUG and then TRACE.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
