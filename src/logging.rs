//! Tracing subscriber setup.
//!
//! Level comes from `SDG_LOG` (e.g. `SDG_LOG=sdg_trends=debug`), defaulting to
//! `sdg_trends=info`. Logs go to stderr; stdout carries only reports.

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

pub const LOG_ENV: &str = "SDG_LOG";
pub const DEFAULT_FILTER: &str = "sdg_trends=info";

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        // `try_init` so an embedding program's subscriber wins.
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .try_init();
    });
}
