//! Tracing initialization and span definitions.

pub mod spans;

use std::sync::Once;

use intentlayer_core::config::ObservabilityConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `config.log_level`. Idempotent: only the first call
/// has an effect, and an already-installed subscriber is left in place.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let result = if config.json {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_current_span(true))
                .with(filter)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_thread_ids(true))
                .with(filter)
                .try_init()
        };
        if result.is_err() {
            tracing::debug!("global tracing subscriber already installed");
        }
    });
}
