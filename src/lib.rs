//! Sutu ABR - Photoshop brush tip decoder
//!
//! Reads ABR brush sets (versions 1, 2, 6, 7 and 10) into named 8-bit
//! alpha brush tips. See [`abr::AbrParser`] for the entry points.

pub mod abr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a `tracing` subscriber for tools built on this crate.
///
/// The filter comes from `RUST_LOG` when set. The library itself never
/// calls this.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sutu_abr=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
