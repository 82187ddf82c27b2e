//! # Photo Organizer
//!
//! Copies a folder of photos into a library laid out by year and place.
//!
//! ## Behaviour
//! - **Never modifies the source** - Files are copied, never moved
//! - **Never overwrites** - Names that already exist are skipped
//! - **One copy per content** - Byte-identical files are copied once per run
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - Scanning, metadata, geocoding and the organize pipeline
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{OrganizerError, Result};

/// Initialize tracing for the library
///
/// Logs go to stderr so stdout stays free for the run summary. Filtering
/// follows `RUST_LOG`. Calling this twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
