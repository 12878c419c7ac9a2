//! Shared plumbing for Autonity diagnostics tooling: configuration loading,
//! tracing setup and error reporting.

// Forbid unsafe code outside of tests
#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]

use eyre::Result;

pub mod settings;

/// Install the process-wide error report handler. Call this first thing in
/// `main`, before settings are loaded, so configuration errors are rendered
/// with span traces.
pub fn setup_error_handling() -> Result<()> {
    #[cfg(feature = "color-eyre")]
    color_eyre::install()?;
    Ok(())
}
