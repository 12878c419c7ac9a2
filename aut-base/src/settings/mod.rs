//! Settings loading for diagnostics tooling.
//!
//! Every tool declares a typed settings struct that implements
//! `serde::Deserialize`, with a default for each field. Values are read from
//! the following sources, later sources taking precedence:
//!
//! 1. An optional settings file passed on the command line. The format is
//!    inferred from the extension (`.json`, `.toml`, `.yaml`, ...).
//! 2. Environment variables named `AUT_<PREFIX>_<FIELD>`. Nested fields are
//!    separated by a double underscore, e.g. `AUT_DIAG_TRACING__LEVEL=debug`.
//!
//! Command line flags are applied by the tool itself after loading.

use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::path::Path;

use config::{Config, Environment, File};
use eyre::{Context, Result};
use serde::de::DeserializeOwned;

pub use trace::*;

mod trace;

/// Load a settings object for the tool identified by `prefix`, reading the
/// process environment.
pub fn load_settings<T>(prefix: &str, file: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned,
{
    load_settings_from_env(prefix, file, env::vars().collect())
}

/// Load a settings object from an optional file and an explicit set of
/// environment variables.
pub fn load_settings_from_env<T>(
    prefix: &str,
    file: Option<&Path>,
    vars: HashMap<String, String>,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let prefix = format!("AUT_{prefix}").to_ascii_uppercase();

    let mut builder = Config::builder();
    if let Some(path) = file {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config_deserializer = builder
        .add_source(
            Environment::with_prefix(&prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars)),
        )
        .build()
        .with_context(|| match file {
            Some(path) => format!("Failed to read settings file {path:?}"),
            None => "Failed to collect settings".to_owned(),
        })?;

    match config_deserializer.try_deserialize::<T>() {
        Ok(settings) => Ok(settings),
        Err(err) => {
            let context = match err.source() {
                Some(source_err) => format!("Settings error source: {source_err}"),
                None => "Settings deserialization error".to_owned(),
            };
            let err = Err(err).context(context);
            match file {
                Some(path) => err.with_context(|| format!("Settings loaded: {path:?}")),
                None => err,
            }
        }
    }
}
