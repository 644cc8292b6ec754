//! Container options.
//!
//! Options can be built in code, read from JSON, or read from environment
//! variables prefixed with `FERROUS_DECOR_`.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

const ENV_PREFIX: &str = "FERROUS_DECOR";

/// Options fixed when the provider is built.
///
/// ```rust
/// use ferrous_decor::ContainerOptions;
///
/// let options = ContainerOptions::from_json(r#"{ "max_build_depth": 16 }"#).unwrap();
/// assert_eq!(options.max_build_depth, 16);
/// assert!(options.resolve_unregistered_concrete_types);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Maximum nesting of producer builds on one thread.
    pub max_build_depth: usize,
    /// Build concrete types that have an activator but no registration.
    pub resolve_unregistered_concrete_types: bool,
    /// Install a [`LoggingObserver`](crate::LoggingObserver) on build.
    pub log_decisions: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        ContainerOptions {
            max_build_depth: 64,
            resolve_unregistered_concrete_types: true,
            log_decisions: false,
        }
    }
}

impl ContainerOptions {
    pub fn from_json(json: &str) -> DiResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| DiError::configuration("options", format!("Invalid container options: {}", e)))
    }

    pub fn to_json(&self) -> DiResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DiError::configuration("options", format!("Container options could not be serialized: {}", e)))
    }

    /// Defaults overridden by `FERROUS_DECOR_MAX_BUILD_DEPTH`,
    /// `FERROUS_DECOR_RESOLVE_UNREGISTERED` and `FERROUS_DECOR_LOG_DECISIONS`.
    pub fn from_env() -> DiResult<Self> {
        let mut options = ContainerOptions::default();
        if let Some(depth) = read_env("MAX_BUILD_DEPTH")? {
            options.max_build_depth = depth;
        }
        if let Some(resolve) = read_env("RESOLVE_UNREGISTERED")? {
            options.resolve_unregistered_concrete_types = resolve;
        }
        if let Some(log) = read_env("LOG_DECISIONS")? {
            options.log_decisions = log;
        }
        Ok(options)
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> DiResult<Option<T>> {
    let name = format!("{}_{}", ENV_PREFIX, key);
    match env::var(&name) {
        Ok(value) => value.trim().parse::<T>().map(Some).map_err(|_| {
            DiError::configuration("options", format!("Environment variable {} has invalid value '{}'", name, value))
        }),
        Err(_) => Ok(None),
    }
}
