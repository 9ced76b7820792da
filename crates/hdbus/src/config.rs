// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decoding and building limits.
//!
//! Supports programmatic, environment and (with the `config-file` feature)
//! TOML configuration.
//!
//! ```toml
//! max_depth = 32
//! max_array_bytes = 1048576
//! ```

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "config-file")]
use std::path::Path;
use thiserror::Error;

/// Protocol ceiling on the byte length of one array.
pub const PROTOCOL_MAX_ARRAY_BYTES: usize = 64 * 1024 * 1024;
/// Protocol ceiling on the byte length of one message.
pub const PROTOCOL_MAX_MESSAGE_BYTES: usize = 128 * 1024 * 1024;
/// Protocol ceiling on total container nesting.
pub const PROTOCOL_MAX_DEPTH: usize = 64;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config-file")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {key} = {value} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Resource bounds applied by [`MessageBuilder`](crate::MessageBuilder) and
/// [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct Limits {
    /// Maximum container nesting.
    pub max_depth: usize,
    /// Maximum byte length of a single array.
    pub max_array_bytes: usize,
    /// Maximum byte length of a whole message.
    pub max_message_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: PROTOCOL_MAX_DEPTH,
            max_array_bytes: PROTOCOL_MAX_ARRAY_BYTES,
            max_message_bytes: PROTOCOL_MAX_MESSAGE_BYTES,
        }
    }
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_array_bytes(mut self, bytes: usize) -> Self {
        self.max_array_bytes = bytes;
        self
    }

    pub fn max_message_bytes(mut self, bytes: usize) -> Self {
        self.max_message_bytes = bytes;
        self
    }

    /// Check every bound is non-zero and within the protocol ceilings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("max_depth", self.max_depth, PROTOCOL_MAX_DEPTH)?;
        check("max_array_bytes", self.max_array_bytes, PROTOCOL_MAX_ARRAY_BYTES)?;
        check("max_message_bytes", self.max_message_bytes, PROTOCOL_MAX_MESSAGE_BYTES)?;
        Ok(())
    }

    /// Defaults overridden by `HDBUS_MAX_DEPTH`, `HDBUS_MAX_ARRAY_BYTES` and
    /// `HDBUS_MAX_MESSAGE_BYTES` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut limits = Self::default();
        if let Some(v) = lookup("HDBUS_MAX_DEPTH") {
            limits.max_depth = parse("max_depth", &v)?;
        }
        if let Some(v) = lookup("HDBUS_MAX_ARRAY_BYTES") {
            limits.max_array_bytes = parse("max_array_bytes", &v)?;
        }
        if let Some(v) = lookup("HDBUS_MAX_MESSAGE_BYTES") {
            limits.max_message_bytes = parse("max_message_bytes", &v)?;
        }
        limits.validate()?;
        log::debug!("[hdbus::config] limits from environment: {:?}", limits);
        Ok(limits)
    }

    /// Parse limits from a TOML document. Missing keys keep their defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let limits: Self = toml::from_str(content)?;
        limits.validate()?;
        Ok(limits)
    }

    /// Load limits from a TOML file.
    #[cfg(feature = "config-file")]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let limits = Self::from_toml_str(&content)?;
        log::debug!(
            "[hdbus::config] loaded {:?} from {}",
            limits,
            path.as_ref().display()
        );
        Ok(limits)
    }
}

fn parse(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: "not an unsigned integer",
    })
}

fn check(key: &'static str, value: usize, ceiling: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be non-zero",
        });
    }
    if value > ceiling {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "exceeds protocol limit",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_depth, 64);
        assert_eq!(limits.max_array_bytes, 64 * 1024 * 1024);
        assert_eq!(limits.max_message_bytes, 128 * 1024 * 1024);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let limits = Limits::new().max_depth(8).max_array_bytes(1024);
        assert_eq!(limits.max_depth, 8);
        assert_eq!(limits.max_array_bytes, 1024);
        assert!(Limits::new().max_depth(0).validate().is_err());
        assert!(Limits::new().max_depth(65).validate().is_err());
    }

    #[test]
    fn test_env_lookup() {
        let vars: HashMap<&str, &str> =
            [("HDBUS_MAX_DEPTH", "16"), ("HDBUS_MAX_ARRAY_BYTES", " 4096 ")].into();
        let limits = Limits::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(limits.max_depth, 16);
        assert_eq!(limits.max_array_bytes, 4096);
        assert_eq!(limits.max_message_bytes, PROTOCOL_MAX_MESSAGE_BYTES);

        let bad = Limits::from_lookup(|k| (k == "HDBUS_MAX_DEPTH").then(|| "deep".to_string()));
        assert!(matches!(bad, Err(ConfigError::Invalid { key: "max_depth", .. })));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_toml_partial() {
        let limits = Limits::from_toml_str("max_depth = 10\n").unwrap();
        assert_eq!(limits.max_depth, 10);
        assert_eq!(limits.max_array_bytes, PROTOCOL_MAX_ARRAY_BYTES);

        assert!(matches!(
            Limits::from_toml_str("max_depth = \"x\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_array_bytes = 2048").unwrap();
        writeln!(file, "max_message_bytes = 8192").unwrap();

        let limits = Limits::load(file.path()).unwrap();
        assert_eq!(limits.max_array_bytes, 2048);
        assert_eq!(limits.max_message_bytes, 8192);
        assert_eq!(limits.max_depth, PROTOCOL_MAX_DEPTH);

        assert!(matches!(
            Limits::load("/nonexistent/hdbus.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
