//! Module: config
//! Responsibility: TOML-backed compiler options and content type definitions.
//! Does not own: locating or watching config files.
//! Boundary: definitions are validated once at load and immutable afterwards.

use crate::access::{ContentType, PermissionGranularity};
use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum ConfigError {
    #[error("content type '{0}' is defined more than once")]
    DuplicateContentType(String),

    #[error("like_escape {0:?} cannot be used as a LIKE escape character")]
    InvalidLikeEscape(char),

    #[error("content type '{0}' declares bundles but has no bundle key")]
    MissingBundleKey(String),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// CompileOptions
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Rewrite `=` / `<>` on case-insensitive properties to `LIKE` /
    /// `NOT LIKE`.
    pub case_insensitive_like: bool,
    pub like_escape: char,
}

impl CompileOptions {
    /// Characters that would break the rendered `ESCAPE '<c>'` literal or
    /// collide with LIKE wildcards.
    pub const RESERVED_ESCAPES: [char; 3] = ['\'', '%', '_'];

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Self::RESERVED_ESCAPES.contains(&self.like_escape) {
            return Err(ConfigError::InvalidLikeEscape(self.like_escape));
        }

        Ok(())
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            case_insensitive_like: true,
            like_escape: '\\',
        }
    }
}

///
/// Config
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub compile: CompileOptions,

    #[serde(default, rename = "content_type")]
    pub content_types: Vec<ContentType>,
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;

        config.finish()
    }

    fn finish(mut self) -> Result<Self, ConfigError> {
        self.compile.validate()?;

        let mut seen = BTreeSet::new();

        self.content_types = self
            .content_types
            .into_iter()
            .map(|ty| {
                if !seen.insert(ty.id.clone()) {
                    return Err(ConfigError::DuplicateContentType(ty.id));
                }
                let has_bundles = ty.permission_granularity == PermissionGranularity::Bundle
                    || !ty.bundles.is_empty();
                let missing_bundle_key =
                    has_bundles && ty.bundle_key.as_deref().is_none_or(str::is_empty);
                if missing_bundle_key {
                    return Err(ConfigError::MissingBundleKey(ty.id));
                }

                Ok(ty.finish())
            })
            .collect::<Result<_, _>>()?;

        Ok(self)
    }

    #[must_use]
    pub fn content_type(&self, id: &str) -> Option<&ContentType> {
        self.content_types.iter().find(|ty| ty.id == id)
    }
}

///
/// TESTS
///
