//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest integer accepted as a rank token.
    pub max_rank: u32,
    /// A row with more unresolved numeric fields than this is rejected.
    pub max_unresolved_numeric: usize,
    /// Record absent stat columns as zero while under the unresolved limit.
    pub missing_stats_as_zero: bool,
    /// Role used when a row carries no class glyph at all.
    pub missing_symbol_role: Role,
    /// Under a header, a rankless line with fewer tokens than this is joined
    /// to the open row instead of starting its own.
    pub min_row_tokens: usize,
    /// Added to the built-in numeric confusion table.
    pub extra_numeric_confusions: BTreeMap<char, char>,
    /// Added to the built-in symbol variant lists, keyed by canonical symbol.
    pub extra_symbol_variants: BTreeMap<String, Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rank: 64,
            max_unresolved_numeric: 1,
            missing_stats_as_zero: true,
            missing_symbol_role: Role::Engineer,
            min_row_tokens: 3,
            extra_numeric_confusions: BTreeMap::new(),
            extra_symbol_variants: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
