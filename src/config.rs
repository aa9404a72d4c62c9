//! Search configuration
//!
//! Boost profiles and safety caps are data, not constants, so one engine can
//! serve several profiles. The configuration is read from
//! `<config_dir>/bookfind/config.json` unless a path is given; a missing file
//! means defaults.

use crate::error::SearchError;
use crate::search::Field;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Boost weight and fuzzy similarity threshold for one field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldProfile {
    pub boost: f64,
    pub threshold: f64,
}

/// Per-field profiles for the three indexed fields.
///
/// A config file may set any subset of fields and values; the rest keep
/// their per-field defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProfileOverrides")]
pub struct FieldProfiles {
    pub title: FieldProfile,
    pub author: FieldProfile,
    pub tags: FieldProfile,
}

impl Default for FieldProfiles {
    fn default() -> Self {
        Self {
            title: FieldProfile { boost: 1.0, threshold: 0.7 },
            author: FieldProfile { boost: 0.9, threshold: 0.7 },
            tags: FieldProfile { boost: 0.5, threshold: 0.9 },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileOverrides {
    title: ProfileOverride,
    author: ProfileOverride,
    tags: ProfileOverride,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileOverride {
    boost: Option<f64>,
    threshold: Option<f64>,
}

impl ProfileOverride {
    fn apply(self, base: FieldProfile) -> FieldProfile {
        FieldProfile {
            boost: self.boost.unwrap_or(base.boost),
            threshold: self.threshold.unwrap_or(base.threshold),
        }
    }
}

impl From<ProfileOverrides> for FieldProfiles {
    fn from(overrides: ProfileOverrides) -> Self {
        let defaults = FieldProfiles::default();
        Self {
            title: overrides.title.apply(defaults.title),
            author: overrides.author.apply(defaults.author),
            tags: overrides.tags.apply(defaults.tags),
        }
    }
}

impl FieldProfiles {
    pub fn get(&self, field: Field) -> FieldProfile {
        match field {
            Field::Title => self.title,
            Field::Author => self.author,
            Field::Tags => self.tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub fields: FieldProfiles,
    /// Weight of each satisfied exact-mode clause
    pub exact_boost: f64,
    /// Result cap
    pub max_results: usize,
    /// Rank by summed boosts; when off, results keep match order
    pub aggregate_boosts: bool,
    /// Cap on candidate terms scanned per fuzzy search call
    pub max_vocabulary_scan: Option<usize>,
    /// Directory holding the index snapshot
    pub index_dir: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fields: FieldProfiles::default(),
            exact_boost: 1.0,
            max_results: 100,
            aggregate_boosts: true,
            max_vocabulary_scan: Some(50_000),
            index_dir: None,
        }
    }
}

impl SearchConfig {
    /// Reject thresholds outside [0, 1] and negative boosts
    pub fn validate(&self) -> Result<(), SearchError> {
        for field in Field::ALL {
            let profile = self.fields.get(field);
            if !(0.0..=1.0).contains(&profile.threshold) {
                return Err(SearchError::InvalidConfig(format!(
                    "{} threshold {} is outside [0, 1]",
                    field, profile.threshold
                )));
            }
            if profile.boost.is_nan() || profile.boost < 0.0 {
                return Err(SearchError::InvalidConfig(format!(
                    "{} boost {} must be non-negative",
                    field, profile.boost
                )));
            }
        }

        if self.exact_boost.is_nan() || self.exact_boost < 0.0 {
            return Err(SearchError::InvalidConfig(
                "exact_boost must be non-negative".to_string(),
            ));
        }

        if self.max_results == 0 {
            return Err(SearchError::InvalidConfig(
                "max_results must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default location of the configuration file
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bookfind").join("config.json"))
}

/// Load and validate the configuration, falling back to defaults when the
/// file does not exist
pub fn load_config(path: Option<&Path>) -> Result<SearchConfig, SearchError> {
    let path = match path.map(Path::to_path_buf).or_else(config_path) {
        Some(p) => p,
        None => return Ok(SearchConfig::default()),
    };

    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(SearchConfig::default());
    }

    let data = fs::read_to_string(&path)?;
    let config: SearchConfig = serde_json::from_str(&data)?;
    config.validate()?;

    debug!("Loaded config from {}", path.display());
    Ok(config)
}
