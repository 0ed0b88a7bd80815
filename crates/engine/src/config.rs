//! Rail configuration via `rail.toml`
//!
//! Settings are read once when a store or cache is created. To change them,
//! edit the file and reopen; nothing is reloaded at runtime.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use railstat_core::{RailError, RailResult};

use crate::scan::ScanStrategy;

/// Config file name placed next to the rail files.
pub const CONFIG_FILE_NAME: &str = "rail.toml";

/// What a builder does when another process holds the build lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockPolicy {
    /// Wait for the other builder, then reuse its file.
    #[default]
    Block,
    /// Return [`RailError::LockContention`] immediately.
    FailFast,
}

/// Rail configuration loaded from `rail.toml`.
///
/// # Example
///
/// ```toml
/// lock_policy = "block"
/// scan_strategy = "sequential"
/// sync = true
/// # rail_dir = "/var/lib/railstat"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RailConfig {
    /// Lock policy: `"block"` or `"fail_fast"`.
    #[serde(default = "default_lock_policy_str")]
    pub lock_policy: String,
    /// Scan strategy: `"sequential"` or `"partitioned"`.
    #[serde(default = "default_scan_strategy_str")]
    pub scan_strategy: String,
    /// Partition count for the partitioned strategy; 0 = thread pool size.
    #[serde(default)]
    pub partitions: usize,
    /// fsync the rail before it is renamed into place.
    #[serde(default = "default_sync")]
    pub sync: bool,
    /// Directory holding rail files; defaults to the index directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rail_dir: Option<PathBuf>,
}

fn default_lock_policy_str() -> String {
    "block".to_string()
}

fn default_scan_strategy_str() -> String {
    "sequential".to_string()
}

fn default_sync() -> bool {
    true
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            lock_policy: default_lock_policy_str(),
            scan_strategy: default_scan_strategy_str(),
            partitions: 0,
            sync: default_sync(),
            rail_dir: None,
        }
    }
}

impl RailConfig {
    /// Parse the lock policy string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"block"` or `"fail_fast"`.
    pub fn lock_policy(&self) -> RailResult<LockPolicy> {
        match self.lock_policy.as_str() {
            "block" => Ok(LockPolicy::Block),
            "fail_fast" => Ok(LockPolicy::FailFast),
            other => Err(RailError::Config(format!(
                "Invalid lock policy '{}' in rail.toml. Expected \"block\" or \"fail_fast\".",
                other
            ))),
        }
    }

    /// Parse the scan strategy string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"sequential"` or `"partitioned"`.
    pub fn scan_strategy(&self) -> RailResult<ScanStrategy> {
        match self.scan_strategy.as_str() {
            "sequential" => Ok(ScanStrategy::Sequential),
            "partitioned" => Ok(ScanStrategy::PartitionedParallel {
                partitions: self.partitions,
            }),
            other => Err(RailError::Config(format!(
                "Invalid scan strategy '{}' in rail.toml. Expected \"sequential\" or \"partitioned\".",
                other
            ))),
        }
    }

    /// Directory for rail files of an index living in `index_dir`.
    pub fn rail_dir<'a>(&'a self, index_dir: &'a Path) -> &'a Path {
        self.rail_dir.as_deref().unwrap_or(index_dir)
    }

    /// Path of the rail file for `field`.
    ///
    /// # Errors
    ///
    /// Returns an error if `field` cannot be used as a file name.
    pub fn rail_path(&self, index_dir: &Path, field: &str) -> RailResult<PathBuf> {
        if field.is_empty()
            || field == "."
            || field == ".."
            || field.contains(['/', '\\', '\0'])
        {
            return Err(RailError::invalid_input(format!(
                "field name '{}' cannot be used as a rail file name",
                field
            )));
        }
        Ok(self.rail_dir(index_dir).join(format!("{}.rail", field)))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Rail configuration
#
# What to do when another process is building the same rail:
#   "block"     = wait for it, then load its file (default)
#   "fail_fast" = return a lock contention error
lock_policy = "block"

# Scan strategy: "sequential" (default) or "partitioned".
# The partitioned strategy splits documents into disjoint ranges reduced
# on the rayon pool. It is usually not faster than a single pass.
scan_strategy = "sequential"

# Partitions for the partitioned strategy (0 = thread pool size)
partitions = 0

# fsync the rail file before renaming it into place
sync = true

# Directory holding rail files (default: the index directory)
# rail_dir = "/var/lib/railstat"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> RailResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RailError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: RailConfig = toml::from_str(&content).map_err(|e| {
            RailError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        tracing::debug!(target: "railstat::config", path = %path.display(), ?config, "Loaded rail config");
        Ok(config)
    }

    /// Validate every enumerated setting.
    pub fn validate(&self) -> RailResult<()> {
        self.lock_policy()?;
        self.scan_strategy()?;
        Ok(())
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> RailResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                RailError::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            tracing::info!(target: "railstat::config", path = %path.display(), "Wrote default rail config");
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> RailResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RailError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            RailError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
