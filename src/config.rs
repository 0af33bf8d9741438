//! Configuration file handling.
//!
//! Loads and saves depscan configuration from a TOML file.
//!
//! # Configuration Location
//!
//! - Linux: `~/.config/depscan/config.toml`
//! - macOS: `~/Library/Application Support/depscan/config.toml`
//! - Windows: `%APPDATA%\depscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! cache_ttl_hours = 24
//! skip_vuln_check = false
//! default_format = "table"
//! check_outdated = true
//!
//! [ignore]
//! packages = ["left-pad", "@types/*"]
//! vulnerabilities = ["GHSA-xxxx-yyyy-zzzz"]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use depscan::Config;
///
/// let config = Config::load().unwrap();
/// println!("Cache TTL: {} hours", config.cache_ttl_hours);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long to cache registry and OSV responses, in hours.
    pub cache_ttl_hours: u64,

    /// Whether to skip vulnerability checking by default.
    pub skip_vuln_check: bool,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json", "cyclonedx"
    pub default_format: String,

    /// Whether to check for outdated packages by default.
    pub check_outdated: bool,

    /// Ignore list configuration for suppressing known issues.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Configuration for ignoring specific packages or vulnerabilities.
///
/// Use this to suppress known false positives or accepted risks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Package names to exclude from reports.
    ///
    /// Supports glob patterns (e.g., "lodash*", "@types/*").
    pub packages: Vec<String>,

    /// Vulnerability IDs to ignore (e.g., "CVE-2021-12345", "GHSA-xxxx").
    pub vulnerabilities: Vec<String>,

    /// Package names to exclude from outdated checks.
    ///
    /// Useful for packages intentionally pinned to older versions.
    pub outdated: Vec<String>,
}

impl IgnoreConfig {
    /// Check if a package should be ignored.
    pub fn should_ignore_package(&self, name: &str) -> bool {
        self.packages.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }

    /// Check if a vulnerability should be ignored.
    pub fn should_ignore_vulnerability(&self, vuln_id: &str) -> bool {
        self.vulnerabilities.iter().any(|id| id == vuln_id)
    }

    /// Check if outdated check should be skipped for a package.
    pub fn should_ignore_outdated(&self, name: &str) -> bool {
        self.outdated.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    // Check prefix (before first *)
    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    // Check suffix (after last *)
    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    // Check middle parts
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_hours: 24,
            skip_vuln_check: false,
            default_format: "table".to_string(),
            check_outdated: true,
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file, falling back to defaults
    /// when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depscan")
            .join("config.toml")
    }

    /// Renders the default configuration as TOML, for `config --init`.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("lodash", "lodash"));
        assert!(!glob_match("lodash", "underscore"));
    }

    #[test]
    fn test_glob_match_prefix() {
        assert!(glob_match("lodash*", "lodash"));
        assert!(glob_match("lodash*", "lodash.debounce"));
        assert!(!glob_match("lodash*", "underscore"));
    }

    #[test]
    fn test_glob_match_suffix() {
        assert!(glob_match("*-loader", "ts-loader"));
        assert!(!glob_match("*-loader", "typescript"));
    }

    #[test]
    fn test_glob_match_scoped() {
        assert!(glob_match("@types/*", "@types/node"));
        assert!(glob_match("@types/*", "@types/react"));
        assert!(!glob_match("@types/*", "@babel/core"));
    }

    #[test]
    fn test_ignore_config_packages() {
        let config = IgnoreConfig {
            packages: vec!["lodash".to_string(), "@types/*".to_string()],
            vulnerabilities: vec![],
            outdated: vec![],
        };

        assert!(config.should_ignore_package("lodash"));
        assert!(config.should_ignore_package("@types/node"));
        assert!(!config.should_ignore_package("underscore"));
        assert!(!config.should_ignore_package("@babel/core"));
    }

    #[test]
    fn test_ignore_config_vulnerabilities() {
        let config = IgnoreConfig {
            packages: vec![],
            vulnerabilities: vec!["CVE-2021-12345".to_string()],
            outdated: vec![],
        };

        assert!(config.should_ignore_vulnerability("CVE-2021-12345"));
        assert!(!config.should_ignore_vulnerability("CVE-2022-99999"));
    }

    #[test]
    fn test_ignore_config_outdated() {
        let config = IgnoreConfig {
            packages: vec![],
            vulnerabilities: vec![],
            outdated: vec!["typescript".to_string()],
        };

        assert!(config.should_ignore_outdated("typescript"));
        assert!(!config.should_ignore_outdated("eslint"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.default_format, "table");
        assert!(config.check_outdated);
        assert!(!config.skip_vuln_check);
        assert!(config.ignore.packages.is_empty());
    }
}
