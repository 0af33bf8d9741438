//! File-based caching for registry and vulnerability lookups.
//!
//! Audit runs hit the npm registry and OSV.dev once per package; caching the
//! responses keeps repeat scans fast and polite. Entries are JSON files with
//! a TTL measured from their modification time.
//!
//! # Cache Location
//!
//! - Linux: `~/.cache/depscan/`
//! - macOS: `~/Library/Caches/depscan/`
//! - Windows: `%LOCALAPPDATA%\depscan\`

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Default cache TTL in hours.
const CACHE_TTL_HOURS: u64 = 24;

/// A file-based cache with TTL support.
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
}

impl Cache {
    /// Creates a cache in the platform cache directory with the default
    /// 24-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl_hours(CACHE_TTL_HOURS)
    }

    /// Creates a cache with a custom TTL.
    pub fn with_ttl_hours(hours: u64) -> Self {
        let dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("depscan");
        Self {
            dir,
            ttl: Duration::from_secs(hours * 3600),
        }
    }

    /// Creates a cache rooted at an explicit directory. Used by tests.
    pub fn with_dir(dir: PathBuf, ttl_hours: u64) -> Self {
        Self {
            dir,
            ttl: Duration::from_secs(ttl_hours * 3600),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Converts a cache key to a safe filename. Keys contain package names,
    /// which may carry `@` and `/`.
    fn cache_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe_key))
    }

    /// Retrieves a value, or `None` if the key is missing or expired.
    /// Expired entries are removed on read.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key);

        if !path.exists() {
            return None;
        }

        if let Ok(metadata) = fs::metadata(&path) {
            if let Ok(modified) = metadata.modified() {
                if let Ok(elapsed) = SystemTime::now().duration_since(modified) {
                    if elapsed > self.ttl {
                        let _ = fs::remove_file(&path);
                        return None;
                    }
                }
            }
        }

        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Stores a value, serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or the
    /// entry cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.cache_path(key);
        let content = serde_json::to_string(value)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Removes every cached entry.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)?.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    let _ = fs::remove_file(path);
                }
            }
        }
        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 1);

        cache.set("npm_version_lodash", &"4.17.21".to_string()).unwrap();
        let value: Option<String> = cache.get("npm_version_lodash");
        assert_eq!(value, Some("4.17.21".to_string()));
    }

    #[test]
    fn test_get_missing_key() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 1);
        let value: Option<String> = cache.get("absent");
        assert_eq!(value, None);
    }

    #[test]
    fn test_scoped_package_key_is_safe() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 1);

        cache.set("npm_version_@types/node", &"20.0.0".to_string()).unwrap();
        let value: Option<String> = cache.get("npm_version_@types/node");
        assert_eq!(value, Some("20.0.0".to_string()));
    }

    #[test]
    fn test_clear_removes_entries() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 1);

        cache.set("a", &1u32).unwrap();
        cache.set("b", &2u32).unwrap();
        cache.clear().unwrap();

        assert_eq!(cache.get::<u32>("a"), None);
        assert_eq!(cache.get::<u32>("b"), None);
    }
}
