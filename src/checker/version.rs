use crate::cache::Cache;
use crate::model::{OutdatedInfo, PackageRecord};
use anyhow::Result;
use serde::Deserialize;

/// Checks resolved versions against the npm registry's latest release.
pub struct VersionChecker {
    client: reqwest::Client,
    cache: Cache,
}

impl VersionChecker {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            cache: Cache::new(),
        }
    }

    pub fn with_cache(cache: Cache) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
        }
    }

    pub async fn check_outdated(&self, packages: &[PackageRecord]) -> Result<Vec<OutdatedInfo>> {
        let mut outdated = Vec::new();

        for record in packages {
            if let Some(info) = self.check_package(record).await {
                outdated.push(info);
            }
        }

        Ok(outdated)
    }

    async fn check_package(&self, record: &PackageRecord) -> Option<OutdatedInfo> {
        let latest = self.get_npm_latest(&record.name).await?;

        if is_newer(&latest, &record.version) {
            Some(OutdatedInfo {
                purl: record.purl(),
                current_version: record.version.clone(),
                latest_version: latest,
            })
        } else {
            None
        }
    }

    async fn get_npm_latest(&self, name: &str) -> Option<String> {
        let cache_key = format!("npm_version_{}", name);

        if let Some(version) = self.cache.get::<String>(&cache_key) {
            return Some(version);
        }

        #[derive(Deserialize)]
        struct NpmPackageInfo {
            #[serde(rename = "dist-tags")]
            dist_tags: Option<DistTags>,
        }

        #[derive(Deserialize)]
        struct DistTags {
            latest: Option<String>,
        }

        let url = format!("https://registry.npmjs.org/{}", name);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .ok()?;

        let info: NpmPackageInfo = response.json().await.ok()?;
        let version = info.dist_tags?.latest?;

        let _ = self.cache.set(&cache_key, &version);

        Some(version)
    }
}

impl Default for VersionChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Compares two version strings, preferring semver ordering and falling back
/// to inequality for version strings semver cannot parse.
pub fn is_newer(latest: &str, current: &str) -> bool {
    if let (Ok(latest_ver), Ok(current_ver)) = (
        semver::Version::parse(latest.trim_start_matches('v')),
        semver::Version::parse(current.trim_start_matches('v')),
    ) {
        return latest_ver > current_ver;
    }

    latest != current
}
