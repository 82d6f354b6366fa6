//! Building registry access
//!
//! Site attributes and asset values live in an external building registry.
//! The lookup sits behind a trait so the runner can be wired with the HTTP
//! implementation in production and a static one in tests or when no
//! registry is configured. A missing record is a normal answer; only
//! transport problems are errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use talus_core::domain::site::{BuildingUse, SiteProfile, StructureType};

use crate::config::Config;

/// What the registry knows about one site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteFacts {
    pub profile: SiteProfile,
    pub asset_value: Option<f64>,
}

/// Registry lookup failure. Always treated as transient by the runner.
#[derive(Debug)]
pub struct DirectoryUnavailable(pub String);

impl std::fmt::Display for DirectoryUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "building registry unavailable: {}", self.0)
    }
}

impl std::error::Error for DirectoryUnavailable {}

/// Service trait for building registry lookups
#[async_trait]
pub trait BuildingDirectory: Send + Sync {
    /// Looks up one site. `Ok(None)` means the registry has no record and
    /// the site is scored with documented defaults.
    async fn lookup(&self, site_id: &str) -> Result<Option<SiteFacts>, DirectoryUnavailable>;
}

/// HTTP implementation against the registry service
pub struct HttpBuildingDirectory {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBuildingDirectory {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl BuildingDirectory for HttpBuildingDirectory {
    async fn lookup(&self, site_id: &str) -> Result<Option<SiteFacts>, DirectoryUnavailable> {
        let url = format!("{}/buildings/{}", self.base_url, site_id);

        // The per-request timeout is mandatory: a hung registry must never
        // stall a unit past its own deadline.
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DirectoryUnavailable(format!("request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(DirectoryUnavailable(format!(
                "registry returned {}",
                response.status()
            )));
        }

        let record: BuildingRecord = response
            .json()
            .await
            .map_err(|e| DirectoryUnavailable(format!("invalid registry payload: {e}")))?;

        Ok(Some(record.into()))
    }
}

/// Fallback used when no registry is configured: every site is unknown.
pub struct StaticDirectory;

#[async_trait]
impl BuildingDirectory for StaticDirectory {
    async fn lookup(&self, _site_id: &str) -> Result<Option<SiteFacts>, DirectoryUnavailable> {
        Ok(None)
    }
}

/// Build the directory the configuration asks for.
pub fn directory_from_config(config: &Config) -> Arc<dyn BuildingDirectory> {
    match &config.registry_url {
        Some(url) => {
            tracing::info!("Using building registry at {}", url);
            Arc::new(HttpBuildingDirectory::new(url.clone(), config.registry_timeout))
        }
        None => {
            tracing::info!("No building registry configured, scoring with defaults");
            Arc::new(StaticDirectory)
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct BuildingRecord {
    built_year: Option<i32>,
    structure: Option<String>,
    floors_above: Option<i32>,
    floors_below: Option<i32>,
    usage: Option<String>,
    asset_value: Option<f64>,
}

impl From<BuildingRecord> for SiteFacts {
    fn from(record: BuildingRecord) -> Self {
        SiteFacts {
            profile: SiteProfile {
                built_year: record.built_year,
                structure: record.structure.as_deref().and_then(StructureType::from_code),
                floors_above: record.floors_above,
                floors_below: record.floors_below,
                usage: record.usage.as_deref().and_then(BuildingUse::from_code),
            },
            asset_value: record.asset_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_directory_knows_nothing() {
        let directory = StaticDirectory;
        let facts = directory.lookup("any-site").await.unwrap();
        assert_eq!(facts, None);
    }

    #[test]
    fn http_directory_normalizes_the_base_url() {
        let directory =
            HttpBuildingDirectory::new("http://registry:9000/".to_string(), Duration::from_secs(5));
        assert_eq!(directory.base_url, "http://registry:9000");
    }

    #[test]
    fn building_record_maps_unknown_codes_to_none() {
        let record = BuildingRecord {
            built_year: Some(1998),
            structure: Some("hologram".to_string()),
            floors_above: Some(3),
            floors_below: None,
            usage: Some("residential".to_string()),
            asset_value: Some(1_500_000.0),
        };
        let facts = SiteFacts::from(record);
        assert_eq!(facts.profile.built_year, Some(1998));
        assert_eq!(facts.profile.structure, None);
        assert_eq!(facts.profile.usage, Some(BuildingUse::Residential));
        assert_eq!(facts.asset_value, Some(1_500_000.0));
    }
}
