//! ID resolver module
//!
//! Handles resolution of UUID prefixes to full UUIDs by querying the API.
//! This allows users to specify short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use talus_client::TalusClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// How many recent jobs a prefix lookup scans.
const RESOLVE_SCAN_LIMIT: i64 = 200;

/// Resolve a job ID or prefix to a full UUID
///
/// If the input is already a full UUID, returns it immediately.
/// Otherwise, fetches recent jobs and finds the one matching the prefix.
///
/// # Arguments
/// * `client` - The API client to use for fetching jobs
/// * `id_or_prefix` - The ID or prefix to resolve
///
/// # Returns
/// The resolved UUID
///
/// # Errors
/// Returns an error if:
/// - No job matches the prefix
/// - Multiple jobs match the prefix (ambiguous)
/// - API call fails
pub async fn resolve_job_id(client: &TalusClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    // If it's already a full UUID, return it
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let prefix = id_or_prefix.as_str().to_lowercase();

    // Fetch recent jobs
    let jobs = client
        .list_jobs(Some(RESOLVE_SCAN_LIMIT))
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    // Find matching jobs
    let matches: Vec<_> = jobs
        .iter()
        .filter(|j| j.id.to_string().to_lowercase().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => Err(anyhow!("No job found with ID starting with '{}'", prefix)),
        1 => Ok(matches[0].id),
        _ => {
            let ids: Vec<String> = matches.iter().map(|j| j.id.to_string()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}
