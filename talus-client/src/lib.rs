//! Talus HTTP Client
//!
//! A simple, type-safe HTTP client for communicating with the Talus orchestrator API.
//!
//! This crate provides a unified interface for the CLI and other callers to submit
//! risk jobs and poll their progress, eliminating code duplication and ensuring
//! consistency.
//!
//! # Example
//!
//! ```no_run
//! use talus_client::TalusClient;
//! use talus_core::domain::job::SiteRequest;
//! use talus_core::domain::site::GeoPoint;
//! use talus_core::dto::job::SubmitAssessment;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = TalusClient::new("http://localhost:8080");
//!
//!     // Submit an assessment for one site
//!     let accepted = client.submit_assessment(SubmitAssessment {
//!         sites: vec![SiteRequest {
//!             location: GeoPoint::new(35.68, 139.77),
//!             site_id: Some("hq".to_string()),
//!             profile: None,
//!             asset_value: None,
//!             insurance_rate: None,
//!         }],
//!         hazard_types: Vec::new(),
//!         scenario: None,
//!         epoch: None,
//!     }).await?;
//!
//!     println!("Submitted job: {}", accepted.id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Talus orchestrator API
///
/// This client provides methods for all orchestrator API endpoints, organized
/// into logical groups:
/// - Job submission (assessments, precomputes)
/// - Job lifecycle (status polling, full records, cancellation)
/// - Job listings (recent, scheduled)
#[derive(Debug, Clone)]
pub struct TalusClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl TalusClient {
    /// Create a new orchestrator client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the orchestrator API (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use talus_client::TalusClient;
    ///
    /// let client = TalusClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new orchestrator client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the orchestrator API
    /// * `client` - A configured reqwest Client
    ///
    /// # Example
    /// ```
    /// use talus_client::TalusClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = TalusClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., cancel operations)
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = TalusClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = TalusClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = TalusClient::with_client("http://localhost:8080", http_client);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
