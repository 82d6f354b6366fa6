//! Job-related API endpoints

use crate::TalusClient;
use crate::error::Result;
use talus_core::domain::job::RiskJob;
use talus_core::dto::job::{JobAccepted, JobStatusView, SubmitAssessment, SubmitPrecompute};
use uuid::Uuid;

impl TalusClient {
    // =============================================================================
    // Job Submission
    // =============================================================================

    /// Submit a site assessment job
    ///
    /// # Arguments
    /// * `req` - The assessment submission request
    ///
    /// # Returns
    /// The accepted job's id and initial snapshot
    ///
    /// # Example
    /// ```no_run
    /// # use talus_client::TalusClient;
    /// # use talus_core::domain::job::SiteRequest;
    /// # use talus_core::domain::site::GeoPoint;
    /// # use talus_core::dto::job::SubmitAssessment;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = TalusClient::new("http://localhost:8080");
    /// let accepted = client.submit_assessment(SubmitAssessment {
    ///     sites: vec![SiteRequest {
    ///         location: GeoPoint::new(35.68, 139.77),
    ///         site_id: None,
    ///         profile: None,
    ///         asset_value: None,
    ///         insurance_rate: None,
    ///     }],
    ///     hazard_types: Vec::new(),
    ///     scenario: None,
    ///     epoch: None,
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_assessment(&self, req: SubmitAssessment) -> Result<JobAccepted> {
        let url = format!("{}/assessment", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Submit a hazard precompute job
    ///
    /// # Arguments
    /// * `req` - The precompute submission request
    ///
    /// # Returns
    /// The accepted job's id and initial snapshot
    pub async fn submit_precompute(&self, req: SubmitPrecompute) -> Result<JobAccepted> {
        let url = format!("{}/precompute", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Get the full job record, results included
    ///
    /// # Arguments
    /// * `job_id` - The job UUID
    ///
    /// # Returns
    /// The full job record
    pub async fn get_job(&self, job_id: Uuid) -> Result<RiskJob> {
        let url = format!("{}/job/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get the poll-friendly status snapshot of a job
    ///
    /// # Arguments
    /// * `job_id` - The job UUID
    ///
    /// # Returns
    /// The job's status, progress and item counters
    pub async fn get_job_status(&self, job_id: Uuid) -> Result<JobStatusView> {
        let url = format!("{}/job/{}/status", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List the most recently created jobs
    ///
    /// # Arguments
    /// * `limit` - Optional cap on how many jobs to return
    ///
    /// # Returns
    /// Recent jobs, newest first
    pub async fn list_jobs(&self, limit: Option<i64>) -> Result<Vec<RiskJob>> {
        let url = format!("{}/jobs", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// List all scheduled (queued) jobs
    ///
    /// # Returns
    /// A list of queued jobs
    pub async fn list_scheduled_jobs(&self) -> Result<Vec<RiskJob>> {
        let url = format!("{}/jobs/scheduled", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Cancel a queued or running job
    ///
    /// # Arguments
    /// * `job_id` - The job UUID to cancel
    pub async fn cancel_job(&self, job_id: Uuid) -> Result<()> {
        let url = format!("{}/job/{}/cancel", self.base_url, job_id);
        let response = self.client.post(&url).send().await?;

        self.handle_empty_response(response).await
    }
}
