//! Assessment runner
//!
//! Drives one risk job from queued to a terminal state: claims the row with
//! a guarded UPDATE, fans the (site, hazard type) units out over bounded
//! tokio tasks, walks each unit through its computation stages and writes
//! the aggregated results back onto the job. A unit failure degrades the
//! run and increments `failed_items`; only infrastructure failures fail the
//! whole job.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use sqlx::PgPool;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use talus_core::domain::hazard::{HazardType, RiskLevel};
use talus_core::domain::job::{JobInput, JobKind, RiskJob, SiteRequest};
use talus_core::domain::results::{
    AalResult, ExposureResult, HazardResult, HazardTypeOutcome, ProbabilityResult, SiteRiskReport,
    VulnerabilityResult,
};
use talus_core::domain::site::SiteProfile;
use talus_engine::{aal, aggregate, bins, exposure, probability, vulnerability};

use crate::assessment::progress::{
    AGGREGATION_DONE, AGGREGATION_START, ProgressPlan, ProgressTracker,
};
use crate::assessment::upstream::BuildingDirectory;
use crate::config::Config;
use crate::repository::{climate_repository, job_repository, results_repository};

/// Executes risk jobs in-process on the orchestrator's runtime.
pub struct AssessmentRunner {
    pool: PgPool,
    directory: Arc<dyn BuildingDirectory>,
    max_parallel_units: usize,
    stage_timeout: Duration,
}

impl AssessmentRunner {
    pub fn new(pool: PgPool, directory: Arc<dyn BuildingDirectory>, config: &Config) -> Self {
        Self {
            pool,
            directory,
            max_parallel_units: config.max_parallel_units,
            stage_timeout: config.stage_timeout,
        }
    }

    /// Detaches a run task for a freshly created job and returns immediately.
    pub fn spawn(self: &Arc<Self>, job: RiskJob) {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            runner.run(job).await;
        });
    }

    /// Drives one job to a terminal state. Every outcome lands on the job
    /// row; the task itself never propagates an error.
    pub async fn run(&self, job: RiskJob) {
        // Exactly one caller wins this transition; losing means the job was
        // claimed elsewhere or cancelled while still queued.
        let claimed = match job_repository::mark_running(&self.pool, job.id).await {
            Ok(claimed) => claimed,
            Err(e) => {
                error!("Failed to claim job {}: {}", job.id, e);
                return;
            }
        };
        if !claimed {
            info!("Job {} is no longer queued, skipping", job.id);
            return;
        }

        info!(
            "Starting {} job {} ({} units)",
            job.kind,
            job.id,
            job.input.unit_count()
        );

        match self.execute(&job).await {
            Ok(results) => match job_repository::complete(&self.pool, job.id, results).await {
                Ok(true) => info!("Job {} completed", job.id),
                Ok(false) => info!("Job {} was cancelled before completion landed", job.id),
                Err(e) => error!("Failed to record completion of job {}: {}", job.id, e),
            },
            Err(e) => {
                error!("Job {} failed: {:#}", job.id, e);
                let trace = format!("{e:?}");
                let message = format!("{e:#}");
                match job_repository::fail(&self.pool, job.id, &message, Some(&trace)).await {
                    Ok(true) => {}
                    Ok(false) => info!("Job {} was cancelled before the failure landed", job.id),
                    Err(db) => error!("Failed to record failure of job {}: {}", job.id, db),
                }
            }
        }
    }

    /// Runs the fan-out and builds the results payload. An error here is an
    /// infrastructure failure and fails the whole job.
    async fn execute(&self, job: &RiskJob) -> Result<serde_json::Value> {
        let input = &job.input;

        if job.kind == JobKind::SiteAssessment {
            self.preflight(input).await?;
        }

        let ctx = Arc::new(JobContext {
            pool: self.pool.clone(),
            directory: Arc::clone(&self.directory),
            job_id: job.id,
            scenario: input.scenario.clone(),
            epoch: input.epoch.clone(),
            stage_timeout: self.stage_timeout,
            assessment_year: Utc::now().year(),
            tracker: Mutex::new(ProgressTracker::new(ProgressPlan::new(
                stage_count_for(job.kind),
                input.unit_count(),
            ))),
        });

        let mut unit_keys = Vec::with_capacity(input.unit_count());
        let mut units = Vec::with_capacity(input.unit_count());
        for (site_index, site) in input.sites.iter().enumerate() {
            for &hazard_type in &input.hazard_types {
                unit_keys.push((site_index, hazard_type));
                units.push(run_unit(Arc::clone(&ctx), job.kind, site.clone(), hazard_type));
            }
        }

        let outputs = join_bounded(self.max_parallel_units, units).await;

        let mut per_site: Vec<Vec<HazardTypeOutcome>> =
            (0..input.sites.len()).map(|_| Vec::new()).collect();
        for ((site_index, hazard_type), output) in unit_keys.into_iter().zip(outputs) {
            let outcome = match output {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    // A panicked unit loses its stage bookkeeping; the
                    // percent cap absorbs the over-count.
                    error!("Unit task of job {} panicked: {}", job.id, join_error);
                    ctx.item_failed(0).await;
                    HazardTypeOutcome::failed(hazard_type, "internal task failure")
                }
            };
            per_site[site_index].push(outcome);
        }

        ctx.mark_percent(AGGREGATION_START).await;

        let results = match job.kind {
            JobKind::SiteAssessment => {
                let reports = build_site_reports(&input.sites, per_site, Utc::now());
                serde_json::to_value(&reports).context("Failed to serialize site reports")?
            }
            JobKind::HazardPrecompute => {
                let (completed, failed) = ctx.counters().await;
                precompute_summary(input, &per_site, completed, failed)
            }
        };

        ctx.mark_percent(AGGREGATION_DONE).await;
        Ok(results)
    }

    /// An assessment needs at least one precomputed hazard row among the
    /// requested cells. None at all means the warehouse was never warmed
    /// for this scenario and the job cannot produce anything meaningful.
    async fn preflight(&self, input: &JobInput) -> Result<()> {
        let mut location_keys: Vec<String> =
            input.sites.iter().map(|s| s.location.grid_key()).collect();
        location_keys.sort();
        location_keys.dedup();

        let rows = results_repository::count_hazard_rows(
            &self.pool,
            &location_keys,
            &input.scenario,
            &input.epoch,
        )
        .await
        .context("Preflight hazard row count failed")?;

        if rows == 0 {
            anyhow::bail!(
                "no precomputed hazard data for any requested location under scenario '{}', epoch '{}'; run a precompute job first",
                input.scenario,
                input.epoch
            );
        }

        debug!(
            "Preflight: {} hazard rows cover the {} requested cells",
            rows,
            location_keys.len()
        );
        Ok(())
    }
}

fn stage_count_for(kind: JobKind) -> usize {
    match kind {
        // fetch, exposure, vulnerability, aal scaling
        JobKind::SiteAssessment => 4,
        // hazard scoring, probability estimation
        JobKind::HazardPrecompute => 2,
    }
}

/// Shared state of one run, handed to every unit.
struct JobContext {
    pool: PgPool,
    directory: Arc<dyn BuildingDirectory>,
    job_id: Uuid,
    scenario: String,
    epoch: String,
    stage_timeout: Duration,
    assessment_year: i32,
    tracker: Mutex<ProgressTracker>,
}

impl JobContext {
    /// Books one finished stage and pushes the snapshot out. The lock is
    /// held across the write so counter snapshots reach the database in
    /// order; `GREATEST` in SQL guards the percentage on top.
    async fn stage_done(&self) {
        let mut tracker = self.tracker.lock().await;
        tracker.stage_done();
        self.write_progress(
            tracker.percent(),
            tracker.completed_items(),
            tracker.failed_items(),
        )
        .await;
    }

    async fn item_completed(&self) {
        let mut tracker = self.tracker.lock().await;
        tracker.item_completed();
        self.write_progress(
            tracker.percent(),
            tracker.completed_items(),
            tracker.failed_items(),
        )
        .await;
    }

    async fn item_failed(&self, stages_done: usize) {
        let mut tracker = self.tracker.lock().await;
        tracker.item_failed(stages_done);
        self.write_progress(
            tracker.percent(),
            tracker.completed_items(),
            tracker.failed_items(),
        )
        .await;
    }

    /// Pushes an explicit percentage for the aggregation band marks.
    async fn mark_percent(&self, percent: i32) {
        let tracker = self.tracker.lock().await;
        self.write_progress(percent, tracker.completed_items(), tracker.failed_items())
            .await;
    }

    async fn counters(&self) -> (i32, i32) {
        let tracker = self.tracker.lock().await;
        (tracker.completed_items(), tracker.failed_items())
    }

    /// Progress is advisory; a failed write is logged and swallowed so it
    /// can never take a unit down.
    async fn write_progress(&self, percent: i32, completed: i32, failed: i32) {
        if let Err(e) =
            job_repository::update_progress(&self.pool, self.job_id, percent, completed, failed)
                .await
        {
            warn!("Failed to write progress for job {}: {}", self.job_id, e);
        }
    }
}

/// Runs every future from `tasks` on its own tokio task while at most
/// `parallelism` bodies make progress at once. Outputs come back in
/// submission order; a panicked task surfaces as its `JoinError`.
async fn join_bounded<F>(parallelism: usize, tasks: Vec<F>) -> Vec<Result<F::Output, JoinError>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));

    let mut handles = Vec::with_capacity(tasks.len());
    for task in tasks {
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            // Acquiring inside the task keeps every handle awaitable while
            // the permit bounds the bodies actually running. The semaphore
            // is never closed, so the acquire only ever parks.
            let _permit = semaphore.acquire_owned().await;
            task.await
        }));
    }

    let mut outputs = Vec::with_capacity(handles.len());
    for handle in handles {
        outputs.push(handle.await);
    }
    outputs
}

/// Walks one (site, hazard type) unit through its stages under the unit
/// deadline, booking progress and converting every failure into a
/// placeholder outcome.
async fn run_unit(
    ctx: Arc<JobContext>,
    kind: JobKind,
    site: SiteRequest,
    hazard_type: HazardType,
) -> HazardTypeOutcome {
    let location_key = site.location.grid_key();
    let stages_done = AtomicUsize::new(0);

    let body = async {
        match kind {
            JobKind::SiteAssessment => {
                assessment_unit(&ctx, &site, hazard_type, &location_key, &stages_done).await
            }
            JobKind::HazardPrecompute => {
                precompute_unit(&ctx, hazard_type, &location_key, &stages_done).await
            }
        }
    };

    match timeout(ctx.stage_timeout, body).await {
        Ok(Ok(outcome)) => {
            ctx.item_completed().await;
            outcome
        }
        Ok(Err(reason)) => {
            warn!(
                "Unit ({}, {}) of job {} failed: {}",
                location_key, hazard_type, ctx.job_id, reason
            );
            ctx.item_failed(stages_done.load(Ordering::Relaxed)).await;
            HazardTypeOutcome::failed(hazard_type, reason)
        }
        Err(_) => {
            warn!(
                "Unit ({}, {}) of job {} timed out after {:?}",
                location_key, hazard_type, ctx.job_id, ctx.stage_timeout
            );
            ctx.item_failed(stages_done.load(Ordering::Relaxed)).await;
            HazardTypeOutcome::failed(
                hazard_type,
                format!("computation timed out after {:?}", ctx.stage_timeout),
            )
        }
    }
}

/// The four-stage assessment chain for one unit. Returns the failure reason
/// as a plain string; the caller turns it into the placeholder outcome.
async fn assessment_unit(
    ctx: &JobContext,
    site: &SiteRequest,
    hazard_type: HazardType,
    location_key: &str,
    stages_done: &AtomicUsize,
) -> Result<HazardTypeOutcome, String> {
    let mut degraded = false;

    // Fetch stage: the precomputed rows plus the building registry record.
    // The hazard row is required input; everything else degrades.
    let hazard_row = results_repository::find_hazard(
        &ctx.pool,
        location_key,
        hazard_type,
        &ctx.scenario,
        &ctx.epoch,
    )
    .await
    .map_err(|e| format!("hazard lookup failed: {e}"))?
    .ok_or_else(|| format!("no precomputed hazard data for cell {location_key}"))?;

    let probability_row = results_repository::find_probability(
        &ctx.pool,
        location_key,
        hazard_type,
        &ctx.scenario,
        &ctx.epoch,
    )
    .await
    .map_err(|e| format!("probability lookup failed: {e}"))?;
    let base_aal = match &probability_row {
        Some(row) => row.aal,
        None => {
            degraded = true;
            0.0
        }
    };

    let (profile, registry_asset_value) = resolve_site_facts(ctx, site, &mut degraded).await?;
    ctx.stage_done().await;
    stages_done.fetch_add(1, Ordering::Relaxed);

    // Exposure stage. Source-bound hazards look their distance up; a missing
    // proximity row scores zero proximity and marks the outcome degraded.
    let distance_m = match exposure::cutoff_radius_m(hazard_type) {
        Some(_) => {
            let distance =
                climate_repository::proximity_distance_m(&ctx.pool, location_key, hazard_type)
                    .await
                    .map_err(|e| format!("proximity lookup failed: {e}"))?;
            if distance.is_none() {
                degraded = true;
            }
            distance
        }
        None => None,
    };

    let asset_value = site.asset_value.or(registry_asset_value);
    let exposure_score = exposure::assess(
        hazard_type,
        distance_m,
        exposure::normalize_asset_value(asset_value),
    );
    results_repository::upsert_exposure(
        &ctx.pool,
        &ExposureResult {
            location_key: location_key.to_string(),
            hazard_type,
            site_id: site.site_id.clone(),
            score: exposure_score.score,
            level: exposure_score.level,
            proximity_factor: exposure_score.proximity_factor,
            asset_value_norm: exposure_score.asset_value_norm,
            distance_m,
            calculated_at: Utc::now(),
        },
    )
    .await
    .map_err(|e| format!("exposure write failed: {e}"))?;
    ctx.stage_done().await;
    stages_done.fetch_add(1, Ordering::Relaxed);

    // Vulnerability stage.
    let vulnerability_score = vulnerability::assess(hazard_type, &profile, ctx.assessment_year);
    results_repository::upsert_vulnerability(
        &ctx.pool,
        &VulnerabilityResult {
            location_key: location_key.to_string(),
            hazard_type,
            site_id: site.site_id.clone(),
            score: vulnerability_score.score,
            level: vulnerability_score.level,
            breakdown: vulnerability_score.breakdown.clone(),
            calculated_at: Utc::now(),
        },
    )
    .await
    .map_err(|e| format!("vulnerability write failed: {e}"))?;
    ctx.stage_done().await;
    stages_done.fetch_add(1, Ordering::Relaxed);

    // AAL scaling stage.
    let insurance_rate = site.insurance_rate.unwrap_or(0.0);
    let scaled = aal::scale(base_aal, vulnerability_score.score, insurance_rate, asset_value)
        .map_err(|e| format!("aal scaling failed: {e}"))?;
    results_repository::upsert_aal(
        &ctx.pool,
        &AalResult {
            location_key: location_key.to_string(),
            hazard_type,
            site_id: site.site_id.clone(),
            base_aal,
            vulnerability_factor: scaled.vulnerability_factor,
            insurance_rate,
            final_aal: scaled.final_aal,
            expected_loss: scaled.expected_loss,
            calculated_at: Utc::now(),
        },
    )
    .await
    .map_err(|e| format!("aal write failed: {e}"))?;
    ctx.stage_done().await;
    stages_done.fetch_add(1, Ordering::Relaxed);

    Ok(HazardTypeOutcome {
        hazard_type,
        hazard_score_100: hazard_row.score_100,
        hazard_level: hazard_row.level,
        exposure_score: exposure_score.score,
        exposure_level: exposure_score.level,
        vulnerability_score: vulnerability_score.score,
        vulnerability_level: vulnerability_score.level,
        base_aal,
        final_aal: scaled.final_aal,
        expected_loss: scaled.expected_loss,
        degraded,
        failure: None,
    })
}

/// The two-stage precompute chain: score the cell's indicators, then turn
/// its intensity series into a bin distribution. Both rows are upserted so
/// a re-run refreshes the cell in place.
async fn precompute_unit(
    ctx: &JobContext,
    hazard_type: HazardType,
    location_key: &str,
    stages_done: &AtomicUsize,
) -> Result<HazardTypeOutcome, String> {
    let indicators = climate_repository::indicator_values(
        &ctx.pool,
        location_key,
        hazard_type,
        &ctx.scenario,
        &ctx.epoch,
    )
    .await
    .map_err(|e| format!("indicator lookup failed: {e}"))?;

    let hazard_score = talus_engine::hazard::score(hazard_type, &indicators);
    results_repository::upsert_hazard(
        &ctx.pool,
        &HazardResult {
            location_key: location_key.to_string(),
            hazard_type,
            scenario: ctx.scenario.clone(),
            epoch: ctx.epoch.clone(),
            score: hazard_score.score,
            score_100: hazard_score.score_100,
            level: hazard_score.level,
            calculated_at: Utc::now(),
        },
    )
    .await
    .map_err(|e| format!("hazard write failed: {e}"))?;
    ctx.stage_done().await;
    stages_done.fetch_add(1, Ordering::Relaxed);

    let samples = climate_repository::intensity_series(
        &ctx.pool,
        location_key,
        hazard_type,
        &ctx.scenario,
        &ctx.epoch,
    )
    .await
    .map_err(|e| format!("intensity lookup failed: {e}"))?;

    let spec = bins::spec_for(hazard_type);
    let estimate = probability::estimate(&samples, spec);
    let base_aal = estimate.aal;
    let sample_count = estimate.sample_count;
    results_repository::upsert_probability(
        &ctx.pool,
        &ProbabilityResult {
            location_key: location_key.to_string(),
            hazard_type,
            scenario: ctx.scenario.clone(),
            epoch: ctx.epoch.clone(),
            bin_probabilities: estimate.bin_probabilities,
            aal: base_aal,
            method: estimate.method,
            sample_count: sample_count as i32,
            calculated_at: Utc::now(),
        },
    )
    .await
    .map_err(|e| format!("probability write failed: {e}"))?;
    ctx.stage_done().await;
    stages_done.fetch_add(1, Ordering::Relaxed);

    // An empty warehouse cell still writes rows (score 0, uniform vector)
    // but the outcome is flagged so the summary shows it leaned on priors.
    let degraded = indicators.is_empty() || sample_count == 0;
    Ok(HazardTypeOutcome {
        hazard_type,
        hazard_score_100: hazard_score.score_100,
        hazard_level: hazard_score.level,
        exposure_score: 0.0,
        exposure_level: RiskLevel::VeryLow,
        vulnerability_score: 0.0,
        vulnerability_level: RiskLevel::VeryLow,
        base_aal,
        final_aal: 0.0,
        expected_loss: None,
        degraded,
        failure: None,
    })
}

/// Resolves the building profile and the registry's asset value for one
/// site: a submitted profile wins outright, otherwise the registry is
/// consulted by site id. A missing record scores default attributes and
/// marks the outcome degraded; only transport failures abort the unit.
async fn resolve_site_facts(
    ctx: &JobContext,
    site: &SiteRequest,
    degraded: &mut bool,
) -> Result<(SiteProfile, Option<f64>), String> {
    if let Some(profile) = &site.profile {
        return Ok((profile.clone(), None));
    }

    let Some(site_id) = &site.site_id else {
        return Ok((SiteProfile::default(), None));
    };

    match ctx.directory.lookup(site_id).await {
        Ok(Some(facts)) => {
            let asset_value = facts
                .asset_value
                .filter(|v| v.is_finite() && *v >= 0.0);
            Ok((facts.profile, asset_value))
        }
        Ok(None) => {
            *degraded = true;
            Ok((SiteProfile::default(), None))
        }
        Err(e) => Err(e.to_string()),
    }
}

fn build_site_reports(
    sites: &[SiteRequest],
    per_site: Vec<Vec<HazardTypeOutcome>>,
    calculated_at: DateTime<Utc>,
) -> Vec<SiteRiskReport> {
    sites
        .iter()
        .zip(per_site)
        .map(|(site, outcomes)| {
            let location_key = site.location.grid_key();
            let summary = aggregate::aggregate(
                site.site_id.clone(),
                &location_key,
                &outcomes,
                calculated_at,
            );
            SiteRiskReport {
                site_id: site.site_id.clone(),
                location_key,
                outcomes,
                summary,
            }
        })
        .collect()
}

fn precompute_summary(
    input: &JobInput,
    per_site: &[Vec<HazardTypeOutcome>],
    completed: i32,
    failed: i32,
) -> serde_json::Value {
    let mut failures = Vec::new();
    for (site, outcomes) in input.sites.iter().zip(per_site) {
        for outcome in outcomes.iter().filter(|o| o.is_failed()) {
            failures.push(serde_json::json!({
                "location_key": site.location.grid_key(),
                "hazard_type": outcome.hazard_type,
                "reason": outcome.failure,
            }));
        }
    }

    serde_json::json!({
        "locations": input.sites.len(),
        "hazard_types": input.hazard_types.len(),
        "completed_units": completed,
        "failed_units": failed,
        "failures": failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use talus_core::domain::site::GeoPoint;

    fn site(site_id: Option<&str>) -> SiteRequest {
        SiteRequest {
            location: GeoPoint::new(35.68, 139.77),
            site_id: site_id.map(|s| s.to_string()),
            profile: None,
            asset_value: None,
            insurance_rate: None,
        }
    }

    fn ok_outcome(hazard_type: HazardType) -> HazardTypeOutcome {
        HazardTypeOutcome {
            hazard_type,
            hazard_score_100: 55,
            hazard_level: RiskLevel::Moderate,
            exposure_score: 0.5,
            exposure_level: RiskLevel::Moderate,
            vulnerability_score: 45.0,
            vulnerability_level: RiskLevel::Moderate,
            base_aal: 0.01,
            final_aal: 0.0098,
            expected_loss: None,
            degraded: false,
            failure: None,
        }
    }

    #[test]
    fn stage_counts_per_kind() {
        assert_eq!(stage_count_for(JobKind::SiteAssessment), 4);
        assert_eq!(stage_count_for(JobKind::HazardPrecompute), 2);
    }

    #[tokio::test]
    async fn join_bounded_preserves_order_and_caps_concurrency() {
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let live = Arc::clone(&live);
                let peak = Arc::clone(&peak);
                async move {
                    let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    live.fetch_sub(1, Ordering::SeqCst);
                    i
                }
            })
            .collect();

        let outputs = join_bounded(3, tasks).await;
        let values: Vec<usize> = outputs.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, (0..16).collect::<Vec<_>>());
        assert!(
            peak.load(Ordering::SeqCst) <= 3,
            "peak concurrency {}",
            peak.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn stalled_unit_cannot_hang_the_fan_out() {
        // Each body applies its own deadline the way run_unit does; the
        // stalled one must resolve as a timeout instead of wedging the join.
        let tasks: Vec<_> = (0..4)
            .map(|i| async move {
                if i == 2 {
                    timeout(Duration::from_millis(20), std::future::pending::<()>())
                        .await
                        .is_ok()
                } else {
                    true
                }
            })
            .collect();

        let outputs = join_bounded(2, tasks).await;
        let finished: Vec<bool> = outputs.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(finished, vec![true, true, false, true]);
    }

    #[test]
    fn reports_keep_failed_hazards_visible_but_unranked() {
        let mut outcomes: Vec<HazardTypeOutcome> = HazardType::ALL
            .iter()
            .take(8)
            .map(|&h| ok_outcome(h))
            .collect();
        outcomes.push(HazardTypeOutcome::failed(
            HazardType::HeavySnow,
            "computation timed out after 20s",
        ));

        let reports = build_site_reports(&[site(Some("hq"))], vec![outcomes], Utc::now());
        assert_eq!(reports.len(), 1);

        let report = &reports[0];
        assert_eq!(report.site_id.as_deref(), Some("hq"));
        assert_eq!(report.outcomes.len(), 9);
        assert_eq!(report.summary.ranking.len(), 8);
        assert_eq!(report.summary.excluded.len(), 1);
        assert_eq!(report.summary.excluded[0].hazard_type, HazardType::HeavySnow);
    }

    #[test]
    fn precompute_summary_lists_failures() {
        let input = JobInput {
            sites: vec![site(None)],
            hazard_types: vec![HazardType::Typhoon, HazardType::Drought],
            scenario: "baseline".into(),
            epoch: "current".into(),
        };
        let per_site = vec![vec![
            ok_outcome(HazardType::Typhoon),
            HazardTypeOutcome::failed(HazardType::Drought, "indicator lookup failed: timed out"),
        ]];

        let summary = precompute_summary(&input, &per_site, 1, 1);
        assert_eq!(summary["locations"], 1);
        assert_eq!(summary["completed_units"], 1);
        assert_eq!(summary["failed_units"], 1);

        let failures = summary["failures"].as_array().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0]["hazard_type"], "drought");
        assert_eq!(failures[0]["location_key"], "35.6800,139.7700");
    }
}
