//! Job command handlers
//!
//! Handles all job-related CLI commands: submission, status polling,
//! result display and cancellation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::*;
use talus_client::TalusClient;
use talus_core::domain::hazard::HazardType;
use talus_core::domain::job::{JobStatus, RiskJob, SiteRequest};
use talus_core::domain::site::GeoPoint;
use talus_core::dto::job::{JobStatusView, SubmitAssessment, SubmitPrecompute};
use uuid::Uuid;

use crate::config::Config;
use crate::id_resolver::resolve_job_id;
use crate::types::IdOrPrefix;

/// Poll cadence used by `submit --watch`.
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 2;

/// Arguments for `talus submit`
#[derive(Args)]
pub struct SubmitArgs {
    /// Site latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Site longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Identifier echoed back in the report; enables registry lookups
    #[arg(long)]
    pub site_id: Option<String>,

    /// Insured asset value in currency units
    #[arg(long)]
    pub asset_value: Option<f64>,

    /// Insured fraction of the asset value, 0..=1
    #[arg(long)]
    pub insurance_rate: Option<f64>,

    /// Comma-separated hazard codes (default: all nine)
    #[arg(long, value_delimiter = ',')]
    pub hazards: Vec<String>,

    /// Climate scenario label
    #[arg(long)]
    pub scenario: Option<String>,

    /// Epoch label, e.g. "current" or "2050"
    #[arg(long)]
    pub epoch: Option<String>,

    /// Read the full submission body from a JSON file instead of flags
    #[arg(
        long,
        conflicts_with_all = ["lat", "lon", "site_id", "asset_value", "insurance_rate"]
    )]
    pub file: Option<PathBuf>,

    /// Poll until the job finishes
    #[arg(long)]
    pub watch: bool,
}

/// Arguments for `talus precompute`
#[derive(Args)]
pub struct PrecomputeArgs {
    /// Cell latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Cell longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Comma-separated hazard codes (default: all nine)
    #[arg(long, value_delimiter = ',')]
    pub hazards: Vec<String>,

    /// Climate scenario label
    #[arg(long)]
    pub scenario: Option<String>,

    /// Epoch label, e.g. "current" or "2050"
    #[arg(long)]
    pub epoch: Option<String>,

    /// Read the full submission body from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub file: Option<PathBuf>,

    /// Poll until the job finishes
    #[arg(long)]
    pub watch: bool,
}

/// Submit a site assessment job
pub async fn submit(args: SubmitArgs, config: &Config) -> Result<()> {
    let client = TalusClient::new(&config.orchestrator_url);
    let req = build_assessment_request(&args)?;

    let accepted = client.submit_assessment(req).await?;
    println!(
        "{} Job {} accepted ({} units)",
        "✓".green(),
        accepted.id.to_string().cyan(),
        accepted.total_items
    );

    if args.watch {
        println!();
        watch_until_done(&client, accepted.id, DEFAULT_WATCH_INTERVAL_SECS).await
    } else {
        println!("{}", format!("  talus status {}", accepted.id).dimmed());
        Ok(())
    }
}

/// Submit a hazard precompute job
pub async fn precompute(args: PrecomputeArgs, config: &Config) -> Result<()> {
    let client = TalusClient::new(&config.orchestrator_url);
    let req = build_precompute_request(&args)?;

    let accepted = client.submit_precompute(req).await?;
    println!(
        "{} Job {} accepted ({} units)",
        "✓".green(),
        accepted.id.to_string().cyan(),
        accepted.total_items
    );

    if args.watch {
        println!();
        watch_until_done(&client, accepted.id, DEFAULT_WATCH_INTERVAL_SECS).await
    } else {
        println!("{}", format!("  talus status {}", accepted.id).dimmed());
        Ok(())
    }
}

/// Show the status of a job
pub async fn status(id: &str, config: &Config) -> Result<()> {
    let client = TalusClient::new(&config.orchestrator_url);
    let uuid = resolve_job_id(&client, &IdOrPrefix::parse(id)).await?;

    let view = match client.get_job_status(uuid).await {
        Ok(view) => view,
        Err(e) if e.is_not_found() => {
            println!("{}", format!("Job {} not found.", uuid).yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    print_status_details(&view);
    Ok(())
}

/// Poll a job until it reaches a terminal state
pub async fn watch(id: &str, interval: u64, config: &Config) -> Result<()> {
    let client = TalusClient::new(&config.orchestrator_url);
    let uuid = resolve_job_id(&client, &IdOrPrefix::parse(id)).await?;

    watch_until_done(&client, uuid, interval).await
}

/// Print a finished job's results as JSON
pub async fn result(id: &str, config: &Config) -> Result<()> {
    let client = TalusClient::new(&config.orchestrator_url);
    let uuid = resolve_job_id(&client, &IdOrPrefix::parse(id)).await?;

    let job = client.get_job(uuid).await?;

    match &job.results {
        Some(results) => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
        None => {
            println!(
                "{}",
                format!("Job {} has no results yet (status: {})", job.id, job.status).yellow()
            );
            if let Some(error) = &job.error {
                println!("{} {}", "Error:".red().bold(), error.red());
            }
        }
    }

    Ok(())
}

/// List recent jobs
pub async fn list(limit: Option<i64>, config: &Config) -> Result<()> {
    let client = TalusClient::new(&config.orchestrator_url);
    let jobs = client.list_jobs(limit).await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// List queued jobs
pub async fn scheduled(config: &Config) -> Result<()> {
    let client = TalusClient::new(&config.orchestrator_url);
    let jobs = client.list_scheduled_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No scheduled jobs found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} scheduled job(s):", jobs.len()).bold()
        );
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Cancel a queued or running job
pub async fn cancel(id: &str, config: &Config) -> Result<()> {
    let client = TalusClient::new(&config.orchestrator_url);
    let uuid = resolve_job_id(&client, &IdOrPrefix::parse(id)).await?;

    client.cancel_job(uuid).await?;
    println!("{} Job {} cancelled", "✓".green(), uuid.to_string().cyan());

    Ok(())
}

// =============================================================================
// Request Builders
// =============================================================================

fn build_assessment_request(args: &SubmitArgs) -> Result<SubmitAssessment> {
    if let Some(path) = &args.file {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&body)
            .with_context(|| format!("Invalid submission JSON in {}", path.display()));
    }

    let (Some(lat), Some(lon)) = (args.lat, args.lon) else {
        anyhow::bail!("either --file or both --lat and --lon are required");
    };

    Ok(SubmitAssessment {
        sites: vec![SiteRequest {
            location: GeoPoint::new(lat, lon),
            site_id: args.site_id.clone(),
            profile: None,
            asset_value: args.asset_value,
            insurance_rate: args.insurance_rate,
        }],
        hazard_types: parse_hazards(&args.hazards)?,
        scenario: args.scenario.clone(),
        epoch: args.epoch.clone(),
    })
}

fn build_precompute_request(args: &PrecomputeArgs) -> Result<SubmitPrecompute> {
    if let Some(path) = &args.file {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&body)
            .with_context(|| format!("Invalid submission JSON in {}", path.display()));
    }

    let (Some(lat), Some(lon)) = (args.lat, args.lon) else {
        anyhow::bail!("either --file or both --lat and --lon are required");
    };

    Ok(SubmitPrecompute {
        locations: vec![GeoPoint::new(lat, lon)],
        hazard_types: parse_hazards(&args.hazards)?,
        scenario: args.scenario.clone(),
        epoch: args.epoch.clone(),
    })
}

fn parse_hazards(codes: &[String]) -> Result<Vec<HazardType>> {
    codes
        .iter()
        .map(|code| {
            HazardType::from_code(code).ok_or_else(|| {
                anyhow!(
                    "unknown hazard '{}' (expected one of: {})",
                    code,
                    HazardType::ALL.map(|h| h.code()).join(", ")
                )
            })
        })
        .collect()
}

// =============================================================================
// Display Helpers
// =============================================================================

/// Poll the status endpoint, printing a line whenever something changes,
/// until the job reaches a terminal state.
async fn watch_until_done(client: &TalusClient, id: Uuid, interval_secs: u64) -> Result<()> {
    let interval = Duration::from_secs(interval_secs.max(1));
    let mut last = None;

    loop {
        let view = client.get_job_status(id).await?;
        let snapshot = (
            view.status,
            view.progress,
            view.completed_items,
            view.failed_items,
        );
        if last != Some(snapshot) {
            print_status_line(&view);
            last = Some(snapshot);
        }

        if view.status.is_terminal() {
            println!();
            match view.status {
                JobStatus::Completed if view.failed_items > 0 => {
                    println!(
                        "{}",
                        format!(
                            "Job completed with {} degraded unit(s); run `talus result {}`",
                            view.failed_items, id
                        )
                        .yellow()
                    );
                }
                JobStatus::Completed => {
                    println!(
                        "{}",
                        format!("Job completed; run `talus result {}`", id).green()
                    );
                }
                JobStatus::Failed => {
                    if let Some(error) = &view.error_message {
                        println!("{} {}", "Job failed:".red().bold(), error.red());
                    } else {
                        println!("{}", "Job failed".red().bold());
                    }
                }
                _ => {
                    println!("{}", "Job cancelled".dimmed());
                }
            }
            return Ok(());
        }

        tokio::time::sleep(interval).await;
    }
}

fn print_status_line(view: &JobStatusView) {
    println!(
        "  {} {}% ({}/{} done, {} failed)",
        colorize_status(&view.status),
        view.progress,
        view.completed_items,
        view.total_items,
        view.failed_items
    );
}

fn print_status_details(view: &JobStatusView) {
    println!("{}", "Job Status:".bold());
    println!("  ID:        {}", view.id.to_string().cyan());
    println!("  Status:    {}", colorize_status(&view.status));
    println!("  Progress:  {}%", view.progress);
    println!(
        "  Items:     {} total, {} completed, {} failed",
        view.total_items, view.completed_items, view.failed_items
    );

    if let Some(error) = &view.error_message {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

/// Print a job summary from a full job record
fn print_job_summary(job: &RiskJob) {
    println!("  {} Job {}", "▸".cyan(), job.id.to_string().dimmed());
    println!("    Kind:     {}", job.kind);
    println!(
        "    Status:   {} ({}%)",
        colorize_status(&job.status),
        job.progress
    );
    println!(
        "    Created:  {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Colorize job status for display
fn colorize_status(status: &JobStatus) -> colored::ColoredString {
    let status_str = format!("{:?}", status);
    match status {
        JobStatus::Queued => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Cancelled => status_str.dimmed(),
    }
}
