//! Repository Module
//!
//! Data access layer for the orchestrator.
//! Each repository handles database operations for a specific domain entity.

pub mod climate;
pub mod job;
pub mod results;

// Re-export for convenience
pub use climate as climate_repository;
pub use job as job_repository;
pub use results as results_repository;
