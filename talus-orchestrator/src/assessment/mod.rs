//! Assessment Module
//!
//! The in-process job runner: progress accounting, upstream building
//! registry access, and the fan-out that walks every (site, hazard type)
//! unit through the computation stages.

pub mod progress;
pub mod runner;
pub mod upstream;

pub use runner::AssessmentRunner;
