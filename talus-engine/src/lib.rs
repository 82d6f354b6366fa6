//! Talus Engine
//!
//! Pure computation components of the risk platform: intensity bin tables,
//! the probability estimator, the four scoring stages and the cross-hazard
//! aggregator. Everything here is synchronous, deterministic and free of
//! I/O; persistence and scheduling live in the orchestrator.

pub mod aal;
pub mod aggregate;
pub mod bins;
pub mod error;
pub mod exposure;
pub mod hazard;
pub mod probability;
pub mod vulnerability;

pub use error::EngineError;
