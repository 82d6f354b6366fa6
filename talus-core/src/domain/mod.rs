//! Core domain types
//!
//! This module contains the domain structures shared across Talus crates.
//! They represent the fundamental entities of the risk platform and are used
//! by the orchestrator (for persistence) and the engine (for computation).

pub mod climate;
pub mod hazard;
pub mod job;
pub mod results;
pub mod site;
