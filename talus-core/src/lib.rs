//! Talus Core
//!
//! Core types and abstractions for the Talus climate-risk platform.
//!
//! This crate contains:
//! - Domain types: hazard categories, sites, jobs, computed risk results
//! - DTOs: request/response shapes for the orchestrator API

pub mod domain;
pub mod dto;
