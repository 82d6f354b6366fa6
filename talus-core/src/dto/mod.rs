//! Data Transfer Objects for the HTTP surface
//!
//! DTOs are the wire shapes exchanged between the orchestrator, the client
//! crate and the CLI. They are lightweight views over domain entities and
//! carry serde-level defaults so callers can omit optional fields.

pub mod job;
