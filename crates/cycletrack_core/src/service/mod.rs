//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store reads/writes and analyzer calls into use-case APIs.
//! - Keep CLI and other rendering layers decoupled from storage details.

pub mod cycle_service;
