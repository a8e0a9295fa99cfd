// crates/rule-console-config/src/lib.rs
// ============================================================================
// Module: Rule Console Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for rule-console.toml semantics.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! `rule-console-config` defines the configuration model of the rule
//! console: control plane connection, session persistence, request audit
//! logging, and list paging. Validation is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
