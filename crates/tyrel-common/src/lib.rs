//! Common types and utilities for the tyrel type-relation engine.
//!
//! This crate provides the pieces shared by every tyrel crate:
//! - Name interning (`Name`, `NameTable`)
//! - Engine limits and thresholds
//! - Tracing subscriber setup

// Name interning for symbol names and string constants
pub mod interner;
pub use interner::{Name, NameTable};

// Centralized limits and thresholds
pub mod limits;

// Opt-in tracing output
pub mod tracing_config;
