//! # Core Module
//!
//! This module contains the core functionality of Suite Runner: the
//! configuration model, the module registry and planner, the result
//! aggregation engine, cross-module consolidation and sequential module
//! execution.

pub mod aggregator;
pub mod config;
pub mod consolidator;
pub mod evidence;
pub mod execution;
pub mod models;
pub mod planner;
pub mod raw;
pub mod registry;

// Re-exports
pub use aggregator::{Aggregation, Aggregator};
pub use config::SuiteConfig;
pub use consolidator::consolidate;
pub use registry::ModuleRegistry;
