//! # Infrastructure Module
//!
//! This module provides infrastructure services for Suite Runner,
//! including child process capture, report file layout and i18n support.

pub mod command;
pub mod fs;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
