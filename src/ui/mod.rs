//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All command output goes through this module to ensure consistent
//! formatting and proper handling of quiet mode.

pub mod output;
