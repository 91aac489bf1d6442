//! Utility functions for display formatting.

pub mod format;

pub use format::{age_display, truncate_string};
