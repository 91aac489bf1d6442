//! Terminal UI module using ratatui.
//!
//! - `render`: frame rendering for the placeholder, login and admin surfaces
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling

pub mod input;
pub mod render;
pub mod styles;
