//! Terminal UI module using ratatui.
//!
//! - `render`: frame rendering and layout
//! - `input`: keyboard event handling
//! - `styles`: color palette and text styling

pub mod input;
pub mod render;
pub mod styles;
