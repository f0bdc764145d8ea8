//! UI module for gemini-panel.
//!
//! This module contains all UI rendering logic including:
//! - Screen dispatch behind the credential gate
//! - The chat screen and the API key setup screen
//! - Gradient and text utilities

mod gradient;
mod render;
pub mod setup;
pub mod text;

pub use render::{render_chat, ui};
pub use setup::render_setup;
