//! gemini-panel - a terminal chat panel for Google Gemini.
//!
//! This library exposes the core modules for testing and reuse.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod input;
pub mod llm;
pub mod logging;
pub mod message;
pub mod ui;
