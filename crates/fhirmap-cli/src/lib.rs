//! CLI library components for the bundle mapper.

pub mod cli;
pub mod config;
pub mod logging;
