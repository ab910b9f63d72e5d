//! Command handlers.

pub mod config;
pub mod fabricate;
pub mod generate;
