//! CLI command implementations.

pub mod changelog;
pub mod config;
pub mod csv;
pub mod expand;
pub mod housekeeping;
pub mod webhooks;
