//! CLI subcommand implementations.

pub mod calculate;
pub mod events;
