//! Statement of Facts laytime CLI library.
//!
//! This crate provides the CLI interface for the laytime calculator.

mod cli;
pub mod commands;
mod config;
mod request;

pub use cli::{Cli, Commands};
pub use config::{Config, MarkerPair};
pub use request::Request;
