//! Startup helpers for the `birdsong` binary

pub mod config;

pub use config::load_config;
