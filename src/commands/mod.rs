//! CLI commands

pub mod deploy;
