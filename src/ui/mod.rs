//! Terminal output: progress display and log routing

pub mod logging;
mod progress;

pub use progress::{format_summary, ProgressReporter};
