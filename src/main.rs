use clap::Parser;
use ftpdeploy::config::Cli;
use ftpdeploy::ui::{logging, ProgressReporter};
use ftpdeploy::Config;
use indicatif::ProgressBar;
use std::io::IsTerminal;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let bar = if cli.quiet || !std::io::stderr().is_terminal() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    logging::init(cli.verbose, cli.quiet, bar.clone());

    // Convert CLI args to Config - this validates before any connection
    let config = Config::try_from(cli)?;
    tracing::debug!(?config, "ftpdeploy v{}", ftpdeploy::VERSION);

    let reporter = ProgressReporter::new(bar);
    if ftpdeploy::commands::deploy::run(&config, &reporter).is_err() {
        // The failure summary is already on stderr
        std::process::exit(1);
    }

    Ok(())
}
