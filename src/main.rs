use anyhow::Context;
use clap::Parser;
use landagg::{logger, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.log_format);

    tracing::debug!("CLI config: {:?}", cli);

    let config = cli.into_run_config().context("Invalid arguments")?;
    let summary = landagg::run(&config)
        .with_context(|| format!("Aggregation below {} failed", config.root.display()))?;

    if !summary.failures.is_empty() {
        for failure in &summary.failures {
            eprintln!("Layer {} failed: {}", failure.layer, failure.reason);
        }
        std::process::exit(2);
    }

    Ok(())
}
