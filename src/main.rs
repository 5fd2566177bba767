use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use driftwatch::services::Ledger;
use driftwatch::services::Monitor;
use driftwatch::MonitorConfig;

#[derive(Parser, Debug)]
#[command(
    name = "driftwatch",
    about = "Run one model-monitoring cycle: ingestion check, drift check, retrain/redeploy if needed"
)]
struct Cli {
    /// Working root holding config.toml, data/, models/ and db/.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Config file to use instead of <root>/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("driftwatch: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let cfg = MonitorConfig::load_from(&cli.root, cli.config.as_deref())
        .context("loading configuration")?;
    let ledger = Ledger::open(&cfg.storage.ledger_path).context("opening monitoring ledger")?;
    let outcome = Monitor::new(&cfg)
        .run_cycle(&ledger)
        .context("running monitoring cycle")?;
    println!("{}", outcome.message());
    Ok(())
}
