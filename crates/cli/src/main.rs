mod cmd;
mod output;

use anyhow::Result;
use clap::Parser;

use cmd::Commands;
use output::OutputMode;

#[derive(Parser)]
#[command(name = "vulnwatch", version, about = "VulnWatch Alerting Admin CLI")]
struct Opts {
    #[clap(subcommand)]
    cmd: Commands,

    /// Emit machine-readable JSON instead of styled output.
    #[arg(long, global = true)]
    json: bool,

    /// Server base URL (overrides VULNWATCH_SERVER).
    #[arg(long, global = true)]
    server: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();
    let mode = if opts.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    cmd::run(opts.cmd, mode, opts.server).await
}
