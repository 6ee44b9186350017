mod health;
pub(crate) mod helpers;
mod notifiers;
mod rules;
mod status;
mod trigger;
mod version;

use anyhow::Result;
use clap::Subcommand;

use crate::output::OutputMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Manage alert rules.
    #[command(subcommand)]
    Rules(rules::RulesCmd),
    /// Show cooldown and dispatch state for a rule.
    Status(status::StatusArgs),
    /// Submit a vulnerability for synchronous evaluation.
    Trigger(trigger::TriggerArgs),
    /// Exercise notification channels.
    #[command(subcommand)]
    Notifiers(notifiers::NotifiersCmd),
    /// Probe the server's health endpoint.
    Health,
    /// Print version information.
    Version,
}

pub async fn run(cmd: Commands, mode: OutputMode, server: Option<String>) -> Result<()> {
    match cmd {
        Commands::Rules(cmd) => rules::execute(cmd, mode, server).await,
        Commands::Status(args) => status::execute(args, mode, server).await,
        Commands::Trigger(args) => trigger::execute(args, mode, server).await,
        Commands::Notifiers(cmd) => notifiers::execute(cmd, mode, server).await,
        Commands::Health => health::execute(mode, server).await,
        Commands::Version => {
            version::execute(mode);
            Ok(())
        }
    }
}
