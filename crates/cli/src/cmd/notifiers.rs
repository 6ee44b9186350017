use anyhow::Result;
use clap::Subcommand;
use reqwest::Method;

use super::helpers;
use crate::output::{print_error, print_json, print_success, spinner, OutputMode};

#[derive(Subcommand)]
pub enum NotifiersCmd {
    Test(TestArgs),
}

#[derive(clap::Args)]
pub struct TestArgs {
    #[arg(long, help = "Channel action JSON: file path or inline")]
    data: String,
}

pub async fn execute(cmd: NotifiersCmd, mode: OutputMode, server: Option<String>) -> Result<()> {
    match cmd {
        NotifiersCmd::Test(args) => test(args, mode, server).await,
    }
}

async fn test(args: TestArgs, mode: OutputMode, server: Option<String>) -> Result<()> {
    let body = helpers::parse_json_data(&args.data)?;
    let base = helpers::resolve_server(server.as_deref());

    let sp = (mode == OutputMode::Human).then(|| spinner::create("Validating channel config..."));
    let result = helpers::send_json(Method::POST, &format!("{base}/v1/notifiers/test"), &body).await?;
    if let Some(sp) = &sp {
        spinner::finish_clear(sp);
    }

    if mode == OutputMode::Json {
        return print_json(&result);
    }

    let message = result["message"].as_str().unwrap_or("-");
    if result["success"].as_bool().unwrap_or(false) {
        print_success(message);
    } else {
        print_error(message);
    }
    Ok(())
}
