use anyhow::Result;
use reqwest::Method;

use super::helpers;
use crate::output::{build_table, print_json, print_success, spinner, theme, OutputMode};

#[derive(clap::Args)]
pub struct TriggerArgs {
    #[arg(long, help = "Vulnerability JSON: file path or inline")]
    data: String,
    #[arg(long, help = "Only evaluate rules belonging to this owner")]
    owner: Option<String>,
}

/// Runs the synchronous evaluation path and prints the per-rule outcomes.
pub async fn execute(args: TriggerArgs, mode: OutputMode, server: Option<String>) -> Result<()> {
    let body = helpers::parse_json_data(&args.data)?;
    let base = helpers::resolve_server(server.as_deref());
    let url = match &args.owner {
        Some(owner) => format!("{base}/v1/vulnerabilities/evaluate?owner_id={owner}"),
        None => format!("{base}/v1/vulnerabilities/evaluate"),
    };

    let sp = (mode == OutputMode::Human).then(|| spinner::create("Evaluating rules..."));
    let outcomes = helpers::send_json(Method::POST, &url, &body).await?;
    if let Some(sp) = &sp {
        spinner::finish_clear(sp);
    }

    if mode == OutputMode::Json {
        return print_json(&outcomes);
    }

    let outcomes = outcomes.as_array().cloned().unwrap_or_default();
    if outcomes.is_empty() {
        print_success("No rules matched");
        return Ok(());
    }

    theme::print_header("Evaluation Outcomes");
    let mut table = build_table(&["Rule", "Status", "Channels", "Detail"]);
    for o in &outcomes {
        let channels = o["result"]["channel_results"]
            .as_array()
            .map(|rs| {
                let ok = rs.iter().filter(|r| r["success"] == true).count();
                format!("{ok}/{}", rs.len())
            })
            .unwrap_or_default();
        table.add_row(vec![
            o["rule_id"].as_str().unwrap_or("-").to_string(),
            o["status"].as_str().unwrap_or("-").to_string(),
            channels,
            o["error"].as_str().unwrap_or("").to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
