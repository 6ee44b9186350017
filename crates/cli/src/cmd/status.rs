use anyhow::Result;

use super::helpers;
use crate::output::{build_table, print_json, spinner, theme, OutputMode};

#[derive(clap::Args)]
pub struct StatusArgs {
    #[arg(help = "Rule ID")]
    id: String,
}

pub async fn execute(args: StatusArgs, mode: OutputMode, server: Option<String>) -> Result<()> {
    let base = helpers::resolve_server(server.as_deref());

    let sp = (mode == OutputMode::Human).then(|| spinner::create("Fetching rule status..."));
    let status = helpers::fetch_json(&format!("{base}/v1/rules/{}/status", args.id)).await?;
    if let Some(sp) = &sp {
        spinner::finish_clear(sp);
    }

    if mode == OutputMode::Json {
        return print_json(&status);
    }

    theme::print_header("Rule Status");
    theme::print_kv("Rule", status["rule_id"].as_str().unwrap_or("-"));
    theme::print_kv("Triggers", &status["trigger_count"].to_string());
    theme::print_kv(
        "Last triggered",
        &status["last_triggered_at_ms"]
            .as_i64()
            .map(|ms| ms.to_string())
            .unwrap_or_else(|| "never".into()),
    );
    theme::print_kv_colored(
        "In flight",
        &status["in_flight"].to_string(),
        !status["in_flight"].as_bool().unwrap_or(false),
    );

    if let Some(results) = status["latest_result"]["channel_results"].as_array() {
        theme::print_section("Latest dispatch");
        theme::print_kv(
            "Dispatch ID",
            status["latest_result"]["dispatch_id"].as_str().unwrap_or("-"),
        );
        let mut table = build_table(&["Channel", "OK", "Provider", "Retries", "Error"]);
        for r in results {
            table.add_row(vec![
                r["channel"].as_str().unwrap_or("-").to_string(),
                r["success"].to_string(),
                r["provider"].as_str().unwrap_or("-").to_string(),
                r["retry_count"].to_string(),
                r["error_message"].as_str().unwrap_or("").to_string(),
            ]);
        }
        println!("{table}");
    }
    println!();
    Ok(())
}
