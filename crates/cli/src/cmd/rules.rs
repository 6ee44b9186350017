use anyhow::Result;
use clap::Subcommand;
use reqwest::Method;

use super::helpers;
use crate::output::{build_table, confirm, print_json, print_success, spinner, theme, OutputMode};

#[derive(Subcommand)]
pub enum RulesCmd {
    List(ListArgs),
    Get(GetArgs),
    Create(CreateArgs),
    Update(UpdateArgs),
    Delete(DeleteArgs),
}

#[derive(clap::Args)]
pub struct ListArgs {
    #[arg(long, help = "Only rules belonging to this owner")]
    owner: Option<String>,
}

#[derive(clap::Args)]
pub struct GetArgs {
    #[arg(help = "Rule ID")]
    id: String,
}

#[derive(clap::Args)]
pub struct CreateArgs {
    #[arg(long, help = "JSON file path or inline JSON")]
    data: String,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    #[arg(help = "Rule ID")]
    id: String,
    #[arg(long, help = "JSON file path or inline JSON")]
    data: String,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    #[arg(help = "Rule ID")]
    id: String,
    #[arg(long, help = "Skip confirmation prompt")]
    yes: bool,
}

pub async fn execute(cmd: RulesCmd, mode: OutputMode, server: Option<String>) -> Result<()> {
    let base = helpers::resolve_server(server.as_deref());

    match cmd {
        RulesCmd::List(args) => list(&base, args, mode).await,
        RulesCmd::Get(args) => get(&base, args, mode).await,
        RulesCmd::Create(args) => create(&base, args, mode).await,
        RulesCmd::Update(args) => update(&base, args, mode).await,
        RulesCmd::Delete(args) => delete(&base, args, mode).await,
    }
}

fn channel_summary(rule: &serde_json::Value) -> String {
    rule["actions"]
        .as_array()
        .map(|actions| {
            actions
                .iter()
                .filter_map(|a| a["channel"].as_str())
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default()
}

fn rules_table(rules: &[serde_json::Value]) -> comfy_table::Table {
    let mut table =
        build_table(&["ID", "Name", "Owner", "Channels", "Cooldown", "Active", "Triggers"]);
    for r in rules {
        table.add_row(vec![
            r["id"].as_str().unwrap_or("-").to_string(),
            r["name"].as_str().unwrap_or("-").to_string(),
            r["owner_id"].as_str().unwrap_or("-").to_string(),
            channel_summary(r),
            format!("{}m", r["cooldown_minutes"]),
            r["is_active"].to_string(),
            r["trigger_count"].to_string(),
        ]);
    }
    table
}

async fn list(base: &str, args: ListArgs, mode: OutputMode) -> Result<()> {
    let url = match &args.owner {
        Some(owner) => format!("{base}/v1/rules?owner_id={owner}"),
        None => format!("{base}/v1/rules"),
    };

    let sp = (mode == OutputMode::Human).then(|| spinner::create("Fetching rules..."));
    let rules = helpers::fetch_json(&url).await?;
    if let Some(sp) = &sp {
        spinner::finish_clear(sp);
    }

    if mode == OutputMode::Json {
        return print_json(&rules);
    }

    let rules = rules.as_array().cloned().unwrap_or_default();
    if rules.is_empty() {
        print_success("No alert rules defined");
        return Ok(());
    }
    theme::print_header("Alert Rules");
    println!("{}", rules_table(&rules));
    Ok(())
}

async fn get(base: &str, args: GetArgs, mode: OutputMode) -> Result<()> {
    let sp = (mode == OutputMode::Human).then(|| spinner::create("Fetching rule..."));
    let rule = helpers::fetch_json(&format!("{base}/v1/rules/{}", args.id)).await?;
    if let Some(sp) = &sp {
        spinner::finish_clear(sp);
    }

    if mode == OutputMode::Json {
        return print_json(&rule);
    }

    theme::print_header("Rule Details");
    for (k, v) in rule.as_object().into_iter().flatten() {
        theme::print_kv(k, &v.to_string());
    }
    println!();
    Ok(())
}

async fn create(base: &str, args: CreateArgs, mode: OutputMode) -> Result<()> {
    let body = helpers::parse_json_data(&args.data)?;

    let sp = (mode == OutputMode::Human).then(|| spinner::create("Creating rule..."));
    let created = helpers::send_json(Method::POST, &format!("{base}/v1/rules"), &body).await?;
    if let Some(sp) = &sp {
        spinner::finish_ok(sp, "Rule created");
    }

    match mode {
        OutputMode::Json => print_json(&created)?,
        OutputMode::Human => theme::print_kv("ID", created["id"].as_str().unwrap_or("-")),
    }
    Ok(())
}

async fn update(base: &str, args: UpdateArgs, mode: OutputMode) -> Result<()> {
    let body = helpers::parse_json_data(&args.data)?;

    let sp = (mode == OutputMode::Human).then(|| spinner::create("Updating rule..."));
    let updated =
        helpers::send_json(Method::PUT, &format!("{base}/v1/rules/{}", args.id), &body).await?;
    if let Some(sp) = &sp {
        spinner::finish_ok(sp, &format!("Rule {} updated", args.id));
    }

    if mode == OutputMode::Json {
        print_json(&updated)?;
    }
    Ok(())
}

async fn delete(base: &str, args: DeleteArgs, mode: OutputMode) -> Result<()> {
    if mode == OutputMode::Human && !args.yes {
        let msg = format!("Delete rule '{}'?", args.id);
        if !confirm::confirm_action(&msg) {
            theme::print_dim("Cancelled.");
            return Ok(());
        }
    }

    let sp = (mode == OutputMode::Human).then(|| spinner::create("Deleting rule..."));
    helpers::delete(&format!("{base}/v1/rules/{}", args.id)).await?;
    if let Some(sp) = &sp {
        spinner::finish_ok(sp, &format!("Rule '{}' deleted", args.id));
    }

    if mode == OutputMode::Json {
        print_json(&serde_json::json!({"deleted": true, "id": args.id}))?;
    }
    Ok(())
}
