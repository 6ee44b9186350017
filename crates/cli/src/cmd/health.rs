use anyhow::Result;

use super::helpers;
use crate::output::{print_json, spinner, theme, OutputMode};

pub async fn execute(mode: OutputMode, server: Option<String>) -> Result<()> {
    let base = helpers::resolve_server(server.as_deref());
    let url = format!("{base}/healthz");

    let sp = (mode == OutputMode::Human).then(|| spinner::create("Checking server health..."));

    let result = reqwest::get(&url).await;

    match result {
        Ok(resp) if resp.status().is_success() => {
            let health: serde_json::Value = resp.json().await?;
            if let Some(sp) = sp {
                spinner::finish_ok(&sp, "Server is healthy");
            }
            match mode {
                OutputMode::Json => print_json(&health)?,
                OutputMode::Human => {
                    theme::print_kv("Server", &base);
                    theme::print_kv("Status", health["status"].as_str().unwrap_or("-"));
                    theme::print_kv("Version", health["version"].as_str().unwrap_or("-"));
                }
            }
            Ok(())
        }
        Ok(resp) => {
            if let Some(sp) = sp {
                spinner::finish_err(&sp, &format!("Server returned {}", resp.status()));
            }
            if mode == OutputMode::Json {
                print_json(&serde_json::json!({"healthy": false, "status": resp.status().as_u16()}))?;
            }
            Ok(())
        }
        Err(e) => {
            if let Some(sp) = sp {
                spinner::finish_err(&sp, &format!("Unreachable: {e}"));
            }
            if mode == OutputMode::Json {
                print_json(&serde_json::json!({"healthy": false, "error": e.to_string()}))?;
            }
            Ok(())
        }
    }
}
