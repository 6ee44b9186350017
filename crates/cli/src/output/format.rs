use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {msg}", "✔".bright_green());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {msg}", "error:".bright_red().bold());
}
