use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

const FRAMES: &[&str] = &["◜", "◠", "◝", "◞", "◡", "◟", " "];

pub fn create(msg: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .expect("static template")
        .tick_strings(FRAMES);
    let sp = ProgressBar::new_spinner()
        .with_style(style)
        .with_message(msg.to_string());
    sp.enable_steady_tick(Duration::from_millis(100));
    sp
}

fn finish(sp: &ProgressBar, line: String) {
    sp.set_style(ProgressStyle::with_template("{msg}").expect("static template"));
    sp.finish_with_message(line);
}

pub fn finish_ok(sp: &ProgressBar, msg: &str) {
    finish(sp, format!("{} {msg}", "✔".bright_green()));
}

pub fn finish_err(sp: &ProgressBar, msg: &str) {
    finish(sp, format!("{} {msg}", "✘".bright_red()));
}

pub fn finish_clear(sp: &ProgressBar) {
    sp.finish_and_clear();
}
