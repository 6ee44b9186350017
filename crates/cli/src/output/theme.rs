use colored::Colorize;

pub fn print_header(title: &str) {
    println!();
    println!("  {}", title.bright_cyan().bold());
    println!("  {}", "═".repeat(title.len() + 2).cyan());
    println!();
}

pub fn print_section(title: &str) {
    println!();
    println!("  {} {}", "▸".bright_cyan(), title.bold());
}

pub fn print_kv(label: &str, value: &str) {
    let padded = format!("{label:<14}");
    println!("    {}  {}", padded.dimmed(), value);
}

pub fn print_kv_colored(label: &str, value: &str, ok: bool) {
    let padded = format!("{label:<14}");
    let styled = if ok { value.green() } else { value.red() };
    println!("    {}  {}", padded.dimmed(), styled);
}

pub fn print_dim(msg: &str) {
    println!("    {}", msg.dimmed());
}
