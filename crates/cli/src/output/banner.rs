use colored::Colorize;

const LOGO: &[&str] = &[
    r"   ██╗   ██╗██╗   ██╗██╗     ███╗   ██╗██╗    ██╗ █████╗ ████████╗ ██████╗██╗  ██╗",
    r"   ██║   ██║██║   ██║██║     ████╗  ██║██║    ██║██╔══██╗╚══██╔══╝██╔════╝██║  ██║",
    r"   ██║   ██║██║   ██║██║     ██╔██╗ ██║██║ █╗ ██║███████║   ██║   ██║     ███████║",
    r"   ╚██╗ ██╔╝██║   ██║██║     ██║╚██╗██║██║███╗██║██╔══██║   ██║   ██║     ██╔══██║",
    r"    ╚████╔╝ ╚██████╔╝███████╗██║ ╚████║╚███╔███╔╝██║  ██║   ██║   ╚██████╗██║  ██║",
    r"     ╚═══╝   ╚═════╝ ╚══════╝╚═╝  ╚═══╝ ╚══╝╚══╝ ╚═╝  ╚═╝   ╚═╝    ╚═════╝╚═╝  ╚═╝",
    r"            ░░ Vulnerability Alerting & Notification Dispatch ░░",
];

pub fn print_banner() {
    for (i, line) in LOGO.iter().enumerate() {
        let styled = match i {
            2 | 3 => line.bright_cyan().bold(),
            6 => line.white().dimmed(),
            _ => line.cyan().bold(),
        };
        println!("{styled}");
    }
}

pub fn print_version_block(version: &str) {
    print_banner();
    println!();
    for (label, value) in [
        ("version", version),
        ("arch", std::env::consts::ARCH),
        ("os", std::env::consts::OS),
    ] {
        let padded = format!("{label:>8}");
        println!("  {}  {}", padded.dimmed(), value.bright_white());
    }
    println!();
}
