use crate::output::{banner, print_json, OutputMode};

pub fn execute(mode: OutputMode) {
    let version = env!("CARGO_PKG_VERSION");
    match mode {
        OutputMode::Json => {
            let _ = print_json(&serde_json::json!({
                "version": version,
                "arch": std::env::consts::ARCH,
                "os": std::env::consts::OS,
            }));
        }
        OutputMode::Human => banner::print_version_block(version),
    }
}
