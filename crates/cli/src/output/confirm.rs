use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

/// Interactive yes/no prompt, defaulting to no. An aborted or failed prompt
/// (ctrl-c, no tty) counts as a refusal.
pub fn confirm_action(prompt: &str) -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact_opt()
        .ok()
        .flatten()
        .unwrap_or(false)
}
