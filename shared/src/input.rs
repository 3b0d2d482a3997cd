use crate::types::Result;
use dialoguer::Input;

/// Standardized question prompt used by the interactive loop.
pub fn ask_question(prompt: &str) -> Result<String> {
    let line: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(line)
}

/// `exit` and `quit` end an interactive session, case-insensitively.
pub fn is_exit_command(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit")
}
