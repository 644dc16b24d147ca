//! Terminal prompts

use std::io::{self, BufRead, Write};
use tracing::warn;
use trustpoll_admin::Confirmer;

/// Asks on stdout and reads the answer from stdin. Anything but `y`/`yes`
/// declines, as does an unreadable terminal.
#[derive(Debug, Default)]
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        let stdin = io::stdin();
        match prompt_yes_no(&mut stdin.lock(), &mut io::stdout(), prompt) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Could not read confirmation, declining");
                false
            }
        }
    }
}

/// `label [y/N]: `, defaulting to no.
pub fn prompt_yes_no(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> io::Result<bool> {
    write!(output, "{label} [y/N]: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Read one trimmed line after printing `label`.
pub fn read_line(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> io::Result<String> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
