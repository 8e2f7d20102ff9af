//! Core REPL utilities

use flowgate_core::Orchestrator;
use std::io::Write;

/// ANSI escape code to reset terminal styling
pub const RESET_STYLE: &str = "\x1b[0m";

/// The input prompt string
pub fn input_prompt() -> &'static str {
    "  ❯ "
}

/// Format the welcome banner header
pub fn format_welcome_header() -> String {
    format!("🔐 flowgate v{}", env!("CARGO_PKG_VERSION"))
}

/// Format the sign-in line shown at startup
pub fn format_identity(subject: Option<&str>, signed_in: bool) -> String {
    match (signed_in, subject) {
        (false, _) => "Identity: not signed in (/login <token>)".to_string(),
        (true, Some(sub)) => format!("Identity: {}", sub),
        (true, None) => "Identity: signed in (no readable claims)".to_string(),
    }
}

/// Reset terminal styling after input
pub fn reset_input_style() {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}", RESET_STYLE);
    let _ = stdout.flush();
}

/// Format the tip line shown at startup
pub fn format_tip() -> &'static str {
    "Type /help for commands, /tokens to inspect tokens, Ctrl+J for multiline"
}

/// Print welcome message and session info
pub fn print_welcome(orchestrator: &Orchestrator) {
    let subject = orchestrator
        .tokens()
        .and_then(|bundle| bundle.identity.subject().map(str::to_string));

    println!("\n{}", format_welcome_header());
    println!("Backend: {}", orchestrator.collaborator_name());
    println!(
        "{}",
        format_identity(subject.as_deref(), orchestrator.is_signed_in())
    );
    println!("{}", format_tip());
    println!();
}
