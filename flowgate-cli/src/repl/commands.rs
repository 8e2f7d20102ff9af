use chrono::Local;
use flowgate_core::{
    codec::Claims, ChatMessage, FlowStep, MessageRole, Orchestrator, StepGroup, TokenBundle,
};

use super::presentation::format_step_line;

/// Classify an input line as a special command type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandType<'a> {
    /// Slash command with name and arguments
    Slash {
        command: &'a str,
        args: Vec<&'a str>,
    },
    /// Regular input to submit to the orchestrator
    Regular,
}

impl<'a> CommandType<'a> {
    /// Parse an input line into a command type
    pub fn parse(input: &'a str) -> Self {
        if input.starts_with('/') {
            let parts: Vec<&str> = input.split_whitespace().collect();
            if let Some((&command, args)) = parts.split_first() {
                return Self::Slash {
                    command,
                    args: args.to_vec(),
                };
            }
        }

        Self::Regular
    }
}

pub enum SpecialCommandResult {
    Exit,
    Continue,
}

/// Handle slash commands
///
/// Returns Some(result) if this was a special command,
/// None if it should be submitted.
pub fn handle_special_command(
    input: &str,
    orchestrator: &Orchestrator,
) -> Option<SpecialCommandResult> {
    let CommandType::Slash { command, args } = CommandType::parse(input) else {
        return None;
    };

    match command {
        "/exit" | "/quit" => return Some(SpecialCommandResult::Exit),
        "/help" => print!("{}", help::full_text()),
        "/login" => login(orchestrator, &args),
        "/logout" => {
            orchestrator.logout();
            println!("Signed out. Tokens and chat history cleared.");
        }
        "/tokens" => print!("{}", format_tokens(orchestrator.tokens().as_ref())),
        "/flow" => print!("{}", format_flow(&orchestrator.sequencer().steps())),
        "/history" => {
            let limit: usize = args.first().and_then(|s| s.parse().ok()).unwrap_or(10);
            print!("{}", format_history(&orchestrator.messages(), limit));
        }
        "/reset" => {
            orchestrator.reset_flow();
            println!("Flow reset.");
        }
        _ => {
            eprintln!(
                "Unknown command: {}. Type /help for available commands.",
                command
            );
        }
    }
    Some(SpecialCommandResult::Continue)
}

fn login(orchestrator: &Orchestrator, args: &[&str]) {
    let Some(token) = args.first() else {
        eprintln!("Usage: /login <id-token>");
        return;
    };

    match orchestrator.login(token) {
        Ok(()) => {
            let subject = orchestrator
                .tokens()
                .and_then(|bundle| bundle.identity.subject().map(str::to_string));
            match subject {
                Some(sub) => println!("Signed in as {}.", sub),
                None => println!("Signed in (token has no readable claims)."),
            }
        }
        Err(e) => eprintln!("❌ {}", e),
    }
}

/// Help text sections for the CLI
pub mod help {
    /// Header for the help display
    pub const HEADER: &str = "\n📖 Available Commands:\n";

    /// Session commands section
    pub const SESSION: &str = "\
Session:
  /login <token>    Sign in with an identity token
  /logout           Sign out and clear tokens and history
";

    /// Inspection commands section
    pub const INSPECT: &str = "\
Inspect:
  /tokens           Show identity, delegation and access tokens
  /flow             Show the current flow steps
  /history [n]      Show last n messages (default: 10)
  /reset            Return every flow step to pending
";

    /// Exit commands section
    pub const EXIT: &str = "\
Exit:
  /exit, /quit      Exit
  Ctrl+D            Exit
";

    /// Anything else section
    pub const REQUESTS: &str = "\
Requests:
  Any other input is sent to the assistant, for example:
    Get customer information for Alice
    Search for documents about security
    Initiate a payment of $15000 to Bob
";

    /// Get the complete help text
    pub fn full_text() -> String {
        format!("{}{}\n{}\n{}\n{}\n", HEADER, SESSION, INSPECT, REQUESTS, EXIT)
    }
}

/// Shorten a raw token for display: first 16 characters and its length
pub fn mask_token(raw: &str) -> String {
    if raw.is_empty() {
        return "(empty)".to_string();
    }
    let head: String = raw.chars().take(16).collect();
    if head.len() == raw.len() {
        head
    } else {
        format!("{}… ({} bytes)", head, raw.len())
    }
}

fn format_claims(claims: &Claims) -> String {
    if claims.is_empty() {
        return "    (no readable claims)\n".to_string();
    }
    let mut output = String::new();
    for (name, value) in claims {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        output.push_str(&format!("    {}: {}\n", name, value));
    }
    output
}

/// Format the token bundle for display
pub fn format_tokens(bundle: Option<&TokenBundle>) -> String {
    let Some(bundle) = bundle else {
        return "\nNot signed in. Use /login <token>.\n\n".to_string();
    };

    let mut output = String::from("\n🔑 Tokens:\n\n");
    output.push_str(&format!(
        "  Identity    {}\n",
        mask_token(&bundle.identity.raw)
    ));
    output.push_str(&format_claims(&bundle.identity.claims));

    match &bundle.delegation {
        Some(delegation) => {
            output.push_str(&format!("  Delegation  {}\n", mask_token(&delegation.raw)));
            output.push_str(&format_claims(&delegation.claims));
        }
        None => output.push_str("  Delegation  (none)\n"),
    }

    match &bundle.access {
        Some(access) => {
            output.push_str(&format!("  Access      {}\n", mask_token(&access.raw)));
            output.push_str(&format!("    scope: {}\n", access.scope));
            output.push_str(&format!("    audience: {}\n", access.audience));
            output.push_str(&format!("    expires_in: {}s\n", access.expires_in_seconds));
        }
        None => output.push_str("  Access      (none)\n"),
    }

    output.push('\n');
    output
}

/// Format the flow steps, primary steps first
pub fn format_flow(steps: &[FlowStep]) -> String {
    let mut output = String::from("\n🔗 Flow:\n");
    for group in [StepGroup::Primary, StepGroup::Secondary] {
        let mut in_group = steps.iter().filter(|s| s.group == group).peekable();
        if in_group.peek().is_none() {
            continue;
        }
        output.push('\n');
        for step in in_group {
            output.push_str(&format_step_line(step.ordinal, &step.title, step.status));
            output.push('\n');
            output.push_str(&format!("      \x1b[2m{}\x1b[0m\n", step.description));
        }
    }
    output.push('\n');
    output
}

/// Format the last `limit` chat messages
pub fn format_history(messages: &[ChatMessage], limit: usize) -> String {
    if messages.is_empty() {
        return "\nNo conversation history yet.\n\n".to_string();
    }

    let skip = messages.len().saturating_sub(limit);
    let mut output = format!("\n📜 Conversation History (last {}):\n\n", limit);
    for (idx, msg) in messages.iter().enumerate().skip(skip) {
        let role = match msg.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        };
        let content: String = if msg.content.chars().count() > 100 {
            format!("{}...", msg.content.chars().take(100).collect::<String>())
        } else {
            msg.content.clone()
        };
        let time = msg.timestamp.with_timezone(&Local).format("%H:%M:%S");
        output.push_str(&format!("{}. [{}] {}: {}\n", idx + 1, time, role, content));
    }
    output.push('\n');
    output
}
