//! Interactive REPL for flowgate

mod commands;
mod core;
mod presentation;
mod spinner;
mod status;

use crate::error::CliError;
use commands::{handle_special_command, SpecialCommandResult};
use self::core::{input_prompt, print_welcome, reset_input_style};
use presentation::new_event_queue;
use rustyline::error::ReadlineError;
use rustyline::{Cmd, DefaultEditor, KeyEvent};
use spinner::Spinner;
use status::{clear_status_line, update_status_line};

use flowgate_core::{MessageRole, Orchestrator};
use std::sync::Arc;

pub use commands::{format_flow, format_history, format_tokens, help, mask_token, CommandType};
pub use presentation::{format_outcome, format_step_line, FlowPresenter, PresentationHook};

/// Run an interactive REPL against the orchestrator
///
/// This provides a command-line interface with:
/// - Up/down arrow history and Ctrl+R reverse search
/// - Slash commands (/login, /tokens, /flow, ...)
/// - Live flow steps printed as the sequencer advances
/// - A status line with identity, flow progress and granted scope
///
/// # Errors
///
/// Returns `CliError::Readline` if the line editor cannot be created or
/// history cannot be recorded.
///
/// # Example
/// ```ignore
/// use flowgate_core::{FlowConfig, Orchestrator, SimulatedCollaborator};
/// use flowgate_cli::run_cli;
///
/// let orchestrator = Orchestrator::new(SimulatedCollaborator::new(), FlowConfig::default());
/// run_cli(orchestrator).await?;
/// ```
pub async fn run_cli(orchestrator: Orchestrator) -> Result<(), CliError> {
    let orchestrator = Arc::new(orchestrator);

    let queue = new_event_queue();
    orchestrator.add_hook(PresentationHook::new(Arc::clone(&queue)));
    let presenter = FlowPresenter::new(queue);
    print_welcome(&orchestrator);

    let mut rl = DefaultEditor::new()?;

    // Bind Ctrl-J to insert newline instead of submitting
    rl.bind_sequence(KeyEvent::ctrl('J'), Cmd::Newline);

    loop {
        update_status_line(&orchestrator.snapshot());

        let readline = rl.readline(input_prompt());
        reset_input_style();

        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line)?;

                if let Some(result) = handle_special_command(line, &orchestrator) {
                    match result {
                        SpecialCommandResult::Exit => break,
                        SpecialCommandResult::Continue => continue,
                    }
                }

                if !orchestrator.is_signed_in() {
                    println!("\x1b[2mNot signed in: the flow will stop at identity.\x1b[0m");
                }

                println!();
                let spinner = Spinner::new(&format!("asking {}", orchestrator.collaborator_name()));
                let report = orchestrator.submit(line).await;
                spinner.stop().await;
                if let Some(error) = &report.error {
                    log::warn!("chat request failed: {}", error);
                }

                if let Some(reply) = orchestrator
                    .messages()
                    .into_iter()
                    .rev()
                    .find(|m| m.role == MessageRole::Assistant)
                {
                    println!("{}\n", reply.content);
                }

                presenter
                    .follow(orchestrator.sequencer(), report.generation, report.outcome)
                    .await;
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C - just continue
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    clear_status_line();
    presenter.discard();

    println!("\n👋 Goodbye!\n");
    Ok(())
}
