//! Terminal surface for flowgate
//!
//! This crate provides:
//! - An interactive REPL that submits requests to an [`Orchestrator`]
//! - Live rendering of flow steps as the sequencer advances
//! - Slash commands for login, token inspection and flow control
//!
//! [`Orchestrator`]: flowgate_core::Orchestrator

mod error;
pub mod repl;

pub use error::CliError;
pub use repl::{run_cli, FlowPresenter, PresentationHook};
