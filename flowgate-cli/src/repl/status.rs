//! Persistent status line display

use crossterm::{
    cursor,
    terminal::{self, ClearType},
    ExecutableCommand, QueueableCommand,
};
use flowgate_core::{DisplaySnapshot, StepStatus};
use std::io::{stdout, Write};

/// ANSI color codes for status display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusColors {
    pub fg: &'static str,
    pub bg: &'static str,
}

impl StatusColors {
    /// Red on dark red: the last run halted
    pub const HALTED: Self = Self {
        fg: "\x1b[31m",
        bg: "\x1b[48;5;52m",
    };

    /// Yellow on dark yellow: a request or run is in progress
    pub const WORKING: Self = Self {
        fg: "\x1b[33m",
        bg: "\x1b[48;5;58m",
    };

    /// White on gray
    pub const NORMAL: Self = Self {
        fg: "\x1b[37m",
        bg: "\x1b[48;5;236m",
    };
}

/// Pick colors from the flow state: any errored step wins, then activity
pub fn select_status_colors(snapshot: &DisplaySnapshot) -> StatusColors {
    let errored = snapshot.steps.iter().any(|s| s.status == StepStatus::Error);
    let active = snapshot.steps.iter().any(|s| s.status == StepStatus::Active);

    if errored {
        StatusColors::HALTED
    } else if snapshot.busy || active {
        StatusColors::WORKING
    } else {
        StatusColors::NORMAL
    }
}

/// Text of the status line
pub fn format_status(snapshot: &DisplaySnapshot) -> String {
    let who = snapshot
        .tokens
        .as_ref()
        .map(|bundle| bundle.identity.subject().unwrap_or("signed in").to_string())
        .unwrap_or_else(|| "signed out".to_string());
    let done = snapshot
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Complete)
        .count();
    let access = match snapshot.tokens.as_ref().and_then(|b| b.access.as_ref()) {
        Some(access) => access.scope.as_str(),
        None => "no access token",
    };

    format!(
        "  {} · flow {}/{} · {} · {} messages",
        who,
        done,
        snapshot.steps.len(),
        access,
        snapshot.messages.len()
    )
}

/// Update persistent status line at bottom of terminal
pub fn update_status_line(snapshot: &DisplaySnapshot) {
    let Ok((width, height)) = terminal::size() else {
        return;
    };

    let mut stdout = stdout();
    let colors = select_status_colors(snapshot);
    let status_text = format_status(snapshot);

    let _ = stdout.queue(cursor::SavePosition);
    let _ = stdout.queue(cursor::MoveTo(0, height.saturating_sub(1)));
    let _ = write!(stdout, "{}{}{}", colors.bg, colors.fg, status_text);

    let padding = (width as usize).saturating_sub(status_text.chars().count());
    if padding > 0 {
        let _ = write!(stdout, "{}", " ".repeat(padding));
    }

    let _ = write!(stdout, "\x1b[0m");
    let _ = stdout.queue(cursor::RestorePosition);
    let _ = stdout.flush();
}

/// Clear the persistent status line
pub fn clear_status_line() {
    if let Ok((_, height)) = terminal::size() {
        let mut stdout = stdout();
        let _ = stdout.queue(cursor::SavePosition);
        let _ = stdout.queue(cursor::MoveTo(0, height.saturating_sub(1)));
        let _ = stdout.execute(terminal::Clear(ClearType::CurrentLine));
        let _ = stdout.queue(cursor::RestorePosition);
        let _ = stdout.flush();
    }
}
