//! Terminal ownership for the wizard TUI.

use anyhow::{Context, Result};
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Owns the raw-mode terminal and restores it when dropped, including on
/// early `?` returns.
pub struct TerminalGuard {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    active: AtomicBool,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen
    pub fn new() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        execute!(io::stdout(), EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let terminal =
            Terminal::new(CrosstermBackend::new(io::stdout())).context("Failed to create terminal")?;
        Ok(Self {
            terminal: Some(terminal),
            active: AtomicBool::new(true),
        })
    }

    pub fn terminal_mut(&mut self) -> Option<&mut Terminal<CrosstermBackend<Stdout>>> {
        self.terminal.as_mut()
    }

    /// Restore the terminal now instead of at drop
    pub fn restore(&mut self) {
        if self.active.swap(false, Ordering::SeqCst) {
            Self::cleanup();
        }
        self.terminal = None;
    }

    /// Undo raw mode and the alternate screen; also used by the panic hook
    pub fn cleanup() {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = io::stdout().flush();
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Install panic hook that restores terminal before printing panic.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        TerminalGuard::cleanup();
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_deactivates_once() {
        let mut guard = TerminalGuard {
            terminal: None,
            active: AtomicBool::new(true),
        };
        guard.restore();
        assert!(!guard.active.load(Ordering::SeqCst));
        assert!(guard.terminal_mut().is_none());
        // A second restore and the drop are no-ops
        guard.restore();
    }

    #[test]
    fn test_inactive_guard_skips_cleanup() {
        let guard = TerminalGuard {
            terminal: None,
            active: AtomicBool::new(false),
        };
        drop(guard);
    }
}
