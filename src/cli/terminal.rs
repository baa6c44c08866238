//! Colour helpers for terminal output.
//!
//! Styling is skipped when stdout does not support colour, so piped output
//! stays plain text.

use owo_colors::{OwoColorize, Style};
use supports_color::Stream;

fn colour_enabled() -> bool {
    supports_color::on_cached(Stream::Stdout).is_some()
}

/// Styles text for the terminal, falling back to plain text.
pub trait Colorize: AsRef<str> {
    /// Apply `style` when colour is enabled.
    fn paint(&self, style: Style) -> String {
        let text = self.as_ref();
        if colour_enabled() {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Green, for a clean result.
    fn success(&self) -> String {
        self.paint(Style::new().green())
    }

    /// Yellow, for problems worth a look.
    fn warning(&self) -> String {
        self.paint(Style::new().yellow())
    }

    /// Dimmed, for labels and secondary detail.
    fn dim(&self) -> String {
        self.paint(Style::new().dimmed())
    }
}

impl<T: AsRef<str> + ?Sized> Colorize for T {}
