//! Terminal styling helpers

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream::Stdout};
use std::fmt::Display;
use supports_hyperlinks::Stream;
use terminal_link::Link;

/// Success marker
pub const CHECK: &str = "✓";

/// Failure marker
pub const CROSS: &str = "✗";

/// Semantic colors for CLI output
pub trait Stylize {
    /// Green, for completed work
    fn success(&self) -> String;
    /// Yellow, for things that need attention
    fn warn(&self) -> String;
    /// Red, for errors
    fn error(&self) -> String;
    /// Cyan, for names and numbers
    fn accent(&self) -> String;
    /// Bold, for headings
    fn emphasis(&self) -> String;
    /// Dimmed, for secondary text
    fn muted(&self) -> String;
}

impl<T: Display> Stylize for T {
    fn success(&self) -> String {
        self.if_supports_color(Stdout, |t| t.green()).to_string()
    }

    fn warn(&self) -> String {
        self.if_supports_color(Stdout, |t| t.yellow()).to_string()
    }

    fn error(&self) -> String {
        self.if_supports_color(Stdout, |t| t.red()).to_string()
    }

    fn accent(&self) -> String {
        self.if_supports_color(Stdout, |t| t.cyan()).to_string()
    }

    fn emphasis(&self) -> String {
        self.if_supports_color(Stdout, |t| t.bold()).to_string()
    }

    fn muted(&self) -> String {
        self.if_supports_color(Stdout, |t| t.dimmed()).to_string()
    }
}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Red cross
pub fn cross() -> String {
    CROSS.error()
}

/// Dimmed arrow for list items
pub fn arrow() -> String {
    "→".muted()
}

/// Spinner used while waiting on the network
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// `text` as a clickable link when the terminal supports it, else `text (url)`
pub fn hyperlink(text: &str, url: &str) -> String {
    if supports_hyperlinks::on(Stream::Stdout) {
        Link::new(text, url).to_string()
    } else {
        format!("{text} ({})", url.muted())
    }
}
