//! Console styling

use owo_colors::{OwoColorize, Style, Styled};
use std::fmt::Display;

pub static CHECK: &str = "✓";
pub static CROSS: &str = "✗";
pub static ARROW: &str = "→";

/// Semantic styles for console output
pub trait Stylize: Display + Sized {
    fn emphasis(&self) -> Styled<&Self> {
        self.style(Style::new().bold())
    }

    fn muted(&self) -> Styled<&Self> {
        self.style(Style::new().dimmed())
    }

    fn accent(&self) -> Styled<&Self> {
        self.style(Style::new().cyan())
    }

    fn warn(&self) -> Styled<&Self> {
        self.style(Style::new().yellow())
    }

    fn error(&self) -> Styled<&Self> {
        self.style(Style::new().red().bold())
    }
}

impl<T: Display> Stylize for T {}

pub fn check() -> Styled<&'static &'static str> {
    CHECK.style(Style::new().green())
}

pub fn cross() -> Styled<&'static &'static str> {
    CROSS.style(Style::new().red())
}

pub fn arrow() -> Styled<&'static &'static str> {
    ARROW.style(Style::new().dimmed())
}
