//! Command-line interface.

mod commands;
mod terminal;

pub use commands::{is_verbose, run};
pub use terminal::TerminalSurface;
