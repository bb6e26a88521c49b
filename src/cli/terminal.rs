//! Terminal control surface: spinner status line, y/N prompts, styled notices.

use std::io::{self, Write};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::surface::{ControlSurface, Notice, Prompt};

pub struct TerminalSurface {
    assume_yes: bool,
    spinner: ProgressBar,
}

impl TerminalSurface {
    pub fn new(assume_yes: bool) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self {
            assume_yes,
            spinner,
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ControlSurface for TerminalSurface {
    fn set_status(&self, text: &str) {
        self.spinner.set_message(text.to_string());
    }

    fn confirm(&self, prompt: Prompt) -> bool {
        if self.assume_yes {
            return true;
        }
        self.spinner.suspend(|| match ask(&prompt.text()) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Could not read confirmation: {}", e);
                false
            }
        })
    }

    fn notify(&self, notice: Notice) {
        let text = notice.text();
        self.spinner.suspend(|| match notice {
            Notice::Success { .. } => println!("{} {}", style("✓").green(), text),
            Notice::ZeroResults | Notice::AlreadyRunning => {
                println!("{} {}", style("!").yellow(), text)
            }
            Notice::Failed { .. } => eprintln!("{} {}", style("✗").red(), text),
        });
    }
}

fn ask(text: &str) -> io::Result<bool> {
    println!("\n{}", text);
    print!("\nProceed? [y/N] ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
