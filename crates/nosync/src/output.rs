//! Terminal output

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use nosync_core::output::{Message, OutputSink};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct State {
    spinner: Option<ProgressBar>,
    /// Label of the step in progress, repeated when it finishes
    step: Option<String>,
}

/// Renders bootstrap messages to stdout/stderr
pub struct ConsoleSink {
    quiet: bool,
    state: Mutex<State>,
}

impl ConsoleSink {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl OutputSink for ConsoleSink {
    fn write(&self, message: Message) {
        let mut state = self.state();
        match message {
            Message::Working(msg) => {
                if !self.quiet {
                    state.spinner = Some(spinner(&msg));
                }
                state.step = Some(msg);
            }
            Message::Step(msg) => {
                if !self.quiet {
                    println!("{} {}", style("ℹ").blue().bold(), msg);
                }
                state.step = Some(msg);
            }
            Message::StepDone(msg) => {
                if let Some(pb) = state.spinner.take() {
                    pb.finish_and_clear();
                }
                let step = state.step.take().unwrap_or_default();
                if !self.quiet {
                    println!("{} {} {}", style("✓").green().bold(), step, msg);
                }
            }
            Message::Stdout(line) => {
                if !self.quiet {
                    match &state.spinner {
                        Some(pb) => pb.println(line),
                        None => println!("{}", line),
                    }
                }
            }
            Message::Stderr(line) => {
                eprintln!("{}", style(line).yellow());
            }
            Message::Info(msg) => {
                if !self.quiet {
                    println!("{} {}", style("ℹ").blue().bold(), msg);
                }
            }
            Message::Success(msg) => {
                if !self.quiet {
                    println!("{} {}", style("✓").green().bold(), style(msg).green());
                }
            }
            Message::Error(msg) => {
                if let Some(pb) = state.spinner.take() {
                    pb.abandon();
                }
                eprintln!("\n{} {}", style("✗").red().bold(), style(msg).red());
            }
            Message::Hint(msg) => {
                eprintln!("{}", style(msg).yellow());
            }
        }
    }
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Create a spinner
fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
