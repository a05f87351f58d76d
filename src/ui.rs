//! Terminal output helpers
//!
//! Colors are disabled when stdout is not a terminal.

use colored::*;
use console::Term;

/// UI configuration
#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Whether to emit ANSI colors
    pub use_color: bool,
    /// Console width, when known
    pub console_width: Option<u16>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            use_color: true,
            console_width: None,
        }
    }
}

impl UiConfig {
    /// Detect color support and width from the attached stdout
    pub fn detect() -> Self {
        let term = Term::stdout();
        let is_term = term.is_term();
        Self {
            use_color: is_term,
            console_width: if is_term { Some(term.size().1) } else { None },
        }
    }
}

/// Apply the UI configuration to the process-wide color switch
pub fn init_ui(config: &UiConfig) {
    colored::control::set_override(config.use_color);
}

/// Print the program banner
pub fn print_banner(version: &str) {
    println!(
        "{}\n{}",
        r#"
┌─┐┬─┐┌─┐─┐ ┬┬ ┬┌─┐┌┬┐┬
├─┘├┬┘│ │┌┴┬┘└┬┘│   │ │
┴  ┴└─└─┘┴ └─ ┴ └─┘ ┴ ┴─┘
        "#
        .cyan()
        .bold(),
        format!("Version: {}", version).yellow()
    );
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print an informational message
pub fn print_info(msg: &str) {
    println!("{} {}", "i".blue().bold(), msg);
}

/// Horizontal rule sized to the console
pub fn rule(config: &UiConfig) -> String {
    let width = config.console_width.unwrap_or(60).min(80) as usize;
    "─".repeat(width)
}
