//! User-facing output and prompts
//!
//! Thin presentation layer over the `console` crate: styled status lines
//! and the interactive prompts used by the no-argument menu mode. All
//! orchestration decisions stay in [crate::release]; this module only
//! displays and asks.

use std::io::{self, Write};

use anyhow::Result;
use console::style;

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

pub fn display_heading(message: &str) {
    println!("\n{}", style(message).blue().bold());
}

/// Numbered next-step hints printed after a successful operation
pub fn display_next_steps(steps: &[&str]) {
    println!("\n{}", style("Next steps:").bold());
    for (i, step) in steps.iter().enumerate() {
        println!("{}. {}", i + 1, step);
    }
}

/// Prompts user to choose one option from a numbered list.
///
/// Returns the zero-based index of the selection. Empty input selects
/// the first option.
pub fn select_option(title: &str, options: &[&str]) -> Result<usize> {
    println!("\n{}", style(title).bold());
    for (i, option) in options.iter().enumerate() {
        println!("  {}. {}", i + 1, option);
    }

    print!("\nChoose an option (1-{}) [default: 1]: ", options.len());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let selection = input.trim();

    let index = if selection.is_empty() {
        1
    } else {
        selection.parse::<usize>().unwrap_or(0)
    };

    if index > 0 && index <= options.len() {
        Ok(index - 1)
    } else {
        Err(anyhow::anyhow!("Invalid selection: {}", selection))
    }
}

/// Ask a yes/no question; default is no
pub fn confirm_action(prompt: &str) -> Result<bool> {
    print!("\n{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

/// Free-form text prompt
pub fn prompt_text(prompt: &str) -> Result<String> {
    print!("{}: ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
