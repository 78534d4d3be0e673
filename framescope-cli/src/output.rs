// framescope-cli/src/output.rs
//
// Styled terminal output for command results and the progress bar.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::time::Duration;

/// Print a section heading with a rule underneath
pub fn print_heading(title: &str) {
    println!();
    println!("{}", style(title).bold().cyan());
    println!("{}", style("=".repeat(title.len())).cyan());
}

/// Print a subsection title
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(title).bold());
}

/// Print a label/value pair with the label padded to a common width
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("  {:<14} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message with a checkmark
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bright().bold().for_stderr(), message);
}

/// Create the per-frame progress bar; the length is set once the stream is known
pub fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let bar_style = ProgressStyle::with_template(
        "{spinner:.green} Frames [{bar:40.cyan/blue}] {pos}/{len} {percent:>3}% ({eta})",
    )
    .map(|template| template.progress_chars("##."))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(bar_style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
