//! Custom dialoguer theme and banner for the review screen.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// Returns a `ColorfulTheme` configured with sieve's visual identity.
///
/// - Prompt prefix: cyan `?`
/// - Success prefix: green `✓`
/// - Error prefix: red `✗`
pub fn sieve_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().cyan(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        active_item_prefix: style("▸".to_string()).for_stderr().cyan(),
        active_item_style: Style::new().for_stderr().cyan(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Prints the sieve banner and key legend to stderr.
pub fn print_banner() {
    let version_line = format!("Sieve v{}", sieve_core::VERSION);
    let tagline = "keep · discard · modify";
    let inner_width = version_line.len().max(tagline.chars().count()) + 8;

    let top = format!("  ╔{:═<width$}╗", "", width = inner_width);
    let mid1 = format!("  ║{:^width$}║", version_line, width = inner_width);
    let mid2 = format!("  ║{:^width$}║", tagline, width = inner_width);
    let bot = format!("  ╚{:═<width$}╝", "", width = inner_width);

    let cyan = Style::new().for_stderr().cyan();
    let dim = Style::new().for_stderr().dim();

    eprintln!();
    eprintln!("{}", cyan.apply_to(&top));
    eprintln!("{}", cyan.apply_to(&mid1));
    eprintln!("{}", cyan.apply_to(&mid2));
    eprintln!("{}", cyan.apply_to(&bot));
    eprintln!();
    eprintln!(
        "  {}",
        dim.apply_to("→/k keep   ←/d discard   ↑/u modify   +/- quality   r realism")
    );
    eprintln!(
        "  {}",
        dim.apply_to("c central on/off   C choose central   o open folder   q quit")
    );
    eprintln!();
}
