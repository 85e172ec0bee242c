//! Terminal output for the taxonomy seeding tool.

use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Color as TermColor, Stylize};
use location_server::taxonomy::{format_location_name, LocationTaxonomy};
use unicode_width::UnicodeWidthStr;

const ACCENT: TermColor = TermColor::Rgb { r: 0, g: 200, b: 220 };
const OK: TermColor = TermColor::Rgb { r: 0, g: 230, b: 130 };
const FAIL: TermColor = TermColor::Rgb { r: 240, g: 80, b: 80 };
const MUTED: TermColor = TermColor::Rgb { r: 130, g: 130, b: 130 };

const RULE_WIDTH: usize = 56;

pub fn get_styles() -> Styles {
    let accent = |style: Style| style.fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
    Styles::styled()
        .usage(accent(Style::new().bold().underline()))
        .header(accent(Style::new().bold().underline()))
        .literal(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .error(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

pub fn print_title(title: &str) {
    let rest = RULE_WIDTH.saturating_sub(title.width() + 3);
    println!();
    println!("{} {} {}", "──".with(ACCENT), title.with(ACCENT).bold(), "─".repeat(rest).with(ACCENT));
}

pub fn print_done(message: &str) {
    println!(" {} {}", "✓".with(OK).bold(), message.with(OK));
}

pub fn print_failure(message: &str) {
    eprintln!(" {} {}", "✗".with(FAIL).bold(), message.with(FAIL));
}

/// Draws the hierarchy as an indented tree. Entries must be ordered by key, which
/// puts every parent right before its children.
pub fn print_taxonomy_tree(entries: &[LocationTaxonomy]) {
    for (i, entry) in entries.iter().enumerate() {
        let depth = entry.depth();
        let last_sibling = entries[i + 1..]
            .iter()
            .take_while(|next| next.depth() >= depth)
            .all(|next| next.depth() > depth);
        let branch = if last_sibling { "└─ " } else { "├─ " };

        let (label, slug) = match (&entry.city, &entry.neighborhood) {
            (Some(_), Some(neighborhood)) => (format_location_name(neighborhood), neighborhood),
            (Some(city), None) => (format_location_name(city), city),
            _ => (format_location_name(&entry.country), &entry.country),
        };

        if depth == 1 {
            println!("{}", label.with(ACCENT).bold());
            continue;
        }
        let indent = "   ".repeat(depth - 2);
        println!(
            "{}{}{} {}",
            indent.with(MUTED),
            branch.with(MUTED),
            label,
            format!("({})", slug).with(MUTED)
        );
    }
}

/// One `key → Display Name` line.
pub fn print_entry(key: &str, display: &str) {
    println!("  {} {} {}", key.with(MUTED), "→".with(ACCENT), display);
}

/// Right-aligned `label: value` lines.
pub fn print_counts(rows: &[(&str, usize)]) {
    let label_width = rows.iter().map(|(label, _)| label.width()).max().unwrap_or(0);
    for (label, count) in rows {
        let padding = " ".repeat(label_width - label.width());
        println!(
            "  {}{} {}",
            padding,
            format!("{}:", label).with(MUTED),
            count.to_string().with(OK).bold()
        );
    }
}
