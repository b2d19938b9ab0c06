use std::collections::{HashMap, HashSet};

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use header_checkr::license::UNKNOWN_CATEGORY;
use header_checkr::{LicenseFilter, LicenseRegistry, Verdict, VerdictStatus};

/// Render a colored terminal report.
pub fn render(verdicts: &[Verdict], verbose: bool, quiet: bool) -> Result<()> {
    let total = verdicts.len();
    let approved_count = count(verdicts, VerdictStatus::Approved);
    let unapproved_count = count(verdicts, VerdictStatus::Unapproved);
    let unknown_count = count(verdicts, VerdictStatus::Unknown);

    if quiet {
        println!(
            "Total: {}  Approved: {}  Unapproved: {}  Unknown: {}",
            total,
            approved_count.to_string().green(),
            unapproved_count.to_string().red(),
            unknown_count.to_string().yellow(),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}\n",
        "header-checkr".bold(),
        env!("CARGO_PKG_VERSION")
    );

    // Summary box
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Files checked : {}", total));
    println!(
        " │  {:<48} │",
        format!(
            "{}  Approved  : {:>4}  {}",
            "✓".green(),
            approved_count,
            summarize_families(verdicts, VerdictStatus::Approved)
        )
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Unapproved: {:>4}  {}",
            "✗".red(),
            unapproved_count,
            summarize_families(verdicts, VerdictStatus::Unapproved)
        )
    );
    println!(
        " │  {:<48} │",
        format!("{}  Unknown   : {:>4}", "?".yellow(), unknown_count)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if unapproved_count > 0 {
        println!(" {} Files with unapproved licenses:\n", "[UNAPPROVED]".red().bold());
        render_table(verdicts, VerdictStatus::Unapproved);
        println!();
    }

    if unknown_count > 0 {
        println!(" {} Files without a recognized license header:\n", "[UNKNOWN]".yellow().bold());
        render_table(verdicts, VerdictStatus::Unknown);
        println!();
    }

    if verbose && approved_count > 0 {
        println!(" {} All approved files:\n", "[APPROVED]".green().bold());
        render_table(verdicts, VerdictStatus::Approved);
        println!();
    }

    Ok(())
}

fn count(verdicts: &[Verdict], status: VerdictStatus) -> usize {
    verdicts.iter().filter(|v| v.status == status).count()
}

fn render_table(verdicts: &[Verdict], status: VerdictStatus) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("File").add_attribute(Attribute::Bold),
            Cell::new("Family").add_attribute(Attribute::Bold),
            Cell::new("Licenses").add_attribute(Attribute::Bold),
            Cell::new("Notes").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for verdict in verdicts.iter().filter(|v| v.status == status) {
        let (status_str, status_color) = match verdict.status {
            VerdictStatus::Approved => ("✓ approved", Color::Green),
            VerdictStatus::Unapproved => ("✗ unapproved", Color::Red),
            VerdictStatus::Unknown => ("? unknown", Color::Yellow),
        };

        let licenses: Vec<String> = verdict
            .matched_licenses()
            .iter()
            .map(|m| if m.approved { m.id.clone() } else { format!("{} (!)", m.id) })
            .collect();
        let notes: Vec<&str> = verdict.notes().collect();

        table.add_row(vec![
            Cell::new(&verdict.document),
            Cell::new(verdict.families().join(", ")),
            Cell::new(licenses.join(", ")),
            Cell::new(notes.join("; ")).fg(Color::DarkGrey),
            Cell::new(status_str)
                .fg(status_color)
                .set_alignment(CellAlignment::Center),
        ]);
    }

    println!("{}", table);
}

fn summarize_families(verdicts: &[Verdict], status: VerdictStatus) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for verdict in verdicts.iter().filter(|v| v.status == status) {
        for family in verdict.families() {
            *counts.entry(family.trim_end()).or_insert(0) += 1;
        }
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(family, cnt)| format!("{} ({})", family, cnt))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}

/// `--list-licenses`: one row per license definition.
pub fn render_licenses(registry: &LicenseRegistry, filter: LicenseFilter) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").add_attribute(Attribute::Bold),
            Cell::new("Family").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Approved").add_attribute(Attribute::Bold),
            Cell::new("Derived from").add_attribute(Attribute::Bold),
            Cell::new("Matcher").add_attribute(Attribute::Bold),
        ]);

    for license in registry.licenses(filter) {
        let approved = registry.is_approved(license);
        table.add_row(vec![
            Cell::new(license.id()),
            Cell::new(license.family().category()),
            Cell::new(license.name()),
            Cell::new(if approved { "yes" } else { "no" })
                .fg(if approved { Color::Green } else { Color::Red })
                .set_alignment(CellAlignment::Center),
            Cell::new(license.derived_from().unwrap_or("-")),
            Cell::new(license.matcher().to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!(" {} licenses ({})\n", "Configured".bold(), filter);
    println!("{}", table);
}

/// `--list-families`: one row per family.
pub fn render_families(registry: &LicenseRegistry, filter: LicenseFilter) {
    let approved: HashSet<&str> = registry
        .families(LicenseFilter::Approved)
        .into_iter()
        .map(|f| f.category())
        .collect();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Approved").add_attribute(Attribute::Bold),
        ]);

    for family in registry.families(filter) {
        let is_approved = approved.contains(family.category());
        table.add_row(vec![
            Cell::new(family.category()),
            Cell::new(family.name()),
            Cell::new(if is_approved { "yes" } else { "no" })
                .fg(if is_approved { Color::Green } else { Color::Red })
                .set_alignment(CellAlignment::Center),
        ]);
    }

    println!(" {} license families ({})\n", "Configured".bold(), filter);
    println!("{}", table);
    if filter == LicenseFilter::All {
        println!(" Unmatched files are reported as {}", UNKNOWN_CATEGORY.yellow());
    }
}
