//! Terminal output.
//!
//! All user-facing printing goes through [`OutputFormatter`]: status lines,
//! the plan preview, progress bars and run summaries. Diagnostics go through
//! `tracing` instead and end up on stderr.

use crate::file_organizer::ApplyReport;
use crate::plan::{Plan, PlanKind};
use crate::undo::{UndoOutcome, UndoReport};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Manages all CLI output with consistent styling.
///
/// ```no_run
/// use tidyup::output::OutputFormatter;
///
/// OutputFormatter::success("Moved 3 files");
/// OutputFormatter::warning("1 file could not be moved");
/// ```
pub struct OutputFormatter;

impl OutputFormatter {
    /// Green check mark line.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Red cross line, on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for an apply run over `total` items.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        let pb = ProgressBar::new(total);
        pb.set_style(style);
        pb
    }

    /// Prints item counts per label with a total row.
    ///
    /// `label_heading` names the first column, e.g. `Category` or `Source`.
    pub fn summary_table(label_heading: &str, counts: &BTreeMap<String, usize>) {
        let total: usize = counts.values().sum();
        let width = counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(label_heading.len())
            .max(5);

        println!(
            "{:<width$} | {}",
            label_heading.bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));
        for (name, count) in counts {
            println!(
                "{:<width$} | {} {}",
                name,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            plural(total),
            width = width
        );
    }

    /// Prints the preview of a plan.
    ///
    /// At most `max_preview` individual moves are listed; the remainder is
    /// summarized in one line.
    pub fn plan_preview(plan: &Plan, max_preview: usize) {
        Self::info(&format!("Root: {}", plan.root.display()));
        let heading = match &plan.kind {
            PlanKind::Organize { result_dir } => {
                Self::info(&format!("Result folder: {}", result_dir.display()));
                "Category"
            }
            PlanKind::Rename => "Source",
        };

        if plan.is_empty() {
            Self::success("Nothing to do");
        } else {
            Self::header("PLAN");
            Self::summary_table(heading, &plan.counts);
        }

        if !plan.directories.is_empty() {
            Self::header("DIRECTORIES TO CREATE");
            for dir in &plan.directories {
                println!("  {}", relative_to(dir, &plan.root));
            }
        }

        if !plan.is_empty() {
            Self::header("MOVES");
            for item in plan.items.iter().take(max_preview) {
                println!(
                    "  [{}] {} {} {}",
                    item.label.name().dimmed(),
                    relative_to(&item.source, &plan.root),
                    "->".cyan(),
                    relative_to(&item.destination, &plan.root)
                );
            }
            if plan.len() > max_preview {
                println!("  ... and {} more", plan.len() - max_preview);
            }
        }

        if !plan.unclassified.is_empty() {
            Self::header("UNCLASSIFIED (left in place)");
            for path in plan.unclassified.iter().take(max_preview) {
                println!("  {}", relative_to(path, &plan.root));
            }
            if plan.unclassified.len() > max_preview {
                println!("  ... and {} more", plan.unclassified.len() - max_preview);
            }
        }

        if plan.unchanged > 0 {
            Self::plain(&format!(
                "{} {} already named correctly",
                plan.unchanged,
                plural(plan.unchanged)
            ));
        }
    }

    pub fn apply_summary(report: &ApplyReport) {
        if report.is_success() {
            Self::success(&format!(
                "Moved {} {}",
                report.moved,
                plural(report.moved)
            ));
        } else {
            Self::warning(&format!(
                "Moved {} of {} {}; {} failed",
                report.moved,
                report.attempted(),
                plural(report.attempted()),
                report.failures.len()
            ));
            for failure in &report.failures {
                Self::error(&format!("{}: {}", failure.source.display(), failure.error));
            }
        }
        if report.rerouted > 0 {
            Self::plain(&format!(
                "{} {} renamed at apply time to avoid a new conflict",
                report.rerouted,
                plural(report.rerouted)
            ));
        }
        Self::info(&format!("Log: {}", report.log_path.display()));
    }

    pub fn undo_summary(report: &UndoReport) {
        for entry in &report.entries {
            let line = format!(
                "{} {} {}",
                entry.new_path.display(),
                "->".cyan(),
                entry.old_path.display()
            );
            match &entry.outcome {
                UndoOutcome::Restored | UndoOutcome::WouldRestore => Self::plain(&format!("  {line}")),
                UndoOutcome::SkippedMissingDestination => {
                    Self::warning(&format!("skipped, file is gone: {line}"))
                }
                UndoOutcome::SkippedSourceExists => {
                    Self::warning(&format!("skipped, original path is taken: {line}"))
                }
                UndoOutcome::Failed(error) => Self::error(&format!("{line}: {error}")),
            }
        }

        let changed = report.changed();
        if report.applied {
            Self::success(&format!("Restored {} {}", changed, plural(changed)));
        } else {
            Self::dry_run_notice(&format!(
                "{} {} would be restored; run again with --apply",
                changed,
                plural(changed)
            ));
        }
        if report.skipped() > 0 {
            Self::warning(&format!("{} skipped", report.skipped()));
        }
        if report.ignored_rows > 0 {
            Self::plain(&format!("{} log rows not eligible for undo", report.ignored_rows));
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

fn relative_to(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
