//! Terminal output for desksort.
//!
//! Everything the user is meant to read goes through [`OutputFormatter`];
//! diagnostics go through `tracing` on stderr instead.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

const BAR_TEMPLATE: &str = "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

/// Prints styled CLI messages.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Announces a file moved into `category`.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Name of the moved file
    /// * `category` - Category directory it now lives in
    ///
    /// # Example
    ///
    /// ```no_run
    /// use desksort::output::OutputFormatter;
    /// OutputFormatter::moved("report.pdf", "Reports");
    /// ```
    pub fn moved(file_name: &str, category: &str) {
        println!("{} {} → {}/", "✓".green(), file_name, category.bold());
    }

    /// Announces where a file would go in a dry run.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Name of the classified file
    /// * `category` - Category the file would move to
    ///
    /// # Example
    ///
    /// ```no_run
    /// use desksort::output::OutputFormatter;
    /// OutputFormatter::planned("menu.txt", "Recipes");
    /// ```
    pub fn planned(file_name: &str, category: &str) {
        println!(
            "{} {} would move to {}/",
            "[DRY RUN]".yellow(),
            file_name,
            category.bold()
        );
    }

    /// Notes a file classified into the base directory itself.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Name of the file left where it is
    pub fn left_in_place(file_name: &str) {
        println!("{} {} stays in place", "·".dimmed(), file_name);
    }

    /// Reports a file that could not be organized or restored, on stderr.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Name or path of the file
    /// * `reason` - Why the file was not handled
    ///
    /// # Example
    ///
    /// ```no_run
    /// use desksort::output::OutputFormatter;
    /// OutputFormatter::failure("broken.docx", "not a zip archive");
    /// ```
    pub fn failure(file_name: &str, reason: &str) {
        eprintln!("{} {}: {}", "✗".red(), file_name, reason.red());
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use desksort::output::OutputFormatter;
    /// OutputFormatter::success("Organization complete!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints a warning in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use desksort::output::OutputFormatter;
    /// OutputFormatter::warning("No rollback log found. Nothing to undo.");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message.yellow());
    }

    /// Prints an info message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a message prefixed with a yellow `[DRY RUN]` tag.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use desksort::output::OutputFormatter;
    /// OutputFormatter::dry_run_notice("No files were modified.");
    /// ```
    pub fn dry_run_notice(message: &str) {
        println!("{} {}", "[DRY RUN]".yellow().bold(), message.yellow());
    }

    /// Creates the per-file progress bar.
    ///
    /// indicatif hides it when stderr is not a terminal, so piped output
    /// stays clean.
    pub fn progress_bar(total: u64) -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        ProgressBar::new(total).with_style(style)
    }

    /// Prints how many files went into each category, largest first.
    ///
    /// ```no_run
    /// use desksort::output::OutputFormatter;
    /// use std::collections::HashMap;
    ///
    /// let counts = HashMap::from([("Reports".to_string(), 3), ("Recipes".to_string(), 1)]);
    /// OutputFormatter::category_table(&counts);
    /// ```
    pub fn category_table(category_counts: &HashMap<String, usize>) {
        let mut rows: Vec<(&String, &usize)> = category_counts.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        let name_width = rows
            .iter()
            .map(|(name, _)| name.chars().count() + 1)
            .chain(std::iter::once("Category".len()))
            .max()
            .unwrap_or_default();
        let total: usize = rows.iter().map(|(_, count)| **count).sum();

        println!("\n{}", "Categories".bold().underline());
        for (name, count) in rows {
            println!(
                "  {:<name_width$}  {:>4} {}",
                format!("{}/", name),
                count.to_string().green(),
                file_noun(*count),
            );
        }
        println!(
            "  {:<name_width$}  {:>4} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            file_noun(total),
        );
    }
}

fn file_noun(count: usize) -> &'static str {
    match count {
        1 => "file",
        _ => "files",
    }
}
