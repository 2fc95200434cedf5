use crate::extract::CommandRecord;
use colored::Colorize;
use miette::Result;
use std::collections::BTreeMap;

/// Terminal reporter with colored output, grouped by source file
pub struct TerminalReporter;

impl TerminalReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, records: &[CommandRecord]) -> Result<()> {
        if records.is_empty() {
            println!("{}", "No executable commands found.".yellow());
            return Ok(());
        }

        // BTreeMap keeps the per-file sections in a stable order
        let mut by_file: BTreeMap<&str, Vec<&CommandRecord>> = BTreeMap::new();
        for record in records {
            by_file
                .entry(record.source_file.as_str())
                .or_default()
                .push(record);
        }

        println!();
        println!(
            "{}",
            format!("Found {} executable commands:", records.len())
                .green()
                .bold()
        );
        println!();

        for (file, commands) in &by_file {
            println!("{}", file.cyan().bold());

            for record in commands {
                self.print_record(record);
            }

            println!();
        }

        println!("{}", "─".repeat(60).dimmed());
        println!(
            "Summary: {} commands across {} files",
            records.len(),
            by_file.len()
        );

        Ok(())
    }

    fn print_record(&self, record: &CommandRecord) {
        let min_os = if record.minimum_os.is_empty() {
            String::new()
        } else {
            format!(" (min OS {})", record.minimum_os)
        };

        println!(
            "  {} {}{}",
            "●".green(),
            record.oma_uri.white(),
            min_os.dimmed()
        );

        if !record.description.is_empty() {
            println!("    {} {}", "→".dimmed(), truncate(&record.description, 100).dimmed());
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Clip long descriptions so each record stays on two lines
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(max).collect();
        format!("{}…", clipped.trim_end())
    }
}
