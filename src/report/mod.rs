mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::extract::CommandRecord;
use miette::Result;
use std::path::PathBuf;

/// Output format for the command catalog
#[derive(Debug, Clone, Copy, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Terminal,
}

/// Reporter for emitting the extracted command catalog
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
        }
    }

    /// Serialize the deduplicated records exactly once
    pub fn report(&self, records: &[CommandRecord]) -> Result<()> {
        match self.format {
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(records)
            }
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new();
                reporter.report(records)
            }
        }
    }
}
