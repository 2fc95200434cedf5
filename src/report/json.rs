use crate::extract::CommandRecord;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;

/// JSON reporter for programmatic output.
///
/// The artifact is a plain array of records with stable field names
/// (OMA_URI, NodeName, Description, MinimumOS, SourceFile, and Exec when
/// payloads are enabled), so repeated runs over unchanged input produce
/// byte-identical output.
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, records: &[CommandRecord]) -> Result<()> {
        let mut json = serde_json::to_string_pretty(records).into_diagnostic()?;
        json.push('\n');

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Catalog written to: {}", path.display());
        } else {
            print!("{}", json);
        }

        Ok(())
    }
}
