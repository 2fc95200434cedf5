use crate::config::Config;
use ignore::WalkBuilder;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A discovered DDF XML file
#[derive(Debug, Clone)]
pub struct DdfFile {
    /// Absolute path to the file
    pub path: PathBuf,
}

impl DdfFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Bare file name, attached to every record extracted from this file
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }

    /// Read the whole file into a string
    pub fn read_contents(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", self.path.display()))
    }
}

/// File finder for discovering DDF XML files in the input directory
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find all XML files under the given directory, sorted by path.
    ///
    /// A missing or non-directory input path is the one fatal setup error
    /// of the whole run.
    pub fn find_files(&self, root: &Path) -> Result<Vec<DdfFile>> {
        if !root.exists() {
            return Err(miette!(
                "Input directory does not exist: {}",
                root.display()
            ));
        }
        if !root.is_dir() {
            return Err(miette!(
                "Input path is not a directory: {}",
                root.display()
            ));
        }

        debug!("Scanning for DDF files in: {}", root.display());

        let walker = WalkBuilder::new(root)
            .hidden(true)           // Skip hidden files
            .git_ignore(true)       // Respect .gitignore
            .git_global(true)       // Respect global gitignore
            .git_exclude(true)      // Respect .git/info/exclude
            .ignore(true)           // Respect .ignore files
            .parents(true)          // Check parent directories for ignore files
            .follow_links(false)    // Don't follow symlinks
            .build();

        let mut files: Vec<DdfFile> = walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();

                let is_xml = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("xml"))
                    .unwrap_or(false);
                if !is_xml {
                    return None;
                }

                if self.config.should_exclude(path) {
                    trace!("Excluding: {}", path.display());
                    return None;
                }

                trace!("Found DDF file: {}", path.display());
                Some(DdfFile::new(path.to_path_buf()))
            })
            .collect();

        // Stable processing order keeps the first-seen record order (and
        // therefore the output artifact) deterministic across runs.
        files.sort_by(|a, b| a.path.cmp(&b.path));

        debug!("Found {} XML files", files.len());
        Ok(files)
    }
}
