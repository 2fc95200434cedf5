use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a ddfscan run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Patterns to exclude from discovery
    pub exclude: Vec<String>,

    /// Extraction configuration
    pub extraction: ExtractionConfig,

    /// Report configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Inherit Description/OsBuildVersion from the nearest ancestor node
    /// when a command node does not declare them itself
    pub inherit_properties: bool,

    /// Attach a rendered SyncML <Exec> fragment to every record
    pub render_payloads: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: json, terminal
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: vec![],
            extraction: ExtractionConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            inherit_properties: true,
            render_payloads: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations in the input directory
    pub fn from_default_locations(input_dir: &Path) -> Result<Self> {
        let default_names = [
            ".ddfscan.yml",
            ".ddfscan.yaml",
            ".ddfscan.toml",
            "ddfscan.yml",
            "ddfscan.yaml",
            "ddfscan.toml",
        ];

        for name in &default_names {
            let path = input_dir.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Check if a path matches an exclusion pattern.
    ///
    /// Patterns are tried against both the full path and the bare file name,
    /// so "Old*" excludes OldPolicy.xml regardless of where it lives.
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.exclude
            .iter()
            .any(|pattern| glob_match(pattern, &path_str) || glob_match(pattern, &file_name))
    }
}

/// Simple glob matching for patterns like "*Policy.xml" or "**/archive/**"
fn glob_match(pattern: &str, text: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        if !pattern.contains('/') {
            // Pattern like "*Policy.xml" matches "BitLockerPolicy.xml"
            return text.ends_with(suffix);
        }
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        if !pattern.contains('/') {
            // Pattern like "Defender*" matches "DefenderDdf.xml"
            return text.starts_with(prefix);
        }
    }

    // Pattern like "**/archive/**" matches any path with an "archive" directory
    if let Some(dir) = pattern
        .strip_prefix("**/")
        .and_then(|p| p.strip_suffix("/**"))
    {
        // Must match a complete directory name, not a substring
        return text.contains(&format!("/{}/", dir));
    }

    text == pattern
}
