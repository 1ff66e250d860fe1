use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_output_dir_string")]
    pub output_dir: String,
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
    /// Worker threads for statement parsing; 0 means one per CPU.
    #[serde(default)]
    pub jobs: usize,
    #[serde(default)]
    pub keep_unreconciled: bool,
    #[serde(default = "default_institutions")]
    pub institutions: Vec<String>,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Csv
}

fn default_institutions() -> Vec<String> {
    vec!["rbc".to_string()]
}

fn default_output_dir_string() -> String {
    default_output_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir_string(),
            output_format: default_output_format(),
            jobs: 0,
            keep_unreconciled: false,
            institutions: default_institutions(),
        }
    }
}

impl Settings {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.output_dir))
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("statement-audit")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("statement-audit")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable files fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| AuditError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            output_dir: "/tmp/audit".to_string(),
            output_format: OutputFormat::Json,
            jobs: 4,
            keep_unreconciled: true,
            institutions: vec!["rbc".into(), "td".into()],
        };
        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.output_dir, "/tmp/audit");
        assert_eq!(loaded.output_format, OutputFormat::Json);
        assert_eq!(loaded.jobs, 4);
        assert!(loaded.keep_unreconciled);
        assert_eq!(loaded.institutions, vec!["rbc", "td"]);
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(s.output_format, OutputFormat::Csv);
        assert_eq!(s.jobs, 0);
        assert!(!s.keep_unreconciled);
        assert_eq!(s.institutions, vec!["rbc"]);
        assert!(!s.output_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"output_format": "json", "jobs": 2}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.output_format, OutputFormat::Json);
        assert_eq!(s.jobs, 2);
        assert_eq!(s.institutions, vec!["rbc"]);
    }

    #[test]
    fn test_save_creates_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("settings.json");
        save_settings_to(&Settings::default(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_shellexpand_leaves_plain_paths() {
        assert_eq!(shellexpand_path("/var/data"), "/var/data");
    }
}
