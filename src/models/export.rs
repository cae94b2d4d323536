use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Snippet;

/// Export format, picked from the target file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ExportFormat::Yaml
            }
            _ => ExportFormat::Json,
        }
    }
}

/// Export file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub snippets: Vec<Snippet>,
}

impl ExportData {
    pub fn new(snippets: &[Snippet]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            snippets: snippets.to_vec(),
        }
    }
}

/// Either a full export or a bare copy of the storage slot
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportDocument {
    Export(ExportData),
    Collection(Vec<Snippet>),
}

/// Export snippets to a file
pub fn export_snippets(snippets: &[Snippet], path: &Path) -> Result<()> {
    let export_data = ExportData::new(snippets);

    let content = match ExportFormat::from_path(path) {
        ExportFormat::Json => serde_json::to_string_pretty(&export_data)
            .context("Failed to serialize snippets to JSON")?,
        ExportFormat::Yaml => {
            serde_yaml::to_string(&export_data).context("Failed to serialize snippets to YAML")?
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create export directory")?;
    }
    fs::write(path, content).context("Failed to write export file")
}

/// Import snippets from a file
pub fn import_snippets(path: &Path) -> Result<Vec<Snippet>> {
    let contents = fs::read_to_string(path).context("Failed to read import file")?;

    let document: ImportDocument = match ExportFormat::from_path(path) {
        ExportFormat::Yaml => {
            serde_yaml::from_str(&contents).context("Failed to parse YAML import file")?
        }
        ExportFormat::Json => {
            serde_json::from_str(&contents).context("Failed to parse JSON import file")?
        }
    };

    Ok(match document {
        ImportDocument::Export(data) => data.snippets,
        ImportDocument::Collection(snippets) => snippets,
    })
}
