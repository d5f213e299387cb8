//! Configuration Management
//!
//! Label file loading, normalization and run settings

use std::path::Path;

use jsonschema::JSONSchema;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::label::Label;
use crate::reconcile::find_duplicate_names;
use crate::target::Target;

/// Label file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    #[default]
    Json,
    Yaml,
}

/// Label entry as written in the label file
///
/// Every field is optional here; [`normalize_labels`] turns entries into [`Label`]s.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawLabel {
    /// Label name (entries without one are dropped)
    #[serde(default)]
    pub name: Option<String>,

    /// Label color (random when missing)
    #[serde(default)]
    pub color: Option<String>,

    /// Label description (empty when missing)
    #[serde(default)]
    pub description: Option<String>,
}

/// Sync Configuration
///
/// gh-label-manager execution configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// GitHub access token
    pub access_token: String,

    /// GitHub API base URL (github.com when None)
    pub api_url: Option<Url>,

    /// Repositories to reconcile
    pub target: Target,

    /// Dry-run mode (don't make actual changes)
    pub dry_run: bool,

    /// Desired labels
    pub labels: Vec<Label>,
}

impl SyncConfig {
    /// Validate configuration
    ///
    /// # Errors
    /// - If access token is empty
    /// - If two desired labels share a case-folded name
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::config_validation("Access token is required"));
        }

        let duplicates = find_duplicate_names(&self.labels);
        if !duplicates.is_empty() {
            return Err(Error::DuplicateLabels(duplicates));
        }

        Ok(())
    }
}

/// JSON Schema every label file must satisfy after parsing
fn label_file_schema() -> Value {
    let optional_string = json!({ "type": ["string", "null"] });
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "name": optional_string,
                "color": optional_string,
                "description": optional_string,
            }
        }
    })
}

/// Check parsed label file content against [`label_file_schema`]
fn check_label_file_schema(document: &Value) -> Result<()> {
    let schema = label_file_schema();
    let compiled = JSONSchema::compile(&schema)
        .map_err(|e| Error::config_validation(format!("Invalid label file schema: {e}")))?;

    let messages: Vec<String> = match compiled.validate(document) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|e| format!("{} (at '{}')", e, e.instance_path))
            .collect(),
    };

    Err(Error::config_validation(format!(
        "Label file has an unexpected structure: {}",
        messages.join("; ")
    )))
}

/// Parse label file content without normalizing it
///
/// # Errors
/// If the content is not valid JSON/YAML or is not a list of label mappings
pub fn parse_raw_labels(content: &str, format: ConfigFormat) -> Result<Vec<RawLabel>> {
    let document: Value = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };

    check_label_file_schema(&document)?;
    Ok(serde_json::from_value(document)?)
}

/// Read and parse a label file without normalizing it
///
/// # Errors
/// If file reading or parsing fails
pub fn load_raw_labels<P: AsRef<Path>>(path: P, format: ConfigFormat) -> Result<Vec<RawLabel>> {
    let path = path.as_ref();
    debug!(path = %path.display(), ?format, "Reading label file");

    let content = std::fs::read_to_string(path)?;
    parse_raw_labels(&content, format)
}

/// Load a label file and normalize its entries
///
/// # Arguments
/// - `path`: Path to the label file
/// - `format`: Parser to use
/// - `rng`: Random source for missing colors
///
/// # Errors
/// If file reading or parsing fails
pub fn load_labels<P: AsRef<Path>, R: Rng + ?Sized>(
    path: P,
    format: ConfigFormat,
    rng: &mut R,
) -> Result<Vec<Label>> {
    let raw = load_raw_labels(path, format)?;
    Ok(normalize_labels(raw, rng))
}

/// Turn raw entries into fully-populated labels
///
/// Entries without a name are dropped with a warning, a missing description
/// becomes empty and a missing color is drawn from `rng`. The result is sorted
/// by case-folded name; entries with equal keys keep their file order.
pub fn normalize_labels<R: Rng + ?Sized>(raw: Vec<RawLabel>, rng: &mut R) -> Vec<Label> {
    let mut labels: Vec<Label> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let name = match entry.name {
                Some(name) if !name.is_empty() => name,
                _ => {
                    warn!(index, "A label without a valid name was found and removed");
                    return None;
                }
            };

            let color = match entry.color {
                Some(color) if !color.is_empty() => color,
                _ => {
                    let color = random_color(rng);
                    debug!(label = %name, %color, "Assigned random color");
                    color
                }
            };

            Some(Label::new(name, color, entry.description.unwrap_or_default()))
        })
        .collect();

    labels.sort_by_key(Label::key);
    labels
}

/// Generate a random 6-digit hex color (uppercase, without #)
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:06X}", rng.gen_range(0..=0xFF_FFFFu32))
}
