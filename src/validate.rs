//! Label Validation
//!
//! Offline well-formedness checks for a desired label list

use std::collections::HashSet;

use crate::label::Label;
use crate::reconcile::find_duplicate_names;

/// Maximum description length accepted by GitHub, in characters
pub const MAX_DESCRIPTION_LENGTH: usize = 100;

/// Result of checking a single label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelCheck {
    /// Label name
    pub name: String,

    /// Label color as written in the label file
    pub color: String,

    /// Whether the color is 3 to 6 hex digits
    pub color_valid: bool,

    /// Description length in characters
    pub description_length: usize,

    /// Whether the description fits within [`MAX_DESCRIPTION_LENGTH`]
    pub description_valid: bool,

    /// Whether another label shares this label's case-folded name
    pub duplicate_name: bool,
}

impl LabelCheck {
    /// Whether every check passed
    pub fn is_valid(&self) -> bool {
        self.color_valid && self.description_valid && !self.duplicate_name
    }
}

/// Validation results for a label list, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub checks: Vec<LabelCheck>,
}

impl ValidationReport {
    /// Whether every label passed
    pub fn is_valid(&self) -> bool {
        self.checks.iter().all(LabelCheck::is_valid)
    }

    /// Labels with at least one failed check
    pub fn failures(&self) -> impl Iterator<Item = &LabelCheck> {
        self.checks.iter().filter(|check| !check.is_valid())
    }
}

/// Check each label independently
///
/// Never fails and never touches the input; findings are for the caller to report.
pub fn validate_labels(labels: &[Label]) -> ValidationReport {
    let duplicates: HashSet<String> = find_duplicate_names(labels).into_iter().collect();

    let checks = labels
        .iter()
        .map(|label| {
            let description_length = label.description.chars().count();
            LabelCheck {
                name: label.name.clone(),
                color: label.color.clone(),
                color_valid: is_valid_hex_color(&label.color),
                description_length,
                description_valid: description_length <= MAX_DESCRIPTION_LENGTH,
                duplicate_name: duplicates.contains(&label.key()),
            }
        })
        .collect();

    ValidationReport { checks }
}

/// Validate hex color code
///
/// # Arguments
/// - `color`: Color code (3 to 6 hex digits without #, any case)
///
/// # Returns
/// True if valid
pub fn is_valid_hex_color(color: &str) -> bool {
    (3..=6).contains(&color.len()) && color.chars().all(|c| c.is_ascii_hexdigit())
}
