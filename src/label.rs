//! Label Record
//!
//! The canonical label value shared by desired (local) and observed (remote) label sets

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A fully-populated label
///
/// Two labels are the same label when name, color and description are all equal.
/// Colors are compared in canonical form (see [`canonical_color`]), so `#d73a4a`
/// and `D73A4A` are the same color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,

    /// Label color as written (hex, with or without #)
    pub color: String,

    /// Label description (empty when the label has none)
    pub description: String,
}

impl Label {
    /// Create a label
    ///
    /// # Arguments
    /// - `name`: Label name
    /// - `color`: Hex color, with or without a leading `#`
    /// - `description`: Label description
    pub fn new(
        name: impl Into<String>,
        color: impl AsRef<str>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.as_ref().to_string(),
            description: description.into(),
        }
    }

    /// Case-folded name used as the matching key
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Color in the form sent to the hosting service
    pub fn hex_color(&self) -> String {
        canonical_color(&self.color)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.hex_color() == other.hex_color()
            && self.description == other.description
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.hex_color().hash(state);
        self.description.hash(state);
    }
}

/// Normalize a color for comparison
///
/// Strips a leading `#`, uppercases, and expands the 3-digit shorthand (`abc`) to
/// 6 digits (`AABBCC`). Anything that is not hex is left otherwise untouched so
/// validation can still report it.
pub fn canonical_color(color: &str) -> String {
    let color = color.trim().trim_start_matches('#').to_ascii_uppercase();

    if color.len() == 3 && color.chars().all(|c| c.is_ascii_hexdigit()) {
        color.chars().flat_map(|c| [c, c]).collect()
    } else {
        color
    }
}
