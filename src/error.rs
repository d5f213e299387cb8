//! Error Handling
//!
//! Error type definitions used in gh-label-manager

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gh-label-manager
#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error: {}", describe_octocrab_error(.0))]
    GitHubApi(#[from] octocrab::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),

    #[error("Duplicate label names in configuration: {}", .0.join(", "))]
    DuplicateLabels(Vec<String>),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Authentication failed: invalid token")]
    AuthenticationFailed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid repository format: {0} (expected 'owner/repo')")]
    InvalidRepositoryFormat(String),
}

impl Error {
    /// Create a new configuration validation error
    pub fn config_validation<S: Into<String>>(message: S) -> Self {
        Error::ConfigValidation(message.into())
    }
}

/// HTTP status of an error response from the GitHub API
pub fn github_status(error: &octocrab::Error) -> Option<u16> {
    match error {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

/// Message for an octocrab error
///
/// API errors carry the reason GitHub gave and the HTTP status, e.g.
/// `Validation Failed (already_exists) [422 Unprocessable Entity]`.
fn describe_octocrab_error(error: &octocrab::Error) -> String {
    match error {
        octocrab::Error::GitHub { source, .. } => {
            let details: Vec<&str> = source
                .errors
                .iter()
                .flatten()
                .filter_map(|detail| {
                    detail
                        .get("message")
                        .or_else(|| detail.get("code"))
                        .and_then(|value| value.as_str())
                })
                .collect();

            if details.is_empty() {
                format!("{} [{}]", source.message, source.status_code)
            } else {
                format!(
                    "{} ({}) [{}]",
                    source.message,
                    details.join(", "),
                    source.status_code
                )
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_labels_message_lists_names() {
        let err = Error::DuplicateLabels(vec!["bug".to_string(), "docs".to_string()]);
        assert_eq!(
            err.to_string(),
            "Duplicate label names in configuration: bug, docs"
        );
    }

    #[test]
    fn test_config_validation_helper() {
        let err = Error::config_validation("bad file");
        assert!(matches!(err, Error::ConfigValidation(ref m) if m == "bad file"));
    }
}
