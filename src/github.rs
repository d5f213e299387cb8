//! GitHub API Client
//!
//! Module for managing interactions with the GitHub API

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{github_status, Error, Result};
use crate::label::Label;
use crate::target::RepositoryName;

/// Page size used for every paginated listing
const PER_PAGE: u8 = 100;

/// Label operations against one hosting service
#[async_trait]
pub trait LabelService: Send + Sync {
    /// List every label of a repository
    async fn list_labels(&self, repo: &RepositoryName) -> Result<Vec<Label>>;

    /// Create a label
    async fn create_label(&self, repo: &RepositoryName, label: &Label) -> Result<()>;

    /// Edit the label with the same (case-insensitive) name
    async fn update_label(&self, repo: &RepositoryName, label: &Label) -> Result<()>;

    /// Delete a label by name
    async fn delete_label(&self, repo: &RepositoryName, name: &str) -> Result<()>;
}

/// Repository listings used to expand users and organizations
#[async_trait]
pub trait RepositoryCatalog: Send + Sync {
    /// Repositories owned by a user, sorted by full name
    async fn list_user_repositories(&self, user: &str) -> Result<Vec<RepositoryName>>;

    /// Repositories of an organization, sorted by full name
    async fn list_org_repositories(&self, org: &str) -> Result<Vec<RepositoryName>>;
}

/// Encode a string for use in URL path segments (RFC 3986 with UTF-8 support)
///
/// This function properly encodes UTF-8 characters including Japanese text.
/// Only unreserved characters (A-Z, a-z, 0-9, -, ., _, ~) are left unencoded.
///
/// # Arguments
/// - `input`: The string to encode
///
/// # Returns
/// URL-encoded string safe for use in path segments
fn encode_path_segment(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            // RFC 3986 unreserved characters
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~' => c.to_string(),
            // Everything else gets percent-encoded as UTF-8 bytes
            _ => c
                .to_string()
                .bytes()
                .map(|b| format!("%{:02X}", b))
                .collect::<String>(),
        })
        .collect()
}

/// Body of the "update a label" endpoint
#[derive(Debug, Serialize)]
struct UpdateLabelRequest<'a> {
    new_name: &'a str,
    color: &'a str,
    description: &'a str,
}

/// Query of the user/organization repository listing endpoints
#[derive(Debug, Serialize)]
struct RepositoryListQuery {
    sort: &'static str,
    per_page: u8,
    page: u32,
}

/// The part of a repository listing entry we need
#[derive(Debug, Deserialize)]
struct RepositorySummary {
    full_name: String,
}

/// GitHub API Client
///
/// Client responsible for interactions with the GitHub API
pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    /// Connect to GitHub and verify the token
    ///
    /// # Arguments
    /// - `access_token`: GitHub access token
    /// - `api_url`: API base URL for GitHub Enterprise (github.com when None)
    ///
    /// # Errors
    /// Returns an error if client initialization fails or the token is rejected
    pub async fn connect(access_token: &str, api_url: Option<&Url>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(access_token.to_string());
        if let Some(api_url) = api_url {
            builder = builder.base_uri(api_url.as_str())?;
        }
        let octocrab = builder.build()?;

        // Authentication test
        let _user = octocrab
            .current()
            .user()
            .await
            .map_err(|_| Error::AuthenticationFailed)?;

        Ok(Self { octocrab })
    }

    /// Wrap an already configured octocrab instance
    pub fn from_octocrab(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }

    /// Get rate limit information
    ///
    /// # Returns
    /// Rate limit status
    pub async fn rate_limit(&self) -> Result<RateLimitInfo> {
        let rate_limit = self.octocrab.ratelimit().get().await?;

        Ok(RateLimitInfo {
            limit: rate_limit.resources.core.limit as u32,
            remaining: rate_limit.resources.core.remaining as u32,
            reset_at: chrono::DateTime::from_timestamp(rate_limit.resources.core.reset as i64, 0)
                .unwrap_or_else(chrono::Utc::now),
        })
    }

    /// Page through a repository listing endpoint
    async fn list_repositories(&self, route: &str) -> Result<Vec<RepositoryName>> {
        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let query = RepositoryListQuery {
                sort: "full_name",
                per_page: PER_PAGE,
                page,
            };
            let items: Vec<RepositorySummary> = self.octocrab.get(route, Some(&query)).await?;
            let count = items.len();

            for item in items {
                repositories.push(item.full_name.parse()?);
            }

            if count < PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        debug!(route, count = repositories.len(), "Listed repositories");
        Ok(repositories)
    }
}

#[async_trait]
impl LabelService for GitHubClient {
    #[instrument(skip(self), fields(repository = %repo))]
    async fn list_labels(&self, repo: &RepositoryName) -> Result<Vec<Label>> {
        let mut labels = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .octocrab
                .issues(&repo.owner, &repo.name)
                .list_labels_for_repo()
                .page(page)
                .per_page(PER_PAGE)
                .send()
                .await
                .map_err(|e| match github_status(&e) {
                    Some(404) => Error::RepositoryNotFound(repo.to_string()),
                    _ => Error::GitHubApi(e),
                })?;

            let count = response.items.len();
            for label in response.items {
                labels.push(Label::new(
                    label.name,
                    label.color,
                    label.description.unwrap_or_default(),
                ));
            }

            if count < PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        debug!(count = labels.len(), "Fetched labels");
        Ok(labels)
    }

    #[instrument(skip(self, label), fields(repository = %repo, label = %label.name))]
    async fn create_label(&self, repo: &RepositoryName, label: &Label) -> Result<()> {
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .create_label(&label.name, &label.hex_color(), &label.description)
            .await?;

        Ok(())
    }

    #[instrument(skip(self, label), fields(repository = %repo, label = %label.name))]
    async fn update_label(&self, repo: &RepositoryName, label: &Label) -> Result<()> {
        // PATCH keeps the label attached to its issues, unlike delete + create
        let route = format!(
            "/repos/{}/{}/labels/{}",
            repo.owner,
            repo.name,
            encode_path_segment(&label.name)
        );
        let color = label.hex_color();
        let body = UpdateLabelRequest {
            new_name: &label.name,
            color: &color,
            description: &label.description,
        };

        let _updated: octocrab::models::Label = self.octocrab.patch(route, Some(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repository = %repo))]
    async fn delete_label(&self, repo: &RepositoryName, name: &str) -> Result<()> {
        // URL encode the label name to handle spaces, special characters, and UTF-8 (Japanese, etc.)
        let encoded_name = encode_path_segment(name);
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .delete_label(&encoded_name)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl RepositoryCatalog for GitHubClient {
    #[instrument(skip(self))]
    async fn list_user_repositories(&self, user: &str) -> Result<Vec<RepositoryName>> {
        self.list_repositories(&format!("/users/{}/repos", encode_path_segment(user)))
            .await
    }

    #[instrument(skip(self))]
    async fn list_org_repositories(&self, org: &str) -> Result<Vec<RepositoryName>> {
        self.list_repositories(&format!("/orgs/{}/repos", encode_path_segment(org)))
            .await
    }
}

/// Rate Limit Information
///
/// Represents GitHub API rate limit status
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Hourly limit
    pub limit: u32,

    /// Remaining usage count
    pub remaining: u32,

    /// Reset time
    pub reset_at: chrono::DateTime<chrono::Utc>,
}
