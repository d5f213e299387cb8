//! Target Selection
//!
//! Expands the user/organization/repository argument into concrete repositories

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::error::{Error, Result};
use crate::github::RepositoryCatalog;

/// Repository identifier in `owner/repo` form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName {
    pub owner: String,
    pub name: String,
}

impl RepositoryName {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (owner, name) = parse_repository(s)?;
        Ok(Self { owner, name })
    }
}

/// Parse repository string into owner and name
///
/// # Arguments
/// - `repo`: Repository string in "owner/repo" format
///
/// # Errors
/// Returns an error if the format is invalid
pub fn parse_repository(repo: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = repo.split('/').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(Error::InvalidRepositoryFormat(repo.to_string()));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// What to reconcile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every repository owned by a user
    User(String),

    /// Every repository of an organization
    Organization(String),

    /// A single repository
    Repository(RepositoryName),
}

impl Target {
    /// Build a target from the mutually exclusive user/org/repo options
    ///
    /// Returns `Ok(None)` when none is given.
    ///
    /// # Errors
    /// If more than one option is given or the repository is not `owner/repo`
    pub fn from_options(
        user: Option<String>,
        org: Option<String>,
        repo: Option<String>,
    ) -> Result<Option<Self>> {
        match (user, org, repo) {
            (None, None, None) => Ok(None),
            (Some(user), None, None) => Ok(Some(Target::User(user))),
            (None, Some(org), None) => Ok(Some(Target::Organization(org))),
            (None, None, Some(repo)) => Ok(Some(Target::Repository(repo.parse()?))),
            _ => Err(Error::config_validation(
                "Only one of user, organization or repository may be given",
            )),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::User(user) => write!(f, "user {user}"),
            Target::Organization(org) => write!(f, "organization {org}"),
            Target::Repository(repo) => write!(f, "repository {repo}"),
        }
    }
}

/// Resolve a target into the repositories to process, sorted by full name
///
/// A single repository resolves without any remote call.
///
/// # Errors
/// If listing the user's or organization's repositories fails
pub async fn resolve_repositories<C: RepositoryCatalog + ?Sized>(
    catalog: &C,
    target: &Target,
) -> Result<Vec<RepositoryName>> {
    let repositories = match target {
        Target::Repository(repo) => return Ok(vec![repo.clone()]),
        Target::User(user) => catalog.list_user_repositories(user).await?,
        Target::Organization(org) => catalog.list_org_repositories(org).await?,
    };

    info!(%target, count = repositories.len(), "Resolved repositories");
    Ok(repositories)
}
