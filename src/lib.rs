//! # gh-label-manager
//!
//! Keeps the labels of GitHub repositories in line with a declarative label file
//!
//! ## Features
//! - JSON and YAML label files
//! - Minimal create/update/delete plans with case-insensitive name matching
//! - Offline label validation
//! - Dry-run mode
//! - Single repository, user-wide and organization-wide runs

pub mod config;
pub mod error;
pub mod github;
pub mod label;
pub mod output;
pub mod reconcile;
pub mod sync;
pub mod target;
pub mod validate;

pub use config::{ConfigFormat, RawLabel, SyncConfig};
pub use error::{Error, Result};
pub use github::{GitHubClient, LabelService, RepositoryCatalog};
pub use label::Label;
pub use reconcile::{reconcile, ReconciliationPlan};
pub use sync::{LabelSyncer, SyncResult};
pub use target::{RepositoryName, Target};
pub use validate::{validate_labels, ValidationReport};

/// Reconcile every repository of a run, one after another
///
/// `on_result` is called as each repository finishes so progress can be shown.
///
/// # Examples
///
/// ```rust,no_run
/// use gh_label_manager::{GitHubClient, Label, RepositoryName, SyncConfig, Target};
///
/// #[tokio::main]
/// async fn main() -> gh_label_manager::Result<()> {
///     let config = SyncConfig {
///         access_token: "your_github_token".to_string(),
///         api_url: None,
///         target: Target::Repository(RepositoryName::new("owner", "repo")),
///         dry_run: true,
///         labels: vec![Label::new("bug", "d73a4a", "Something isn't working")],
///     };
///     config.validate()?;
///
///     let client = GitHubClient::connect(&config.access_token, None).await?;
///     let results = gh_label_manager::sync_repositories(&client, &config, |result| {
///         println!("{}: {} change(s)", result.repository, result.outcomes.len());
///     })
///     .await?;
///     println!("Processed {} repositories", results.len());
///     Ok(())
/// }
/// ```
///
/// # Errors
/// If the target cannot be expanded into repositories. Per-repository and
/// per-label failures are reported in the results instead.
pub async fn sync_repositories<C, F>(
    client: &C,
    config: &SyncConfig,
    mut on_result: F,
) -> Result<Vec<SyncResult>>
where
    C: LabelService + RepositoryCatalog + ?Sized,
    F: FnMut(&SyncResult),
{
    let repositories = target::resolve_repositories(client, &config.target).await?;
    let syncer = LabelSyncer::new(client, config.dry_run);

    let mut results = Vec::with_capacity(repositories.len());
    for repo in &repositories {
        let result = syncer.sync_repository(repo, &config.labels).await;
        on_result(&result);
        results.push(result);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Organization with a fixed set of repositories, one of them unreadable
    struct FakeOrg {
        labels: Mutex<HashMap<String, Vec<Label>>>,
    }

    impl FakeOrg {
        fn new() -> Self {
            let mut labels = HashMap::new();
            labels.insert("acme/api".to_string(), vec![Label::new("bug", "d73a4a", "")]);
            labels.insert("acme/web".to_string(), Vec::new());
            Self {
                labels: Mutex::new(labels),
            }
        }
    }

    #[async_trait]
    impl LabelService for FakeOrg {
        async fn list_labels(&self, repo: &RepositoryName) -> Result<Vec<Label>> {
            self.labels
                .lock()
                .unwrap()
                .get(&repo.to_string())
                .cloned()
                .ok_or_else(|| Error::RepositoryNotFound(repo.to_string()))
        }

        async fn create_label(&self, repo: &RepositoryName, label: &Label) -> Result<()> {
            if let Some(labels) = self.labels.lock().unwrap().get_mut(&repo.to_string()) {
                labels.push(label.clone());
            }
            Ok(())
        }

        async fn update_label(&self, _repo: &RepositoryName, _label: &Label) -> Result<()> {
            Ok(())
        }

        async fn delete_label(&self, _repo: &RepositoryName, _name: &str) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl RepositoryCatalog for FakeOrg {
        async fn list_user_repositories(&self, user: &str) -> Result<Vec<RepositoryName>> {
            Err(Error::RepositoryNotFound(user.to_string()))
        }

        async fn list_org_repositories(&self, org: &str) -> Result<Vec<RepositoryName>> {
            Ok(["api", "archived", "web"]
                .iter()
                .map(|name| RepositoryName::new(org, *name))
                .collect())
        }
    }

    fn config(target: Target) -> SyncConfig {
        SyncConfig {
            access_token: "token".to_string(),
            api_url: None,
            target,
            dry_run: false,
            labels: vec![Label::new("bug", "d73a4a", ""), Label::new("docs", "0075ca", "")],
        }
    }

    #[tokio::test]
    async fn test_sync_repositories_processes_each_repository_in_order() {
        let client = FakeOrg::new();
        let mut seen = Vec::new();

        let results = sync_repositories(
            &client,
            &config(Target::Organization("acme".to_string())),
            |result| seen.push(result.repository.to_string()),
        )
        .await
        .unwrap();

        assert_eq!(seen, vec!["acme/api", "acme/archived", "acme/web"]);
        assert_eq!(results[0].created(), 1);
        assert!(results[1].fetch_error.is_some());
        assert_eq!(results[2].created(), 2);
    }

    #[tokio::test]
    async fn test_sync_repositories_expansion_failure() {
        let client = FakeOrg::new();
        let result =
            sync_repositories(&client, &config(Target::User("ghost".to_string())), |_| {}).await;
        assert!(result.is_err());
    }
}
