//! Label Synchronization Functionality
//!
//! Applies a reconciliation plan to a repository, one label at a time

use tracing::{info, warn};

use crate::github::LabelService;
use crate::label::Label;
use crate::reconcile::{reconcile, ReconciliationPlan};
use crate::target::RepositoryName;

/// Types of label synchronization operations
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOperation {
    /// Create a label
    Create { label: Label },

    /// Delete a label
    Delete { label: Label },

    /// Update a label
    Update { label: Label },
}

impl SyncOperation {
    /// The label this operation is about
    pub fn label(&self) -> &Label {
        match self {
            SyncOperation::Create { label }
            | SyncOperation::Delete { label }
            | SyncOperation::Update { label } => label,
        }
    }
}

/// What happened to a single operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    /// Performed against the repository
    Applied,

    /// Skipped because of dry-run mode
    DryRun,

    /// Rejected by the repository
    Failed(String),
}

/// Outcome of one planned operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub operation: SyncOperation,
    pub status: OperationStatus,
}

/// Synchronization result for one repository
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Repository the result belongs to
    pub repository: RepositoryName,

    /// Whether this is a dry run
    pub dry_run: bool,

    /// Outcomes in execution order (creates, then deletes, then updates)
    pub outcomes: Vec<OperationOutcome>,

    /// Why the repository's labels could not be fetched, if they could not
    pub fetch_error: Option<String>,
}

impl SyncResult {
    /// Create a new empty synchronization result
    pub fn new(repository: RepositoryName, dry_run: bool) -> Self {
        Self {
            repository,
            dry_run,
            outcomes: Vec::new(),
            fetch_error: None,
        }
    }

    fn count(&self, is_kind: impl Fn(&SyncOperation) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| is_kind(&o.operation) && !matches!(o.status, OperationStatus::Failed(_)))
            .count()
    }

    /// Number of labels created (or that would be, in dry-run mode)
    pub fn created(&self) -> usize {
        self.count(|op| matches!(op, SyncOperation::Create { .. }))
    }

    /// Number of labels updated (or that would be, in dry-run mode)
    pub fn updated(&self) -> usize {
        self.count(|op| matches!(op, SyncOperation::Update { .. }))
    }

    /// Number of labels deleted (or that would be, in dry-run mode)
    pub fn deleted(&self) -> usize {
        self.count(|op| matches!(op, SyncOperation::Delete { .. }))
    }

    /// Number of operations rejected by the repository
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OperationStatus::Failed(_)))
            .count()
    }

    /// Whether any change was planned
    pub fn has_changes(&self) -> bool {
        !self.outcomes.is_empty()
    }

    /// Every failure, including a failed label fetch
    pub fn errors(&self) -> Vec<String> {
        let mut errors: Vec<String> = self.fetch_error.iter().cloned().collect();
        errors.extend(self.outcomes.iter().filter_map(|o| match &o.status {
            OperationStatus::Failed(reason) => Some(format!(
                "Failed to {} label '{}': {}",
                verb(&o.operation),
                o.operation.label().name,
                reason
            )),
            _ => None,
        }));
        errors
    }
}

fn verb(operation: &SyncOperation) -> &'static str {
    match operation {
        SyncOperation::Create { .. } => "create",
        SyncOperation::Delete { .. } => "delete",
        SyncOperation::Update { .. } => "update",
    }
}

/// Label Synchronization Engine
///
/// Brings repositories in line with the desired labels through a [`LabelService`]
pub struct LabelSyncer<'a, S: LabelService + ?Sized> {
    service: &'a S,
    dry_run: bool,
}

impl<'a, S: LabelService + ?Sized> LabelSyncer<'a, S> {
    /// Create a new label synchronization engine
    ///
    /// # Arguments
    /// - `service`: Label operations of the hosting service
    /// - `dry_run`: Report operations without performing them
    pub fn new(service: &'a S, dry_run: bool) -> Self {
        Self { service, dry_run }
    }

    /// Fetch, reconcile and apply for one repository
    ///
    /// A failed fetch is recorded in the result; nothing is applied in that case.
    pub async fn sync_repository(&self, repo: &RepositoryName, desired: &[Label]) -> SyncResult {
        let observed = match self.service.list_labels(repo).await {
            Ok(labels) => labels,
            Err(e) => {
                warn!(repository = %repo, error = %e, "Failed to retrieve labels");
                let mut result = SyncResult::new(repo.clone(), self.dry_run);
                result.fetch_error = Some(format!("Failed to retrieve labels from {repo}: {e}"));
                return result;
            }
        };

        let plan = reconcile(desired, &observed);
        info!(
            repository = %repo,
            add = plan.to_add.len(),
            delete = plan.to_delete.len(),
            update = plan.to_update.len(),
            "Planned label changes"
        );

        self.apply_plan(repo, &plan).await
    }

    /// Apply a plan: creates, then deletes, then updates
    ///
    /// Each operation is attempted once and independently; a failure is recorded
    /// and the remaining operations still run.
    pub async fn apply_plan(&self, repo: &RepositoryName, plan: &ReconciliationPlan) -> SyncResult {
        let mut result = SyncResult::new(repo.clone(), self.dry_run);

        let operations = plan
            .to_add
            .iter()
            .map(|label| SyncOperation::Create { label: label.clone() })
            .chain(plan.to_delete.iter().map(|label| SyncOperation::Delete { label: label.clone() }))
            .chain(plan.to_update.iter().map(|label| SyncOperation::Update { label: label.clone() }));

        for operation in operations {
            let status = self.execute_operation(repo, &operation).await;
            result.outcomes.push(OperationOutcome { operation, status });
        }

        result
    }

    /// Execute an operation
    async fn execute_operation(
        &self,
        repo: &RepositoryName,
        operation: &SyncOperation,
    ) -> OperationStatus {
        let label = operation.label();

        if self.dry_run {
            info!(repository = %repo, label = %label.name, action = verb(operation), "Dry run");
            return OperationStatus::DryRun;
        }

        let outcome = match operation {
            SyncOperation::Create { label } => self.service.create_label(repo, label).await,
            SyncOperation::Delete { label } => self.service.delete_label(repo, &label.name).await,
            SyncOperation::Update { label } => self.service.update_label(repo, label).await,
        };

        match outcome {
            Ok(()) => {
                info!(repository = %repo, label = %label.name, action = verb(operation), "Applied");
                OperationStatus::Applied
            }
            Err(e) => {
                warn!(
                    repository = %repo,
                    label = %label.name,
                    action = verb(operation),
                    error = %e,
                    "Operation failed"
                );
                OperationStatus::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::{Error, Result};

    /// In-memory label store for a single repository
    #[derive(Default)]
    struct MemoryLabelService {
        labels: Mutex<Vec<Label>>,
        calls: Mutex<Vec<String>>,
        reject: HashSet<String>,
        unreachable: bool,
    }

    impl MemoryLabelService {
        fn with_labels(labels: Vec<Label>) -> Self {
            Self {
                labels: Mutex::new(labels),
                ..Default::default()
            }
        }

        fn rejecting(mut self, name: &str) -> Self {
            self.reject.insert(name.to_lowercase());
            self
        }

        fn check(&self, call: String, name: &str) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.reject.contains(&name.to_lowercase()) {
                return Err(Error::config_validation(format!("rejected {name}")));
            }
            Ok(())
        }

        fn labels(&self) -> Vec<Label> {
            self.labels.lock().unwrap().clone()
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LabelService for MemoryLabelService {
        async fn list_labels(&self, repo: &RepositoryName) -> Result<Vec<Label>> {
            if self.unreachable {
                return Err(Error::RepositoryNotFound(repo.to_string()));
            }
            Ok(self.labels())
        }

        async fn create_label(&self, _repo: &RepositoryName, label: &Label) -> Result<()> {
            self.check(format!("create {}", label.name), &label.name)?;
            self.labels.lock().unwrap().push(label.clone());
            Ok(())
        }

        async fn update_label(&self, _repo: &RepositoryName, label: &Label) -> Result<()> {
            self.check(format!("update {}", label.name), &label.name)?;
            let mut labels = self.labels.lock().unwrap();
            let existing = labels
                .iter_mut()
                .find(|l| l.key() == label.key())
                .ok_or_else(|| Error::config_validation("missing"))?;
            *existing = label.clone();
            Ok(())
        }

        async fn delete_label(&self, _repo: &RepositoryName, name: &str) -> Result<()> {
            self.check(format!("delete {name}"), name)?;
            self.labels
                .lock()
                .unwrap()
                .retain(|l| l.key() != name.to_lowercase());
            Ok(())
        }
    }

    fn repo() -> RepositoryName {
        RepositoryName::new("octo", "repo")
    }

    fn desired() -> Vec<Label> {
        vec![
            Label::new("Bug", "ff0000", "Broken"),
            Label::new("docs", "0075ca", ""),
            Label::new("triage", "fbca04", ""),
        ]
    }

    fn observed() -> Vec<Label> {
        vec![
            Label::new("bug", "d73a4a", "Something isn't working"),
            Label::new("docs", "0075ca", ""),
            Label::new("invalid", "e4e669", ""),
        ]
    }

    #[tokio::test]
    async fn test_sync_applies_groups_in_order() {
        let service = MemoryLabelService::with_labels(observed());
        let syncer = LabelSyncer::new(&service, false);

        let result = syncer.sync_repository(&repo(), &desired()).await;

        assert_eq!(
            service.calls(),
            vec!["create triage", "delete invalid", "update Bug"]
        );
        assert_eq!(result.created(), 1);
        assert_eq!(result.deleted(), 1);
        assert_eq!(result.updated(), 1);
        assert_eq!(result.failed(), 0);
        assert!(result.errors().is_empty());
        assert!(result
            .outcomes
            .iter()
            .all(|o| o.status == OperationStatus::Applied));
    }

    #[tokio::test]
    async fn test_second_sync_is_a_no_op() {
        let service = MemoryLabelService::with_labels(observed());
        let syncer = LabelSyncer::new(&service, false);

        syncer.sync_repository(&repo(), &desired()).await;
        let second = syncer.sync_repository(&repo(), &desired()).await;

        assert!(!second.has_changes());
        assert_eq!(service.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_calls() {
        let service = MemoryLabelService::with_labels(observed());
        let syncer = LabelSyncer::new(&service, true);

        let result = syncer.sync_repository(&repo(), &desired()).await;

        assert!(service.calls().is_empty());
        assert_eq!(service.labels(), observed());
        assert!(result.dry_run);
        assert_eq!(result.outcomes.len(), 3);
        assert!(result
            .outcomes
            .iter()
            .all(|o| o.status == OperationStatus::DryRun));
        assert_eq!(result.created() + result.deleted() + result.updated(), 3);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let service = MemoryLabelService::with_labels(observed()).rejecting("triage");
        let syncer = LabelSyncer::new(&service, false);

        let result = syncer.sync_repository(&repo(), &desired()).await;

        assert_eq!(
            service.calls(),
            vec!["create triage", "delete invalid", "update Bug"]
        );
        assert_eq!(result.failed(), 1);
        assert_eq!(result.created(), 0);
        assert_eq!(result.deleted(), 1);
        assert_eq!(result.updated(), 1);

        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to create label 'triage'"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_recorded() {
        let service = MemoryLabelService {
            unreachable: true,
            ..Default::default()
        };
        let syncer = LabelSyncer::new(&service, false);

        let result = syncer.sync_repository(&repo(), &desired()).await;

        assert!(service.calls().is_empty());
        assert!(!result.has_changes());
        assert_eq!(result.errors().len(), 1);
        assert!(result.fetch_error.unwrap().contains("octo/repo"));
    }

    #[tokio::test]
    async fn test_apply_empty_plan() {
        let service = MemoryLabelService::default();
        let syncer = LabelSyncer::new(&service, false);

        let result = syncer.apply_plan(&repo(), &ReconciliationPlan::default()).await;

        assert!(!result.has_changes());
        assert_eq!(result.repository, repo());
    }
}
