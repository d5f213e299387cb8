//! Label Reconciliation
//!
//! Computes the changes that bring a repository's labels in line with the desired set

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::label::Label;

/// Changes required to converge observed labels to desired labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationPlan {
    /// Desired labels with no remote label of the same name
    pub to_add: Vec<Label>,

    /// Remote labels with no desired label of the same name
    pub to_delete: Vec<Label>,

    /// Desired labels whose remote counterpart differs in color, description or name casing
    pub to_update: Vec<Label>,
}

impl ReconciliationPlan {
    /// Whether nothing needs to change
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_delete.is_empty() && self.to_update.is_empty()
    }

    /// Total number of planned operations
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_delete.len() + self.to_update.len()
    }
}

/// Compare desired and observed labels
///
/// Labels identical in both sets are left alone. The remaining labels are matched
/// by case-folded name: a match is an update, an unmatched desired label is an add
/// and an unmatched observed label is a delete. Input order is preserved within
/// each group.
///
/// Both inputs are expected to be free of duplicate case-folded names
/// (see [`find_duplicate_names`]).
pub fn reconcile(desired: &[Label], observed: &[Label]) -> ReconciliationPlan {
    let desired_only: Vec<&Label> = desired.iter().filter(|d| !observed.contains(d)).collect();
    let observed_only: Vec<&Label> = observed.iter().filter(|o| !desired.contains(o)).collect();

    let observed_keys: HashSet<String> = observed_only.iter().map(|o| o.key()).collect();
    let mut matched = HashSet::new();
    let mut plan = ReconciliationPlan::default();

    for label in &desired_only {
        let key = label.key();
        if observed_keys.contains(&key) {
            plan.to_update.push((*label).clone());
            matched.insert(key);
        }
    }

    plan.to_add = desired_only
        .into_iter()
        .filter(|d| !matched.contains(&d.key()))
        .cloned()
        .collect();

    plan.to_delete = observed_only
        .into_iter()
        .filter(|o| !matched.contains(&o.key()))
        .cloned()
        .collect();

    plan
}

/// Case-folded names that appear more than once, sorted
pub fn find_duplicate_names(labels: &[Label]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label.key()).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
