//! Running a whole upload batch: classify, then merge each group in turn

use crate::classifier::{classify, GroupKind};
use crate::error::Error;
use crate::merger::{merge_group, MergedTable};
use crate::upload::UploadedFile;

/// What happens to the remaining groups after one fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HaltPolicy {
    /// Skip every group after the first failure
    #[default]
    StopOnFirstError,
    /// Merge every group regardless of earlier failures
    Independent,
}

/// Terminal state of one group's merge
#[derive(Debug)]
pub enum GroupOutcome {
    /// No uploads matched this group
    Empty,
    Merged(MergedTable),
    Failed(Error),
    /// Not attempted because an earlier group failed
    Skipped,
}

impl GroupOutcome {
    pub fn merged(&self) -> Option<&MergedTable> {
        match self {
            GroupOutcome::Merged(m) => Some(m),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            GroupOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Everything a presentation layer needs after processing a batch
#[derive(Debug)]
pub struct BatchReport {
    pub location: GroupOutcome,
    pub dc: GroupOutcome,
    /// Names of uploads that matched neither group
    pub ignored: Vec<String>,
}

impl BatchReport {
    /// Outcome for one group
    pub fn outcome(&self, kind: GroupKind) -> &GroupOutcome {
        match kind {
            GroupKind::Location => &self.location,
            GroupKind::Dc => &self.dc,
        }
    }

    /// Outcomes in presentation order
    pub fn groups(&self) -> impl Iterator<Item = (GroupKind, &GroupOutcome)> {
        GroupKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.outcome(kind)))
    }

    /// First failure in presentation order
    pub fn first_error(&self) -> Option<(GroupKind, &Error)> {
        self.groups()
            .find_map(|(kind, outcome)| outcome.error().map(|e| (kind, e)))
    }

    /// True when no group failed
    pub fn is_success(&self) -> bool {
        self.first_error().is_none()
    }
}

/// Classify a batch and merge each group.
///
/// Location is merged before DC. Under `HaltPolicy::StopOnFirstError` a
/// failed Location merge leaves DC `Skipped`.
pub fn merge_batch(files: &[UploadedFile], policy: HaltPolicy) -> BatchReport {
    let classification = classify(files);
    let ignored: Vec<String> = classification
        .unmatched_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    if !ignored.is_empty() {
        tracing::warn!(files = ?ignored, "ignoring uploads that match no group");
    }

    let mut halted = false;
    let mut run = |kind: GroupKind| {
        let members = classification.group(kind);

        if halted {
            return GroupOutcome::Skipped;
        }
        if members.is_empty() {
            return GroupOutcome::Empty;
        }

        match merge_group(members, kind.label()) {
            Ok(Some(merged)) => GroupOutcome::Merged(merged),
            Ok(None) => GroupOutcome::Empty,
            Err(e) => {
                tracing::error!(group = kind.label(), error = %e, "group merge failed");
                halted = policy == HaltPolicy::StopOnFirstError;
                GroupOutcome::Failed(e)
            }
        }
    };

    let location = run(GroupKind::Location);
    let dc = run(GroupKind::Dc);

    BatchReport {
        location,
        dc,
        ignored,
    }
}
