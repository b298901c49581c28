//! Splitting uploads into Location and DC groups by filename

use crate::upload::UploadedFile;
use serde::{Deserialize, Serialize};

/// The two merge groups an upload can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Location,
    Dc,
}

impl GroupKind {
    /// All groups, in the order they are merged and presented
    pub const ALL: [GroupKind; 2] = [GroupKind::Location, GroupKind::Dc];

    /// Human-readable group label
    pub fn label(&self) -> &'static str {
        match self {
            GroupKind::Location => "Location On Hand",
            GroupKind::Dc => "DC On Hand",
        }
    }

    /// Lowercase substring a filename must contain to join this group
    pub fn pattern(&self) -> &'static str {
        match self {
            GroupKind::Location => "location",
            GroupKind::Dc => "dc",
        }
    }

    /// File name the merged table is written to
    pub fn output_file_name(&self) -> &'static str {
        match self {
            GroupKind::Location => "Location_On_Hand_Merged.csv",
            GroupKind::Dc => "DC_On_Hand_Merged.csv",
        }
    }

    /// Case-insensitive filename test for this group
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.to_lowercase().contains(self.pattern())
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Uploads partitioned by group, each list in upload order
#[derive(Debug, Clone, Default)]
pub struct Classification<'a> {
    pub location: Vec<&'a UploadedFile>,
    pub dc: Vec<&'a UploadedFile>,
    /// Uploads matching neither group; these are ignored, not errors
    pub unmatched: Vec<&'a UploadedFile>,
}

impl<'a> Classification<'a> {
    /// Members of one group
    pub fn group(&self, kind: GroupKind) -> &[&'a UploadedFile] {
        match kind {
            GroupKind::Location => &self.location,
            GroupKind::Dc => &self.dc,
        }
    }

    /// Names of the ignored uploads
    pub fn unmatched_names(&self) -> Vec<&'a str> {
        self.unmatched.iter().map(|f| f.name()).collect()
    }
}

/// Partition uploads into Location, DC and unmatched groups.
///
/// Membership is tested independently per group, so a name containing both
/// "location" and "dc" (e.g. `dc_location_totals.csv`) lands in both groups
/// and is merged into both outputs.
pub fn classify(files: &[UploadedFile]) -> Classification<'_> {
    let mut classification = Classification::default();

    for file in files {
        let in_location = GroupKind::Location.matches(file.name());
        let in_dc = GroupKind::Dc.matches(file.name());

        if in_location {
            classification.location.push(file);
        }
        if in_dc {
            classification.dc.push(file);
        }
        if !in_location && !in_dc {
            classification.unmatched.push(file);
        }
    }

    tracing::debug!(
        location = classification.location.len(),
        dc = classification.dc.len(),
        unmatched = classification.unmatched.len(),
        "classified uploads"
    );

    classification
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploads(names: &[&str]) -> Vec<UploadedFile> {
        names
            .iter()
            .map(|n| UploadedFile::new(*n, b"id\n1\n".to_vec()))
            .collect()
    }

    fn names<'a>(files: &[&'a UploadedFile]) -> Vec<&'a str> {
        files.iter().map(|f| f.name()).collect()
    }

    #[test]
    fn test_classify_case_insensitive() {
        let files = uploads(&["location_A.csv", "LOCATION_B.csv", "Dc_Main.csv"]);
        let c = classify(&files);

        assert_eq!(names(&c.location), vec!["location_A.csv", "LOCATION_B.csv"]);
        assert_eq!(names(&c.dc), vec!["Dc_Main.csv"]);
        assert!(c.unmatched.is_empty());
    }

    #[test]
    fn test_classify_both_groups() {
        let files = uploads(&["DC_Location_Totals.csv"]);
        let c = classify(&files);

        assert_eq!(names(&c.location), vec!["DC_Location_Totals.csv"]);
        assert_eq!(names(&c.dc), vec!["DC_Location_Totals.csv"]);
        assert!(c.unmatched.is_empty());
    }

    #[test]
    fn test_classify_neither_group() {
        let files = uploads(&["inventory.csv", "location_1.csv", "summary.csv"]);
        let c = classify(&files);

        assert_eq!(c.unmatched_names(), vec!["inventory.csv", "summary.csv"]);
        assert_eq!(names(&c.location), vec!["location_1.csv"]);
        assert!(c.dc.is_empty());
    }

    #[test]
    fn test_classify_substring_anywhere() {
        // "dc" matches inside other words too
        let files = uploads(&["hdcount.csv", "relocations.csv"]);
        let c = classify(&files);

        assert_eq!(names(&c.dc), vec!["hdcount.csv"]);
        assert_eq!(names(&c.location), vec!["relocations.csv"]);
    }

    #[test]
    fn test_location_membership_independent_of_dc() {
        let files = uploads(&["a_location.csv", "b_dc.csv", "c_dc_location.csv", "d.csv"]);
        let c = classify(&files);

        for file in &files {
            let expected = file.name().to_lowercase().contains("location");
            let actual = c.location.iter().any(|f| f.name() == file.name());
            assert_eq!(expected, actual, "{}", file.name());
        }
    }

    #[test]
    fn test_classify_empty() {
        let c = classify(&[]);
        assert!(c.location.is_empty());
        assert!(c.dc.is_empty());
        assert!(c.unmatched.is_empty());
    }

    #[test]
    fn test_group_accessor_and_labels() {
        let files = uploads(&["dc_1.csv"]);
        let c = classify(&files);

        assert_eq!(c.group(GroupKind::Dc).len(), 1);
        assert!(c.group(GroupKind::Location).is_empty());
        assert_eq!(GroupKind::Location.label(), "Location On Hand");
        assert_eq!(GroupKind::Dc.output_file_name(), "DC_On_Hand_Merged.csv");
    }
}
