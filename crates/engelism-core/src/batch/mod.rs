//! Batch fabrication: task planning, the work-pulling pool, and artifact output.
//!
//! A batch run cross-multiplies every camera angle with every shot scale in
//! the catalog, for one fixed lens and aspect ratio, and asks the resolved
//! provider for one protocol per combination.

mod fabricate;
mod pool;

pub use fabricate::{FabricateOptions, Fabricator};
pub use pool::{effective_concurrency, run_pool, PoolSummary, Progress, TaskOutcome};

use crate::error::{BatchError, TaskError};
use crate::library::{FabricationConfig, Library};
use std::collections::HashMap;
use std::path::PathBuf;

/// One angle/scale combination to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub angle_key: String,
    pub scale_key: String,
    /// `<angle>-<scale>-<lens>` UI labels; also the artifact name
    pub label: String,
}

/// Plan the cross product of angles and scales in catalog order.
///
/// Angles form the outer loop. Fails if the batch config names a lens the
/// catalog does not have.
pub fn plan_tasks(library: &Library, fabrication: &FabricationConfig) -> Result<Vec<Task>, BatchError> {
    let lens = library.lenses.require("lens", &fabrication.lens)?;

    let mut tasks = Vec::with_capacity(library.camera_angles.len() * library.shot_scales.len());
    for (angle_key, angle) in library.camera_angles.iter() {
        for (scale_key, scale) in library.shot_scales.iter() {
            tasks.push(Task {
                angle_key: angle_key.to_string(),
                scale_key: scale_key.to_string(),
                label: format!("{}-{}-{}", angle.ui_label, scale.ui_label, lens.ui_label),
            });
        }
    }
    Ok(tasks)
}

/// First pair of tasks that would write the same artifact, if any.
pub fn find_duplicate_label(tasks: &[Task]) -> Option<BatchError> {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        let name = artifact_file_name(&task.label);
        if let Some(&first) = seen.get(&name) {
            return Some(BatchError::DuplicateLabel {
                label: task.label.clone(),
                first,
                second: index,
            });
        }
        seen.insert(name, index);
    }
    None
}

/// File name of the artifact written for `label`.
///
/// Path separators would escape the output directory, so they become `_`.
pub fn artifact_file_name(label: &str) -> String {
    let safe: String = label
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{safe}.json")
}

/// Final state of one batch task.
#[derive(Debug)]
pub enum BatchOutcome {
    Written { label: String, path: PathBuf },
    Failed { label: String, error: TaskError },
}

impl BatchOutcome {
    pub fn label(&self) -> &str {
        match self {
            BatchOutcome::Written { label, .. } | BatchOutcome::Failed { label, .. } => label,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, BatchOutcome::Written { .. })
    }
}

/// Tally of a finished batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// One outcome per planned task, in plan order
    pub outcomes: Vec<BatchOutcome>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{Catalog, CatalogEntry};

    pub(crate) fn two_by_two_library() -> Library {
        Library {
            camera_angles: Catalog::from_entries([
                ("eye_level", CatalogEntry::new("Eye Level", "at 1.6m")),
                ("aerial", CatalogEntry::new("Aerial", "from a drone")),
            ]),
            shot_scales: Catalog::from_entries([
                ("full_shot", CatalogEntry::new("Full", "whole facade")),
                ("detail", CatalogEntry::new("Detail", "a single joint")),
            ]),
            lenses: Catalog::from_entries([("50mm_natural", CatalogEntry::new("50mm", "natural"))]),
            ..Library::default()
        }
    }

    fn fabrication(lens: &str) -> FabricationConfig {
        FabricationConfig {
            lens: lens.to_string(),
            aspect_ratio: "16:9".to_string(),
            reference_image: "ref.png".to_string(),
        }
    }

    #[test]
    fn test_plan_is_angle_major_cross_product() {
        let tasks = plan_tasks(&two_by_two_library(), &fabrication("50mm_natural")).unwrap();
        let labels: Vec<&str> = tasks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Eye Level-Full-50mm",
                "Eye Level-Detail-50mm",
                "Aerial-Full-50mm",
                "Aerial-Detail-50mm",
            ]
        );
        assert_eq!(tasks[2].angle_key, "aerial");
        assert_eq!(tasks[2].scale_key, "full_shot");
    }

    #[test]
    fn test_plan_rejects_unknown_lens() {
        let err = plan_tasks(&two_by_two_library(), &fabrication("85mm_portrait")).unwrap_err();
        assert!(matches!(err, BatchError::UnknownEntry { table: "lens", .. }));
    }

    #[test]
    fn test_plan_with_empty_axis_is_empty() {
        let mut library = two_by_two_library();
        library.shot_scales = Catalog::default();
        let tasks = plan_tasks(&library, &fabrication("50mm_natural")).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_duplicate_labels_detected() {
        let mut library = two_by_two_library();
        library.shot_scales = Catalog::from_entries([
            ("full_shot", CatalogEntry::new("Full", "")),
            ("full_shot_alt", CatalogEntry::new("Full", "")),
        ]);
        let tasks = plan_tasks(&library, &fabrication("50mm_natural")).unwrap();

        match find_duplicate_label(&tasks) {
            Some(BatchError::DuplicateLabel { label, first, second }) => {
                assert_eq!(label, "Eye Level-Full-50mm");
                assert_eq!((first, second), (0, 1));
            }
            other => panic!("expected duplicate label, got {other:?}"),
        }
    }

    #[test]
    fn test_unique_labels_pass() {
        let tasks = plan_tasks(&two_by_two_library(), &fabrication("50mm_natural")).unwrap();
        assert!(find_duplicate_label(&tasks).is_none());
    }

    #[test]
    fn test_artifact_file_name_strips_separators() {
        assert_eq!(artifact_file_name("Aerial-Full-50mm"), "Aerial-Full-50mm.json");
        assert_eq!(artifact_file_name("1/2 Shot"), "1_2 Shot.json");
    }
}
