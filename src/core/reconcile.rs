//! # Declaration diffing.
//!
//! [`reconcile`] compares the currently running task set against a freshly
//! declared one and classifies every name as added, updated, removed, or
//! unchanged. It is a pure, side-effect-free classification; the supervisor
//! applies it.
//!
//! The live side of the comparison is each worker's *applied* parameters,
//! not a cached copy of the previous declaration, so re-declaring what a
//! worker is already running is a cheap no-op.

use std::collections::{BTreeSet, HashMap};

use crate::descriptor::TaskDescriptor;

/// Classification of one declaration set against the live fleet.
///
/// The four sets partition the union of live and declared names: they are
/// pairwise disjoint and jointly exhaustive.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Reconciliation {
    /// Declared but not running: spawn a worker.
    pub added: BTreeSet<String>,
    /// Running with different parameters: stage a reload.
    pub updated: BTreeSet<String>,
    /// Running but no longer declared: request termination.
    pub removed: BTreeSet<String>,
    /// Running with identical parameters: no action.
    pub unchanged: BTreeSet<String>,
}

/// Classifies `declared` against the live fleet view.
///
/// `live` maps each running task name to the parameters its worker is
/// currently operating with.
pub(crate) fn reconcile(
    live: &HashMap<String, TaskDescriptor>,
    declared: &HashMap<String, TaskDescriptor>,
) -> Reconciliation {
    let mut plan = Reconciliation::default();

    for (name, descriptor) in declared {
        match live.get(name) {
            None => {
                plan.added.insert(name.clone());
            }
            Some(running) if running == descriptor => {
                plan.unchanged.insert(name.clone());
            }
            Some(_) => {
                plan.updated.insert(name.clone());
            }
        }
    }

    for name in live.keys() {
        if !declared.contains_key(name) {
            plan.removed.insert(name.clone());
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, interval_ms: u64, endpoint: &str, enabled: bool) -> TaskDescriptor {
        TaskDescriptor {
            name: name.to_string(),
            enabled,
            interval_ms,
            endpoint: endpoint.to_string(),
        }
    }

    fn set(entries: &[TaskDescriptor]) -> HashMap<String, TaskDescriptor> {
        entries
            .iter()
            .map(|d| (d.name.clone(), d.clone()))
            .collect()
    }

    #[test]
    fn test_all_added_against_empty_fleet() {
        let declared = set(&[
            descriptor("a", 100, "http://h/a", true),
            descriptor("b", 200, "http://h/b", false),
        ]);
        let plan = reconcile(&HashMap::new(), &declared);

        assert_eq!(plan.added.len(), 2);
        assert!(plan.updated.is_empty());
        assert!(plan.removed.is_empty());
        assert!(plan.unchanged.is_empty());
    }

    #[test]
    fn test_identical_declaration_is_unchanged() {
        let live = set(&[descriptor("a", 100, "http://h/a", true)]);
        let plan = reconcile(&live, &live.clone());

        assert!(plan.added.is_empty());
        assert!(plan.updated.is_empty());
        assert!(plan.removed.is_empty());
        assert_eq!(plan.unchanged, BTreeSet::from(["a".to_string()]));
    }

    #[test]
    fn test_field_change_is_updated() {
        let live = set(&[descriptor("a", 100, "http://h/a", true)]);

        for changed in [
            descriptor("a", 150, "http://h/a", true),
            descriptor("a", 100, "http://h/other", true),
            descriptor("a", 100, "http://h/a", false),
        ] {
            let plan = reconcile(&live, &set(&[changed]));
            assert_eq!(plan.updated, BTreeSet::from(["a".to_string()]));
            assert!(plan.added.is_empty() && plan.removed.is_empty());
        }
    }

    #[test]
    fn test_undeclared_name_is_removed() {
        let live = set(&[
            descriptor("a", 100, "http://h/a", true),
            descriptor("b", 200, "http://h/b", true),
        ]);
        let declared = set(&[descriptor("b", 200, "http://h/b", true)]);
        let plan = reconcile(&live, &declared);

        assert_eq!(plan.removed, BTreeSet::from(["a".to_string()]));
        assert_eq!(plan.unchanged, BTreeSet::from(["b".to_string()]));
    }

    #[test]
    fn test_partitions_union_of_names() {
        let live = set(&[
            descriptor("keep", 100, "http://h/keep", true),
            descriptor("change", 100, "http://h/change", true),
            descriptor("drop", 100, "http://h/drop", true),
        ]);
        let declared = set(&[
            descriptor("keep", 100, "http://h/keep", true),
            descriptor("change", 500, "http://h/change", true),
            descriptor("fresh", 100, "http://h/fresh", true),
        ]);
        let plan = reconcile(&live, &declared);

        let mut union: BTreeSet<String> = live.keys().cloned().collect();
        union.extend(declared.keys().cloned());

        let mut classified = BTreeSet::new();
        for part in [&plan.added, &plan.updated, &plan.removed, &plan.unchanged] {
            for name in part {
                // Disjointness: no name may land in two classes.
                assert!(classified.insert(name.clone()), "{name} classified twice");
            }
        }
        assert_eq!(classified, union);
    }
}
