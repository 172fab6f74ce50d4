//! Generic name-keyed set reconciliation.
//!
//! The add/drop/modify pattern is the same for columns, indexes and foreign
//! keys, so it is implemented once, parameterized over a key accessor and an
//! equality predicate. Output is sorted by name for deterministic change
//! lists.

use std::collections::{BTreeMap, BTreeSet};

use super::Action;

/// One reconciled entry: the transition for a single name.
pub(crate) struct Reconciled<'a, T> {
    pub name: String,
    pub action: Action,
    pub old: Option<&'a T>,
    pub new: Option<&'a T>,
}

/// Diffs two name-keyed collections.
///
/// Present only in `new` yields Add, only in `old` yields Drop, present in
/// both but unequal yields Modify; equal entries are omitted. Callers must
/// have validated name uniqueness beforehand.
pub(crate) fn reconcile_by_name<'a, T, K, E>(
    old: &'a [T],
    new: &'a [T],
    key: K,
    equal: E,
) -> Vec<Reconciled<'a, T>>
where
    K: Fn(&T) -> &str,
    E: Fn(&T, &T) -> bool,
{
    let old_by_name: BTreeMap<&str, &T> = old.iter().map(|item| (key(item), item)).collect();
    let new_by_name: BTreeMap<&str, &T> = new.iter().map(|item| (key(item), item)).collect();

    let names: BTreeSet<&str> = old_by_name
        .keys()
        .chain(new_by_name.keys())
        .copied()
        .collect();

    let mut changes = Vec::new();
    for name in names {
        let entry = match (old_by_name.get(name), new_by_name.get(name)) {
            (None, Some(new_item)) => Reconciled {
                name: name.to_string(),
                action: Action::Add,
                old: None,
                new: Some(*new_item),
            },
            (Some(old_item), None) => Reconciled {
                name: name.to_string(),
                action: Action::Drop,
                old: Some(*old_item),
                new: None,
            },
            (Some(old_item), Some(new_item)) => {
                if equal(old_item, new_item) {
                    continue;
                }
                Reconciled {
                    name: name.to_string(),
                    action: Action::Modify,
                    old: Some(*old_item),
                    new: Some(*new_item),
                }
            }
            (None, None) => unreachable!("name came from one of the two maps"),
        };
        changes.push(entry);
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Named {
        name: &'static str,
        payload: i32,
    }

    fn named(name: &'static str, payload: i32) -> Named {
        Named { name, payload }
    }

    #[test]
    fn test_add_drop_modify_partition() {
        let old = vec![named("kept", 1), named("changed", 1), named("gone", 1)];
        let new = vec![named("kept", 1), named("changed", 2), named("fresh", 1)];

        let changes = reconcile_by_name(&old, &new, |n| n.name, |a, b| a.payload == b.payload);

        let summary: Vec<(String, Action)> =
            changes.iter().map(|c| (c.name.clone(), c.action)).collect();
        assert_eq!(
            summary,
            vec![
                ("changed".to_string(), Action::Modify),
                ("fresh".to_string(), Action::Add),
                ("gone".to_string(), Action::Drop),
            ]
        );
    }

    #[test]
    fn test_equal_collections_yield_nothing() {
        let old = vec![named("a", 1), named("b", 2)];
        let new = vec![named("b", 2), named("a", 1)];
        let changes = reconcile_by_name(&old, &new, |n| n.name, |a, b| a.payload == b.payload);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_output_sorted_by_name() {
        let old: Vec<Named> = Vec::new();
        let new = vec![named("zeta", 1), named("alpha", 1), named("mid", 1)];
        let changes = reconcile_by_name(&old, &new, |n| n.name, |a, b| a.payload == b.payload);
        let names: Vec<&str> = changes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
