//! Set difference between current and desired state.
//!
//! Pure: no store access, no logging. Inputs may contain duplicates; the
//! output never does and keeps first-seen order so that mutations are
//! applied in the order the caller listed them.

use std::hash::Hash;

use indexmap::IndexSet;

use crate::claim::Claim;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta<T> {
    /// desired - current
    pub to_add: Vec<T>,
    /// current - desired
    pub to_remove: Vec<T>,
}

impl<T> Delta<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

impl<T> Default for Delta<T> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_remove: Vec::new(),
        }
    }
}

/// Exact-equality set difference in both directions.
pub fn diff<T>(current: &[T], desired: &[T]) -> Delta<T>
where
    T: Eq + Hash + Clone,
{
    let current: IndexSet<&T> = current.iter().collect();
    let desired: IndexSet<&T> = desired.iter().collect();

    Delta {
        to_add: desired.difference(&current).map(|t| (*t).clone()).collect(),
        to_remove: current.difference(&desired).map(|t| (*t).clone()).collect(),
    }
}

/// Claims to add and remove. A changed value is one removal plus one addition.
pub fn reconcile_claims(current: &[Claim], desired: &[Claim]) -> Delta<Claim> {
    diff(current, desired)
}

/// Roles to grant (`to_add`) and revoke (`to_remove`), by name.
pub fn reconcile_roles(current: &[String], desired: &[String]) -> Delta<String> {
    diff(current, desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn claims(pairs: &[(&str, &str)]) -> Vec<Claim> {
        pairs.iter().map(|(t, v)| Claim::new(*t, *v)).collect()
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_adds_missing_claim_only() {
        let current = claims(&[("Name", "Alice")]);
        let desired = claims(&[("Name", "Alice"), ("Dept", "Eng")]);
        let delta = reconcile_claims(&current, &desired);
        assert_eq!(delta.to_add, claims(&[("Dept", "Eng")]));
        assert!(delta.to_remove.is_empty());
    }

    #[test]
    fn test_role_swap() {
        let delta = reconcile_roles(&roles(&["Admin", "Viewer"]), &roles(&["Viewer", "Editor"]));
        assert_eq!(delta.to_add, roles(&["Editor"]));
        assert_eq!(delta.to_remove, roles(&["Admin"]));
    }

    #[test]
    fn test_changed_value_is_remove_plus_add() {
        let delta = reconcile_claims(&claims(&[("Dept", "Eng")]), &claims(&[("Dept", "Ops")]));
        assert_eq!(delta.to_add, claims(&[("Dept", "Ops")]));
        assert_eq!(delta.to_remove, claims(&[("Dept", "Eng")]));
    }

    #[test]
    fn test_equality_is_exact() {
        let delta = reconcile_claims(&claims(&[("Dept", "eng")]), &claims(&[("Dept", "Eng")]));
        assert_eq!(delta.len(), 2);
    }

    #[test]
    fn test_idempotent() {
        let d = claims(&[("a", "1"), ("b", "2"), ("b", "3")]);
        assert!(reconcile_claims(&d, &d).is_empty());
        assert!(reconcile_roles(&[], &[]).is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let delta = reconcile_roles(&roles(&["A", "A"]), &roles(&["B", "B", "C"]));
        assert_eq!(delta.to_add, roles(&["B", "C"]));
        assert_eq!(delta.to_remove, roles(&["A"]));
    }

    #[test]
    fn test_applying_delta_reaches_desired() {
        let cases: Vec<(Vec<Claim>, Vec<Claim>)> = vec![
            (vec![], vec![]),
            (vec![], claims(&[("a", "1")])),
            (claims(&[("a", "1")]), vec![]),
            (claims(&[("a", "1"), ("b", "2")]), claims(&[("b", "2"), ("c", "3")])),
            (claims(&[("a", "1"), ("a", "2")]), claims(&[("a", "2"), ("a", "3"), ("a", "1")])),
            (claims(&[("x", "1"), ("y", "1"), ("z", "1")]), claims(&[("x", "2"), ("y", "2")])),
        ];

        for (current, desired) in cases {
            let delta = reconcile_claims(&current, &desired);
            let c: HashSet<Claim> = current.iter().cloned().collect();
            let d: HashSet<Claim> = desired.iter().cloned().collect();
            let add: HashSet<Claim> = delta.to_add.iter().cloned().collect();
            let remove: HashSet<Claim> = delta.to_remove.iter().cloned().collect();

            assert_eq!(add, d.difference(&c).cloned().collect::<HashSet<_>>());
            assert_eq!(remove, c.difference(&d).cloned().collect::<HashSet<_>>());

            let reached: HashSet<Claim> = c.difference(&remove).cloned().chain(add.iter().cloned()).collect();
            assert_eq!(reached, d);
            assert!(add.is_disjoint(&c));
            assert!(remove.is_subset(&c));
        }
    }

    #[test]
    fn test_order_follows_input() {
        let delta = reconcile_roles(&[], &roles(&["Zeta", "Alpha", "Mid"]));
        assert_eq!(delta.to_add, roles(&["Zeta", "Alpha", "Mid"]));
    }
}
