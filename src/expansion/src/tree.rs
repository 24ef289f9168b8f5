//! Expansion tree
//!
//! Groups a flat entry list into user → role → class → leaf, each node
//! carrying a row count. Leaves collect entries that are equivalent when
//! states are ignored; a leaf's row count is the number of distinct entries
//! it collapses, and every inner count is the sum of its children.
//!
//! The tree borrows the entries and never changes them, so the same list can
//! be grouped again under a different class ordering.

use crate::entry::{AclExpansionEntry, IgnoreStateEquivalence, IgnoreStateKey};
use aclx_core::{ClassId, DisplayLabels, RoleId, UserId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A grouping node: a key, the rows below it and its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclExpansionTreeNode<K, C> {
    key: K,
    row_count: usize,
    children: Vec<C>,
}

impl<K, C> AclExpansionTreeNode<K, C> {
    fn new(key: K, row_count: usize, children: Vec<C>) -> Self {
        Self {
            key,
            row_count,
            children,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn children(&self) -> &[C] {
        &self.children
    }
}

/// Representative entry over the distinct entries it stands for
pub type LeafNode<'e> = AclExpansionTreeNode<&'e AclExpansionEntry, &'e AclExpansionEntry>;
/// Class (`None` for stateless lists) over its leaves
pub type ClassNode<'e> = AclExpansionTreeNode<Option<&'e ClassId>, LeafNode<'e>>;
pub type RoleNode<'e> = AclExpansionTreeNode<&'e RoleId, ClassNode<'e>>;
pub type UserNode<'e> = AclExpansionTreeNode<&'e UserId, RoleNode<'e>>;

/// Grouped view over a list of expansion entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclExpansionTree<'e> {
    row_count: usize,
    users: Vec<UserNode<'e>>,
}

impl<'e> AclExpansionTree<'e> {
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn users(&self) -> &[UserNode<'e>] {
        &self.users
    }

    /// All leaves in tree order
    pub fn leaves(&self) -> impl Iterator<Item = &LeafNode<'e>> {
        self.users
            .iter()
            .flat_map(|u| u.children.iter())
            .flat_map(|r| r.children.iter())
            .flat_map(|c| c.children.iter())
    }
}

type ClassKeyFn<'l> = Box<dyn Fn(&AclExpansionEntry) -> String + 'l>;

/// Builds [`AclExpansionTree`]s
///
/// Users are ordered by display label, roles by group label then position
/// label (missing labels first), classes by the class key. By default the
/// class key is the class label, and the empty string for stateless lists.
pub struct AclExpansionTreeBuilder<'l> {
    labels: &'l dyn DisplayLabels,
    class_key: ClassKeyFn<'l>,
}

impl<'l> AclExpansionTreeBuilder<'l> {
    pub fn new(labels: &'l dyn DisplayLabels) -> Self {
        Self {
            labels,
            class_key: Box::new(move |entry: &AclExpansionEntry| default_class_key(labels, entry)),
        }
    }

    /// Replace the class ordering key
    pub fn with_class_order(mut self, key: impl Fn(&AclExpansionEntry) -> String + 'l) -> Self {
        self.class_key = Box::new(key);
        self
    }

    /// The class key an entry sorts under
    pub fn class_key(&self, entry: &AclExpansionEntry) -> String {
        (self.class_key)(entry)
    }

    pub fn build_tree<'e>(&self, entries: &'e [AclExpansionEntry]) -> AclExpansionTree<'e> {
        let by_user = group_sorted(entries.iter(), |e| {
            (self.labels.user_label(e.user()), e.user().clone())
        });

        let users: Vec<UserNode<'e>> = by_user
            .into_iter()
            .map(|members| {
                let first: &'e AclExpansionEntry = members[0];
                let user = first.user();
                let roles = self.role_nodes(members);
                AclExpansionTreeNode::new(user, sum(&roles), roles)
            })
            .collect();

        AclExpansionTree {
            row_count: sum(&users),
            users,
        }
    }

    fn role_nodes<'e>(&self, entries: Vec<&'e AclExpansionEntry>) -> Vec<RoleNode<'e>> {
        group_sorted(entries.into_iter(), |e| {
            (
                self.labels.role_group_label(e.role()),
                self.labels.role_position_label(e.role()),
                e.role().clone(),
            )
        })
        .into_iter()
        .map(|members| {
            let first: &'e AclExpansionEntry = members[0];
            let role = first.role();
            let classes = self.class_nodes(members);
            AclExpansionTreeNode::new(role, sum(&classes), classes)
        })
        .collect()
    }

    fn class_nodes<'e>(&self, entries: Vec<&'e AclExpansionEntry>) -> Vec<ClassNode<'e>> {
        group_sorted(entries.into_iter(), |e| (self.class_key(e), e.class().cloned()))
            .into_iter()
            .map(|members| {
                let first: &'e AclExpansionEntry = members[0];
                let class = first.class();
                let leaves = leaf_nodes(members);
                AclExpansionTreeNode::new(class, sum(&leaves), leaves)
            })
            .collect()
    }
}

fn default_class_key(labels: &dyn DisplayLabels, entry: &AclExpansionEntry) -> String {
    match entry.class() {
        None => String::new(),
        Some(class) => labels.class_label(class).unwrap_or_else(|| class.clone()),
    }
}

/// Group by `sort_key`, groups in key order, members in input order
fn group_sorted<'e, K: Ord>(
    entries: impl Iterator<Item = &'e AclExpansionEntry>,
    sort_key: impl Fn(&AclExpansionEntry) -> K,
) -> Vec<Vec<&'e AclExpansionEntry>> {
    let mut groups: BTreeMap<K, Vec<&'e AclExpansionEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(sort_key(entry)).or_default().push(entry);
    }
    groups.into_values().collect()
}

/// Collapse state-equivalent entries, leaves in first-occurrence order
fn leaf_nodes(entries: Vec<&AclExpansionEntry>) -> Vec<LeafNode<'_>> {
    let equivalence = IgnoreStateEquivalence;
    let mut index: HashMap<IgnoreStateKey<'_>, usize> = HashMap::new();
    let mut groups: Vec<Vec<&AclExpansionEntry>> = Vec::new();

    for entry in entries {
        let slot = *index.entry(equivalence.key(entry)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(entry);
    }

    groups
        .into_iter()
        .map(|members| {
            let mut seen = HashSet::new();
            let distinct: Vec<&AclExpansionEntry> =
                members.into_iter().filter(|e| seen.insert(*e)).collect();
            AclExpansionTreeNode::new(distinct[0], distinct.len(), distinct)
        })
        .collect()
}

fn sum<K, C>(nodes: &[AclExpansionTreeNode<K, C>]) -> usize {
    nodes.iter().map(|n| n.row_count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::AccessConditions;
    use aclx_core::TenantHierarchy;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    /// Labels derived from ids; ids starting with "x" have none
    struct Labels;

    impl DisplayLabels for Labels {
        fn user_label(&self, user: &str) -> Option<String> {
            (!user.starts_with('x')).then(|| user.to_uppercase())
        }

        fn role_group_label(&self, role: &str) -> Option<String> {
            (!role.starts_with('x')).then(|| format!("group-{role}"))
        }

        fn role_position_label(&self, role: &str) -> Option<String> {
            (!role.starts_with('x')).then(|| format!("position-{role}"))
        }

        fn class_label(&self, class: &str) -> Option<String> {
            Some(format!("Class {class}"))
        }
    }

    fn entry(user: &str, role: &str, acl: &str, class: Option<&str>, states: &[&str], allowed: &[&str]) -> AclExpansionEntry {
        AclExpansionEntry::new(
            user.into(),
            role.into(),
            acl.into(),
            class.map(Into::into),
            states.iter().map(|s| s.to_string()).collect(),
            AccessConditions::default(),
            allowed.iter().map(|a| a.to_string()).collect(),
            BTreeSet::new(),
        )
    }

    #[test]
    fn test_states_collapse_into_one_leaf() {
        let entries = vec![
            entry("u1", "r1", "acl-s1", Some("invoice"), &["s1"], &["read"]),
            entry("u1", "r1", "acl-s2", Some("invoice"), &["s2"], &["read"]),
        ];
        let tree = AclExpansionTreeBuilder::new(&Labels).build_tree(&entries);

        let leaves: Vec<_> = tree.leaves().collect();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].row_count(), 2);
        assert_eq!(leaves[0].children().len(), 2);
        assert_eq!(tree.row_count(), 2);
        assert_eq!(tree.users()[0].row_count(), 2);
    }

    #[test]
    fn test_duplicates_count_once() {
        let e = entry("u1", "r1", "acl", Some("invoice"), &["s1"], &["read"]);
        let entries = vec![e.clone(), e];
        let tree = AclExpansionTreeBuilder::new(&Labels).build_tree(&entries);

        assert_eq!(tree.row_count(), 1);
        assert_eq!(tree.leaves().next().map(|l| l.row_count()), Some(1));
    }

    #[test]
    fn test_differing_grants_stay_apart() {
        let owned = AclExpansionEntry::new(
            "u1".into(),
            "r1".into(),
            "acl-b".into(),
            Some("invoice".into()),
            Vec::new(),
            AccessConditions::builder()
                .owning_tenant("t1".into(), TenantHierarchy::THIS)
                .build()
                .unwrap(),
            ["read".to_string()].into_iter().collect(),
            BTreeSet::new(),
        );
        let entries = vec![
            entry("u1", "r1", "acl-a", Some("invoice"), &[], &["read"]),
            entry("u1", "r1", "acl-a", Some("invoice"), &[], &["read", "write"]),
            owned,
        ];
        let tree = AclExpansionTreeBuilder::new(&Labels).build_tree(&entries);

        assert_eq!(tree.leaves().count(), 3);
        assert_eq!(tree.row_count(), 3);
    }

    #[test]
    fn test_ordering() {
        let entries = vec![
            entry("u2", "r1", "acl", Some("b"), &[], &["read"]),
            entry("u1", "r2", "acl", Some("b"), &[], &["read"]),
            entry("u1", "r1", "acl", Some("b"), &[], &["read"]),
            entry("u1", "xr", "acl", Some("b"), &[], &["read"]),
            entry("u1", "r1", "acl", Some("a"), &[], &["read"]),
            entry("u1", "r1", "acl", None, &[], &["read"]),
            entry("xu", "r1", "acl", None, &[], &["read"]),
        ];
        let tree = AclExpansionTreeBuilder::new(&Labels).build_tree(&entries);

        let users: Vec<&str> = tree.users().iter().map(|u| u.key().as_str()).collect();
        assert_eq!(users, vec!["xu", "u1", "u2"]);

        let u1 = &tree.users()[1];
        let roles: Vec<&str> = u1.children().iter().map(|r| r.key().as_str()).collect();
        assert_eq!(roles, vec!["xr", "r1", "r2"]);

        let r1 = &u1.children()[1];
        let classes: Vec<Option<&str>> = r1.children().iter().map(|c| c.key().map(String::as_str)).collect();
        assert_eq!(classes, vec![None, Some("a"), Some("b")]);
    }

    #[test]
    fn test_custom_class_order() {
        let entries = vec![
            entry("u1", "r1", "acl", Some("a"), &[], &["read"]),
            entry("u1", "r1", "acl", Some("b"), &[], &["read"]),
        ];
        let builder = AclExpansionTreeBuilder::new(&Labels).with_class_order(|e| match e.class() {
            Some(c) if c == "b" => "0".to_string(),
            _ => "1".to_string(),
        });
        let tree = builder.build_tree(&entries);

        let classes: Vec<Option<&str>> = tree.users()[0].children()[0]
            .children()
            .iter()
            .map(|c| c.key().map(String::as_str))
            .collect();
        assert_eq!(classes, vec![Some("b"), Some("a")]);

        // Regrouping does not disturb the input
        let again = AclExpansionTreeBuilder::new(&Labels).build_tree(&entries);
        assert_eq!(again.row_count(), tree.row_count());
    }

    #[test]
    fn test_empty_input() {
        let tree = AclExpansionTreeBuilder::new(&Labels).build_tree(&[]);
        assert_eq!(tree.row_count(), 0);
        assert!(tree.users().is_empty());
    }

    fn arb_entries() -> impl Strategy<Value = Vec<AclExpansionEntry>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["u1", "u2", "xu"]),
                prop::sample::select(vec!["r1", "r2"]),
                prop::sample::select(vec!["acl1", "acl2"]),
                prop::option::of(prop::sample::select(vec!["invoice", "order"])),
                prop::sample::select(vec!["s1", "s2", "s3"]),
                prop::sample::subsequence(vec!["read", "write"], 1..=2),
            )
                .prop_map(|(user, role, acl, class, state, allowed)| {
                    entry(user, role, acl, class, &[state], &allowed)
                }),
            0..24,
        )
    }

    /// (user, role, class, leaf key, count) for every leaf, sorted
    fn leaf_summary(tree: &AclExpansionTree<'_>) -> Vec<String> {
        let mut rows: Vec<String> = tree
            .leaves()
            .map(|leaf| format!("{:?} {}", IgnoreStateEquivalence.key(leaf.key()), leaf.row_count()))
            .collect();
        rows.sort();
        rows
    }

    proptest! {
        #[test]
        fn prop_counts_are_sums(entries in arb_entries()) {
            let tree = AclExpansionTreeBuilder::new(&Labels).build_tree(&entries);

            prop_assert_eq!(tree.row_count(), sum(tree.users()));
            for user in tree.users() {
                prop_assert_eq!(user.row_count(), sum(user.children()));
                for role in user.children() {
                    prop_assert_eq!(role.row_count(), sum(role.children()));
                    for class in role.children() {
                        prop_assert_eq!(class.row_count(), sum(class.children()));
                        for leaf in class.children() {
                            prop_assert_eq!(leaf.row_count(), leaf.children().len());
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_grouping_ignores_input_order(
            (entries, shuffled) in arb_entries().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let builder = AclExpansionTreeBuilder::new(&Labels);
            let a = builder.build_tree(&entries);
            let b = builder.build_tree(&shuffled);
            prop_assert_eq!(leaf_summary(&a), leaf_summary(&b));
            prop_assert_eq!(a.row_count(), b.row_count());
        }

        #[test]
        fn prop_row_count_is_distinct_entries(entries in arb_entries()) {
            let tree = AclExpansionTreeBuilder::new(&Labels).build_tree(&entries);
            let distinct: HashSet<&AclExpansionEntry> = entries.iter().collect();
            prop_assert_eq!(tree.row_count(), distinct.len());
        }
    }
}
