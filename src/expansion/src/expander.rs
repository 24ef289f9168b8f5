//! Expansion orchestration
//!
//! Wires the enumerator, the entry creator and the tree builder together
//! and owns the evaluation context for each run.
//!
//! # Pipeline
//!
//! ```text
//! users × lists → combinations → probe → evaluate → entry? → [flat | tree]
//! ```
//!
//! Sequential runs hold one context for the whole enumeration. Parallel runs
//! split the users into chunks; each chunk gets its own context and the
//! chunk results are concatenated in input order.

use crate::config::ExpanderConfig;
use crate::creator::{AclExpansionEntryCreator, EntryOutcome};
use crate::entry::AclExpansionEntry;
use crate::error::Result;
use crate::finder::{AclSource, UserRoleAclAceCombinationFinder, UserSource};
use crate::sources::{AclFinder, UserFinder};
use crate::tree::{AclExpansionTree, AclExpansionTreeBuilder};
use aclx_core::{AccessEvaluator, DisplayLabels, EvaluationContext, SecurityModel, User};
use rayon::prelude::*;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters for one expansion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    /// Combinations probed
    pub combinations: u64,

    /// Expansion entries produced
    pub entries: u64,

    /// Skipped: the probed entry did not take part in the decision
    pub not_contributing: u64,

    /// Skipped: the probed entry took part but nothing is allowed
    pub nothing_allowed: u64,
}

impl ExpansionStats {
    fn record(&mut self, outcome: &EntryOutcome) {
        self.combinations += 1;
        match outcome {
            EntryOutcome::Created(_) => self.entries += 1,
            EntryOutcome::NotContributing => self.not_contributing += 1,
            EntryOutcome::NothingAllowed => self.nothing_allowed += 1,
        }
    }

    /// Fold another run's counters into this one
    pub fn merge(&mut self, other: &ExpansionStats) {
        self.combinations += other.combinations;
        self.entries += other.entries;
        self.not_contributing += other.not_contributing;
        self.nothing_allowed += other.nothing_allowed;
    }

    pub fn skipped(&self) -> u64 {
        self.not_contributing + self.nothing_allowed
    }

    /// Share of probed combinations that produced an entry
    pub fn yield_rate(&self) -> f64 {
        if self.combinations == 0 {
            0.0
        } else {
            self.entries as f64 / self.combinations as f64
        }
    }
}

/// Expands users against access-control lists over one model
pub struct AclExpander<'m, E: AccessEvaluator + ?Sized> {
    model: &'m SecurityModel,
    config: ExpanderConfig,
    creator: AclExpansionEntryCreator<'m, E>,
}

impl<'m, E: AccessEvaluator + ?Sized> AclExpander<'m, E> {
    pub fn new(model: &'m SecurityModel, evaluator: &'m E, config: ExpanderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            config,
            creator: AclExpansionEntryCreator::new(model, evaluator),
        })
    }

    pub fn model(&self) -> &'m SecurityModel {
        self.model
    }

    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    pub fn creator(&self) -> &AclExpansionEntryCreator<'m, E> {
        &self.creator
    }

    /// Expand `users` against `acls`
    pub fn expand<U, A>(&self, users: &U, acls: &A) -> Result<Vec<AclExpansionEntry>>
    where
        U: UserSource<'m> + ?Sized,
        A: AclSource<'m> + ?Sized,
    {
        self.expand_with_stats(users, acls).map(|(entries, _)| entries)
    }

    /// Expand `users` against `acls`, counting what happened to each combination
    pub fn expand_with_stats<U, A>(&self, users: &U, acls: &A) -> Result<(Vec<AclExpansionEntry>, ExpansionStats)>
    where
        U: UserSource<'m> + ?Sized,
        A: AclSource<'m> + ?Sized,
    {
        let start = Instant::now();
        let ctx = EvaluationContext::new(self.model);
        let _guard = ctx.enter();

        let (entries, stats) = self.expand_in(&ctx, users, acls)?;
        log_summary(&stats, start);
        Ok((entries, stats))
    }

    /// Deduplicated entries in report order
    pub fn expand_sorted_distinct<U, A>(&self, users: &U, acls: &A) -> Result<Vec<AclExpansionEntry>>
    where
        U: UserSource<'m> + ?Sized,
        A: AclSource<'m> + ?Sized,
    {
        let entries = self.expand(users, acls)?;
        Ok(self.sort_distinct(entries))
    }

    /// Expand chunks of `users` concurrently
    ///
    /// Produces the same entries in the same order as [`expand`](Self::expand).
    pub fn expand_parallel<A>(&self, users: &[&'m User], acls: &A) -> Result<(Vec<AclExpansionEntry>, ExpansionStats)>
    where
        A: AclSource<'m> + Sync + ?Sized,
    {
        let start = Instant::now();
        debug!(users = users.len(), chunk_size = self.config.chunk_size, "Starting parallel expansion");

        let chunks: Vec<(Vec<AclExpansionEntry>, ExpansionStats)> = users
            .par_chunks(self.config.chunk_size)
            .map(|chunk| {
                let ctx = EvaluationContext::new(self.model);
                let _guard = ctx.enter();
                self.expand_in(&ctx, chunk, acls)
            })
            .collect::<Result<_>>()?;

        let mut entries = Vec::new();
        let mut stats = ExpansionStats::default();
        for (chunk_entries, chunk_stats) in chunks {
            entries.extend(chunk_entries);
            stats.merge(&chunk_stats);
        }

        log_summary(&stats, start);
        Ok((entries, stats))
    }

    /// Expand the users and lists selected by the configuration
    pub fn run(&self) -> Result<(Vec<AclExpansionEntry>, ExpansionStats)> {
        let users = UserFinder::with_filter(self.model, self.config.user_filter.clone());
        let mut acls = AclFinder::new(self.model);
        if !self.config.classes.is_empty() {
            acls = acls.with_classes(self.config.classes.iter().cloned());
        }

        if self.config.parallel {
            let users: Vec<&'m User> = users.users().collect();
            self.expand_parallel(&users, &acls)
        } else {
            self.expand_with_stats(&users, &acls)
        }
    }

    /// Order by user, role and class labels, dropping exact duplicates
    pub fn sort_distinct(&self, entries: Vec<AclExpansionEntry>) -> Vec<AclExpansionEntry> {
        let tree_builder = self.tree_builder();
        let labels: &dyn DisplayLabels = self.model;

        let mut seen = HashSet::new();
        let mut distinct: Vec<AclExpansionEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.clone()))
            .collect();

        distinct.sort_by_cached_key(|e| {
            (
                labels.user_label(e.user()),
                labels.role_group_label(e.role()),
                labels.role_position_label(e.role()),
                tree_builder.class_key(e),
            )
        });
        distinct
    }

    /// Tree builder labelled from the model
    pub fn tree_builder(&self) -> AclExpansionTreeBuilder<'m> {
        AclExpansionTreeBuilder::new(self.model)
    }

    pub fn build_tree<'e>(&self, entries: &'e [AclExpansionEntry]) -> AclExpansionTree<'e> {
        self.tree_builder().build_tree(entries)
    }

    fn expand_in<U, A>(
        &self,
        ctx: &EvaluationContext<'_>,
        users: &U,
        acls: &A,
    ) -> Result<(Vec<AclExpansionEntry>, ExpansionStats)>
    where
        U: UserSource<'m> + ?Sized,
        A: AclSource<'m> + ?Sized,
    {
        let finder = UserRoleAclAceCombinationFinder::new(users, acls);
        let mut entries = Vec::new();
        let mut stats = ExpansionStats::default();

        for combination in finder.combinations() {
            let outcome = self.creator.evaluate_combination(ctx, &combination)?;
            stats.record(&outcome);
            if let EntryOutcome::Created(entry) = outcome {
                entries.push(entry);
            }
        }

        Ok((entries, stats))
    }
}

fn log_summary(stats: &ExpansionStats, start: Instant) {
    if stats.combinations == 0 {
        warn!("No combinations to probe: user or list population is empty");
    }
    info!(
        combinations = stats.combinations,
        entries = stats.entries,
        not_contributing = stats.not_contributing,
        nothing_allowed = stats.nothing_allowed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Expansion finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use aclx_core::{
        AccessControlEntry, AccessControlList, AccessType, AclEvaluator, Group, Position,
        SecurableClass, Tenant, UserCondition,
    };

    fn model(users: usize) -> SecurityModel {
        let mut builder = SecurityModel::builder()
            .tenant(Tenant::new("t1", "Acme"))
            .group(Group::new("g1", "Sales", "t1"))
            .position(Position::new("p1", "Clerk"))
            .position(Position::new("p2", "Manager"))
            .access_type(AccessType::new("read", "Read"))
            .class(SecurableClass::new("invoice", "Invoice"))
            .acl(
                AccessControlList::stateless("acl1", "invoice")
                    .with_entry(AccessControlEntry::new("all").allow("read"))
                    .with_entry(
                        AccessControlEntry::new("managers")
                            .with_user(UserCondition::SpecificPosition { position: "p2".into() })
                            .allow("read"),
                    ),
            );
        for i in 0..users {
            builder = builder.user(
                User::new(format!("u{i:02}"), format!("user{i:02}"))
                    .with_tenant("t1")
                    .with_role(format!("r{i:02}a"), "g1", "p1")
                    .with_role(format!("r{i:02}b"), "g1", "p2"),
            );
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_stats_account_for_every_combination() {
        let model = model(3);
        let evaluator = AclEvaluator::new();
        let expander = AclExpander::new(&model, &evaluator, ExpanderConfig::default()).unwrap();

        let (entries, stats) = expander.run().unwrap();
        // 3 users × 2 roles × 2 entries
        assert_eq!(stats.combinations, 12);
        assert_eq!(stats.entries + stats.skipped(), stats.combinations);
        // "all" for every role, "managers" for p2 roles only
        assert_eq!(stats.entries, 9);
        assert_eq!(stats.not_contributing, 3);
        assert_eq!(entries.len(), 9);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = model(10);
        let evaluator = AclEvaluator::new();
        let config = ExpanderConfig {
            chunk_size: 3,
            ..Default::default()
        };
        let expander = AclExpander::new(&model, &evaluator, config).unwrap();

        let users: Vec<&User> = model.users().iter().collect();
        let acls: &[AccessControlList] = model.acls();
        let (sequential, seq_stats) = expander.expand_with_stats(&users, &acls).unwrap();
        let (parallel, par_stats) = expander.expand_parallel(&users, &acls).unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(seq_stats, par_stats);
    }

    #[test]
    fn test_sorted_distinct() {
        let model = model(2);
        let evaluator = AclEvaluator::new();
        let expander = AclExpander::new(&model, &evaluator, ExpanderConfig::default()).unwrap();

        let (entries, _) = expander.run().unwrap();
        // "all" and "managers" grant the same thing to a p2 role
        assert_eq!(entries.len(), 6);
        let manager_rows: Vec<&AclExpansionEntry> =
            entries.iter().filter(|e| e.role() == "r00b").collect();
        assert_eq!(manager_rows.len(), 2);
        assert_eq!(manager_rows[0], manager_rows[1]);

        let mut distinct: Vec<&AclExpansionEntry> = Vec::new();
        for entry in &entries {
            if !distinct.contains(&entry) {
                distinct.push(entry);
            }
        }
        assert_eq!(distinct.len(), 4);

        let mut doubled = entries.clone();
        doubled.extend(entries.iter().rev().cloned());

        let sorted = expander.sort_distinct(doubled);
        assert_eq!(sorted.len(), distinct.len());
        let users: Vec<&str> = sorted.iter().map(|e| e.user().as_str()).collect();
        let mut expected = users.clone();
        expected.sort();
        assert_eq!(users, expected);
    }

    #[test]
    fn test_empty_population() {
        let model = model(0);
        let evaluator = AclEvaluator::new();
        let expander = AclExpander::new(&model, &evaluator, ExpanderConfig::default()).unwrap();

        let (entries, stats) = expander.run().unwrap();
        assert!(entries.is_empty());
        assert_eq!(stats, ExpansionStats::default());
        assert_eq!(stats.yield_rate(), 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let model = model(0);
        let evaluator = AclEvaluator::new();
        let config = ExpanderConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(AclExpander::new(&model, &evaluator, config).is_err());
    }

    #[test]
    fn test_stats_merge() {
        let mut a = ExpansionStats {
            combinations: 4,
            entries: 1,
            not_contributing: 2,
            nothing_allowed: 1,
        };
        a.merge(&a.clone());
        assert_eq!(a.combinations, 8);
        assert_eq!(a.skipped(), 6);
        assert!((a.yield_rate() - 0.25).abs() < f64::EPSILON);
    }
}
