//! Evaluator seam
//!
//! The expansion engine treats "which access does this token get from this
//! list" as a black box behind [`AccessEvaluator`]. Besides the decision the
//! evaluator reports which entries took part in it, so that a result can be
//! attributed to the entry being probed and not to a neighbour that happened
//! to match as well.

use crate::context::EvaluationContext;
use crate::error::Result;
use crate::types::{AccessControlList, AccessTypeId, AceId, SecurityToken};
use serde::Serialize;
use std::collections::BTreeSet;

/// Which entries of the evaluated list influenced the decision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessTypeStatistics {
    matching: Vec<AceId>,
    contributing: Vec<AceId>,
}

impl AccessTypeStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry whose conditions matched the token
    pub fn add_matching(&mut self, ace: impl Into<AceId>) {
        self.matching.push(ace.into());
    }

    /// Record an entry that allowed or denied at least one access type
    pub fn add_contributing(&mut self, ace: impl Into<AceId>) {
        self.contributing.push(ace.into());
    }

    pub fn is_matching(&self, ace: &str) -> bool {
        self.matching.iter().any(|a| a == ace)
    }

    pub fn is_contributing(&self, ace: &str) -> bool {
        self.contributing.iter().any(|a| a == ace)
    }

    pub fn matching(&self) -> &[AceId] {
        &self.matching
    }

    pub fn contributing(&self) -> &[AceId] {
        &self.contributing
    }
}

/// Outcome of evaluating one token against one list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessEvaluation {
    pub allowed: BTreeSet<AccessTypeId>,
    pub denied: BTreeSet<AccessTypeId>,
    pub statistics: AccessTypeStatistics,
}

/// Decides what a token may do against a list
pub trait AccessEvaluator: Send + Sync {
    /// Evaluate `token` against `acl`
    ///
    /// Fails with `NoActiveContext` when `ctx` is not active.
    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        token: &SecurityToken,
        acl: &AccessControlList,
    ) -> Result<AccessEvaluation>;
}
