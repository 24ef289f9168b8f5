//! Reference evaluator
//!
//! Matches every entry of a list against a token and folds the matching
//! entries into one decision: everything any matching entry allows, minus
//! everything any matching entry denies.
//!
//! An entry matches when all four of its condition axes match. The group
//! axis and a `SpecificPosition` user condition are checked against the
//! principal's roles together: one role has to satisfy both.

use crate::context::EvaluationContext;
use crate::error::Result;
use crate::model::SecurityModel;
use crate::traits::{AccessEvaluation, AccessEvaluator, AccessTypeStatistics};
use crate::types::*;
use tracing::trace;

/// Evaluator over the in-memory [`SecurityModel`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AclEvaluator;

impl AclEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Whether `entry` applies to `token`
    pub fn matches(
        &self,
        model: &SecurityModel,
        entry: &AccessControlEntry,
        token: &SecurityToken,
    ) -> bool {
        self.matches_tenant(model, entry, token)
            && self.matches_user(entry, token)
            && self.matches_abstract_role(entry, token)
            && self.matches_roles(model, entry, token)
    }

    fn matches_tenant(
        &self,
        model: &SecurityModel,
        entry: &AccessControlEntry,
        token: &SecurityToken,
    ) -> bool {
        let principal_tenant = &token.principal.tenant;
        match &entry.tenant_condition {
            TenantCondition::None => true,
            TenantCondition::SpecificTenant { tenant } => {
                tenant_relates(model, principal_tenant, tenant, entry.tenant_hierarchy)
            }
            TenantCondition::OwningTenant => token
                .owning_tenant
                .as_deref()
                .is_some_and(|owning| {
                    tenant_relates(model, principal_tenant, owning, entry.tenant_hierarchy)
                }),
        }
    }

    fn matches_user(&self, entry: &AccessControlEntry, token: &SecurityToken) -> bool {
        match &entry.user_condition {
            UserCondition::None | UserCondition::SpecificPosition { .. } => true,
            UserCondition::SpecificUser { user } => token.principal.user == *user,
            UserCondition::Owner => token.owning_user.as_deref() == Some(token.principal.user.as_str()),
        }
    }

    fn matches_abstract_role(&self, entry: &AccessControlEntry, token: &SecurityToken) -> bool {
        match &entry.abstract_role_condition {
            AbstractRoleCondition::None => true,
            AbstractRoleCondition::Specific { abstract_role } => {
                token.abstract_roles.contains(abstract_role)
            }
        }
    }

    fn matches_roles(
        &self,
        model: &SecurityModel,
        entry: &AccessControlEntry,
        token: &SecurityToken,
    ) -> bool {
        let position = match &entry.user_condition {
            UserCondition::SpecificPosition { position } => Some(position),
            _ => None,
        };
        if position.is_none() && entry.group_condition == GroupCondition::None {
            return true;
        }

        token.principal.roles.iter().any(|role| {
            position.map_or(true, |p| role.position == *p)
                && self.matches_group(model, entry, token, &role.group)
        })
    }

    fn matches_group(
        &self,
        model: &SecurityModel,
        entry: &AccessControlEntry,
        token: &SecurityToken,
        role_group: &str,
    ) -> bool {
        match &entry.group_condition {
            GroupCondition::None => true,
            GroupCondition::SpecificGroup { group } => {
                group_relates(model, role_group, group, entry.group_hierarchy)
            }
            GroupCondition::AnyGroupWithType { group_type } => model
                .group(role_group)
                .and_then(|g| g.group_type.as_ref())
                == Some(group_type),
            GroupCondition::OwningGroup => token.owning_group.as_deref().is_some_and(|owning| {
                group_relates(model, role_group, owning, entry.group_hierarchy)
            }),
            GroupCondition::BranchOfOwningGroup { group_type } => {
                let Some(owning) = token.owning_group.as_deref() else {
                    return false;
                };
                model
                    .group_chain(owning)
                    .into_iter()
                    .find(|g| g.group_type.as_ref() == Some(group_type))
                    .is_some_and(|branch| {
                        group_relates(
                            model,
                            role_group,
                            &branch.id,
                            GroupHierarchy::THIS | GroupHierarchy::CHILDREN,
                        )
                    })
            }
        }
    }
}

/// Whether `candidate` stands in `hierarchy` relation to `reference`
fn group_relates(
    model: &SecurityModel,
    candidate: &str,
    reference: &str,
    hierarchy: GroupHierarchy,
) -> bool {
    (hierarchy.contains(GroupHierarchy::THIS) && candidate == reference)
        || (hierarchy.contains(GroupHierarchy::PARENT) && model.is_group_ancestor(candidate, reference))
        || (hierarchy.contains(GroupHierarchy::CHILDREN) && model.is_group_ancestor(reference, candidate))
}

fn tenant_relates(
    model: &SecurityModel,
    candidate: &str,
    reference: &str,
    hierarchy: TenantHierarchy,
) -> bool {
    (hierarchy.contains(TenantHierarchy::THIS) && candidate == reference)
        || (hierarchy.contains(TenantHierarchy::PARENT) && model.is_tenant_ancestor(candidate, reference))
}

impl AccessEvaluator for AclEvaluator {
    fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        token: &SecurityToken,
        acl: &AccessControlList,
    ) -> Result<AccessEvaluation> {
        let model = ctx.ensure_active()?;

        let mut evaluation = AccessEvaluation {
            statistics: AccessTypeStatistics::new(),
            ..Default::default()
        };

        for entry in acl.entries.iter().filter(|e| self.matches(model, e, token)) {
            evaluation.statistics.add_matching(entry.id.clone());
            if !entry.allowed.is_empty() || !entry.denied.is_empty() {
                evaluation.statistics.add_contributing(entry.id.clone());
            }
            evaluation.allowed.extend(entry.allowed.iter().cloned());
            evaluation.denied.extend(entry.denied.iter().cloned());
        }

        let denied = &evaluation.denied;
        evaluation.allowed.retain(|a| !denied.contains(a));

        trace!(
            acl = %acl.id,
            user = %token.principal.user,
            allowed = evaluation.allowed.len(),
            denied = evaluation.denied.len(),
            "Evaluated token against acl"
        );

        Ok(evaluation)
    }
}
