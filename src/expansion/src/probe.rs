//! Probe construction
//!
//! A probe is a synthetic security token built for one (user, role, entry)
//! triple, together with the [`AccessConditions`] recording every assumption
//! made about the protected object while building it.
//!
//! Axes the evaluator can decide from the principal alone (specific user,
//! specific position, specific tenant or group, group type) are left to the
//! evaluator. Axes that refer to the protected object get a synthetic value
//! chosen so the probed entry can match, and the choice is recorded:
//!
//! | Condition | Synthetic value | Recorded condition |
//! |-----------|-----------------|--------------------|
//! | `Owner` | owning user = probed user | owning user required |
//! | `OwningTenant` | owning tenant = user's tenant | owning tenant + hierarchy |
//! | `OwningGroup` | owning group = role's group | owning group + hierarchy |
//! | `BranchOfOwningGroup(t)` | closest ancestor-or-self of role's group of type `t` | that group, `THIS \| CHILDREN` |
//! | abstract role `r` | token carries `r` | abstract role `r` |
//!
//! The principal carries only the probed role, never the user's other roles,
//! so that an unrelated role cannot make the entry match.

use crate::conditions::{AccessConditions, AccessConditionsBuilder};
use crate::error::{ExpansionError, Result};
use crate::hierarchy::GroupChainResolver;
use aclx_core::{
    AbstractRoleCondition, AccessControlEntry, GroupCondition, GroupHierarchy, Principal,
    PrincipalRole, Role, SecurityModel, SecurityToken, TenantCondition, User, UserCondition,
};
use std::collections::BTreeSet;

/// Synthetic token plus the assumptions behind it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclProbe {
    pub token: SecurityToken,
    pub conditions: AccessConditions,
}

/// Builds probes against one security model
pub struct ProbeBuilder<'m> {
    model: &'m SecurityModel,
    groups: GroupChainResolver<'m>,
}

impl<'m> ProbeBuilder<'m> {
    pub fn new(model: &'m SecurityModel) -> Self {
        Self {
            model,
            groups: GroupChainResolver::new(model),
        }
    }

    pub fn model(&self) -> &'m SecurityModel {
        self.model
    }

    pub fn group_resolver(&self) -> &GroupChainResolver<'m> {
        &self.groups
    }

    /// Build the probe for `entry` as seen by `user` acting in `role`
    ///
    /// Fails with `InvalidProbe` when the user has no tenant, the role has
    /// no position or group, the role is not the user's, or the entry's
    /// hierarchy cannot accept the synthesized owning tenant or group.
    pub fn build_probe(&self, user: &User, role: &Role, entry: &AccessControlEntry) -> Result<AclProbe> {
        let tenant = user
            .tenant
            .as_ref()
            .ok_or_else(|| ExpansionError::InvalidProbe(format!("user {} has no tenant", user.id)))?;
        let position = role
            .position
            .as_ref()
            .ok_or_else(|| ExpansionError::InvalidProbe(format!("role {} has no position", role.id)))?;
        let group = role
            .group
            .as_ref()
            .ok_or_else(|| ExpansionError::InvalidProbe(format!("role {} has no group", role.id)))?;
        if role.user != user.id {
            return Err(ExpansionError::InvalidProbe(format!(
                "role {} belongs to user {}, not {}",
                role.id, role.user, user.id
            )));
        }

        let mut conditions = AccessConditions::builder();
        let mut token = SecurityToken::for_principal(Principal {
            user: user.id.clone(),
            tenant: tenant.clone(),
            roles: vec![PrincipalRole::new(position.clone(), group.clone())],
        });

        self.resolve_user(user, entry, &mut token, &mut conditions);
        self.resolve_tenant(user, entry, &mut token, &mut conditions)?;
        self.resolve_group(role, entry, &mut token, &mut conditions)?;
        token.abstract_roles = self.resolve_abstract_role(entry, &mut conditions);

        Ok(AclProbe {
            token,
            conditions: conditions.build()?,
        })
    }

    fn resolve_user(
        &self,
        user: &User,
        entry: &AccessControlEntry,
        token: &mut SecurityToken,
        conditions: &mut AccessConditionsBuilder,
    ) {
        match &entry.user_condition {
            UserCondition::Owner => {
                token.owning_user = Some(user.id.clone());
                conditions.require_owning_user();
            }
            UserCondition::None
            | UserCondition::SpecificUser { .. }
            | UserCondition::SpecificPosition { .. } => {}
        }
    }

    fn resolve_tenant(
        &self,
        user: &User,
        entry: &AccessControlEntry,
        token: &mut SecurityToken,
        conditions: &mut AccessConditionsBuilder,
    ) -> Result<()> {
        match &entry.tenant_condition {
            TenantCondition::OwningTenant => {
                if !entry.tenant_hierarchy.includes_this() {
                    return Err(ExpansionError::InvalidProbe(format!(
                        "entry {} tests the owning tenant with hierarchy {:?} lacking THIS",
                        entry.id, entry.tenant_hierarchy
                    )));
                }
                // Preconditions guarantee the tenant
                if let Some(tenant) = &user.tenant {
                    token.owning_tenant = Some(tenant.clone());
                    conditions.owning_tenant(tenant.clone(), entry.tenant_hierarchy);
                }
            }
            TenantCondition::None | TenantCondition::SpecificTenant { .. } => {}
        }
        Ok(())
    }

    fn resolve_group(
        &self,
        role: &Role,
        entry: &AccessControlEntry,
        token: &mut SecurityToken,
        conditions: &mut AccessConditionsBuilder,
    ) -> Result<()> {
        let Some(role_group) = &role.group else {
            return Ok(());
        };

        match &entry.group_condition {
            GroupCondition::OwningGroup => {
                if !entry.group_hierarchy.includes_this() {
                    return Err(ExpansionError::InvalidProbe(format!(
                        "entry {} tests the owning group with hierarchy {:?} lacking THIS",
                        entry.id, entry.group_hierarchy
                    )));
                }
                token.owning_group = Some(role_group.clone());
                conditions.owning_group(Some(role_group.clone()), entry.group_hierarchy);
            }
            GroupCondition::BranchOfOwningGroup { group_type } => {
                // No typed ancestor: the probe is still built, it just
                // cannot match through this axis.
                let branch = self
                    .groups
                    .first_with_type(role_group, group_type)
                    .map(|g| g.id.clone());
                token.owning_group = branch.clone();
                conditions.owning_group(branch, GroupHierarchy::THIS | GroupHierarchy::CHILDREN);
            }
            GroupCondition::None
            | GroupCondition::SpecificGroup { .. }
            | GroupCondition::AnyGroupWithType { .. } => {}
        }
        Ok(())
    }

    fn resolve_abstract_role(
        &self,
        entry: &AccessControlEntry,
        conditions: &mut AccessConditionsBuilder,
    ) -> BTreeSet<String> {
        let mut abstract_roles = BTreeSet::new();
        match &entry.abstract_role_condition {
            AbstractRoleCondition::Specific { abstract_role } => {
                abstract_roles.insert(abstract_role.clone());
                conditions.abstract_role(abstract_role.clone());
            }
            AbstractRoleCondition::None => {}
        }
        abstract_roles
    }
}
