//! Access conditions
//!
//! The assumptions a probe had to make about the protected object. An
//! expansion entry only holds for objects satisfying all of them, e.g. "the
//! owning tenant is T" or "the current user owns the object".

use crate::error::{ExpansionError, Result};
use aclx_core::{AbstractRoleId, GroupHierarchy, GroupId, TenantHierarchy, TenantId};
use serde::Serialize;

/// Object-dependent conditions attached to an expansion entry
///
/// Invariant: a recorded owning group (tenant) comes with a hierarchy that
/// includes `THIS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AccessConditions {
    is_owning_user_required: bool,
    owning_group: Option<GroupId>,
    group_hierarchy: GroupHierarchy,
    owning_tenant: Option<TenantId>,
    tenant_hierarchy: TenantHierarchy,
    abstract_role: Option<AbstractRoleId>,
}

impl Default for AccessConditions {
    fn default() -> Self {
        Self {
            is_owning_user_required: false,
            owning_group: None,
            group_hierarchy: GroupHierarchy::empty(),
            owning_tenant: None,
            tenant_hierarchy: TenantHierarchy::empty(),
            abstract_role: None,
        }
    }
}

impl AccessConditions {
    pub fn builder() -> AccessConditionsBuilder {
        AccessConditionsBuilder::default()
    }

    pub fn is_owning_user_required(&self) -> bool {
        self.is_owning_user_required
    }

    pub fn owning_group(&self) -> Option<&GroupId> {
        self.owning_group.as_ref()
    }

    pub fn group_hierarchy(&self) -> GroupHierarchy {
        self.group_hierarchy
    }

    pub fn owning_tenant(&self) -> Option<&TenantId> {
        self.owning_tenant.as_ref()
    }

    pub fn tenant_hierarchy(&self) -> TenantHierarchy {
        self.tenant_hierarchy
    }

    pub fn abstract_role(&self) -> Option<&AbstractRoleId> {
        self.abstract_role.as_ref()
    }

    /// No assumption about the object was needed
    pub fn is_unconditional(&self) -> bool {
        !self.is_owning_user_required
            && self.owning_group.is_none()
            && self.group_hierarchy.is_empty()
            && self.owning_tenant.is_none()
            && self.tenant_hierarchy.is_empty()
            && self.abstract_role.is_none()
    }
}

/// Accumulates conditions axis by axis, then freezes them
#[derive(Debug, Clone, Default)]
pub struct AccessConditionsBuilder {
    conditions: AccessConditions,
}

impl AccessConditionsBuilder {
    /// The probed user must own the object
    pub fn require_owning_user(&mut self) -> &mut Self {
        self.conditions.is_owning_user_required = true;
        self
    }

    pub fn owning_group(&mut self, group: Option<GroupId>, hierarchy: GroupHierarchy) -> &mut Self {
        self.conditions.owning_group = group;
        self.conditions.group_hierarchy = hierarchy;
        self
    }

    pub fn owning_tenant(&mut self, tenant: TenantId, hierarchy: TenantHierarchy) -> &mut Self {
        self.conditions.owning_tenant = Some(tenant);
        self.conditions.tenant_hierarchy = hierarchy;
        self
    }

    pub fn abstract_role(&mut self, abstract_role: AbstractRoleId) -> &mut Self {
        self.conditions.abstract_role = Some(abstract_role);
        self
    }

    /// Freeze the accumulated conditions
    pub fn build(&self) -> Result<AccessConditions> {
        let c = &self.conditions;
        if c.owning_group.is_some() && !c.group_hierarchy.includes_this() {
            return Err(ExpansionError::ProbeInvariant(format!(
                "owning group recorded with hierarchy {:?} lacking THIS",
                c.group_hierarchy
            )));
        }
        if c.owning_tenant.is_some() && !c.tenant_hierarchy.includes_this() {
            return Err(ExpansionError::ProbeInvariant(format!(
                "owning tenant recorded with hierarchy {:?} lacking THIS",
                c.tenant_hierarchy
            )));
        }
        Ok(c.clone())
    }
}
