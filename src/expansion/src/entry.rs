//! Expansion entries and the relations used to compare them
//!
//! Two relations live here and are kept apart on purpose:
//!
//! - full equality (`PartialEq`), which includes the list and its states;
//! - [`IgnoreStateEquivalence`], which collapses entries differing only in
//!   the list (and therefore the object state) they came from.

use crate::conditions::AccessConditions;
use aclx_core::{
    AbstractRoleId, AccessTypeId, AclId, ClassId, GroupHierarchy, GroupId, RoleId, StateId,
    TenantHierarchy, TenantId, UserId,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// One row of the permissions matrix
///
/// "`user` acting in `role` may do `allowed_access_types` on objects guarded
/// by `access_control_list`, provided `access_conditions` hold."
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AclExpansionEntry {
    user: UserId,
    role: RoleId,
    access_control_list: AclId,
    class: Option<ClassId>,
    states: Vec<StateId>,
    access_conditions: AccessConditions,
    allowed_access_types: BTreeSet<AccessTypeId>,
    denied_access_types: BTreeSet<AccessTypeId>,
}

impl AclExpansionEntry {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        user: UserId,
        role: RoleId,
        access_control_list: AclId,
        class: Option<ClassId>,
        states: Vec<StateId>,
        access_conditions: AccessConditions,
        allowed_access_types: BTreeSet<AccessTypeId>,
        denied_access_types: BTreeSet<AccessTypeId>,
    ) -> Self {
        Self {
            user,
            role,
            access_control_list,
            class,
            states,
            access_conditions,
            allowed_access_types,
            denied_access_types,
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn role(&self) -> &RoleId {
        &self.role
    }

    pub fn access_control_list(&self) -> &AclId {
        &self.access_control_list
    }

    /// `None` for stateless lists
    pub fn class(&self) -> Option<&ClassId> {
        self.class.as_ref()
    }

    /// States of the originating list, for display only
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    pub fn access_conditions(&self) -> &AccessConditions {
        &self.access_conditions
    }

    pub fn allowed_access_types(&self) -> &BTreeSet<AccessTypeId> {
        &self.allowed_access_types
    }

    pub fn denied_access_types(&self) -> &BTreeSet<AccessTypeId> {
        &self.denied_access_types
    }
}

/// Projection of an entry onto the fields [`IgnoreStateEquivalence`] compares
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IgnoreStateKey<'e> {
    class: Option<&'e ClassId>,
    role: &'e RoleId,
    user: &'e UserId,
    abstract_role: Option<&'e AbstractRoleId>,
    group_hierarchy: GroupHierarchy,
    is_owning_user_required: bool,
    owning_group: Option<&'e GroupId>,
    owning_tenant: Option<&'e TenantId>,
    tenant_hierarchy: TenantHierarchy,
    allowed: &'e BTreeSet<AccessTypeId>,
    denied: &'e BTreeSet<AccessTypeId>,
}

/// Entries are equivalent when they differ at most in list and states
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreStateEquivalence;

impl IgnoreStateEquivalence {
    pub fn key<'e>(&self, entry: &'e AclExpansionEntry) -> IgnoreStateKey<'e> {
        let conditions = &entry.access_conditions;
        IgnoreStateKey {
            class: entry.class.as_ref(),
            role: &entry.role,
            user: &entry.user,
            abstract_role: conditions.abstract_role(),
            group_hierarchy: conditions.group_hierarchy(),
            is_owning_user_required: conditions.is_owning_user_required(),
            owning_group: conditions.owning_group(),
            owning_tenant: conditions.owning_tenant(),
            tenant_hierarchy: conditions.tenant_hierarchy(),
            allowed: &entry.allowed_access_types,
            denied: &entry.denied_access_types,
        }
    }

    pub fn equivalent(&self, a: &AclExpansionEntry, b: &AclExpansionEntry) -> bool {
        self.key(a) == self.key(b)
    }
}
