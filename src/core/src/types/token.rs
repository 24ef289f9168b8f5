//! Security token presented to an evaluator

use super::ids::{AbstractRoleId, GroupId, PositionId, TenantId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Position held in a group, as seen by the evaluator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalRole {
    pub position: PositionId,
    pub group: GroupId,
}

impl PrincipalRole {
    pub fn new(position: impl Into<PositionId>, group: impl Into<GroupId>) -> Self {
        Self {
            position: position.into(),
            group: group.into(),
        }
    }
}

/// Who is asking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user: UserId,
    pub tenant: TenantId,
    #[serde(default)]
    pub roles: Vec<PrincipalRole>,
}

/// Principal plus the object-dependent values an entry may test against
///
/// At request time the owning tenant, group and user come from the
/// protected object. During expansion they are synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityToken {
    pub principal: Principal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_tenant: Option<TenantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_group: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_user: Option<UserId>,
    #[serde(default)]
    pub abstract_roles: BTreeSet<AbstractRoleId>,
}

impl SecurityToken {
    /// Token with no object-dependent values
    pub fn for_principal(principal: Principal) -> Self {
        Self {
            principal,
            owning_tenant: None,
            owning_group: None,
            owning_user: None,
            abstract_roles: BTreeSet::new(),
        }
    }
}
