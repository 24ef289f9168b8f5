//! Condition axes of an access-control entry
//!
//! An entry restricts who it applies to along four independent axes: the
//! user, the group, the tenant and the abstract role. Each axis is a closed
//! set of condition kinds carrying only the data that kind needs, so a new
//! kind cannot be added without every consumer handling it.
//!
//! Some kinds (`Owner`, `OwningGroup`, `BranchOfOwningGroup`,
//! `OwningTenant`) refer to the protected object and cannot be decided from
//! the principal alone.

use super::ids::{AbstractRoleId, GroupId, GroupTypeId, PositionId, TenantId, UserId};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which groups relative to a reference group satisfy a group condition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct GroupHierarchy: u8 {
        /// The reference group itself
        const THIS = 0b001;
        /// Ancestors of the reference group
        const PARENT = 0b010;
        /// Descendants of the reference group
        const CHILDREN = 0b100;
    }
}

impl GroupHierarchy {
    /// Whether the unmodified reference group satisfies the condition
    pub fn includes_this(self) -> bool {
        self.contains(Self::THIS)
    }
}

impl Default for GroupHierarchy {
    fn default() -> Self {
        Self::THIS
    }
}

bitflags! {
    /// Which tenants relative to a reference tenant satisfy a tenant condition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TenantHierarchy: u8 {
        /// The reference tenant itself
        const THIS = 0b01;
        /// Ancestors of the reference tenant
        const PARENT = 0b10;
    }
}

impl TenantHierarchy {
    /// Whether the unmodified reference tenant satisfies the condition
    pub fn includes_this(self) -> bool {
        self.contains(Self::THIS)
    }
}

impl Default for TenantHierarchy {
    fn default() -> Self {
        Self::THIS
    }
}

/// User axis
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserCondition {
    /// Any user
    #[default]
    None,
    /// Exactly this user
    SpecificUser { user: UserId },
    /// Any user holding this position (combined with the group axis)
    SpecificPosition { position: PositionId },
    /// The owning user of the protected object
    Owner,
}

/// Group axis
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupCondition {
    /// Any group
    #[default]
    None,
    /// This group, qualified by the entry's group hierarchy
    SpecificGroup { group: GroupId },
    /// Any group of this type
    AnyGroupWithType { group_type: GroupTypeId },
    /// The owning group of the protected object, qualified by the hierarchy
    OwningGroup,
    /// The closest ancestor-or-self of the owning group having this type,
    /// and everything below it
    BranchOfOwningGroup { group_type: GroupTypeId },
}

/// Tenant axis
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TenantCondition {
    /// Any tenant
    #[default]
    None,
    /// This tenant, qualified by the entry's tenant hierarchy
    SpecificTenant { tenant: TenantId },
    /// The owning tenant of the protected object, qualified by the hierarchy
    OwningTenant,
}

/// Abstract-role axis
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbstractRoleCondition {
    /// No abstract role required
    #[default]
    None,
    /// The token must carry this abstract role
    Specific { abstract_role: AbstractRoleId },
}

impl UserCondition {
    /// Whether this condition can only be resolved against a concrete object
    pub fn is_object_dependent(&self) -> bool {
        matches!(self, UserCondition::Owner)
    }
}

impl GroupCondition {
    /// Whether this condition can only be resolved against a concrete object
    pub fn is_object_dependent(&self) -> bool {
        matches!(
            self,
            GroupCondition::OwningGroup | GroupCondition::BranchOfOwningGroup { .. }
        )
    }
}

impl TenantCondition {
    /// Whether this condition can only be resolved against a concrete object
    pub fn is_object_dependent(&self) -> bool {
        matches!(self, TenantCondition::OwningTenant)
    }
}
