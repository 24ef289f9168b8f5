//! Shared types for the security model

pub mod ids;
pub mod conditions;
pub mod entities;
pub mod token;

// Re-export commonly used types
pub use ids::{
    AbstractRoleId, AccessTypeId, AceId, AclId, ClassId, GroupId, GroupTypeId, PositionId, RoleId,
    StateId, TenantId, UserId,
};
pub use conditions::{
    AbstractRoleCondition, GroupCondition, GroupHierarchy, TenantCondition, TenantHierarchy,
    UserCondition,
};
pub use entities::{
    AbstractRole, AccessControlEntry, AccessControlList, AccessType, AclKind, Group, GroupType,
    Position, Role, SecurableClass, StateDefinition, Tenant, User,
};
pub use token::{Principal, PrincipalRole, SecurityToken};
