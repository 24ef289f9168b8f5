//! # aclx core
//!
//! Read-only security model consumed by the ACL expansion engine: tenants,
//! groups, users and their roles, access-control lists and entries, the
//! security token presented to an evaluator, and the evaluator itself.
//!
//! The expansion engine never mutates anything in here. It borrows a
//! [`SecurityModel`], opens an [`EvaluationContext`] over it and asks an
//! [`AccessEvaluator`] what a synthetic token may do against a list.

pub mod types;
pub mod traits;
pub mod error;
pub mod model;
pub mod context;
pub mod acl_evaluator;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use types::{
    AbstractRoleCondition, GroupCondition, GroupHierarchy, TenantCondition, TenantHierarchy,
    UserCondition,
};
pub use types::{
    AbstractRole, AccessControlEntry, AccessControlList, AccessType, AclKind, Group, GroupType,
    Position, Role, SecurableClass, StateDefinition, Tenant, User,
};
pub use types::{Principal, PrincipalRole, SecurityToken};
pub use types::{
    AbstractRoleId, AccessTypeId, AceId, AclId, ClassId, GroupId, GroupTypeId, PositionId, RoleId,
    StateId, TenantId, UserId,
};
pub use model::{DisplayLabels, SecurityModel, SecurityModelBuilder};
pub use context::{ContextGuard, EvaluationContext};
pub use traits::{AccessEvaluation, AccessEvaluator, AccessTypeStatistics};
pub use acl_evaluator::AclEvaluator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
