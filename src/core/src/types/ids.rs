//! Entity identifiers
//!
//! Entities refer to each other by identifier only. Two references denote
//! the same entity iff their identifiers are equal.

/// Tenant identifier
pub type TenantId = String;

/// Group identifier
pub type GroupId = String;

/// Group type identifier (e.g. "department", "division")
pub type GroupTypeId = String;

/// Position identifier (e.g. "manager", "clerk")
pub type PositionId = String;

/// User identifier
pub type UserId = String;

/// Role identifier (one user holding one position in one group)
pub type RoleId = String;

/// Abstract role identifier (a role not bound to a group, e.g. "auditor")
pub type AbstractRoleId = String;

/// Securable class identifier
pub type ClassId = String;

/// State identifier within a securable class
pub type StateId = String;

/// Access-control-list identifier
pub type AclId = String;

/// Access-control-entry identifier
pub type AceId = String;

/// Access type identifier (e.g. "Read", "Edit")
pub type AccessTypeId = String;
