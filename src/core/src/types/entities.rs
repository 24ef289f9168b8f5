//! Security model entities

use super::conditions::{
    AbstractRoleCondition, GroupCondition, GroupHierarchy, TenantCondition, TenantHierarchy,
    UserCondition,
};
use super::ids::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tenant (top-level organisational unit, may be nested)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TenantId>,
}

impl Tenant {
    pub fn new(id: impl Into<TenantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<TenantId>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Group type (e.g. "division", "department")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupType {
    pub id: GroupTypeId,
    pub name: String,
}

impl GroupType {
    pub fn new(id: impl Into<GroupTypeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Group within a tenant, forming a tree through `parent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub tenant: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<GroupTypeId>,
}

impl Group {
    pub fn new(id: impl Into<GroupId>, name: impl Into<String>, tenant: impl Into<TenantId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            short_name: None,
            tenant: tenant.into(),
            parent: None,
            group_type: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<GroupId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_type(mut self, group_type: impl Into<GroupTypeId>) -> Self {
        self.group_type = Some(group_type.into());
        self
    }

    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    /// Label used in reports: the short name when present
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

/// Position a user can hold within a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub name: String,
}

impl Position {
    pub fn new(id: impl Into<PositionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One user holding one position in one group
///
/// Group and position are optional in the stored model; the expansion
/// engine rejects roles missing either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    #[serde(default)]
    pub user: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionId>,
}

impl Role {
    pub fn new(id: impl Into<RoleId>, user: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            user: user.into(),
            group: None,
            position: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<GroupId>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_position(mut self, position: impl Into<PositionId>) -> Self {
        self.position = Some(position.into());
        self
    }
}

/// User and the roles they hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantId>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    pub fn new(id: impl Into<UserId>, user_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_name: user_name.into(),
            first_name: None,
            last_name: None,
            tenant: None,
            roles: Vec::new(),
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<TenantId>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    /// Add a role held by this user in `group` at `position`
    pub fn with_role(
        mut self,
        id: impl Into<RoleId>,
        group: impl Into<GroupId>,
        position: impl Into<PositionId>,
    ) -> Self {
        let role = Role::new(id, self.id.clone())
            .with_group(group)
            .with_position(position);
        self.roles.push(role);
        self
    }

    /// "Last, First" when both names are known, otherwise the user name
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{}, {}", last, first),
            (None, Some(last)) => last.clone(),
            _ => self.user_name.clone(),
        }
    }
}

/// Role not bound to any group (e.g. "auditor")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractRole {
    pub id: AbstractRoleId,
    pub name: String,
}

impl AbstractRole {
    pub fn new(id: impl Into<AbstractRoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Class of protected objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurableClass {
    pub id: ClassId,
    pub name: String,
}

impl SecurableClass {
    pub fn new(id: impl Into<ClassId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One value of one state property of a securable class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDefinition {
    pub id: StateId,
    pub class: ClassId,
    pub property: String,
    pub name: String,
}

impl StateDefinition {
    pub fn new(
        id: impl Into<StateId>,
        class: impl Into<ClassId>,
        property: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            property: property.into(),
            name: name.into(),
        }
    }
}

/// Access type (e.g. "Read", "Edit")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessType {
    pub id: AccessTypeId,
    pub name: String,
}

impl AccessType {
    pub fn new(id: impl Into<AccessTypeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Whether a list applies regardless of object state or to one state combination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AclKind {
    #[default]
    Stateless,
    Stateful { states: Vec<StateId> },
}

/// Ordered collection of entries guarding one class (in one state combination)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
    pub id: AclId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassId>,
    #[serde(flatten)]
    pub kind: AclKind,
    #[serde(default)]
    pub entries: Vec<AccessControlEntry>,
}

impl AccessControlList {
    pub fn stateless(id: impl Into<AclId>, class: impl Into<ClassId>) -> Self {
        Self {
            id: id.into(),
            class: Some(class.into()),
            kind: AclKind::Stateless,
            entries: Vec::new(),
        }
    }

    pub fn stateful(id: impl Into<AclId>, class: impl Into<ClassId>, states: Vec<StateId>) -> Self {
        Self {
            id: id.into(),
            class: Some(class.into()),
            kind: AclKind::Stateful { states },
            entries: Vec::new(),
        }
    }

    /// Append an entry; the entry is re-parented to this list
    pub fn with_entry(mut self, mut entry: AccessControlEntry) -> Self {
        entry.acl = self.id.clone();
        self.entries.push(entry);
        self
    }

    pub fn is_stateless(&self) -> bool {
        matches!(self.kind, AclKind::Stateless)
    }

    /// States this list applies to; empty for stateless lists
    pub fn states(&self) -> &[StateId] {
        match &self.kind {
            AclKind::Stateless => &[],
            AclKind::Stateful { states } => states,
        }
    }

    pub fn entry(&self, id: &str) -> Option<&AccessControlEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// One rule of a list: four condition axes plus granted and denied access types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub id: AceId,
    #[serde(default)]
    pub acl: AclId,
    #[serde(default)]
    pub tenant_condition: TenantCondition,
    #[serde(default)]
    pub tenant_hierarchy: TenantHierarchy,
    #[serde(default)]
    pub group_condition: GroupCondition,
    #[serde(default)]
    pub group_hierarchy: GroupHierarchy,
    #[serde(default)]
    pub user_condition: UserCondition,
    #[serde(default)]
    pub abstract_role_condition: AbstractRoleCondition,
    #[serde(default)]
    pub allowed: BTreeSet<AccessTypeId>,
    #[serde(default)]
    pub denied: BTreeSet<AccessTypeId>,
}

impl AccessControlEntry {
    /// Entry matching everybody and granting nothing
    pub fn new(id: impl Into<AceId>) -> Self {
        Self {
            id: id.into(),
            acl: AclId::new(),
            tenant_condition: TenantCondition::None,
            tenant_hierarchy: TenantHierarchy::THIS,
            group_condition: GroupCondition::None,
            group_hierarchy: GroupHierarchy::THIS,
            user_condition: UserCondition::None,
            abstract_role_condition: AbstractRoleCondition::None,
            allowed: BTreeSet::new(),
            denied: BTreeSet::new(),
        }
    }

    pub fn with_tenant(mut self, condition: TenantCondition, hierarchy: TenantHierarchy) -> Self {
        self.tenant_condition = condition;
        self.tenant_hierarchy = hierarchy;
        self
    }

    pub fn with_group(mut self, condition: GroupCondition, hierarchy: GroupHierarchy) -> Self {
        self.group_condition = condition;
        self.group_hierarchy = hierarchy;
        self
    }

    pub fn with_user(mut self, condition: UserCondition) -> Self {
        self.user_condition = condition;
        self
    }

    pub fn with_abstract_role(mut self, abstract_role: impl Into<AbstractRoleId>) -> Self {
        self.abstract_role_condition = AbstractRoleCondition::Specific {
            abstract_role: abstract_role.into(),
        };
        self
    }

    pub fn allow(mut self, access_type: impl Into<AccessTypeId>) -> Self {
        self.allowed.insert(access_type.into());
        self
    }

    pub fn deny(mut self, access_type: impl Into<AccessTypeId>) -> Self {
        self.denied.insert(access_type.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_display_name() {
        let user = User::new("u1", "jdoe");
        assert_eq!(user.display_name(), "jdoe");

        let user = user.with_name("Jane", "Doe");
        assert_eq!(user.display_name(), "Doe, Jane");
    }

    #[test]
    fn test_user_roles_point_back_at_user() {
        let user = User::new("u1", "jdoe").with_role("r1", "g1", "p1");
        assert_eq!(user.roles.len(), 1);
        assert_eq!(user.roles[0].user, "u1");
        assert_eq!(user.roles[0].group.as_deref(), Some("g1"));
        assert_eq!(user.roles[0].position.as_deref(), Some("p1"));
    }

    #[test]
    fn test_acl_reparents_entries() {
        let acl = AccessControlList::stateful("acl1", "Invoice", vec!["paid".into()])
            .with_entry(AccessControlEntry::new("ace1").allow("Read"));

        assert_eq!(acl.entries[0].acl, "acl1");
        assert_eq!(acl.states(), &["paid".to_string()]);
        assert!(!acl.is_stateless());
        assert!(acl.entry("ace1").is_some());
    }

    #[test]
    fn test_acl_serde_flattens_kind() {
        let json = r#"{
            "id": "acl1",
            "class": "Invoice",
            "kind": "stateful",
            "states": ["open"],
            "entries": [{ "id": "ace1", "allowed": ["Read"] }]
        }"#;
        let acl: AccessControlList = serde_json::from_str(json).unwrap();
        assert_eq!(acl.states(), &["open".to_string()]);
        assert_eq!(acl.entries[0].tenant_hierarchy, TenantHierarchy::THIS);
        assert!(acl.entries[0].allowed.contains("Read"));
    }
}
