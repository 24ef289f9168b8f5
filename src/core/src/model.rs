//! In-memory security model
//!
//! A validated, indexed snapshot of every entity the expansion engine reads.
//! Built through [`SecurityModelBuilder`] or loaded from JSON; immutable
//! afterwards.

use crate::error::{CoreError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Display labels used to order report rows
///
/// Missing entities yield `None`, which sorts before any label.
pub trait DisplayLabels {
    fn user_label(&self, user: &str) -> Option<String>;
    fn role_group_label(&self, role: &str) -> Option<String>;
    fn role_position_label(&self, role: &str) -> Option<String>;
    fn class_label(&self, class: &str) -> Option<String>;
}

/// Serialized form of a model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ModelDocument {
    #[serde(default)]
    tenants: Vec<Tenant>,
    #[serde(default)]
    group_types: Vec<GroupType>,
    #[serde(default)]
    groups: Vec<Group>,
    #[serde(default)]
    positions: Vec<Position>,
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    abstract_roles: Vec<AbstractRole>,
    #[serde(default)]
    classes: Vec<SecurableClass>,
    #[serde(default)]
    states: Vec<StateDefinition>,
    #[serde(default)]
    access_types: Vec<AccessType>,
    #[serde(default)]
    acls: Vec<AccessControlList>,
}

/// Validated security model
#[derive(Debug, Clone, Default)]
pub struct SecurityModel {
    doc: ModelDocument,
    tenants: HashMap<TenantId, usize>,
    group_types: HashMap<GroupTypeId, usize>,
    groups: HashMap<GroupId, usize>,
    positions: HashMap<PositionId, usize>,
    users: HashMap<UserId, usize>,
    roles: HashMap<RoleId, (usize, usize)>,
    abstract_roles: HashMap<AbstractRoleId, usize>,
    classes: HashMap<ClassId, usize>,
    states: HashMap<StateId, usize>,
    access_types: HashMap<AccessTypeId, usize>,
    acls: HashMap<AclId, usize>,
}

fn index_of<T>(
    items: &[T],
    kind: &'static str,
    id: impl Fn(&T) -> &String,
) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        if index.insert(id(item).clone(), position).is_some() {
            return Err(CoreError::DuplicateId {
                kind,
                id: id(item).clone(),
            });
        }
    }
    Ok(index)
}

impl SecurityModel {
    /// Start building a model programmatically
    pub fn builder() -> SecurityModelBuilder {
        SecurityModelBuilder::default()
    }

    /// Parse and validate a JSON model document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut doc: ModelDocument = serde_json::from_str(json)?;

        // Owned children may omit their back-reference
        for user in &mut doc.users {
            for role in &mut user.roles {
                if role.user.is_empty() {
                    role.user = user.id.clone();
                }
            }
        }
        for acl in &mut doc.acls {
            for entry in &mut acl.entries {
                if entry.acl.is_empty() {
                    entry.acl = acl.id.clone();
                }
            }
        }

        Self::from_document(doc)
    }

    /// Load and validate a JSON model file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to the JSON document format accepted by [`Self::from_json_str`]
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }

    fn from_document(doc: ModelDocument) -> Result<Self> {
        let mut roles = HashMap::new();
        for (user_pos, user) in doc.users.iter().enumerate() {
            for (role_pos, role) in user.roles.iter().enumerate() {
                if roles.insert(role.id.clone(), (user_pos, role_pos)).is_some() {
                    return Err(CoreError::DuplicateId {
                        kind: "role",
                        id: role.id.clone(),
                    });
                }
            }
        }

        let model = Self {
            tenants: index_of(&doc.tenants, "tenant", |t| &t.id)?,
            group_types: index_of(&doc.group_types, "group type", |t| &t.id)?,
            groups: index_of(&doc.groups, "group", |g| &g.id)?,
            positions: index_of(&doc.positions, "position", |p| &p.id)?,
            users: index_of(&doc.users, "user", |u| &u.id)?,
            roles,
            abstract_roles: index_of(&doc.abstract_roles, "abstract role", |r| &r.id)?,
            classes: index_of(&doc.classes, "class", |c| &c.id)?,
            states: index_of(&doc.states, "state", |s| &s.id)?,
            access_types: index_of(&doc.access_types, "access type", |a| &a.id)?,
            acls: index_of(&doc.acls, "acl", |a| &a.id)?,
            doc,
        };

        model.validate()?;

        debug!(
            users = model.doc.users.len(),
            groups = model.doc.groups.len(),
            acls = model.doc.acls.len(),
            "Security model loaded"
        );

        Ok(model)
    }

    /// Check every reference and every parent chain
    pub fn validate(&self) -> Result<()> {
        for tenant in &self.doc.tenants {
            if let Some(parent) = &tenant.parent {
                self.check_ref(&self.tenants, "tenant", parent, || format!("tenant {}", tenant.id))?;
            }
        }
        for tenant in &self.doc.tenants {
            self.check_acyclic("tenant", &tenant.id, |id| {
                self.tenant(id).and_then(|t| t.parent.as_deref())
            })?;
        }

        for group in &self.doc.groups {
            let owner = || format!("group {}", group.id);
            self.check_ref(&self.tenants, "tenant", &group.tenant, owner)?;
            if let Some(parent) = &group.parent {
                self.check_ref(&self.groups, "group", parent, owner)?;
            }
            if let Some(group_type) = &group.group_type {
                self.check_ref(&self.group_types, "group type", group_type, owner)?;
            }
        }
        for group in &self.doc.groups {
            self.check_acyclic("group", &group.id, |id| {
                self.group(id).and_then(|g| g.parent.as_deref())
            })?;
        }

        for user in &self.doc.users {
            if let Some(tenant) = &user.tenant {
                self.check_ref(&self.tenants, "tenant", tenant, || format!("user {}", user.id))?;
            }
            for role in &user.roles {
                let owner = || format!("role {}", role.id);
                if role.user != user.id {
                    return Err(CoreError::inconsistent_owner(format!(
                        "role {} names user '{}' but is held by user '{}'",
                        role.id, role.user, user.id
                    )));
                }
                if let Some(group) = &role.group {
                    self.check_ref(&self.groups, "group", group, owner)?;
                }
                if let Some(position) = &role.position {
                    self.check_ref(&self.positions, "position", position, owner)?;
                }
            }
        }

        for state in &self.doc.states {
            self.check_ref(&self.classes, "class", &state.class, || format!("state {}", state.id))?;
        }

        for acl in &self.doc.acls {
            let owner = || format!("acl {}", acl.id);
            if let Some(class) = &acl.class {
                self.check_ref(&self.classes, "class", class, owner)?;
            } else if !acl.is_stateless() {
                return Err(CoreError::inconsistent_owner(format!(
                    "stateful acl {} has no class",
                    acl.id
                )));
            }
            for state in acl.states() {
                self.check_ref(&self.states, "state", state, owner)?;
            }

            let mut seen = HashSet::new();
            for entry in &acl.entries {
                if !seen.insert(entry.id.as_str()) {
                    return Err(CoreError::DuplicateId {
                        kind: "ace",
                        id: entry.id.clone(),
                    });
                }
                if entry.acl != acl.id {
                    return Err(CoreError::inconsistent_owner(format!(
                        "ace {} names acl '{}' but belongs to acl '{}'",
                        entry.id, entry.acl, acl.id
                    )));
                }
                self.validate_entry(entry)?;
            }
        }

        Ok(())
    }

    fn validate_entry(&self, entry: &AccessControlEntry) -> Result<()> {
        let owner = || format!("ace {}", entry.id);

        if let TenantCondition::SpecificTenant { tenant } = &entry.tenant_condition {
            self.check_ref(&self.tenants, "tenant", tenant, owner)?;
        }
        match &entry.group_condition {
            GroupCondition::SpecificGroup { group } => {
                self.check_ref(&self.groups, "group", group, owner)?;
            }
            GroupCondition::AnyGroupWithType { group_type }
            | GroupCondition::BranchOfOwningGroup { group_type } => {
                self.check_ref(&self.group_types, "group type", group_type, owner)?;
            }
            GroupCondition::None | GroupCondition::OwningGroup => {}
        }
        match &entry.user_condition {
            UserCondition::SpecificUser { user } => {
                self.check_ref(&self.users, "user", user, owner)?;
            }
            UserCondition::SpecificPosition { position } => {
                self.check_ref(&self.positions, "position", position, owner)?;
            }
            UserCondition::None | UserCondition::Owner => {}
        }
        if let AbstractRoleCondition::Specific { abstract_role } = &entry.abstract_role_condition {
            self.check_ref(&self.abstract_roles, "abstract role", abstract_role, owner)?;
        }
        for access_type in entry.allowed.iter().chain(entry.denied.iter()) {
            self.check_ref(&self.access_types, "access type", access_type, owner)?;
        }

        Ok(())
    }

    fn check_ref(
        &self,
        index: &HashMap<String, usize>,
        kind: &'static str,
        id: &str,
        referenced_by: impl Fn() -> String,
    ) -> Result<()> {
        if index.contains_key(id) {
            Ok(())
        } else {
            Err(CoreError::unknown_reference(kind, id, referenced_by()))
        }
    }

    fn check_acyclic<'a>(
        &'a self,
        kind: &'static str,
        start: &'a str,
        parent_of: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<()> {
        let mut visited = HashSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(CoreError::HierarchyCycle {
                    kind,
                    id: start.to_string(),
                });
            }
            current = parent_of(id);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn tenant(&self, id: &str) -> Option<&Tenant> {
        self.tenants.get(id).map(|&i| &self.doc.tenants[i])
    }

    pub fn group_type(&self, id: &str) -> Option<&GroupType> {
        self.group_types.get(id).map(|&i| &self.doc.group_types[i])
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id).map(|&i| &self.doc.groups[i])
    }

    pub fn position(&self, id: &str) -> Option<&Position> {
        self.positions.get(id).map(|&i| &self.doc.positions[i])
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id).map(|&i| &self.doc.users[i])
    }

    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles
            .get(id)
            .map(|&(user, role)| &self.doc.users[user].roles[role])
    }

    pub fn abstract_role(&self, id: &str) -> Option<&AbstractRole> {
        self.abstract_roles.get(id).map(|&i| &self.doc.abstract_roles[i])
    }

    pub fn class(&self, id: &str) -> Option<&SecurableClass> {
        self.classes.get(id).map(|&i| &self.doc.classes[i])
    }

    pub fn state(&self, id: &str) -> Option<&StateDefinition> {
        self.states.get(id).map(|&i| &self.doc.states[i])
    }

    pub fn access_type(&self, id: &str) -> Option<&AccessType> {
        self.access_types.get(id).map(|&i| &self.doc.access_types[i])
    }

    pub fn acl(&self, id: &str) -> Option<&AccessControlList> {
        self.acls.get(id).map(|&i| &self.doc.acls[i])
    }

    /// Like [`Self::user`] but failing with `NotFound`
    pub fn require_user(&self, id: &str) -> Result<&User> {
        self.user(id).ok_or_else(|| CoreError::not_found("user", id))
    }

    /// Like [`Self::acl`] but failing with `NotFound`
    pub fn require_acl(&self, id: &str) -> Result<&AccessControlList> {
        self.acl(id).ok_or_else(|| CoreError::not_found("acl", id))
    }

    /// All users in model order
    pub fn users(&self) -> &[User] {
        &self.doc.users
    }

    /// All access-control lists in model order
    pub fn acls(&self) -> &[AccessControlList] {
        &self.doc.acls
    }

    pub fn groups(&self) -> &[Group] {
        &self.doc.groups
    }

    pub fn tenants(&self) -> &[Tenant] {
        &self.doc.tenants
    }

    // ------------------------------------------------------------------
    // Hierarchies
    // ------------------------------------------------------------------

    /// The group followed by its ancestors, closest first
    ///
    /// Empty if the group is unknown. Stops at the first repeated group.
    pub fn group_chain(&self, id: &str) -> Vec<&Group> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.group(id);
        while let Some(group) = current {
            if !visited.insert(group.id.as_str()) {
                break;
            }
            chain.push(group);
            current = group.parent.as_deref().and_then(|p| self.group(p));
        }
        chain
    }

    /// The tenant followed by its ancestors, closest first
    pub fn tenant_chain(&self, id: &str) -> Vec<&Tenant> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.tenant(id);
        while let Some(tenant) = current {
            if !visited.insert(tenant.id.as_str()) {
                break;
            }
            chain.push(tenant);
            current = tenant.parent.as_deref().and_then(|p| self.tenant(p));
        }
        chain
    }

    /// Whether `ancestor` is a strict ancestor of `group`
    pub fn is_group_ancestor(&self, ancestor: &str, group: &str) -> bool {
        self.group_chain(group)
            .iter()
            .skip(1)
            .any(|g| g.id == ancestor)
    }

    /// Whether `ancestor` is a strict ancestor of `tenant`
    pub fn is_tenant_ancestor(&self, ancestor: &str, tenant: &str) -> bool {
        self.tenant_chain(tenant)
            .iter()
            .skip(1)
            .any(|t| t.id == ancestor)
    }
}

impl DisplayLabels for SecurityModel {
    fn user_label(&self, user: &str) -> Option<String> {
        self.user(user).map(User::display_name)
    }

    fn role_group_label(&self, role: &str) -> Option<String> {
        self.role(role)
            .and_then(|r| r.group.as_deref())
            .and_then(|g| self.group(g))
            .map(|g| g.display_name().to_string())
    }

    fn role_position_label(&self, role: &str) -> Option<String> {
        self.role(role)
            .and_then(|r| r.position.as_deref())
            .and_then(|p| self.position(p))
            .map(|p| p.name.clone())
    }

    fn class_label(&self, class: &str) -> Option<String> {
        self.class(class).map(|c| c.name.clone())
    }
}

/// Programmatic model construction
#[derive(Debug, Default)]
pub struct SecurityModelBuilder {
    doc: ModelDocument,
}

impl SecurityModelBuilder {
    pub fn tenant(mut self, tenant: Tenant) -> Self {
        self.doc.tenants.push(tenant);
        self
    }

    pub fn group_type(mut self, group_type: GroupType) -> Self {
        self.doc.group_types.push(group_type);
        self
    }

    pub fn group(mut self, group: Group) -> Self {
        self.doc.groups.push(group);
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.doc.positions.push(position);
        self
    }

    pub fn user(mut self, user: User) -> Self {
        self.doc.users.push(user);
        self
    }

    pub fn abstract_role(mut self, abstract_role: AbstractRole) -> Self {
        self.doc.abstract_roles.push(abstract_role);
        self
    }

    pub fn class(mut self, class: SecurableClass) -> Self {
        self.doc.classes.push(class);
        self
    }

    pub fn state(mut self, state: StateDefinition) -> Self {
        self.doc.states.push(state);
        self
    }

    pub fn access_type(mut self, access_type: AccessType) -> Self {
        self.doc.access_types.push(access_type);
        self
    }

    pub fn acl(mut self, acl: AccessControlList) -> Self {
        self.doc.acls.push(acl);
        self
    }

    /// Index and validate
    pub fn build(self) -> Result<SecurityModel> {
        SecurityModel::from_document(self.doc)
    }
}
