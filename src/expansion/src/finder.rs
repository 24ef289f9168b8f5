//! Combination enumeration
//!
//! Every (role, entry) pair reachable from a user population and a list
//! population, in product order: users, then each user's roles, then lists,
//! then each list's entries. Nothing is sorted, filtered or deduplicated
//! here; the sources are assumed duplicate-free.

use aclx_core::{AccessControlEntry, AccessControlList, AceId, AclId, Role, RoleId, User, UserId};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Yields users to expand
///
/// Each call to [`UserSource::users`] starts a fresh pass. Users must belong
/// to the model the combinations are later evaluated against.
pub trait UserSource<'m> {
    fn users(&self) -> Box<dyn Iterator<Item = &'m User> + '_>;
}

/// Yields access-control lists to expand
///
/// Each call to [`AclSource::acls`] starts a fresh pass. Lists must belong
/// to the model the combinations are later evaluated against; entry creation
/// resolves them by id and fails with `NotFound` otherwise.
pub trait AclSource<'m> {
    fn acls(&self) -> Box<dyn Iterator<Item = &'m AccessControlList> + '_>;
}

impl<'m> UserSource<'m> for &'m [User] {
    fn users(&self) -> Box<dyn Iterator<Item = &'m User> + '_> {
        let users: &'m [User] = *self;
        Box::new(users.iter())
    }
}

impl<'m> UserSource<'m> for [&'m User] {
    fn users(&self) -> Box<dyn Iterator<Item = &'m User> + '_> {
        Box::new(self.iter().copied())
    }
}

impl<'m> UserSource<'m> for Vec<&'m User> {
    fn users(&self) -> Box<dyn Iterator<Item = &'m User> + '_> {
        Box::new(self.iter().copied())
    }
}

impl<'m> AclSource<'m> for &'m [AccessControlList] {
    fn acls(&self) -> Box<dyn Iterator<Item = &'m AccessControlList> + '_> {
        let acls: &'m [AccessControlList] = *self;
        Box::new(acls.iter())
    }
}

impl<'m> AclSource<'m> for [&'m AccessControlList] {
    fn acls(&self) -> Box<dyn Iterator<Item = &'m AccessControlList> + '_> {
        Box::new(self.iter().copied())
    }
}

impl<'m> AclSource<'m> for Vec<&'m AccessControlList> {
    fn acls(&self) -> Box<dyn Iterator<Item = &'m AccessControlList> + '_> {
        Box::new(self.iter().copied())
    }
}

/// One role probed against one entry
///
/// Identity is the (role, entry) pair. Entry ids are only unique within
/// their list, so the entry is identified by (list, entry id); the user
/// holding the role plays no part in equality or hashing.
#[derive(Debug, Clone, Copy)]
pub struct UserRoleAclAceCombination<'m> {
    role: &'m Role,
    ace: &'m AccessControlEntry,
}

impl<'m> UserRoleAclAceCombination<'m> {
    pub fn new(role: &'m Role, ace: &'m AccessControlEntry) -> Self {
        Self { role, ace }
    }

    pub fn role(&self) -> &'m Role {
        self.role
    }

    pub fn ace(&self) -> &'m AccessControlEntry {
        self.ace
    }

    /// The user holding the role
    pub fn user_id(&self) -> &'m UserId {
        &self.role.user
    }

    /// The list owning the entry
    pub fn acl_id(&self) -> &'m AclId {
        &self.ace.acl
    }

    /// The role and qualified entry identifying this combination
    pub fn identity(&self) -> (&'m RoleId, &'m AclId, &'m AceId) {
        (&self.role.id, &self.ace.acl, &self.ace.id)
    }
}

impl PartialEq for UserRoleAclAceCombination<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for UserRoleAclAceCombination<'_> {}

impl Hash for UserRoleAclAceCombination<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Lazily enumerates (role, entry) combinations
pub struct UserRoleAclAceCombinationFinder<'s, 'm, U: ?Sized, A: ?Sized> {
    users: &'s U,
    acls: &'s A,
    _model: PhantomData<&'m ()>,
}

impl<'s, 'm, U, A> UserRoleAclAceCombinationFinder<'s, 'm, U, A>
where
    U: UserSource<'m> + ?Sized,
    A: AclSource<'m> + ?Sized,
    'm: 's,
{
    pub fn new(users: &'s U, acls: &'s A) -> Self {
        Self {
            users,
            acls,
            _model: PhantomData,
        }
    }

    /// Start a fresh enumeration
    ///
    /// Both sources are re-read on every call; two enumerations share no
    /// cursor state. Dropping the iterator early leaves nothing to clean up.
    pub fn combinations(&self) -> impl Iterator<Item = UserRoleAclAceCombination<'m>> + 's {
        let users = self.users;
        let acls = self.acls;
        users.users().flat_map(move |user| {
            user.roles.iter().flat_map(move |role| {
                acls.acls().flat_map(move |acl| {
                    acl.entries
                        .iter()
                        .map(move |ace| UserRoleAclAceCombination::new(role, ace))
                })
            })
        })
    }
}
