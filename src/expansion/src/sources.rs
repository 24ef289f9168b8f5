//! Model-backed user and list sources

use crate::finder::{AclSource, UserSource};
use aclx_core::{AccessControlList, ClassId, SecurityModel, User};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Selects users by name; an absent field matches everyone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
}

impl UserFilter {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.user_name.is_none()
    }

    pub fn matches(&self, user: &User) -> bool {
        fn field(wanted: &Option<String>, actual: Option<&str>) -> bool {
            wanted.as_deref().map_or(true, |w| actual == Some(w))
        }

        field(&self.first_name, user.first_name.as_deref())
            && field(&self.last_name, user.last_name.as_deref())
            && field(&self.user_name, Some(user.user_name.as_str()))
    }
}

/// Users of a model passing a [`UserFilter`], in model order
#[derive(Debug, Clone)]
pub struct UserFinder<'m> {
    model: &'m SecurityModel,
    filter: UserFilter,
}

impl<'m> UserFinder<'m> {
    pub fn new(model: &'m SecurityModel) -> Self {
        Self::with_filter(model, UserFilter::default())
    }

    pub fn with_filter(model: &'m SecurityModel, filter: UserFilter) -> Self {
        Self { model, filter }
    }

    pub fn filter(&self) -> &UserFilter {
        &self.filter
    }
}

impl<'m> UserSource<'m> for UserFinder<'m> {
    fn users(&self) -> Box<dyn Iterator<Item = &'m User> + '_> {
        let model: &'m SecurityModel = self.model;
        Box::new(model.users().iter().filter(move |u| self.filter.matches(u)))
    }
}

/// Lists of a model, optionally restricted to some classes
///
/// Stateless lists without a class are dropped by any class restriction.
#[derive(Debug, Clone)]
pub struct AclFinder<'m> {
    model: &'m SecurityModel,
    classes: Option<BTreeSet<ClassId>>,
}

impl<'m> AclFinder<'m> {
    pub fn new(model: &'m SecurityModel) -> Self {
        Self { model, classes: None }
    }

    pub fn with_classes(mut self, classes: impl IntoIterator<Item = impl Into<ClassId>>) -> Self {
        self.classes = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    fn accepts(&self, acl: &AccessControlList) -> bool {
        match (&self.classes, &acl.class) {
            (None, _) => true,
            (Some(classes), Some(class)) => classes.contains(class),
            (Some(_), None) => false,
        }
    }
}

impl<'m> AclSource<'m> for AclFinder<'m> {
    fn acls(&self) -> Box<dyn Iterator<Item = &'m AccessControlList> + '_> {
        let model: &'m SecurityModel = self.model;
        Box::new(model.acls().iter().filter(move |acl| self.accepts(acl)))
    }
}
