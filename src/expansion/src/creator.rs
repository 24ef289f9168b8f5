//! Entry creation
//!
//! Turns one (role, entry) combination into at most one expansion entry:
//! build the probe, let the evaluator decide, and keep the result only when
//! the probed entry itself contributed and something is allowed.

use crate::entry::AclExpansionEntry;
use crate::error::{ExpansionError, Result};
use crate::finder::UserRoleAclAceCombination;
use crate::probe::{AclProbe, ProbeBuilder};
use aclx_core::{
    AccessControlList, AccessEvaluator, ClassId, EvaluationContext, PrincipalRole, Role,
    SecurityModel,
};
use tracing::{debug, trace};

/// What became of one combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The probed entry grants something through this probe
    Created(AclExpansionEntry),
    /// Something else in the list decided; the probed entry did not take part
    NotContributing,
    /// The probed entry took part but nothing is allowed
    NothingAllowed,
}

impl EntryOutcome {
    pub fn into_entry(self) -> Option<AclExpansionEntry> {
        match self {
            EntryOutcome::Created(entry) => Some(entry),
            EntryOutcome::NotContributing | EntryOutcome::NothingAllowed => None,
        }
    }
}

/// Class an entry is reported under; `None` for stateless lists
pub fn derive_class(acl: &AccessControlList) -> Option<ClassId> {
    if acl.is_stateless() {
        None
    } else {
        acl.class.clone()
    }
}

/// Creates expansion entries for combinations over one model
pub struct AclExpansionEntryCreator<'m, E: AccessEvaluator + ?Sized> {
    probes: ProbeBuilder<'m>,
    evaluator: &'m E,
}

impl<'m, E: AccessEvaluator + ?Sized> AclExpansionEntryCreator<'m, E> {
    pub fn new(model: &'m SecurityModel, evaluator: &'m E) -> Self {
        Self {
            probes: ProbeBuilder::new(model),
            evaluator,
        }
    }

    pub fn probes(&self) -> &ProbeBuilder<'m> {
        &self.probes
    }

    /// The expansion entry for `combination`, if it grants anything
    ///
    /// Requires `ctx` to be active. The combination's user and list are
    /// resolved in the creator's model; a combination drawn from lists or
    /// users outside it fails with [`CoreError::NotFound`].
    ///
    /// [`CoreError::NotFound`]: aclx_core::CoreError::NotFound
    pub fn create_entry(
        &self,
        ctx: &EvaluationContext<'_>,
        combination: &UserRoleAclAceCombination<'_>,
    ) -> Result<Option<AclExpansionEntry>> {
        self.evaluate_combination(ctx, combination)
            .map(EntryOutcome::into_entry)
    }

    /// Like [`create_entry`](Self::create_entry), but says why nothing was created
    pub fn evaluate_combination(
        &self,
        ctx: &EvaluationContext<'_>,
        combination: &UserRoleAclAceCombination<'_>,
    ) -> Result<EntryOutcome> {
        ctx.ensure_active()?;

        let model = self.probes.model();
        let role = combination.role();
        let ace = combination.ace();
        let user = model.require_user(combination.user_id())?;
        let acl = model.require_acl(combination.acl_id())?;

        let probe = self.probes.build_probe(user, role, ace)?;
        check_probe_role(&probe, role)?;

        let evaluation = self.evaluator.evaluate(ctx, &probe.token, acl)?;

        if !evaluation.statistics.is_contributing(&ace.id) {
            trace!(role = %role.id, ace = %ace.id, "entry did not contribute");
            return Ok(EntryOutcome::NotContributing);
        }
        if evaluation.allowed.is_empty() {
            trace!(role = %role.id, ace = %ace.id, "nothing allowed");
            return Ok(EntryOutcome::NothingAllowed);
        }

        debug!(
            user = %user.id,
            role = %role.id,
            acl = %acl.id,
            ace = %ace.id,
            allowed = evaluation.allowed.len(),
            "expansion entry created"
        );

        Ok(EntryOutcome::Created(AclExpansionEntry::new(
            user.id.clone(),
            role.id.clone(),
            acl.id.clone(),
            derive_class(acl),
            acl.states().to_vec(),
            probe.conditions,
            evaluation.allowed,
            evaluation.denied,
        )))
    }
}

/// The token must carry exactly the probed (position, group)
fn check_probe_role(probe: &AclProbe, role: &Role) -> Result<()> {
    let roles = &probe.token.principal.roles;
    let expected = match (&role.position, &role.group) {
        (Some(position), Some(group)) => PrincipalRole::new(position.clone(), group.clone()),
        _ => {
            return Err(ExpansionError::ProbeInvariant(format!(
                "probe built for incomplete role {}",
                role.id
            )))
        }
    };

    match roles.as_slice() {
        [only] if *only == expected => Ok(()),
        [only] => Err(ExpansionError::ProbeInvariant(format!(
            "probe for role {} carries ({}, {}) instead of ({}, {})",
            role.id, only.position, only.group, expected.position, expected.group
        ))),
        _ => Err(ExpansionError::ProbeInvariant(format!(
            "probe for role {} carries {} roles",
            role.id,
            roles.len()
        ))),
    }
}
