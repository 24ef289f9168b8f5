//! Scoped evaluation context
//!
//! Evaluation reads the security model through an explicit context instead
//! of ambient state. A context is active only while a [`ContextGuard`] from
//! [`EvaluationContext::enter`] is alive; dropping the guard releases it on
//! every exit path, including an enumeration abandoned half way.

use crate::error::{CoreError, Result};
use crate::model::SecurityModel;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Read-only view of one security model for the duration of one expansion run
#[derive(Debug)]
pub struct EvaluationContext<'m> {
    model: &'m SecurityModel,
    depth: AtomicUsize,
}

impl<'m> EvaluationContext<'m> {
    /// Create an inactive context over `model`
    pub fn new(model: &'m SecurityModel) -> Self {
        Self {
            model,
            depth: AtomicUsize::new(0),
        }
    }

    /// Activate the context until the returned guard is dropped
    ///
    /// Guards nest; the context stays active while any guard is alive.
    pub fn enter(&self) -> ContextGuard<'_, 'm> {
        self.depth.fetch_add(1, Ordering::AcqRel);
        ContextGuard { context: self }
    }

    /// Run `f` with the context active
    pub fn scope<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _guard = self.enter();
        f(self)
    }

    pub fn is_active(&self) -> bool {
        self.depth.load(Ordering::Acquire) > 0
    }

    /// The model, if the context is active
    pub fn ensure_active(&self) -> Result<&'m SecurityModel> {
        if self.is_active() {
            Ok(self.model)
        } else {
            Err(CoreError::NoActiveContext)
        }
    }

    /// The model regardless of activity
    pub fn model(&self) -> &'m SecurityModel {
        self.model
    }
}

/// Keeps an [`EvaluationContext`] active while alive
#[derive(Debug)]
pub struct ContextGuard<'c, 'm> {
    context: &'c EvaluationContext<'m>,
}

impl Drop for ContextGuard<'_, '_> {
    fn drop(&mut self) {
        self.context.depth.fetch_sub(1, Ordering::AcqRel);
    }
}
