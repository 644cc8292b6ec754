use std::fmt;
use std::sync::Arc;

use crate::plan::{PlanBuilder, PlanId};
use crate::types::TypeExpr;

/// Facts about one decoration decision, handed to predicates and decorator
/// type factories.
///
/// A snapshot is taken before every candidate decorator is evaluated, so the
/// second decorator of a chain sees the first in
/// [`applied_decorators`](Self::applied_decorators) and a plan that already
/// contains it. Decorators that take a `DecoratorContext` constructor
/// parameter receive the snapshot taken when they were applied.
#[derive(Clone)]
pub struct DecoratorPredicateContext {
    service_type: TypeExpr,
    implementation_type: TypeExpr,
    plan: PlanId,
    plan_description: Arc<str>,
    applied_decorators: Arc<[TypeExpr]>,
}

impl DecoratorPredicateContext {
    pub(crate) fn snapshot(
        service_type: &TypeExpr,
        implementation_type: Option<&TypeExpr>,
        plan: PlanId,
        builder: &PlanBuilder,
        applied: &[TypeExpr],
    ) -> Self {
        DecoratorPredicateContext {
            service_type: service_type.clone(),
            implementation_type: implementation_type.unwrap_or(service_type).clone(),
            plan,
            plan_description: Arc::from(builder.describe(plan)),
            applied_decorators: Arc::from(applied),
        }
    }

    /// The closed service type being resolved.
    pub fn service_type(&self) -> &TypeExpr {
        &self.service_type
    }

    /// The concrete type behind the service, or the service type itself when
    /// the base instance comes from a factory closure.
    pub fn implementation_type(&self) -> &TypeExpr {
        &self.implementation_type
    }

    /// Handle of the plan node that would be wrapped. Differs between two
    /// decisions of the same chain once a decorator has been applied.
    pub fn plan(&self) -> PlanId {
        self.plan
    }

    /// Nested textual form of [`plan`](Self::plan).
    pub fn plan_description(&self) -> &str {
        &self.plan_description
    }

    /// Closed decorator types applied so far, innermost first.
    pub fn applied_decorators(&self) -> &[TypeExpr] {
        &self.applied_decorators
    }
}

impl fmt::Debug for DecoratorPredicateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorPredicateContext")
            .field("service_type", &self.service_type)
            .field("implementation_type", &self.implementation_type)
            .field("plan", &self.plan_description)
            .field("applied_decorators", &self.applied_decorators)
            .finish()
    }
}
