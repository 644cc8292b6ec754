use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::decoration::DecoratorPredicateContext;
use crate::error::{DiError, DiResult};
use crate::provider::WeakProvider;
use crate::types::TypeExpr;
use crate::AnyArc;

use super::{ConstructionPlan, PlanId};

/// A resolved constructor argument.
#[derive(Clone)]
pub enum Argument {
    Instance(AnyArc),
    /// Supplied for `Func<Service>` parameters.
    Factory(InstanceFactory),
    /// Supplied for `DecoratorContext` parameters.
    Context(Arc<DecoratorPredicateContext>),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Instance(_) => f.write_str("Instance"),
            Argument::Factory(factory) => write!(f, "Factory({})", factory.service_type()),
            Argument::Context(context) => write!(f, "Context({})", context.service_type()),
        }
    }
}

/// Input to an [`Activator`](crate::types::Activator): the closed type being
/// constructed and its arguments in constructor order.
pub struct Activation<'a> {
    implementation: &'a TypeExpr,
    arguments: &'a [Argument],
}

impl<'a> Activation<'a> {
    pub(crate) fn new(implementation: &'a TypeExpr, arguments: &'a [Argument]) -> Self {
        Activation {
            implementation,
            arguments,
        }
    }

    pub fn implementation_type(&self) -> &TypeExpr {
        self.implementation
    }

    pub fn arguments(&self) -> &[Argument] {
        self.arguments
    }

    pub fn instance(&self, index: usize) -> DiResult<AnyArc> {
        match self.arguments.get(index) {
            Some(Argument::Instance(value)) => Ok(Arc::clone(value)),
            _ => Err(self.mismatch(index, "instance")),
        }
    }

    /// The instance argument at `index`, downcast to `T`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> DiResult<Arc<T>> {
        self.instance(index)?
            .downcast::<T>()
            .map_err(|_| self.mismatch(index, std::any::type_name::<T>()))
    }

    pub fn factory(&self, index: usize) -> DiResult<InstanceFactory> {
        match self.arguments.get(index) {
            Some(Argument::Factory(factory)) => Ok(factory.clone()),
            _ => Err(self.mismatch(index, "factory")),
        }
    }

    pub fn context(&self, index: usize) -> DiResult<Arc<DecoratorPredicateContext>> {
        match self.arguments.get(index) {
            Some(Argument::Context(context)) => Ok(Arc::clone(context)),
            _ => Err(self.mismatch(index, "decorator context")),
        }
    }

    fn mismatch(&self, index: usize, expected: &str) -> DiError {
        DiError::TypeMismatch(format!(
            "argument {} of {} is not a {}",
            index, self.implementation, expected
        ))
    }
}

/// Produces instances of the wrapped service on demand.
///
/// Handed to decorators that take `Func<Service>`. Every call to
/// [`create`](Self::create) runs the decoratee's plan again, so a transient
/// decoratee yields a new instance each time while cached layers inside the
/// plan still share theirs.
#[derive(Clone)]
pub struct InstanceFactory {
    service_type: TypeExpr,
    plan: Weak<ConstructionPlan>,
    node: PlanId,
    provider: WeakProvider,
}

impl InstanceFactory {
    pub(crate) fn new(service_type: TypeExpr, plan: Weak<ConstructionPlan>, node: PlanId, provider: WeakProvider) -> Self {
        InstanceFactory {
            service_type,
            plan,
            node,
            provider,
        }
    }

    pub fn service_type(&self) -> &TypeExpr {
        &self.service_type
    }

    pub fn create(&self) -> DiResult<AnyArc> {
        let provider = self.provider.upgrade().ok_or(DiError::Disposed)?;
        let plan = self.plan.upgrade().ok_or(DiError::Disposed)?;
        plan.run(self.node, &provider)
    }

    pub fn create_as<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.create()?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }
}

impl fmt::Debug for InstanceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceFactory")
            .field("service_type", &self.service_type)
            .field("node", &self.node)
            .finish()
    }
}
