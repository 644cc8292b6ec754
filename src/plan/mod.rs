//! Construction plans: an arena of nodes describing how an instance is built.
//!
//! Each [`InstanceProducer`](crate::InstanceProducer) owns one
//! [`ConstructionPlan`]. Nodes reference each other by [`PlanId`] inside the
//! same arena; dependencies on other services are edges to their producers.
//! A plan is immutable once built and can be run by any number of threads.

mod activation;
pub(crate) mod caching;
pub(crate) mod graph;

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::decoration::DecoratorPredicateContext;
use crate::error::{DiError, DiResult};
use crate::initialization::InstanceInitializer;
use crate::lifestyle::Lifestyle;
use crate::provider::{InstanceProducer, ServiceProvider};
use crate::registration::ServiceFactory;
use crate::types::{Activator, TypeExpr};
use crate::AnyArc;

pub use activation::{Activation, Argument, InstanceFactory};
use caching::Cache;

/// Handle of a node inside one construction plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanId(u32);

impl PlanId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) enum PlanNode {
    /// Runs an activator with the given constructor arguments.
    Construct {
        implementation: TypeExpr,
        activator: Activator,
        args: Vec<PlanArg>,
        /// Run on the new instance, in registration order.
        initializers: Vec<InstanceInitializer>,
    },
    /// Calls a registered factory closure.
    Delegate {
        service_type: TypeExpr,
        factory: ServiceFactory,
    },
    Instance(AnyArc),
    /// Runs every element plan and yields a `Vec<AnyArc>`.
    Collection(Vec<PlanId>),
    /// Delegates to another service's producer.
    Dependency(Arc<InstanceProducer>),
    Cached {
        inner: PlanId,
        lifestyle: Lifestyle,
        cache: Cache,
    },
}

#[derive(Clone)]
pub(crate) enum PlanArg {
    Value(PlanId),
    /// A factory that re-runs `plan` on every call.
    Deferred { service_type: TypeExpr, plan: PlanId },
    Context(Arc<DecoratorPredicateContext>),
}

/// Builds the node arena of one plan.
#[derive(Default)]
pub(crate) struct PlanBuilder {
    nodes: Vec<PlanNode>,
}

impl PlanBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, node: PlanNode) -> PlanId {
        let id = PlanId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn describe(&self, id: PlanId) -> String {
        describe(&self.nodes, id)
    }

    pub(crate) fn finish(self, root: PlanId) -> ConstructionPlan {
        ConstructionPlan {
            nodes: self.nodes,
            root,
        }
    }
}

/// An immutable, runnable construction plan.
pub struct ConstructionPlan {
    nodes: Vec<PlanNode>,
    root: PlanId,
}

impl ConstructionPlan {
    pub fn root(&self) -> PlanId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nested textual form of the plan, outermost node first.
    ///
    /// `Singleton(LogDecorator<RealCommand>(TransactionDecorator<RealCommand>(StubHandler)))`
    pub fn describe(&self) -> String {
        describe(&self.nodes, self.root)
    }

    /// Nested textual form of the sub-plan rooted at `id`.
    pub fn describe_node(&self, id: PlanId) -> Option<String> {
        (id.index() < self.nodes.len()).then(|| describe(&self.nodes, id))
    }

    /// Roots of the sub-plans handed to decorators as `Func<Service>`
    /// factories.
    pub(crate) fn deferred_plans(&self) -> Vec<PlanId> {
        let mut out = Vec::new();
        for node in &self.nodes {
            if let PlanNode::Construct { args, .. } = node {
                for arg in args {
                    if let PlanArg::Deferred { plan, .. } = arg {
                        out.push(*plan);
                    }
                }
            }
        }
        out
    }

    pub(crate) fn run(self: &Arc<Self>, id: PlanId, provider: &ServiceProvider) -> DiResult<AnyArc> {
        match &self.nodes[id.index()] {
            PlanNode::Construct {
                implementation,
                activator,
                args,
                initializers,
            } => {
                let mut values: SmallVec<[Argument; 4]> = SmallVec::with_capacity(args.len());
                for arg in args {
                    values.push(match arg {
                        PlanArg::Value(inner) => Argument::Instance(self.run(*inner, provider)?),
                        PlanArg::Deferred { service_type, plan } => Argument::Factory(InstanceFactory::new(
                            service_type.clone(),
                            Arc::downgrade(self),
                            *plan,
                            provider.downgrade(),
                        )),
                        PlanArg::Context(context) => Argument::Context(Arc::clone(context)),
                    });
                }
                let instance = activator(&Activation::new(implementation, &values))?;
                for initialize in initializers {
                    initialize(&instance, implementation).map_err(|e| {
                        DiError::caused_by(
                            implementation,
                            format!("An initializer registered for {} failed. {}", implementation, e),
                            e,
                        )
                    })?;
                }
                Ok(instance)
            }
            PlanNode::Delegate { service_type, factory } => factory(provider).map_err(|e| match e {
                DiError::Activation { .. } => e,
                other => DiError::caused_by(
                    service_type,
                    format!("Creating the instance for type {} failed. {}", service_type, other),
                    other,
                ),
            }),
            PlanNode::Instance(value) => Ok(Arc::clone(value)),
            PlanNode::Collection(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.run(*item, provider)?);
                }
                Ok(Arc::new(out) as AnyArc)
            }
            PlanNode::Dependency(producer) => producer.instance_with(provider),
            PlanNode::Cached { inner, cache, .. } => cache.get_or_create(|| self.run(*inner, provider)),
        }
    }
}

impl fmt::Debug for ConstructionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionPlan")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("plan", &self.describe())
            .finish()
    }
}

fn describe(nodes: &[PlanNode], id: PlanId) -> String {
    match &nodes[id.index()] {
        PlanNode::Construct { implementation, args, .. } => {
            if args.is_empty() {
                return implementation.to_string();
            }
            let args: Vec<String> = args
                .iter()
                .map(|arg| match arg {
                    PlanArg::Value(inner) => describe(nodes, *inner),
                    PlanArg::Deferred { plan, .. } => format!("() => {}", describe(nodes, *plan)),
                    PlanArg::Context(_) => "context".to_string(),
                })
                .collect();
            format!("{}({})", implementation, args.join(", "))
        }
        PlanNode::Delegate { service_type, .. } => format!("factory<{}>", service_type),
        PlanNode::Instance(_) => "instance".to_string(),
        PlanNode::Collection(items) => {
            let items: Vec<String> = items.iter().map(|i| describe(nodes, *i)).collect();
            format!("[{}]", items.join(", "))
        }
        PlanNode::Dependency(producer) => producer.service_type().to_string(),
        PlanNode::Cached { inner, lifestyle, .. } => format!("{}({})", lifestyle, describe(nodes, *inner)),
    }
}
