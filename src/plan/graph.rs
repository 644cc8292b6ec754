//! Object-graph resolution: base plans and constructor auto-wiring.

use std::sync::Arc;

use crate::decoration::DecoratorPredicateContext;
use crate::error::{DiError, DiResult};
use crate::lifestyle::Lifestyle;
use crate::observer::PlanBuildingEvent;
use crate::provider::ServiceProvider;
use crate::registration::{ServiceRegistration, ServiceSource};
use crate::relationships::{self, KnownRelationship};
use crate::types::{builtins, Bindings, TypeExpr};

use super::caching::wrap_with_caching;
use super::{PlanArg, PlanBuilder, PlanId, PlanNode};

/// The undecorated plan of a registration.
pub(crate) struct BasePlan {
    pub(crate) plan: PlanId,
    pub(crate) lifestyle: Lifestyle,
    /// `None` when the instance comes from a factory closure.
    pub(crate) implementation_type: Option<TypeExpr>,
    pub(crate) relationships: Vec<KnownRelationship>,
}

/// What to auto-wire and which arguments are supplied by the caller.
pub(crate) struct ConstructRequest<'a> {
    pub(crate) implementation: &'a TypeExpr,
    pub(crate) lifestyle: &'a Lifestyle,
    /// The service the resulting node is built for; named in errors.
    pub(crate) service_type: &'a TypeExpr,
    /// Constructor index and argument of a decoratee.
    pub(crate) decoratee: Option<(usize, PlanArg)>,
    /// Injected into `DecoratorContext` parameters.
    pub(crate) context: Option<Arc<DecoratorPredicateContext>>,
    /// Edges already known for this node.
    pub(crate) relationships: Vec<KnownRelationship>,
}

pub(crate) fn build_base_plan(
    builder: &mut PlanBuilder,
    registration: &ServiceRegistration,
    provider: &ServiceProvider,
) -> DiResult<BasePlan> {
    let service_type = registration.service_type();
    let lifestyle = registration.lifestyle().clone();

    match registration.source() {
        ServiceSource::Type(implementation) => {
            let (node, relationships) = construct(
                builder,
                ConstructRequest {
                    implementation,
                    lifestyle: &lifestyle,
                    service_type,
                    decoratee: None,
                    context: None,
                    relationships: Vec::new(),
                },
                provider,
            )?;
            Ok(BasePlan {
                plan: wrap_with_caching(builder, node, &lifestyle),
                lifestyle,
                implementation_type: Some(implementation.clone()),
                relationships,
            })
        }
        ServiceSource::Instance {
            implementation_type,
            value,
        } => Ok(BasePlan {
            plan: builder.push(PlanNode::Instance(Arc::clone(value))),
            lifestyle: Lifestyle::Singleton,
            implementation_type: Some(implementation_type.clone()),
            relationships: Vec::new(),
        }),
        ServiceSource::Factory(factory) => {
            let node = builder.push(PlanNode::Delegate {
                service_type: service_type.clone(),
                factory: Arc::clone(factory),
            });
            Ok(BasePlan {
                plan: wrap_with_caching(builder, node, &lifestyle),
                lifestyle,
                implementation_type: None,
                relationships: Vec::new(),
            })
        }
        ServiceSource::Collection(elements) => {
            let mut items = Vec::with_capacity(elements.len());
            let mut relationships = Vec::new();
            for element in elements {
                let (node, edges) = construct(
                    builder,
                    ConstructRequest {
                        implementation: element,
                        lifestyle: &Lifestyle::Transient,
                        service_type,
                        decoratee: None,
                        context: None,
                        relationships: Vec::new(),
                    },
                    provider,
                )?;
                items.push(node);
                relationships.extend(edges);
            }
            let node = builder.push(PlanNode::Collection(items));
            Ok(BasePlan {
                plan: wrap_with_caching(builder, node, &lifestyle),
                lifestyle,
                implementation_type: Some(service_type.clone()),
                relationships,
            })
        }
    }
}

/// Auto-wires the single constructor of `request.implementation`.
///
/// Every parameter that is not the decoratee or a `DecoratorContext` is
/// resolved through the provider's producer for that type, which is built on
/// the way. Returns the construct node (without lifestyle caching) and the
/// relationships recorded for it.
pub(crate) fn construct(
    builder: &mut PlanBuilder,
    request: ConstructRequest<'_>,
    provider: &ServiceProvider,
) -> DiResult<(PlanId, Vec<KnownRelationship>)> {
    let implementation = request.implementation;
    let service_type = request.service_type;

    let def = implementation.def().ok_or_else(|| {
        DiError::activation(
            service_type,
            format!("The type {} is not a concrete type and can not be constructed.", implementation),
        )
    })?;
    let activator = def.activator().cloned().ok_or_else(|| {
        DiError::activation(
            service_type,
            format!("The type {} can not be constructed because it has no activator.", implementation),
        )
    })?;
    let constructor = match def.constructors() {
        [single] => single,
        others => {
            return Err(DiError::activation(
                service_type,
                format!(
                    "For the container to be able to create {} it should contain exactly one public constructor, but it has {}.",
                    implementation,
                    others.len()
                ),
            ))
        }
    };

    let bindings = Bindings::for_expr(implementation);
    let context_type = builtins::decorator_context_type();
    let mut relationships = request.relationships;
    let mut args = Vec::with_capacity(constructor.params().len());

    for (index, param) in constructor.params().iter().enumerate() {
        if let Some((decoratee_index, decoratee)) = &request.decoratee {
            if *decoratee_index == index {
                args.push(decoratee.clone());
                continue;
            }
        }

        let ty = param.ty().substitute(&bindings);
        if ty == context_type {
            let context = request.context.as_ref().ok_or_else(|| {
                DiError::activation(
                    service_type,
                    format!(
                        "The constructor of type {} contains a parameter of type {} with name '{}'. {} can only be injected into decorators.",
                        implementation,
                        ty,
                        param.name(),
                        ty
                    ),
                )
            })?;
            args.push(PlanArg::Context(Arc::clone(context)));
            continue;
        }

        let producer = provider.producer_for(&ty).map_err(|e| {
            DiError::caused_by(
                service_type,
                format!(
                    "The constructor of type {} contains the parameter of type {} with name '{}' that is not registered. Please ensure {} is registered.",
                    implementation,
                    ty,
                    param.name(),
                    ty
                ),
                e,
            )
        })?;
        let built = producer.built_with(provider).map_err(|e| {
            DiError::caused_by(
                service_type,
                format!(
                    "The constructor of type {} depends on {}, which could not be built. {}",
                    implementation, ty, e
                ),
                e,
            )
        })?;

        relationships.push(KnownRelationship::new(
            implementation.clone(),
            request.lifestyle.clone(),
            ty,
            built.lifestyle().clone(),
        ));
        args.push(PlanArg::Value(builder.push(PlanNode::Dependency(producer))));
    }

    let node = builder.push(PlanNode::Construct {
        implementation: implementation.clone(),
        activator,
        args,
        initializers: provider.initializers().matching(implementation),
    });

    let mut event = PlanBuildingEvent::new(service_type, implementation, node, &mut relationships);
    provider.observers().plan_building(&mut event);
    relationships::dedup(&mut relationships);

    Ok((node, relationships))
}
