//! Applies decorator candidates to a base plan, in registration order.

use std::sync::Arc;

use tracing::trace;

use crate::error::{DiError, DiResult};
use crate::lifestyle::Lifestyle;
use crate::observer::SkipReason;
use crate::plan::caching::wrap_with_caching;
use crate::plan::graph::{construct, ConstructRequest};
use crate::plan::{PlanArg, PlanBuilder, PlanId};
use crate::provider::ServiceProvider;
use crate::relationships::KnownRelationship;
use crate::types::unify::{match_decorator, DecoratorMatch};
use crate::types::{builtins, TypeExpr};

use super::shape::{self, DecorateeForm};
use super::{Candidate, DecoratorPredicateContext, DecoratorRegistration, DecoratorSource, DecoratorTypeFactory};

pub(crate) struct DecorationRequest<'a> {
    pub(crate) service_type: &'a TypeExpr,
    pub(crate) implementation_type: Option<&'a TypeExpr>,
    pub(crate) plan: PlanId,
    pub(crate) lifestyle: Lifestyle,
}

pub(crate) struct Decorated {
    pub(crate) plan: PlanId,
    /// Lifestyle of the outermost layer.
    pub(crate) lifestyle: Lifestyle,
    pub(crate) applied: Vec<TypeExpr>,
    pub(crate) relationships: Vec<KnownRelationship>,
}

pub(crate) fn apply(
    builder: &mut PlanBuilder,
    request: DecorationRequest<'_>,
    candidates: &[Candidate],
    provider: &ServiceProvider,
) -> DiResult<Decorated> {
    let service_type = request.service_type;
    let observers = provider.observers();

    let mut plan = request.plan;
    let mut lifestyle = request.lifestyle;
    let mut applied: Vec<TypeExpr> = Vec::new();
    let mut relationships = Vec::new();

    for candidate in candidates {
        let registration = candidate.registration();
        let context = DecoratorPredicateContext::snapshot(
            service_type,
            request.implementation_type,
            plan,
            builder,
            &applied,
        );

        let decorator = match registration.source() {
            DecoratorSource::Fixed(_) => {
                let Some(closed) = candidate.closed_decorator() else {
                    continue;
                };
                if !registration.accepts(&context) {
                    skipped(provider, service_type, registration, SkipReason::PredicateRejected);
                    continue;
                }
                closed.clone()
            }
            DecoratorSource::Factory(factory) => {
                if !registration.accepts(&context) {
                    skipped(provider, service_type, registration, SkipReason::PredicateRejected);
                    continue;
                }
                match decorator_from_factory(factory, &context, registration, service_type)? {
                    Some(closed) => closed,
                    None => {
                        skipped(provider, service_type, registration, SkipReason::ConstraintViolation);
                        continue;
                    }
                }
            }
        };

        let shape = shape::validate(&decorator, service_type)
            .map_err(|e| DiError::activation(service_type, e.to_string()))?;

        let (decoratee, dependency, dependency_lifestyle) = match shape.form() {
            DecorateeForm::Direct => (PlanArg::Value(plan), service_type.clone(), lifestyle.clone()),
            DecorateeForm::Deferred => (
                PlanArg::Deferred {
                    service_type: service_type.clone(),
                    plan,
                },
                builtins::func_of(service_type.clone()),
                Lifestyle::Singleton,
            ),
        };
        let layer_lifestyle = registration.lifestyle();

        let (node, edges) = construct(
            builder,
            ConstructRequest {
                implementation: &decorator,
                lifestyle: layer_lifestyle,
                service_type,
                decoratee: Some((shape.decoratee_index(), decoratee)),
                context: Some(Arc::new(context)),
                relationships: vec![KnownRelationship::new(
                    decorator.clone(),
                    layer_lifestyle.clone(),
                    dependency,
                    dependency_lifestyle,
                )],
            },
            provider,
        )?;

        plan = wrap_with_caching(builder, node, layer_lifestyle);
        lifestyle = layer_lifestyle.clone();
        relationships.extend(edges);

        trace!(service = %service_type, decorator = %decorator, lifestyle = %lifestyle, "decorator applied");
        observers.decorator_applied(service_type, &decorator, &lifestyle);
        applied.push(decorator);
    }

    Ok(Decorated {
        plan,
        lifestyle,
        applied,
        relationships,
    })
}

/// Calls a decorator type factory and closes the returned type against the
/// request. `Ok(None)` means the type does not satisfy its constraints for
/// this request and is skipped.
fn decorator_from_factory(
    factory: &DecoratorTypeFactory,
    context: &DecoratorPredicateContext,
    registration: &DecoratorRegistration,
    service_type: &TypeExpr,
) -> DiResult<Option<TypeExpr>> {
    let returned = factory(context).ok_or_else(|| {
        DiError::activation(
            service_type,
            format!(
                "The decorator type factory delegate that was registered for service type {} returned null.",
                service_type
            ),
        )
    })?;

    let pattern = registration.service_pattern();
    let pattern_is_generic = pattern.def().is_some_and(|d| d.is_generic());
    if !returned.is_closed() && !pattern_is_generic {
        return Err(DiError::activation(
            service_type,
            format!(
                "The registered decorator type factory returned open generic type {} while the registered service type {} is not generic, making it impossible for a closed-generic decorator type to be constructed.",
                returned, pattern
            ),
        ));
    }

    match match_decorator(&returned, service_type) {
        DecoratorMatch::Matched(closed) => Ok(Some(closed)),
        DecoratorMatch::ConstraintViolation(reason) => {
            trace!(service = %service_type, decorator = %returned, %reason, "factory decorator skipped");
            Ok(None)
        }
        DecoratorMatch::Unresolvable(_) => Err(DiError::activation(
            service_type,
            format!(
                "The decorator type factory returned a type that can not be used. {} contains unresolvable type arguments. The type would never be resolved and is therefore not suited to be used as decorator.",
                returned
            ),
        )),
        DecoratorMatch::Unrelated => Err(DiError::activation(
            service_type,
            format!(
                "The registered decorator type factory returned type {} which does not implement {}.",
                returned, service_type
            ),
        )),
    }
}

fn skipped(provider: &ServiceProvider, service_type: &TypeExpr, registration: &DecoratorRegistration, reason: SkipReason) {
    trace!(service = %service_type, pattern = %registration.service_pattern(), ?reason, "decorator skipped");
    provider
        .observers()
        .decorator_skipped(service_type, registration, reason);
}
