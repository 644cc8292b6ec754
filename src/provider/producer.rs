use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use tracing::{debug, debug_span};

use crate::decoration::pipeline::{self, DecorationRequest};
use crate::error::{DiError, DiResult};
use crate::internal::BuildGuard;
use crate::lifestyle::Lifestyle;
use crate::plan::graph::build_base_plan;
use crate::plan::{ConstructionPlan, PlanBuilder};
use crate::registration::ServiceRegistration;
use crate::relationships::{self, KnownRelationship};
use crate::types::TypeExpr;
use crate::AnyArc;

use super::{ServiceProvider, WeakProvider};

/// Builds and runs the decorated plan of one service type.
///
/// The plan, including every decorator decision, is built on first use and
/// at most once: concurrent first resolutions wait for a single build, so
/// predicates and decorator type factories run once per producer.
pub struct InstanceProducer {
    registration: Arc<ServiceRegistration>,
    provider: WeakProvider,
    built: OnceCell<Arc<BuiltProducer>>,
}

pub(crate) struct BuiltProducer {
    plan: Arc<ConstructionPlan>,
    lifestyle: Lifestyle,
    implementation_type: TypeExpr,
    applied: Vec<TypeExpr>,
    relationships: Vec<KnownRelationship>,
}

impl BuiltProducer {
    pub(crate) fn lifestyle(&self) -> &Lifestyle {
        &self.lifestyle
    }

    pub(crate) fn applied(&self) -> &[TypeExpr] {
        &self.applied
    }

    pub(crate) fn relationships(&self) -> &[KnownRelationship] {
        &self.relationships
    }
}

impl InstanceProducer {
    pub(crate) fn new(registration: Arc<ServiceRegistration>, provider: WeakProvider) -> Self {
        InstanceProducer {
            registration,
            provider,
            built: OnceCell::new(),
        }
    }

    pub fn service_type(&self) -> &TypeExpr {
        self.registration.service_type()
    }

    pub fn registration(&self) -> &ServiceRegistration {
        &self.registration
    }

    pub fn is_built(&self) -> bool {
        self.built.get().is_some()
    }

    pub fn get_instance(&self) -> DiResult<AnyArc> {
        let provider = self.provider()?;
        self.instance_with(&provider)
    }

    /// Lifestyle of the outermost decorator, or of the registration when no
    /// decorator applies.
    pub fn lifestyle(&self) -> DiResult<Lifestyle> {
        Ok(self.built()?.lifestyle.clone())
    }

    pub fn implementation_type(&self) -> DiResult<TypeExpr> {
        Ok(self.built()?.implementation_type.clone())
    }

    pub fn applied_decorators(&self) -> DiResult<Vec<TypeExpr>> {
        Ok(self.built()?.applied.clone())
    }

    pub fn relationships(&self) -> DiResult<Vec<KnownRelationship>> {
        Ok(self.built()?.relationships.clone())
    }

    pub fn plan(&self) -> DiResult<Arc<ConstructionPlan>> {
        Ok(Arc::clone(&self.built()?.plan))
    }

    /// Builds the plan and creates one instance through it. Decoratee plans
    /// handed out as `Func<Service>` factories are run once as well.
    pub fn verify(&self) -> DiResult<()> {
        let provider = self.provider()?;
        self.verify_with(&provider)
    }

    fn provider(&self) -> DiResult<ServiceProvider> {
        self.provider.upgrade().ok_or(DiError::Disposed)
    }

    fn built(&self) -> DiResult<Arc<BuiltProducer>> {
        let provider = self.provider()?;
        self.built_with(&provider)
    }

    pub(crate) fn built_with(&self, provider: &ServiceProvider) -> DiResult<Arc<BuiltProducer>> {
        if let Some(built) = self.built.get() {
            return Ok(Arc::clone(built));
        }
        let _guard = BuildGuard::enter(self.service_type(), provider.options().max_build_depth)?;
        self.built
            .get_or_try_init(|| self.build(provider).map(Arc::new))
            .map(Arc::clone)
    }

    pub(crate) fn instance_with(&self, provider: &ServiceProvider) -> DiResult<AnyArc> {
        let built = self.built_with(provider)?;
        built.plan.run(built.plan.root(), provider)
    }

    pub(crate) fn verify_with(&self, provider: &ServiceProvider) -> DiResult<()> {
        let built = self.built_with(provider)?;
        built.plan.run(built.plan.root(), provider)?;
        for deferred in built.plan.deferred_plans() {
            built.plan.run(deferred, provider)?;
        }
        Ok(())
    }

    fn build(&self, provider: &ServiceProvider) -> DiResult<BuiltProducer> {
        let service_type = self.service_type();
        let span = debug_span!("build_producer", service = %service_type);
        let _entered = span.enter();
        let started = Instant::now();
        provider.observers().building(service_type);

        let mut builder = PlanBuilder::new();
        let base = build_base_plan(&mut builder, &self.registration, provider)?;
        let candidates = provider.decorator_candidates(service_type);
        let decorated = pipeline::apply(
            &mut builder,
            DecorationRequest {
                service_type,
                implementation_type: base.implementation_type.as_ref(),
                plan: base.plan,
                lifestyle: base.lifestyle,
            },
            &candidates,
            provider,
        )?;

        let mut relationships = base.relationships;
        relationships.extend(decorated.relationships);
        relationships::dedup(&mut relationships);
        let plan = builder.finish(decorated.plan);

        debug!(
            candidates = candidates.len(),
            applied = decorated.applied.len(),
            nodes = plan.len(),
            lifestyle = %decorated.lifestyle,
            "producer built"
        );
        provider
            .observers()
            .built(service_type, &decorated.applied, started.elapsed());

        Ok(BuiltProducer {
            plan: Arc::new(plan),
            lifestyle: decorated.lifestyle,
            implementation_type: base.implementation_type.unwrap_or_else(|| service_type.clone()),
            applied: decorated.applied,
            relationships,
        })
    }
}

impl fmt::Debug for InstanceProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("InstanceProducer");
        s.field("service_type", self.service_type());
        match self.built.get() {
            Some(built) => s
                .field("plan", &built.plan.describe())
                .field("lifestyle", &built.lifestyle),
            None => s.field("built", &false),
        };
        s.finish()
    }
}
