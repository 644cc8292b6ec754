//! Service provider module.
//!
//! The [`ServiceProvider`] owns the per-container producer cache. Producers are
//! created lazily, one per closed service type, and each builds its decorated
//! plan at most once.

use std::sync::{Arc, Weak};

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::ContainerOptions;
use crate::decoration::{Candidate, DecoratorRegistration, DecoratorRegistry};
use crate::error::{DiError, DiResult};
use crate::initialization::Initializers;
use crate::lifestyle::Lifestyle;
use crate::observer::Observers;
use crate::registration::{Registry, ServiceRegistration};
use crate::relationships::KnownRelationship;
use crate::traits::{Resolver, ResolverCore};
use crate::types::{builtins, TypeExpr, TypeKind};
use crate::AnyArc;

mod producer;

pub use producer::InstanceProducer;

/// Resolves services and owns their producers.
///
/// Cloning is cheap and shares the producer cache. Dropping the last clone
/// drops every producer and every cached instance.
///
/// # Examples
///
/// ```
/// use ferrous_decor::{Constructor, ServiceCollection, TypeDef, TypeExpr, Resolver};
/// use std::sync::Arc;
///
/// struct Greeter;
///
/// let greeter = TypeDef::class("Greeter")
///     .constructor(Constructor::new())
///     .activator(|_| Ok(Arc::new(Greeter)))
///     .build();
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(greeter.expr(), greeter.expr()).unwrap();
/// let provider = services.build();
///
/// let a = provider.get_required::<Greeter>(&greeter.expr());
/// let b = provider.get_required::<Greeter>(&greeter.expr());
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    registry: Registry,
    decorators: RwLock<DecoratorRegistry>,
    producers: RwLock<AHashMap<TypeExpr, Arc<InstanceProducer>>>,
    observers: Observers,
    initializers: Initializers,
    options: ContainerOptions,
}

impl Drop for ProviderInner {
    fn drop(&mut self) {
        debug!(producers = self.producers.get_mut().len(), "service provider disposed");
    }
}

/// Non-owning handle held by producers and instance factories.
#[derive(Clone)]
pub(crate) struct WeakProvider(Weak<ProviderInner>);

impl WeakProvider {
    pub(crate) fn upgrade(&self) -> Option<ServiceProvider> {
        self.0.upgrade().map(|inner| ServiceProvider { inner })
    }
}

impl ServiceProvider {
    pub(crate) fn new(
        registry: Registry,
        decorators: DecoratorRegistry,
        observers: Observers,
        initializers: Initializers,
        options: ContainerOptions,
    ) -> Self {
        debug!(
            services = registry.len(),
            decorators = decorators.len(),
            observers = observers.len(),
            initializers = initializers.len(),
            "service provider built"
        );
        ServiceProvider {
            inner: Arc::new(ProviderInner {
                registry,
                decorators: RwLock::new(decorators),
                producers: RwLock::new(AHashMap::new()),
                observers,
                initializers,
                options,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakProvider {
        WeakProvider(Arc::downgrade(&self.inner))
    }

    pub(crate) fn observers(&self) -> &Observers {
        &self.inner.observers
    }

    pub(crate) fn initializers(&self) -> &Initializers {
        &self.inner.initializers
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// Resolves an instance of a closed service type, building its producer
    /// on first use.
    pub fn get_instance(&self, service_type: &TypeExpr) -> DiResult<AnyArc> {
        self.producer_for(service_type)?.instance_with(self)
    }

    /// Resolves `IEnumerable<element_type>`.
    ///
    /// Undecorated, the value is a `Vec<AnyArc>`. A decorator registered for
    /// the collection type wraps the collection as a whole and is returned
    /// instead.
    pub fn get_all_instances(&self, element_type: &TypeExpr) -> DiResult<AnyArc> {
        self.get_instance(&builtins::enumerable_of(element_type.clone()))
    }

    /// The shared producer of `service_type`.
    pub fn get_producer(&self, service_type: &TypeExpr) -> DiResult<Arc<InstanceProducer>> {
        self.producer_for(service_type)
    }

    /// A producer for `registration` that is not cached by the provider.
    /// Each standalone producer builds its own plan, and runs its own
    /// decorator decisions, once.
    pub fn create_producer(&self, registration: ServiceRegistration) -> Arc<InstanceProducer> {
        Arc::new(InstanceProducer::new(Arc::new(registration), self.downgrade()))
    }

    /// Adds a decorator after the provider was built. Producers that already
    /// built their plan are not affected.
    pub fn register_decorator(&self, registration: DecoratorRegistration) {
        self.inner.decorators.write().register(registration);
    }

    pub fn get_relationships(&self, service_type: &TypeExpr) -> DiResult<Vec<KnownRelationship>> {
        self.producer_for(service_type)?.built_with(self).map(|b| b.relationships().to_vec())
    }

    /// Closed decorator types applied to `service_type`, innermost first.
    pub fn get_applied_decorators(&self, service_type: &TypeExpr) -> DiResult<Vec<TypeExpr>> {
        self.producer_for(service_type)?.built_with(self).map(|b| b.applied().to_vec())
    }

    /// Lifestyle of the outermost layer of `service_type`.
    pub fn get_lifestyle(&self, service_type: &TypeExpr) -> DiResult<Lifestyle> {
        self.producer_for(service_type)?.built_with(self).map(|b| b.lifestyle().clone())
    }

    pub fn is_registered(&self, service_type: &TypeExpr) -> bool {
        self.inner.registry.get(service_type).is_some()
    }

    /// Builds the producer of every registered service, creates an instance
    /// through each one and returns the first failure.
    ///
    /// Singleton layers keep the instance created here.
    pub fn verify(&self) -> DiResult<()> {
        for service_type in self.inner.registry.service_types() {
            self.producer_for(service_type)?.verify_with(self)?;
        }
        debug!("container verified");
        Ok(())
    }

    pub(crate) fn producer_for(&self, service_type: &TypeExpr) -> DiResult<Arc<InstanceProducer>> {
        if let Some(producer) = self.inner.producers.read().get(service_type) {
            return Ok(Arc::clone(producer));
        }

        let registration = match self.inner.registry.get(service_type) {
            Some(registration) => Arc::clone(registration),
            None => self.just_in_time(service_type)?,
        };

        let mut producers = self.inner.producers.write();
        let producer = producers
            .entry(service_type.clone())
            .or_insert_with(|| Arc::new(InstanceProducer::new(registration, self.downgrade())));
        Ok(Arc::clone(producer))
    }

    pub(crate) fn decorator_candidates(&self, service_type: &TypeExpr) -> Vec<Candidate> {
        self.inner.decorators.read().candidates_for(service_type)
    }

    fn just_in_time(&self, service_type: &TypeExpr) -> DiResult<Arc<ServiceRegistration>> {
        let constructible = self.inner.options.resolve_unregistered_concrete_types
            && service_type.is_closed()
            && service_type
                .def()
                .is_some_and(|def| def.kind() != TypeKind::Interface && def.activator().is_some());
        if !constructible {
            return Err(DiError::NotFound(service_type.to_string()));
        }
        debug!(service = %service_type, "registering concrete type just in time");
        ServiceRegistration::new(service_type.clone(), service_type.clone(), Lifestyle::Transient).map(Arc::new)
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, service_type: &TypeExpr) -> DiResult<AnyArc> {
        self.get_instance(service_type)
    }

    fn resolve_all(&self, element_type: &TypeExpr) -> DiResult<Vec<AnyArc>> {
        let collection = self.get_all_instances(element_type)?;
        collection
            .downcast::<Vec<AnyArc>>()
            .map(|items| items.as_ref().clone())
            .map_err(|_| DiError::TypeMismatch(builtins::enumerable_of(element_type.clone()).to_string()))
    }
}

impl Resolver for ServiceProvider {}
