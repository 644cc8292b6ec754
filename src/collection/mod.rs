//! Service collection module for dependency injection.
//!
//! This module contains the [`ServiceCollection`] type, which gathers service
//! registrations, decorator registrations and observers, and builds them into
//! a [`ServiceProvider`].

use std::sync::Arc;

use tracing::debug;

use crate::config::ContainerOptions;
use crate::decoration::{DecoratorPredicateContext, DecoratorRegistration, DecoratorRegistry};
use crate::error::DiResult;
use crate::initialization::Initializers;
use crate::lifestyle::Lifestyle;
use crate::observer::{DiObserver, LoggingObserver, Observers};
use crate::provider::ServiceProvider;
use crate::registration::{Registry, ServiceRegistration};
use crate::types::TypeExpr;
use crate::AnyArc;

/// Registrations waiting to be built into a [`ServiceProvider`].
///
/// Registration methods validate eagerly and return configuration errors;
/// a collection that accepted every registration builds infallibly.
///
/// # Examples
///
/// ```rust
/// use ferrous_decor::{Constructor, ServiceCollection, TypeDef};
///
/// let repository = TypeDef::interface("IRepository").build();
/// let sql = TypeDef::class("SqlRepository")
///     .implements(repository.expr())
///     .constructor(Constructor::new())
///     .build();
/// let caching = TypeDef::class("CachingRepository")
///     .implements(repository.expr())
///     .constructor(Constructor::new().param("inner", repository.expr()))
///     .build();
///
/// let mut services = ServiceCollection::new();
/// services
///     .add_singleton(repository.expr(), sql.expr()).unwrap()
///     .add_decorator(repository.expr(), caching.expr()).unwrap();
/// ```
#[derive(Default)]
pub struct ServiceCollection {
    registry: Registry,
    decorators: DecoratorRegistry,
    observers: Observers,
    initializers: Initializers,
    options: ContainerOptions,
}

impl ServiceCollection {
    /// Creates a new empty service collection with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        ServiceCollection {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    // ----- Service registrations -----

    /// Registers `implementation` for `service_type`, replacing any earlier
    /// registration of the same service type.
    pub fn add(&mut self, service_type: TypeExpr, implementation: TypeExpr, lifestyle: Lifestyle) -> DiResult<&mut Self> {
        let registration = ServiceRegistration::new(service_type, implementation, lifestyle)?;
        Ok(self.add_registration(registration))
    }

    pub fn add_transient(&mut self, service_type: TypeExpr, implementation: TypeExpr) -> DiResult<&mut Self> {
        self.add(service_type, implementation, Lifestyle::Transient)
    }

    pub fn add_singleton(&mut self, service_type: TypeExpr, implementation: TypeExpr) -> DiResult<&mut Self> {
        self.add(service_type, implementation, Lifestyle::Singleton)
    }

    /// Registers a pre-built instance. `implementation_type` is what
    /// decorators and predicates see as the implementation.
    pub fn add_instance<T>(&mut self, service_type: TypeExpr, implementation_type: TypeExpr, value: T) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
    {
        let value: AnyArc = Arc::new(value);
        let registration = ServiceRegistration::instance(service_type, implementation_type, value)?;
        Ok(self.add_registration(registration))
    }

    /// Registers a factory closure. Its implementation type is unknown, so
    /// predicates see the service type in its place.
    pub fn add_factory<F>(&mut self, service_type: TypeExpr, lifestyle: Lifestyle, factory: F) -> DiResult<&mut Self>
    where
        F: Fn(&ServiceProvider) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let registration = ServiceRegistration::factory(service_type, lifestyle, factory)?;
        Ok(self.add_registration(registration))
    }

    /// Registers the elements of `IEnumerable<element_type>`, in order.
    pub fn add_collection<I>(&mut self, element_type: TypeExpr, implementations: I) -> DiResult<&mut Self>
    where
        I: IntoIterator<Item = TypeExpr>,
    {
        let registration = ServiceRegistration::collection(element_type, implementations)?;
        Ok(self.add_registration(registration))
    }

    pub fn add_registration(&mut self, registration: ServiceRegistration) -> &mut Self {
        debug!(
            service = %registration.service_type(),
            lifestyle = %registration.lifestyle(),
            "service registered"
        );
        self.registry.insert(registration);
        self
    }

    // ----- Decorator registrations -----

    /// Registers a transient decorator for every service type matching
    /// `service_pattern`.
    pub fn add_decorator(&mut self, service_pattern: TypeExpr, decorator: TypeExpr) -> DiResult<&mut Self> {
        self.add_decorator_with_lifestyle(service_pattern, decorator, Lifestyle::Transient)
    }

    pub fn add_singleton_decorator(&mut self, service_pattern: TypeExpr, decorator: TypeExpr) -> DiResult<&mut Self> {
        self.add_decorator_with_lifestyle(service_pattern, decorator, Lifestyle::Singleton)
    }

    pub fn add_decorator_with_lifestyle(
        &mut self,
        service_pattern: TypeExpr,
        decorator: TypeExpr,
        lifestyle: Lifestyle,
    ) -> DiResult<&mut Self> {
        let registration = DecoratorRegistration::builder(service_pattern)
            .decorator(decorator)
            .lifestyle(lifestyle)
            .build()?;
        Ok(self.register_decorator(registration))
    }

    /// Registers a transient decorator applied only where `predicate` holds.
    pub fn add_decorator_when<P>(&mut self, service_pattern: TypeExpr, decorator: TypeExpr, predicate: P) -> DiResult<&mut Self>
    where
        P: Fn(&DecoratorPredicateContext) -> bool + Send + Sync + 'static,
    {
        let registration = DecoratorRegistration::builder(service_pattern)
            .decorator(decorator)
            .when(predicate)
            .build()?;
        Ok(self.register_decorator(registration))
    }

    /// Registers a decorator whose type is chosen per service by `factory`.
    pub fn add_decorator_factory<F>(&mut self, service_pattern: TypeExpr, lifestyle: Lifestyle, factory: F) -> DiResult<&mut Self>
    where
        F: Fn(&DecoratorPredicateContext) -> Option<TypeExpr> + Send + Sync + 'static,
    {
        let registration = DecoratorRegistration::builder(service_pattern)
            .factory(factory)
            .lifestyle(lifestyle)
            .build()?;
        Ok(self.register_decorator(registration))
    }

    /// Like [`add_decorator_factory`](Self::add_decorator_factory); `factory`
    /// is only called where `predicate` holds.
    pub fn add_decorator_factory_when<F, P>(
        &mut self,
        service_pattern: TypeExpr,
        lifestyle: Lifestyle,
        factory: F,
        predicate: P,
    ) -> DiResult<&mut Self>
    where
        F: Fn(&DecoratorPredicateContext) -> Option<TypeExpr> + Send + Sync + 'static,
        P: Fn(&DecoratorPredicateContext) -> bool + Send + Sync + 'static,
    {
        let registration = DecoratorRegistration::builder(service_pattern)
            .factory(factory)
            .lifestyle(lifestyle)
            .when(predicate)
            .build()?;
        Ok(self.register_decorator(registration))
    }

    /// Appends an already validated registration. Decorators apply in the
    /// order they are registered, the first one innermost.
    pub fn register_decorator(&mut self, registration: DecoratorRegistration) -> &mut Self {
        self.decorators.register(registration);
        self
    }

    // ----- Initializers -----

    /// Runs `initializer` on every constructed instance whose implementation
    /// type is assignable to `target`, decorators included. Initializers run
    /// in registration order, right after the instance is created and before
    /// any lifestyle caching.
    pub fn add_initializer<F>(&mut self, target: TypeExpr, initializer: F) -> &mut Self
    where
        F: Fn(&AnyArc, &TypeExpr) -> DiResult<()> + Send + Sync + 'static,
    {
        debug!(ty = %target, "initializer registered");
        self.initializers.add(target, Arc::new(initializer));
        self
    }

    // ----- Observers -----

    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Builds the provider. Plans are built lazily, on first resolution.
    pub fn build(self) -> ServiceProvider {
        let ServiceCollection {
            registry,
            decorators,
            mut observers,
            initializers,
            options,
        } = self;
        if options.log_decisions {
            observers.add(Arc::new(LoggingObserver::new()));
        }
        ServiceProvider::new(registry, decorators, observers, initializers, options)
    }
}
