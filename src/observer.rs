//! Observers for producer builds and decoration decisions.
//!
//! Observers are registered on the [`ServiceCollection`](crate::ServiceCollection)
//! and called synchronously while a producer builds its plan, which happens
//! once per service type. Besides notifications they receive a mutable
//! [`PlanBuildingEvent`] for every constructed node, through which extra
//! [`KnownRelationship`]s can be recorded.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::decoration::DecoratorRegistration;
use crate::lifestyle::Lifestyle;
use crate::plan::PlanId;
use crate::relationships::KnownRelationship;
use crate::types::TypeExpr;

/// Why a compatible decorator was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The registration's predicate returned false.
    PredicateRejected,
    /// The type returned by a decorator type factory violates its own
    /// constraints for this request.
    ConstraintViolation,
}

/// A node of a plan under construction.
///
/// Raised for the base implementation of a registration, for every element of
/// a collection, and for every decorator layer. The node itself cannot be
/// replaced; relationships can be added.
pub struct PlanBuildingEvent<'a> {
    service_type: &'a TypeExpr,
    implementation_type: &'a TypeExpr,
    plan: PlanId,
    relationships: &'a mut Vec<KnownRelationship>,
}

impl<'a> PlanBuildingEvent<'a> {
    pub(crate) fn new(
        service_type: &'a TypeExpr,
        implementation_type: &'a TypeExpr,
        plan: PlanId,
        relationships: &'a mut Vec<KnownRelationship>,
    ) -> Self {
        PlanBuildingEvent {
            service_type,
            implementation_type,
            plan,
            relationships,
        }
    }

    pub fn service_type(&self) -> &TypeExpr {
        self.service_type
    }

    pub fn implementation_type(&self) -> &TypeExpr {
        self.implementation_type
    }

    pub fn plan(&self) -> PlanId {
        self.plan
    }

    pub fn relationships(&self) -> &[KnownRelationship] {
        self.relationships
    }

    pub fn add_relationship(&mut self, relationship: KnownRelationship) {
        self.relationships.push(relationship);
    }
}

/// Observer trait for plan building.
///
/// All methods have empty defaults. Keep implementations cheap; they run
/// inside the producer's single-build critical section.
///
/// # Examples
///
/// ```
/// use ferrous_decor::{DiObserver, ServiceCollection, TypeExpr};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct BuildCounter(AtomicUsize);
///
/// impl DiObserver for BuildCounter {
///     fn built(&self, _service_type: &TypeExpr, _applied: &[TypeExpr], _duration: Duration) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(BuildCounter::default()));
/// let provider = services.build();
/// ```
pub trait DiObserver: Send + Sync {
    /// A producer starts building the plan for `service_type`.
    fn building(&self, _service_type: &TypeExpr) {}

    /// A producer finished building; `applied` lists the decorators in
    /// application order.
    fn built(&self, _service_type: &TypeExpr, _applied: &[TypeExpr], _duration: Duration) {}

    fn decorator_applied(&self, _service_type: &TypeExpr, _decorator: &TypeExpr, _lifestyle: &Lifestyle) {}

    fn decorator_skipped(&self, _service_type: &TypeExpr, _registration: &DecoratorRegistration, _reason: SkipReason) {}

    fn plan_building(&self, _event: &mut PlanBuildingEvent<'_>) {}
}

/// Container for registered observers.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn building(&self, service_type: &TypeExpr) {
        for observer in &self.observers {
            observer.building(service_type);
        }
    }

    #[inline]
    pub(crate) fn built(&self, service_type: &TypeExpr, applied: &[TypeExpr], duration: Duration) {
        for observer in &self.observers {
            observer.built(service_type, applied, duration);
        }
    }

    #[inline]
    pub(crate) fn decorator_applied(&self, service_type: &TypeExpr, decorator: &TypeExpr, lifestyle: &Lifestyle) {
        for observer in &self.observers {
            observer.decorator_applied(service_type, decorator, lifestyle);
        }
    }

    #[inline]
    pub(crate) fn decorator_skipped(&self, service_type: &TypeExpr, registration: &DecoratorRegistration, reason: SkipReason) {
        for observer in &self.observers {
            observer.decorator_skipped(service_type, registration, reason);
        }
    }

    #[inline]
    pub(crate) fn plan_building(&self, event: &mut PlanBuildingEvent<'_>) {
        for observer in &self.observers {
            observer.plan_building(event);
        }
    }
}

/// Forwards every callback to `tracing` events.
///
/// Builds are logged at `debug`, individual decisions at `trace`. Installed
/// automatically when [`ContainerOptions::log_decisions`](crate::ContainerOptions)
/// is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl LoggingObserver {
    pub fn new() -> Self {
        LoggingObserver
    }
}

impl DiObserver for LoggingObserver {
    fn building(&self, service_type: &TypeExpr) {
        debug!(service = %service_type, "building plan");
    }

    fn built(&self, service_type: &TypeExpr, applied: &[TypeExpr], duration: Duration) {
        debug!(
            service = %service_type,
            decorators = applied.len(),
            elapsed_us = duration.as_micros() as u64,
            "plan built"
        );
    }

    fn decorator_applied(&self, service_type: &TypeExpr, decorator: &TypeExpr, lifestyle: &Lifestyle) {
        trace!(service = %service_type, %decorator, %lifestyle, "decorator applied");
    }

    fn decorator_skipped(&self, service_type: &TypeExpr, registration: &DecoratorRegistration, reason: SkipReason) {
        trace!(
            service = %service_type,
            pattern = %registration.service_pattern(),
            ?reason,
            "decorator skipped"
        );
    }

    fn plan_building(&self, event: &mut PlanBuildingEvent<'_>) {
        trace!(
            service = %event.service_type(),
            implementation = %event.implementation_type(),
            plan = %event.plan(),
            relationships = event.relationships().len(),
            "plan node built"
        );
    }
}
