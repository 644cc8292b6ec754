//! Decorator registrations and their application to construction plans.
//!
//! A decorator wraps the instance of a service behind the same abstraction.
//! Registrations are kept in order; when a closed service type is resolved
//! for the first time every compatible registration is evaluated and, if
//! accepted, wraps the plan produced by the ones before it.
//!
//! ```rust
//! use ferrous_decor::{Constructor, DecoratorRegistration, Lifestyle, TypeDef, TypeExpr};
//!
//! let handler = TypeDef::interface("ICommandHandler").param("TCommand").build();
//! let logging = TypeDef::class("LoggingDecorator")
//!     .param("T")
//!     .implements(handler.of([TypeExpr::var("T")]))
//!     .constructor(Constructor::new().param("decoratee", handler.of([TypeExpr::var("T")])))
//!     .build();
//!
//! let registration = DecoratorRegistration::builder(handler.expr())
//!     .decorator(logging.expr())
//!     .lifestyle(Lifestyle::Singleton)
//!     .when(|ctx| ctx.applied_decorators().is_empty())
//!     .build()
//!     .unwrap();
//! assert_eq!(registration.lifestyle(), &Lifestyle::Singleton);
//! ```

mod context;
pub(crate) mod pipeline;
mod registry;
pub mod shape;

use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::lifestyle::Lifestyle;
use crate::types::unify::unresolvable_params;
use crate::types::TypeExpr;

pub use context::DecoratorPredicateContext;
pub use registry::{Candidate, DecoratorRegistry};

/// Decides whether a decorator applies.
pub type DecoratorPredicate = Arc<dyn Fn(&DecoratorPredicateContext) -> bool + Send + Sync>;

/// Supplies the decorator type for a decision. `None` is an activation error.
pub type DecoratorTypeFactory = Arc<dyn Fn(&DecoratorPredicateContext) -> Option<TypeExpr> + Send + Sync>;

/// Where the decorator type of a registration comes from.
#[derive(Clone)]
pub enum DecoratorSource {
    /// A template, validated at registration and unified per request.
    Fixed(TypeExpr),
    /// Computed per request; validated when it is called.
    Factory(DecoratorTypeFactory),
}

impl fmt::Debug for DecoratorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoratorSource::Fixed(ty) => write!(f, "Fixed({})", ty),
            DecoratorSource::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// An immutable, validated decorator registration.
#[derive(Clone)]
pub struct DecoratorRegistration {
    service_pattern: TypeExpr,
    source: DecoratorSource,
    lifestyle: Lifestyle,
    predicate: Option<DecoratorPredicate>,
}

impl DecoratorRegistration {
    pub fn builder(service_pattern: TypeExpr) -> DecoratorRegistrationBuilder {
        DecoratorRegistrationBuilder {
            service_pattern,
            source: None,
            lifestyle: Lifestyle::Transient,
            predicate: None,
        }
    }

    /// A transient, unconditional decorator.
    pub fn fixed(service_pattern: TypeExpr, decorator: TypeExpr) -> DiResult<Self> {
        Self::builder(service_pattern).decorator(decorator).build()
    }

    pub fn service_pattern(&self) -> &TypeExpr {
        &self.service_pattern
    }

    pub fn source(&self) -> &DecoratorSource {
        &self.source
    }

    pub fn lifestyle(&self) -> &Lifestyle {
        &self.lifestyle
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    pub(crate) fn accepts(&self, context: &DecoratorPredicateContext) -> bool {
        self.predicate.as_ref().map_or(true, |predicate| predicate(context))
    }

    fn validate(&self) -> DiResult<()> {
        let Some(pattern_def) = self.service_pattern.def() else {
            return Err(DiError::configuration(
                "service_type",
                format!("The supplied type {} is not a service type.", self.service_pattern),
            ));
        };
        let DecoratorSource::Fixed(decorator) = &self.source else {
            return Ok(());
        };

        if decorator.def().is_none() {
            return Err(DiError::configuration(
                "decorator_type",
                format!("The supplied type {} is not a decorator type.", decorator),
            ));
        }
        let open = !decorator.is_closed();
        if open && !pattern_def.is_generic() {
            return Err(DiError::configuration(
                "decorator_type",
                format!(
                    "The supplied decorator {} is an open generic type definition, while the service type {} is not generic.",
                    decorator, self.service_pattern
                ),
            ));
        }
        if open && self.service_pattern.is_closed() {
            return Err(DiError::configuration(
                "service_type",
                "Registering a closed generic service type with an open generic decorator is not supported. \
                 Instead, register the service type as open generic, and the decorator as closed generic type.",
            ));
        }

        let shape = shape::validate(decorator, &self.service_pattern)
            .map_err(|e| DiError::configuration("decorator_type", e.to_string()))?;

        let unresolvable = unresolvable_params(decorator, shape.abstraction());
        if !unresolvable.is_empty() {
            return Err(DiError::configuration(
                "decorator_type",
                format!(
                    "The supplied decorator {} contains unresolvable type arguments. The type would never be resolved and is therefore not suited to be used as decorator.",
                    decorator
                ),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for DecoratorRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorRegistration")
            .field("service_pattern", &self.service_pattern)
            .field("source", &self.source)
            .field("lifestyle", &self.lifestyle)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}

/// Builder for [`DecoratorRegistration`]. Validation runs in
/// [`build`](Self::build).
pub struct DecoratorRegistrationBuilder {
    service_pattern: TypeExpr,
    source: Option<DecoratorSource>,
    lifestyle: Lifestyle,
    predicate: Option<DecoratorPredicate>,
}

impl DecoratorRegistrationBuilder {
    pub fn decorator(mut self, decorator: TypeExpr) -> Self {
        self.source = Some(DecoratorSource::Fixed(decorator));
        self
    }

    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&DecoratorPredicateContext) -> Option<TypeExpr> + Send + Sync + 'static,
    {
        self.source = Some(DecoratorSource::Factory(Arc::new(factory)));
        self
    }

    pub fn source(mut self, source: DecoratorSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn lifestyle(mut self, lifestyle: Lifestyle) -> Self {
        self.lifestyle = lifestyle;
        self
    }

    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&DecoratorPredicateContext) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn build(self) -> DiResult<DecoratorRegistration> {
        let source = self.source.ok_or_else(|| {
            DiError::configuration(
                "decorator_type",
                "Either a decorator type or a decorator type factory must be supplied.",
            )
        })?;
        let registration = DecoratorRegistration {
            service_pattern: self.service_pattern,
            source,
            lifestyle: self.lifestyle,
            predicate: self.predicate,
        };
        registration.validate()?;
        Ok(registration)
    }
}
