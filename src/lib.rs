//! # ferrous-decor
//!
//! Decorator resolution and composition for a runtime-typed dependency
//! injection container.
//!
//! ## Features
//!
//! - **Ordered decoration**: decorators wrap a service in registration order,
//!   the first registered innermost
//! - **Open generic decorators**: a decorator template is closed against each
//!   requested service type, honoring its type parameter constraints
//! - **Conditional decorators**: predicates see the service, the
//!   implementation and the decorators already applied
//! - **Decorator type factories**: the decorator type can be chosen per service
//! - **Lifestyles**: transient, singleton and hybrid decorators, independent
//!   of the decorated service
//! - **Introspection**: applied decorators and known relationships per service
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_decor::{AnyArc, Constructor, Resolver, ServiceCollection, TypeDef};
//! use std::sync::Arc;
//!
//! struct SqlRepository;
//! struct CachingRepository {
//!     inner: AnyArc,
//! }
//!
//! let repository = TypeDef::interface("IRepository").build();
//! let sql = TypeDef::class("SqlRepository")
//!     .implements(repository.expr())
//!     .constructor(Constructor::new())
//!     .activator(|_| Ok(Arc::new(SqlRepository)))
//!     .build();
//! let caching = TypeDef::class("CachingRepository")
//!     .implements(repository.expr())
//!     .constructor(Constructor::new().param("inner", repository.expr()))
//!     .activator(|a| Ok(Arc::new(CachingRepository { inner: a.instance(0)? })))
//!     .build();
//!
//! let mut services = ServiceCollection::new();
//! services
//!     .add_transient(repository.expr(), sql.expr()).unwrap()
//!     .add_decorator(repository.expr(), caching.expr()).unwrap();
//!
//! let provider = services.build();
//! let resolved = provider.get_required::<CachingRepository>(&repository.expr());
//! assert!(resolved.inner.is::<SqlRepository>());
//! assert_eq!(
//!     provider.get_applied_decorators(&repository.expr()).unwrap(),
//!     vec![caching.expr()]
//! );
//! ```

pub mod collection;
pub mod config;
pub mod decoration;
pub mod error;
pub mod initialization;
pub mod lifestyle;
pub mod observer;
pub mod plan;
pub mod provider;
pub mod registration;
pub mod relationships;
pub mod traits;
pub mod types;

// Internal modules
mod internal;

use std::any::Any;
use std::sync::Arc;

/// A type-erased, shareable instance.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

pub use collection::ServiceCollection;
pub use config::ContainerOptions;
pub use decoration::{
    Candidate, DecoratorPredicate, DecoratorPredicateContext, DecoratorRegistration, DecoratorRegistrationBuilder,
    DecoratorRegistry, DecoratorSource, DecoratorTypeFactory,
};
pub use error::{DiError, DiResult};
pub use initialization::InstanceInitializer;
pub use lifestyle::{HybridLifestyle, Lifestyle, LifestyleSelector};
pub use observer::{DiObserver, LoggingObserver, PlanBuildingEvent, SkipReason};
pub use plan::{Activation, Argument, ConstructionPlan, InstanceFactory, PlanId};
pub use provider::{InstanceProducer, ServiceProvider};
pub use registration::{ServiceFactory, ServiceRegistration, ServiceSource};
pub use relationships::KnownRelationship;
pub use traits::{Resolver, ResolverCore};
pub use types::{
    builtins, Activator, Bindings, Constraint, Constructor, Parameter, TypeDef, TypeDefBuilder, TypeExpr, TypeKind, TypeParam,
};
