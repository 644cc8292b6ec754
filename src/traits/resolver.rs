//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::types::TypeExpr;
use crate::AnyArc;

/// Core resolver trait for object-safe service resolution.
///
/// Works on type-erased instances. Most users should use [`Resolver`], which
/// adds typed accessors on top of this trait.
pub trait ResolverCore: Send + Sync {
    /// Resolves the instance of a closed service type.
    fn resolve_any(&self, service_type: &TypeExpr) -> DiResult<AnyArc>;

    /// Resolves every element registered for `IEnumerable<element_type>`, in
    /// registration order.
    fn resolve_all(&self, element_type: &TypeExpr) -> DiResult<Vec<AnyArc>>;
}

/// Typed service resolution.
///
/// The container identifies services by [`TypeExpr`]; the Rust type `T` only
/// describes what the activator produced. A mismatch between the two is a
/// [`DiError::TypeMismatch`].
///
/// # Examples
///
/// ```
/// use ferrous_decor::{Constructor, ServiceCollection, TypeDef, Resolver};
/// use std::sync::Arc;
///
/// struct Clock(u64);
///
/// let clock = TypeDef::class("Clock")
///     .constructor(Constructor::new())
///     .activator(|_| Ok(Arc::new(Clock(7))))
///     .build();
///
/// let mut services = ServiceCollection::new();
/// services.add_transient(clock.expr(), clock.expr()).unwrap();
/// let provider = services.build();
///
/// let resolved = provider.get::<Clock>(&clock.expr()).unwrap();
/// assert_eq!(resolved.0, 7);
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `service_type` and downcasts the instance to `T`.
    fn get<T: Any + Send + Sync>(&self, service_type: &TypeExpr) -> DiResult<Arc<T>> {
        self.resolve_any(service_type)?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }

    /// Like [`get`](Self::get), panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error when the service cannot be resolved.
    fn get_required<T: Any + Send + Sync>(&self, service_type: &TypeExpr) -> Arc<T> {
        match self.get::<T>(service_type) {
            Ok(instance) => instance,
            Err(e) => panic!("Failed to resolve {}: {}", service_type, e),
        }
    }

    /// Resolves every element of `IEnumerable<element_type>` as `T`.
    fn get_all<T: Any + Send + Sync>(&self, element_type: &TypeExpr) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(element_type)?
            .into_iter()
            .map(|item| {
                item.downcast::<T>()
                    .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
            })
            .collect()
    }
}
