//! Service registration types.

use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{DiError, DiResult};
use crate::lifestyle::Lifestyle;
use crate::provider::ServiceProvider;
use crate::types::{builtins, TypeExpr, TypeKind};
use crate::AnyArc;

/// Factory closure for a registration without a known implementation type.
pub type ServiceFactory = Arc<dyn Fn(&ServiceProvider) -> DiResult<AnyArc> + Send + Sync>;

/// Where instances of a registered service come from.
#[derive(Clone)]
pub enum ServiceSource {
    /// Auto-wired through the implementation's single constructor.
    Type(TypeExpr),
    /// A pre-built instance.
    Instance {
        implementation_type: TypeExpr,
        value: AnyArc,
    },
    Factory(ServiceFactory),
    /// Element implementations of an `IEnumerable<T>` registration.
    Collection(Vec<TypeExpr>),
}

/// A closed service type bound to a source and a lifestyle.
#[derive(Clone)]
pub struct ServiceRegistration {
    service_type: TypeExpr,
    source: ServiceSource,
    lifestyle: Lifestyle,
}

impl ServiceRegistration {
    /// Registers `implementation` for `service_type`.
    ///
    /// Both types must be closed and the implementation must be a concrete
    /// type assignable to the service.
    pub fn new(service_type: TypeExpr, implementation: TypeExpr, lifestyle: Lifestyle) -> DiResult<Self> {
        ensure_closed("service_type", &service_type)?;
        ensure_implementation(&service_type, &implementation)?;
        Ok(ServiceRegistration {
            service_type,
            source: ServiceSource::Type(implementation),
            lifestyle,
        })
    }

    /// Registers a shared instance. The lifestyle is always singleton.
    pub fn instance(service_type: TypeExpr, implementation_type: TypeExpr, value: AnyArc) -> DiResult<Self> {
        ensure_closed("service_type", &service_type)?;
        ensure_closed("implementation_type", &implementation_type)?;
        if !implementation_type.is_assignable_to(&service_type) {
            return Err(DiError::configuration(
                "implementation_type",
                format!(
                    "The supplied type {} does not implement {}.",
                    implementation_type, service_type
                ),
            ));
        }
        Ok(ServiceRegistration {
            service_type,
            source: ServiceSource::Instance {
                implementation_type,
                value,
            },
            lifestyle: Lifestyle::Singleton,
        })
    }

    pub fn factory<F>(service_type: TypeExpr, lifestyle: Lifestyle, factory: F) -> DiResult<Self>
    where
        F: Fn(&ServiceProvider) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        ensure_closed("service_type", &service_type)?;
        Ok(ServiceRegistration {
            service_type,
            source: ServiceSource::Factory(Arc::new(factory)),
            lifestyle,
        })
    }

    /// Registers the elements of `IEnumerable<element_type>`. The collection
    /// itself is transient; every element is built on each resolution.
    pub fn collection<I>(element_type: TypeExpr, implementations: I) -> DiResult<Self>
    where
        I: IntoIterator<Item = TypeExpr>,
    {
        ensure_closed("element_type", &element_type)?;
        let implementations: Vec<TypeExpr> = implementations.into_iter().collect();
        for implementation in &implementations {
            ensure_implementation(&element_type, implementation)?;
        }
        Ok(ServiceRegistration {
            service_type: builtins::enumerable_of(element_type),
            source: ServiceSource::Collection(implementations),
            lifestyle: Lifestyle::Transient,
        })
    }

    pub fn service_type(&self) -> &TypeExpr {
        &self.service_type
    }

    pub fn source(&self) -> &ServiceSource {
        &self.source
    }

    pub fn lifestyle(&self) -> &Lifestyle {
        &self.lifestyle
    }

    /// The implementation type, when the source makes it known.
    pub fn implementation_type(&self) -> Option<&TypeExpr> {
        match &self.source {
            ServiceSource::Type(implementation) => Some(implementation),
            ServiceSource::Instance {
                implementation_type, ..
            } => Some(implementation_type),
            ServiceSource::Factory(_) => None,
            ServiceSource::Collection(_) => Some(&self.service_type),
        }
    }
}

fn ensure_closed(parameter: &'static str, ty: &TypeExpr) -> DiResult<()> {
    if ty.is_closed() {
        Ok(())
    } else {
        Err(DiError::configuration(
            parameter,
            format!("The supplied type {} is an open generic type.", ty),
        ))
    }
}

fn ensure_implementation(service_type: &TypeExpr, implementation: &TypeExpr) -> DiResult<()> {
    ensure_closed("implementation_type", implementation)?;
    if implementation.kind() == Some(TypeKind::Interface) {
        return Err(DiError::configuration(
            "implementation_type",
            format!("The supplied type {} is not a concrete type.", implementation),
        ));
    }
    if !implementation.is_assignable_to(service_type) {
        return Err(DiError::configuration(
            "implementation_type",
            format!("The supplied type {} does not implement {}.", implementation, service_type),
        ));
    }
    Ok(())
}

/// Service registry holding all registrations
///
/// Small registries are scanned linearly; past `small_threshold` entries new
/// registrations go to a hash map. Re-registering a service type replaces
/// the earlier registration in place.
#[derive(Clone)]
pub(crate) struct Registry {
    one_small: Vec<(TypeExpr, Arc<ServiceRegistration>)>,
    one_large: AHashMap<TypeExpr, Arc<ServiceRegistration>>,
    /// Registration order, for verification.
    order: Vec<TypeExpr>,
    small_threshold: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            one_small: Vec::new(),
            one_large: AHashMap::new(),
            order: Vec::new(),
            small_threshold: 16,
        }
    }

    pub(crate) fn insert(&mut self, registration: ServiceRegistration) {
        let key = registration.service_type.clone();
        let registration = Arc::new(registration);

        if let Some(pos) = self.one_small.iter().position(|(k, _)| k == &key) {
            self.one_small[pos].1 = registration;
            return;
        }
        if let Some(existing) = self.one_large.get_mut(&key) {
            *existing = registration;
            return;
        }

        self.order.push(key.clone());
        if self.one_small.len() < self.small_threshold {
            self.one_small.push((key, registration));
        } else {
            self.one_large.insert(key, registration);
        }
    }

    pub(crate) fn get(&self, key: &TypeExpr) -> Option<&Arc<ServiceRegistration>> {
        self.one_small
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, r)| r)
            .or_else(|| self.one_large.get(key))
    }

    /// Registered service types in first-registration order.
    pub(crate) fn service_types(&self) -> &[TypeExpr] {
        &self.order
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}
