use std::sync::Arc;

use tracing::trace;

use crate::types::unify::{match_decorator, unify, DecoratorMatch};
use crate::types::{Bindings, TypeExpr};

use super::{DecoratorRegistration, DecoratorSource};

/// A registration compatible with a requested service type.
#[derive(Debug, Clone)]
pub struct Candidate {
    registration: Arc<DecoratorRegistration>,
    closed: Option<TypeExpr>,
}

impl Candidate {
    pub fn registration(&self) -> &DecoratorRegistration {
        &self.registration
    }

    /// The unified decorator type of a fixed registration. `None` for
    /// factory registrations, whose type is only known once called.
    pub fn closed_decorator(&self) -> Option<&TypeExpr> {
        self.closed.as_ref()
    }
}

/// Ordered store of decorator registrations.
#[derive(Debug, Clone, Default)]
pub struct DecoratorRegistry {
    registrations: Vec<Arc<DecoratorRegistration>>,
}

impl DecoratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registration. Registrations are validated when built, so
    /// this cannot fail.
    pub fn register(&mut self, registration: DecoratorRegistration) {
        trace!(
            service_pattern = %registration.service_pattern(),
            source = ?registration.source(),
            lifestyle = %registration.lifestyle(),
            "decorator registered"
        );
        self.registrations.push(Arc::new(registration));
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecoratorRegistration> {
        self.registrations.iter().map(|r| &**r)
    }

    /// Registrations whose pattern matches `service_type`, in registration
    /// order. Fixed decorators that do not unify with the request, or whose
    /// constraints it violates, are left out. Predicates are not evaluated.
    pub fn candidates_for(&self, service_type: &TypeExpr) -> Vec<Candidate> {
        let mut out = Vec::new();
        for registration in &self.registrations {
            if !unify(registration.service_pattern(), service_type, &mut Bindings::new()) {
                continue;
            }
            let closed = match registration.source() {
                DecoratorSource::Factory(_) => None,
                DecoratorSource::Fixed(decorator) => match match_decorator(decorator, service_type) {
                    DecoratorMatch::Matched(closed) => Some(closed),
                    other => {
                        trace!(
                            service = %service_type,
                            decorator = %decorator,
                            outcome = ?other,
                            "decorator does not serve request"
                        );
                        continue;
                    }
                },
            };
            out.push(Candidate {
                registration: Arc::clone(registration),
                closed,
            });
        }
        out
    }
}
