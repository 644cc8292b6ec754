//! Dependency edges recorded while plans are built.

use std::fmt;

use ahash::AHashSet;

use crate::lifestyle::Lifestyle;
use crate::types::TypeExpr;

/// An edge stating that `implementation_type`, living with `lifestyle`,
/// depends on `dependency_service_type`, which lives with
/// `dependency_lifestyle`.
///
/// A decorator layer records one edge to its decoratee. For the deferred form
/// the dependency is `Func<Service>` with a singleton lifestyle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KnownRelationship {
    pub implementation_type: TypeExpr,
    pub lifestyle: Lifestyle,
    pub dependency_service_type: TypeExpr,
    pub dependency_lifestyle: Lifestyle,
}

impl KnownRelationship {
    pub fn new(
        implementation_type: TypeExpr,
        lifestyle: Lifestyle,
        dependency_service_type: TypeExpr,
        dependency_lifestyle: Lifestyle,
    ) -> Self {
        KnownRelationship {
            implementation_type,
            lifestyle,
            dependency_service_type,
            dependency_lifestyle,
        }
    }
}

impl fmt::Display for KnownRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) depends on {} ({})",
            self.implementation_type, self.lifestyle, self.dependency_service_type, self.dependency_lifestyle
        )
    }
}

/// Drops repeated edges, keeping the first occurrence of each in order.
pub(crate) fn dedup(edges: &mut Vec<KnownRelationship>) {
    let mut seen = AHashSet::with_capacity(edges.len());
    edges.retain(|edge| seen.insert(edge.clone()));
}
