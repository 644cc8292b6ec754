//! Instance initializers.
//!
//! An initializer is registered for a target type and runs on every instance
//! the container constructs whose implementation type is assignable to that
//! target: base implementations and decorator layers alike. Targets may be
//! open templates, in which case any closing of the template matches.
//! Pre-built instances and factory closures are not initialized.

use std::fmt;
use std::sync::Arc;

use crate::error::DiResult;
use crate::types::unify::unify;
use crate::types::{Bindings, TypeExpr};
use crate::AnyArc;

/// Runs on a freshly constructed instance. Receives the instance and its
/// closed implementation type.
pub type InstanceInitializer = Arc<dyn Fn(&AnyArc, &TypeExpr) -> DiResult<()> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    target: TypeExpr,
    initializer: InstanceInitializer,
}

/// Registered initializers, in registration order.
#[derive(Clone, Default)]
pub(crate) struct Initializers {
    entries: Vec<Entry>,
}

impl Initializers {
    pub(crate) fn add(&mut self, target: TypeExpr, initializer: InstanceInitializer) {
        self.entries.push(Entry { target, initializer });
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Initializers whose target `implementation` is assignable to.
    pub(crate) fn matching(&self, implementation: &TypeExpr) -> Vec<InstanceInitializer> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let supertypes = implementation.supertypes();
        self.entries
            .iter()
            .filter(|entry| {
                supertypes
                    .iter()
                    .any(|s| unify(&entry.target, s, &mut Bindings::new()))
            })
            .map(|entry| Arc::clone(&entry.initializer))
            .collect()
    }
}

impl fmt::Debug for Initializers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.target.to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDef;

    fn noop() -> InstanceInitializer {
        Arc::new(|_, _| Ok(()))
    }

    #[test]
    fn matches_by_assignability_and_open_templates() {
        let base = TypeDef::class("HandlerBase").build();
        let handler = TypeDef::interface("ICommandHandler").param("T").build();
        let command = TypeDef::class("RealCommand").build();
        let decorator = TypeDef::class("PropertyDecorator")
            .param("T")
            .implements(base.expr())
            .implements(handler.of([TypeExpr::var("T")]))
            .build();
        let other = TypeDef::class("Other").build();

        let mut initializers = Initializers::default();
        initializers.add(base.expr(), noop());
        initializers.add(handler.expr(), noop());
        initializers.add(decorator.of([command.expr()]), noop());
        initializers.add(other.expr(), noop());

        assert_eq!(initializers.len(), 4);
        assert_eq!(initializers.matching(&decorator.of([command.expr()])).len(), 3);
        assert_eq!(initializers.matching(&decorator.of([other.expr()])).len(), 2);
        assert!(initializers.matching(&command.expr()).is_empty());
    }
}
