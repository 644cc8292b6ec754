//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::types::TypeExpr;

// Service types whose producers are currently building on this thread.
thread_local! {
    static BUILD_STACK: RefCell<Vec<TypeExpr>> = const { RefCell::new(Vec::new()) };
}

/// Marks a producer build as in progress on this thread.
///
/// Entering a service type that is already on the stack is a cycle; the
/// guard must be acquired before the producer's build slot, or the thread
/// would block on its own initialization.
pub(crate) struct BuildGuard {
    service_type: TypeExpr,
}

impl BuildGuard {
    pub(crate) fn enter(service_type: &TypeExpr, max_depth: usize) -> DiResult<Self> {
        BUILD_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if stack.iter().any(|t| t == service_type) {
                let mut path: Vec<String> = stack.iter().map(ToString::to_string).collect();
                path.push(service_type.to_string());
                return Err(DiError::Circular(path));
            }
            if stack.len() >= max_depth {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(service_type.clone());
            Ok(BuildGuard {
                service_type: service_type.clone(),
            })
        })
    }

    #[cfg(test)]
    pub(crate) fn depth() -> usize {
        BUILD_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        BUILD_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped.as_ref(), Some(&self.service_type));
        });
    }
}
