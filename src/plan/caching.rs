//! Lifestyle caching for plan nodes.
//!
//! Singleton slots use `OnceCell::get_or_try_init`, so concurrent first
//! accesses block on a single construction and a failed construction leaves
//! the slot empty for the next caller.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::lifestyle::{HybridLifestyle, Lifestyle};
use crate::AnyArc;

use super::{PlanBuilder, PlanId, PlanNode};

pub(crate) enum Cache {
    Transient,
    Singleton(OnceCell<AnyArc>),
    Hybrid {
        lifestyle: Arc<HybridLifestyle>,
        when_true: Box<Cache>,
        when_false: Box<Cache>,
    },
}

impl Cache {
    pub(crate) fn for_lifestyle(lifestyle: &Lifestyle) -> Cache {
        match lifestyle {
            Lifestyle::Transient => Cache::Transient,
            Lifestyle::Singleton => Cache::Singleton(OnceCell::new()),
            Lifestyle::Hybrid(hybrid) => Cache::Hybrid {
                lifestyle: Arc::clone(hybrid),
                when_true: Box::new(Cache::for_lifestyle(hybrid.when_true())),
                when_false: Box::new(Cache::for_lifestyle(hybrid.when_false())),
            },
        }
    }

    pub(crate) fn get_or_create<F>(&self, create: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        match self {
            Cache::Transient => create(),
            Cache::Singleton(cell) => cell.get_or_try_init(create).cloned(),
            Cache::Hybrid {
                lifestyle,
                when_true,
                when_false,
            } => {
                if lifestyle.evaluate() {
                    when_true.get_or_create(create)
                } else {
                    when_false.get_or_create(create)
                }
            }
        }
    }
}

/// Wraps `plan` so its output is cached according to `lifestyle`.
/// Transient plans are returned unchanged.
pub(crate) fn wrap_with_caching(builder: &mut PlanBuilder, plan: PlanId, lifestyle: &Lifestyle) -> PlanId {
    match lifestyle {
        Lifestyle::Transient => plan,
        other => builder.push(PlanNode::Cached {
            inner: plan,
            lifestyle: other.clone(),
            cache: Cache::for_lifestyle(other),
        }),
    }
}
