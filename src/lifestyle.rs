//! Service lifestyle definitions.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Selector closure for a hybrid lifestyle.
pub type LifestyleSelector = Arc<dyn Fn() -> bool + Send + Sync>;

/// Lifestyles controlling instance caching behavior
///
/// A lifestyle is attached to every node that manufactures an instance: the
/// base implementation of a registration and each decorator layer wrapped
/// around it. Layers are cached independently, so a singleton decorator may
/// wrap a transient decoratee and the other way around.
///
/// - **Transient**: a new instance on every resolution
/// - **Singleton**: one instance per construction plan node, created on first
///   access with an atomic check-or-create
/// - **Hybrid**: picks one of two lifestyles on every access through a
///   selector closure; each side keeps its own cache
///
/// # Examples
///
/// ```rust
/// use ferrous_decor::Lifestyle;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let in_request = Arc::new(AtomicBool::new(false));
/// let flag = in_request.clone();
/// let hybrid = Lifestyle::hybrid(
///     "request-or-transient",
///     move || flag.load(Ordering::SeqCst),
///     Lifestyle::Singleton,
///     Lifestyle::Transient,
/// );
///
/// assert_eq!(hybrid.name(), "request-or-transient");
/// assert_eq!(hybrid, hybrid.clone());
/// assert_ne!(hybrid, Lifestyle::Singleton);
/// ```
#[derive(Clone, Default)]
pub enum Lifestyle {
    /// New instance on every access.
    #[default]
    Transient,
    /// One shared instance.
    Singleton,
    /// Per-call choice between two lifestyles.
    Hybrid(Arc<HybridLifestyle>),
}

/// The two arms and selector of a [`Lifestyle::Hybrid`].
pub struct HybridLifestyle {
    name: String,
    selector: LifestyleSelector,
    when_true: Lifestyle,
    when_false: Lifestyle,
}

impl HybridLifestyle {
    /// Evaluates the selector and returns the lifestyle that applies to this
    /// access.
    pub fn select(&self) -> &Lifestyle {
        if self.evaluate() {
            &self.when_true
        } else {
            &self.when_false
        }
    }

    /// Runs the selector.
    pub fn evaluate(&self) -> bool {
        (self.selector)()
    }

    pub fn when_true(&self) -> &Lifestyle {
        &self.when_true
    }

    pub fn when_false(&self) -> &Lifestyle {
        &self.when_false
    }
}

impl Lifestyle {
    /// Builds a hybrid lifestyle. Two hybrids are equal only when they are the
    /// same instance (clones share identity).
    pub fn hybrid<F>(name: impl Into<String>, selector: F, when_true: Lifestyle, when_false: Lifestyle) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Lifestyle::Hybrid(Arc::new(HybridLifestyle {
            name: name.into(),
            selector: Arc::new(selector),
            when_true,
            when_false,
        }))
    }

    pub fn name(&self) -> &str {
        match self {
            Lifestyle::Transient => "Transient",
            Lifestyle::Singleton => "Singleton",
            Lifestyle::Hybrid(h) => &h.name,
        }
    }

    /// True when at least one reachable arm keeps instances between accesses.
    pub fn is_cached(&self) -> bool {
        match self {
            Lifestyle::Transient => false,
            Lifestyle::Singleton => true,
            Lifestyle::Hybrid(h) => h.when_true.is_cached() || h.when_false.is_cached(),
        }
    }
}

impl PartialEq for Lifestyle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Lifestyle::Transient, Lifestyle::Transient) => true,
            (Lifestyle::Singleton, Lifestyle::Singleton) => true,
            (Lifestyle::Hybrid(a), Lifestyle::Hybrid(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Lifestyle {}

impl Hash for Lifestyle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        if let Lifestyle::Hybrid(h) = self {
            (Arc::as_ptr(h) as *const () as usize).hash(state);
        }
    }
}

impl fmt::Debug for Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifestyle::Transient => f.write_str("Transient"),
            Lifestyle::Singleton => f.write_str("Singleton"),
            Lifestyle::Hybrid(h) => f
                .debug_struct("Hybrid")
                .field("name", &h.name)
                .field("when_true", &h.when_true)
                .field("when_false", &h.when_false)
                .finish(),
        }
    }
}

impl fmt::Display for Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
