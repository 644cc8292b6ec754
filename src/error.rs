//! Error types for the decorator container.

use std::sync::Arc;

use thiserror::Error;

/// Dependency injection errors
///
/// Every failure surfaced by registration or resolution. The variants fall into
/// two classes: configuration errors, raised while services and decorators are
/// being registered, and activation errors, raised the first time a specific
/// closed service type is resolved. See [`DiError::is_configuration`] and
/// [`DiError::is_activation`].
///
/// # Examples
///
/// ```rust
/// use ferrous_decor::DiError;
///
/// let not_found = DiError::NotFound("ILogger".to_string());
/// assert_eq!(not_found.to_string(), "Service not found: ILogger");
///
/// let circular = DiError::Circular(vec!["A".into(), "B".into(), "A".into()]);
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// assert!(circular.is_activation());
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Service not registered
    #[error("Service not found: {0}")]
    NotFound(String),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(String),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum build depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Invalid registration; `parameter` names the offending argument
    #[error("Invalid argument '{parameter}': {message}")]
    Configuration {
        parameter: &'static str,
        message: String,
    },
    /// First resolution of `service` failed
    #[error("{message}")]
    Activation {
        service: String,
        message: String,
        #[source]
        cause: Option<Arc<DiError>>,
    },
    /// Raised by a user-supplied factory closure
    #[error("{0}")]
    Factory(String),
    /// The owning provider was dropped
    #[error("The container has been disposed")]
    Disposed,
}

impl DiError {
    pub(crate) fn configuration(parameter: &'static str, message: impl Into<String>) -> Self {
        DiError::Configuration {
            parameter,
            message: message.into(),
        }
    }

    pub(crate) fn activation(service: impl ToString, message: impl Into<String>) -> Self {
        DiError::Activation {
            service: service.to_string(),
            message: message.into(),
            cause: None,
        }
    }

    /// Wraps `cause` in an activation error for `service`, keeping the
    /// original error reachable through [`std::error::Error::source`].
    pub(crate) fn caused_by(service: impl ToString, message: impl Into<String>, cause: DiError) -> Self {
        DiError::Activation {
            service: service.to_string(),
            message: message.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    /// True for errors raised at registration time.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DiError::Configuration { .. })
    }

    /// True for errors raised while building or running a construction plan.
    pub fn is_activation(&self) -> bool {
        matches!(
            self,
            DiError::Activation { .. }
                | DiError::NotFound(_)
                | DiError::Circular(_)
                | DiError::DepthExceeded(_)
                | DiError::Factory(_)
        )
    }

    /// The directly wrapped error of an [`DiError::Activation`], if any.
    pub fn cause(&self) -> Option<&DiError> {
        match self {
            DiError::Activation { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }

    /// The innermost error in the activation chain.
    pub fn root_cause(&self) -> &DiError {
        let mut current = self;
        while let Some(next) = current.cause() {
            current = next;
        }
        current
    }
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;
