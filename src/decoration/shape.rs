//! Structural validation of decorator types.

use thiserror::Error;

use crate::types::unify::unify;
use crate::types::{builtins, Bindings, TypeExpr};

/// How the decoratee is handed to the decorator's constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorateeForm {
    /// `Service`
    Direct,
    /// `Func<Service>`
    Deferred,
}

/// The validated constructor shape of a decorator.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratorShape {
    abstraction: TypeExpr,
    decoratee_index: usize,
    form: DecorateeForm,
}

impl DecoratorShape {
    /// The service abstraction the decorator implements and wraps, over the
    /// decorator's own arguments.
    pub fn abstraction(&self) -> &TypeExpr {
        &self.abstraction
    }

    pub fn decoratee_index(&self) -> usize {
        self.decoratee_index
    }

    pub fn form(&self) -> DecorateeForm {
        self.form
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("For the container to be able to use {decorator} as a decorator, it should contain exactly one public constructor, but it has {count}.")]
    ConstructorCount { decorator: String, count: usize },

    #[error("For the container to be able to use {decorator} as a decorator, its constructor must include a single parameter of type {abstraction} (or {factory}), where {abstraction} does not currently exist in the constructor of class {decorator}.")]
    MissingDecoratee {
        decorator: String,
        abstraction: String,
        factory: String,
    },

    #[error("For the container to be able to use {decorator} as a decorator, its constructor must include a single parameter of type {abstraction} (or {factory}), where {duplicated} is defined multiple times in the constructor of class {decorator}.")]
    DuplicateDecoratee {
        decorator: String,
        abstraction: String,
        factory: String,
        duplicated: String,
    },

    #[error("For the container to be able to use {decorator} as a decorator, its constructor must include a single parameter of type {abstraction} (or {factory}), but it contains both.")]
    AmbiguousDecoratee {
        decorator: String,
        abstraction: String,
        factory: String,
    },

    #[error("The supplied type {decorator} does not implement {service}.")]
    DoesNotImplement { decorator: String, service: String },
}

/// Validates `decorator` as a decorator of `service`.
///
/// `service` may be an open pattern (at registration) or a closed type (at
/// resolution). Rules run in order: a single constructor, a single decoratee
/// parameter, and an implemented abstraction matching `service`. A decorator
/// with no abstraction built from the service's definition fails the last
/// rule before the parameter rule is looked at.
pub fn validate(decorator: &TypeExpr, service: &TypeExpr) -> Result<DecoratorShape, ShapeError> {
    let does_not_implement = || ShapeError::DoesNotImplement {
        decorator: decorator.to_string(),
        service: service.to_string(),
    };
    let (Some(def), Some(service_def)) = (decorator.def(), service.def()) else {
        return Err(does_not_implement());
    };

    let constructor = match def.constructors() {
        [single] => single,
        others => {
            return Err(ShapeError::ConstructorCount {
                decorator: decorator.to_string(),
                count: others.len(),
            })
        }
    };

    let candidates = decorator.supertypes_of(service_def);
    let matching = candidates
        .iter()
        .find(|a| service.is_closed() && unify(a, service, &mut Bindings::new()));
    let abstraction = matching
        .or_else(|| candidates.first())
        .cloned()
        .ok_or_else(does_not_implement)?;

    let factory = builtins::func_of(abstraction.clone());
    let bindings = Bindings::for_expr(decorator);
    let mut direct = Vec::new();
    let mut deferred = Vec::new();
    for (index, param) in constructor.params().iter().enumerate() {
        let ty = param.ty().substitute(&bindings);
        if ty == abstraction {
            direct.push(index);
        } else if ty == factory {
            deferred.push(index);
        }
    }

    let (decoratee_index, form) = match (direct.as_slice(), deferred.as_slice()) {
        ([index], []) => (*index, DecorateeForm::Direct),
        ([], [index]) => (*index, DecorateeForm::Deferred),
        ([], []) => {
            return Err(ShapeError::MissingDecoratee {
                decorator: decorator.to_string(),
                abstraction: abstraction.to_string(),
                factory: factory.to_string(),
            })
        }
        (d, f) if d.len() > 1 || f.len() > 1 => {
            let duplicated = if d.len() > 1 { &abstraction } else { &factory };
            return Err(ShapeError::DuplicateDecoratee {
                decorator: decorator.to_string(),
                abstraction: abstraction.to_string(),
                factory: factory.to_string(),
                duplicated: duplicated.to_string(),
            });
        }
        _ => {
            return Err(ShapeError::AmbiguousDecoratee {
                decorator: decorator.to_string(),
                abstraction: abstraction.to_string(),
                factory: factory.to_string(),
            })
        }
    };

    if service.is_closed() && !unify(&abstraction, service, &mut Bindings::new()) {
        return Err(does_not_implement());
    }

    Ok(DecoratorShape {
        abstraction,
        decoratee_index,
        form,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Constructor, TypeDef};

    fn handler() -> TypeDef {
        TypeDef::interface("ICommandHandler").param("TCommand").build()
    }

    fn var(name: &str) -> TypeExpr {
        TypeExpr::var(name)
    }

    #[test]
    fn accepts_direct_and_deferred_decoratee() {
        let h = handler();
        let direct = TypeDef::class("Direct")
            .param("T")
            .implements(h.of([var("T")]))
            .constructor(Constructor::new().param("decoratee", h.of([var("T")])))
            .build();
        let deferred = TypeDef::class("Deferred")
            .param("T")
            .implements(h.of([var("T")]))
            .constructor(Constructor::new().param("factory", builtins::func_of(h.of([var("T")]))))
            .build();

        let shape = validate(&direct.expr(), &h.expr()).unwrap();
        assert_eq!(shape.form(), DecorateeForm::Direct);
        let shape = validate(&deferred.expr(), &h.expr()).unwrap();
        assert_eq!(shape.form(), DecorateeForm::Deferred);
        assert_eq!(shape.decoratee_index(), 0);
    }

    #[test]
    fn multiple_constructors_are_rejected_first() {
        let h = handler();
        let decorator = TypeDef::class("MultipleConstructors")
            .param("T")
            .implements(h.of([var("T")]))
            .constructor(Constructor::new())
            .constructor(Constructor::new().param("decoratee", h.of([var("T")])))
            .build();

        let err = validate(&decorator.expr(), &h.expr()).unwrap_err();
        assert!(err.to_string().contains("exactly one public constructor"));
    }

    #[test]
    fn missing_and_duplicate_decoratee() {
        let h = handler();
        let int = TypeDef::structure("Int32").build();
        let byte = TypeDef::structure("Byte").build();
        let missing = TypeDef::class("BadDecorator")
            .implements(h.of([int.expr()]))
            .constructor(Constructor::new().param("decoratee", h.of([byte.expr()])))
            .build();
        let duplicate = TypeDef::class("Duplicate")
            .param("T")
            .implements(h.of([var("T")]))
            .constructor(
                Constructor::new()
                    .param("first", h.of([var("T")]))
                    .param("second", h.of([var("T")])),
            )
            .build();

        let err = validate(&missing.expr(), &h.of([int.expr()])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "For the container to be able to use BadDecorator as a decorator, its constructor must include a single \
             parameter of type ICommandHandler<Int32> (or Func<ICommandHandler<Int32>>), where ICommandHandler<Int32> \
             does not currently exist in the constructor of class BadDecorator."
        );
        let err = validate(&duplicate.expr(), &h.expr()).unwrap_err();
        assert!(err.to_string().contains("is defined multiple times"));
    }

    #[test]
    fn closed_decorator_for_another_closing_does_not_implement() {
        let h = handler();
        let command = TypeDef::class("RealCommand").build();
        let int = TypeDef::structure("Int32").build();
        let decorator = TypeDef::class("RealCommandHandlerDecorator")
            .implements(h.of([command.expr()]))
            .constructor(Constructor::new().param("decoratee", h.of([command.expr()])))
            .build();

        let err = validate(&decorator.expr(), &h.of([int.expr()])).unwrap_err();
        assert_eq!(
            err,
            ShapeError::DoesNotImplement {
                decorator: "RealCommandHandlerDecorator".into(),
                service: "ICommandHandler<Int32>".into(),
            }
        );
        assert!(validate(&decorator.expr(), &h.expr()).is_ok());
    }
}
