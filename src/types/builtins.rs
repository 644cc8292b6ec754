//! Definitions the container itself understands.

use once_cell::sync::Lazy;

use super::{TypeDef, TypeExpr};

static FUNC: Lazy<TypeDef> = Lazy::new(|| TypeDef::class("Func").param("TResult").build());
static ENUMERABLE: Lazy<TypeDef> = Lazy::new(|| TypeDef::interface("IEnumerable").param("T").build());
static DECORATOR_CONTEXT: Lazy<TypeDef> = Lazy::new(|| TypeDef::class("DecoratorContext").build());

/// `Func<TResult>`: a zero-argument factory. A decorator that takes
/// `Func<Service>` instead of `Service` receives an [`InstanceFactory`].
///
/// [`InstanceFactory`]: crate::InstanceFactory
pub fn func() -> &'static TypeDef {
    &FUNC
}

pub fn func_of(result: TypeExpr) -> TypeExpr {
    FUNC.of([result])
}

/// `IEnumerable<T>`: the abstraction collection registrations are resolved
/// through.
pub fn enumerable() -> &'static TypeDef {
    &ENUMERABLE
}

pub fn enumerable_of(element: TypeExpr) -> TypeExpr {
    ENUMERABLE.of([element])
}

/// `DecoratorContext`: a decorator constructor parameter of this type receives
/// the predicate context captured when the decorator was applied.
pub fn decorator_context() -> &'static TypeDef {
    &DECORATOR_CONTEXT
}

pub fn decorator_context_type() -> TypeExpr {
    DECORATOR_CONTEXT.expr()
}
