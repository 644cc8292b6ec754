//! Unification of decorator templates against requested service types.

use std::sync::Arc;

use super::{Bindings, Constraint, TypeExpr};

/// Outcome of matching a decorator template against a closed service type.
#[derive(Debug, Clone, PartialEq)]
pub enum DecoratorMatch {
    /// The fully closed decorator type that serves the request.
    Matched(TypeExpr),
    /// The decorator does not implement the requested abstraction.
    Unrelated,
    /// Inference succeeded but an argument violates a declared constraint.
    ConstraintViolation(String),
    /// Inference left these decorator parameters unbound.
    Unresolvable(Vec<Arc<str>>),
}

/// Structurally unifies `pattern` with `concrete`, extending `bindings`.
///
/// Variables in `pattern` bind to the corresponding sub-expression of
/// `concrete`; a variable seen twice must bind to equal expressions.
/// Variables in `concrete` are treated as opaque names.
pub fn unify(pattern: &TypeExpr, concrete: &TypeExpr, bindings: &mut Bindings) -> bool {
    match pattern {
        TypeExpr::Var(name) => match bindings.get(name) {
            Some(bound) => bound == concrete,
            None => {
                bindings.bind(name.clone(), concrete.clone());
                true
            }
        },
        TypeExpr::Named(def, args) => match concrete {
            TypeExpr::Named(other, other_args) if def == other && args.len() == other_args.len() => args
                .iter()
                .zip(other_args.iter())
                .all(|(p, c)| unify(p, c, bindings)),
            _ => false,
        },
    }
}

/// Matches a decorator template, possibly partially closed, against a closed
/// service type and infers the decorator's free arguments.
pub fn match_decorator(decorator: &TypeExpr, requested: &TypeExpr) -> DecoratorMatch {
    let Some(requested_def) = requested.def() else {
        return DecoratorMatch::Unrelated;
    };

    if decorator.is_closed() {
        if !decorator.is_assignable_to(requested) {
            return DecoratorMatch::Unrelated;
        }
        return match check_constraints(decorator) {
            Ok(()) => DecoratorMatch::Matched(decorator.clone()),
            Err(reason) => DecoratorMatch::ConstraintViolation(reason),
        };
    }

    let mut inferred = None;
    for abstraction in decorator.supertypes_of(requested_def) {
        let mut bindings = Bindings::new();
        if unify(&abstraction, requested, &mut bindings) {
            inferred = Some(bindings);
            break;
        }
    }
    let Some(bindings) = inferred else {
        return DecoratorMatch::Unrelated;
    };

    let closed = decorator.substitute(&bindings);
    if !closed.is_closed() {
        return DecoratorMatch::Unresolvable(closed.free_vars().into_vec());
    }
    match check_constraints(&closed) {
        Ok(()) => DecoratorMatch::Matched(closed),
        Err(reason) => DecoratorMatch::ConstraintViolation(reason),
    }
}

/// Decorator parameters that cannot be inferred from `abstraction`, the
/// implemented service abstraction the decorator is matched through.
pub fn unresolvable_params(decorator: &TypeExpr, abstraction: &TypeExpr) -> Vec<Arc<str>> {
    let reachable = abstraction.free_vars();
    decorator
        .free_vars()
        .into_iter()
        .filter(|v| !reachable.contains(v))
        .collect()
}

/// Checks every declared constraint of `ty`'s definition against its
/// arguments, recursing into nested arguments.
pub fn check_constraints(ty: &TypeExpr) -> Result<(), String> {
    let TypeExpr::Named(def, args) = ty else {
        return Ok(());
    };
    let bindings = Bindings::for_expr(ty);

    for (param, arg) in def.params().iter().zip(args.iter()) {
        for constraint in param.constraints() {
            let satisfied = match constraint {
                Constraint::ReferenceType => arg.kind().is_some_and(|k| k.is_reference_type()),
                Constraint::ValueType => arg.kind().is_some_and(|k| !k.is_reference_type()),
                Constraint::Implements(bound) => arg.is_assignable_to(&bound.substitute(&bindings)),
            };
            if !satisfied {
                return Err(format!(
                    "{} violates the constraint {} on type parameter {} of {}",
                    arg,
                    describe(constraint, &bindings),
                    param.name(),
                    def.name()
                ));
            }
        }
        check_constraints(arg)?;
    }
    Ok(())
}

fn describe(constraint: &Constraint, bindings: &Bindings) -> String {
    match constraint {
        Constraint::ReferenceType => "class".to_string(),
        Constraint::ValueType => "struct".to_string(),
        Constraint::Implements(bound) => bound.substitute(bindings).to_string(),
    }
}
