//! Type templates, closed types and the structural relations between them.
//!
//! The container never looks at Rust types. Services and decorators are
//! described by [`TypeDef`]s (named definitions with type parameters,
//! implemented abstractions and constructors) and referenced through
//! [`TypeExpr`]s, which are either a type variable or a definition applied to
//! argument expressions.
//!
//! ```rust
//! use ferrous_decor::{Constructor, TypeDef, TypeExpr};
//!
//! let handler = TypeDef::interface("ICommandHandler").param("TCommand").build();
//! let command = TypeDef::class("RealCommand").build();
//! let decorator = TypeDef::class("TransactionDecorator")
//!     .param("T")
//!     .implements(handler.of([TypeExpr::var("T")]))
//!     .constructor(Constructor::new().param("decoratee", handler.of([TypeExpr::var("T")])))
//!     .build();
//!
//! let closed = decorator.of([command.expr()]);
//! assert!(closed.is_closed());
//! assert!(closed.is_assignable_to(&handler.of([command.expr()])));
//! assert_eq!(closed.to_string(), "TransactionDecorator<RealCommand>");
//! ```

pub mod builtins;
pub mod unify;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::{DiError, DiResult};
use crate::plan::Activation;
use crate::AnyArc;

/// Manufactures an instance of a closed type from its resolved constructor
/// arguments.
pub type Activator = Arc<dyn Fn(&Activation<'_>) -> DiResult<AnyArc> + Send + Sync>;

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Category of a type definition. Drives the reference/value constraints and
/// whether a definition can be constructed just in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Interface,
    Class,
    Struct,
}

impl TypeKind {
    pub fn is_reference_type(self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Class)
    }
}

/// A constraint on a type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// The argument must be an interface or a class.
    ReferenceType,
    /// The argument must be a struct.
    ValueType,
    /// The argument must be assignable to the given type. The bound may refer
    /// to the other parameters of the same definition.
    Implements(TypeExpr),
}

/// A named type parameter and its constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    name: Arc<str>,
    constraints: Vec<Constraint>,
}

impl TypeParam {
    pub fn new(name: &str) -> Self {
        TypeParam {
            name: Arc::from(name),
            constraints: Vec::new(),
        }
    }

    pub fn reference_type(mut self) -> Self {
        self.constraints.push(Constraint::ReferenceType);
        self
    }

    pub fn value_type(mut self) -> Self {
        self.constraints.push(Constraint::ValueType);
        self
    }

    pub fn implementing(mut self, bound: TypeExpr) -> Self {
        self.constraints.push(Constraint::Implements(bound));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

impl From<&str> for TypeParam {
    fn from(name: &str) -> Self {
        TypeParam::new(name)
    }
}

/// A constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: Arc<str>,
    ty: TypeExpr,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter type, expressed over the owning definition's parameters.
    pub fn ty(&self) -> &TypeExpr {
        &self.ty
    }
}

/// An ordered list of constructor parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constructor {
    params: Vec<Parameter>,
}

impl Constructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: &str, ty: TypeExpr) -> Self {
        self.params.push(Parameter {
            name: Arc::from(name),
            ty,
        });
        self
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }
}

struct TypeDefInner {
    id: u64,
    name: Arc<str>,
    kind: TypeKind,
    params: Vec<TypeParam>,
    implements: Vec<TypeExpr>,
    constructors: Vec<Constructor>,
    activator: Option<Activator>,
}

/// A named type definition.
///
/// Identity is per definition: two definitions built with the same name are
/// different types. Cloning is cheap and preserves identity.
#[derive(Clone)]
pub struct TypeDef(Arc<TypeDefInner>);

impl TypeDef {
    pub fn interface(name: &str) -> TypeDefBuilder {
        TypeDefBuilder::new(name, TypeKind::Interface)
    }

    pub fn class(name: &str) -> TypeDefBuilder {
        TypeDefBuilder::new(name, TypeKind::Class)
    }

    pub fn structure(name: &str) -> TypeDefBuilder {
        TypeDefBuilder::new(name, TypeKind::Struct)
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    pub fn params(&self) -> &[TypeParam] {
        &self.0.params
    }

    pub fn is_generic(&self) -> bool {
        !self.0.params.is_empty()
    }

    /// Directly implemented abstractions, over this definition's parameters.
    pub fn implements(&self) -> &[TypeExpr] {
        &self.0.implements
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.0.constructors
    }

    pub fn activator(&self) -> Option<&Activator> {
        self.0.activator.as_ref()
    }

    /// Applies this definition to the given arguments.
    ///
    /// # Panics
    ///
    /// Panics when the number of arguments differs from the number of type
    /// parameters. Use [`try_of`](Self::try_of) for arguments that are not
    /// known to fit.
    pub fn of<I>(&self, args: I) -> TypeExpr
    where
        I: IntoIterator<Item = TypeExpr>,
    {
        let args: Arc<[TypeExpr]> = args.into_iter().collect();
        assert_eq!(
            args.len(),
            self.0.params.len(),
            "{} takes {} type arguments",
            self.name(),
            self.0.params.len()
        );
        TypeExpr::Named(self.clone(), args)
    }

    /// Like [`of`](Self::of), but reports an arity mismatch as a
    /// configuration error.
    pub fn try_of<I>(&self, args: I) -> DiResult<TypeExpr>
    where
        I: IntoIterator<Item = TypeExpr>,
    {
        let args: Arc<[TypeExpr]> = args.into_iter().collect();
        if args.len() != self.0.params.len() {
            return Err(DiError::configuration(
                "type_arguments",
                format!(
                    "The type {} has {} type parameters, but {} type arguments were supplied.",
                    self.name(),
                    self.0.params.len(),
                    args.len()
                ),
            ));
        }
        Ok(TypeExpr::Named(self.clone(), args))
    }

    /// This definition applied to its own parameters: the open template for a
    /// generic definition, the closed type otherwise.
    pub fn expr(&self) -> TypeExpr {
        self.of(self.0.params.iter().map(|p| TypeExpr::Var(p.name.clone())))
    }
}

impl PartialEq for TypeDef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeDef {}

impl Hash for TypeDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("arity", &self.0.params.len())
            .finish()
    }
}

/// Builder for [`TypeDef`].
pub struct TypeDefBuilder {
    name: Arc<str>,
    kind: TypeKind,
    params: Vec<TypeParam>,
    implements: Vec<TypeExpr>,
    constructors: Vec<Constructor>,
    activator: Option<Activator>,
}

impl TypeDefBuilder {
    fn new(name: &str, kind: TypeKind) -> Self {
        TypeDefBuilder {
            name: Arc::from(name),
            kind,
            params: Vec::new(),
            implements: Vec::new(),
            constructors: Vec::new(),
            activator: None,
        }
    }

    pub fn param(mut self, param: impl Into<TypeParam>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn implements(mut self, abstraction: TypeExpr) -> Self {
        self.implements.push(abstraction);
        self
    }

    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn activator<F>(mut self, activator: F) -> Self
    where
        F: Fn(&Activation<'_>) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.activator = Some(Arc::new(activator));
        self
    }

    pub fn build(self) -> TypeDef {
        TypeDef(Arc::new(TypeDefInner {
            id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            kind: self.kind,
            params: self.params,
            implements: self.implements,
            constructors: self.constructors,
            activator: self.activator,
        }))
    }
}

/// A type expression: a type variable, or a definition applied to arguments.
///
/// Two expressions are equal iff they name the same definition with equal
/// arguments (variables compare by name).
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Var(Arc<str>),
    Named(TypeDef, Arc<[TypeExpr]>),
}

impl TypeExpr {
    pub fn var(name: &str) -> Self {
        TypeExpr::Var(Arc::from(name))
    }

    pub fn def(&self) -> Option<&TypeDef> {
        match self {
            TypeExpr::Var(_) => None,
            TypeExpr::Named(def, _) => Some(def),
        }
    }

    pub fn args(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Var(_) => &[],
            TypeExpr::Named(_, args) => args,
        }
    }

    pub fn kind(&self) -> Option<TypeKind> {
        self.def().map(TypeDef::kind)
    }

    /// True when no type variable occurs anywhere in the expression.
    pub fn is_closed(&self) -> bool {
        match self {
            TypeExpr::Var(_) => false,
            TypeExpr::Named(_, args) => args.iter().all(TypeExpr::is_closed),
        }
    }

    /// Distinct type variables in order of first occurrence.
    pub fn free_vars(&self) -> SmallVec<[Arc<str>; 4]> {
        let mut out = SmallVec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut SmallVec<[Arc<str>; 4]>) {
        match self {
            TypeExpr::Var(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            TypeExpr::Named(_, args) => args.iter().for_each(|a| a.collect_vars(out)),
        }
    }

    /// Replaces bound variables; unbound ones are kept.
    pub fn substitute(&self, bindings: &Bindings) -> TypeExpr {
        match self {
            TypeExpr::Var(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeExpr::Named(def, args) => {
                if args.is_empty() {
                    return self.clone();
                }
                TypeExpr::Named(def.clone(), args.iter().map(|a| a.substitute(bindings)).collect())
            }
        }
    }

    /// The expression itself followed by every abstraction it implements,
    /// transitively, with the definition's parameters replaced by this
    /// expression's arguments.
    pub fn supertypes(&self) -> Vec<TypeExpr> {
        let mut out = vec![self.clone()];
        let mut next = 0;
        while next < out.len() {
            let current = out[next].clone();
            if let TypeExpr::Named(def, _) = &current {
                let bindings = Bindings::for_expr(&current);
                for abstraction in def.implements() {
                    let resolved = abstraction.substitute(&bindings);
                    if !out.contains(&resolved) {
                        out.push(resolved);
                    }
                }
            }
            next += 1;
        }
        out
    }

    /// Supertypes built from `def`, in discovery order.
    pub fn supertypes_of(&self, def: &TypeDef) -> Vec<TypeExpr> {
        self.supertypes()
            .into_iter()
            .filter(|s| s.def() == Some(def))
            .collect()
    }

    pub fn is_assignable_to(&self, target: &TypeExpr) -> bool {
        self == target || self.supertypes().iter().any(|s| s == target)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Var(name) => f.write_str(name),
            TypeExpr::Named(def, args) => {
                f.write_str(def.name())?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<&TypeDef> for TypeExpr {
    fn from(def: &TypeDef) -> Self {
        def.expr()
    }
}

/// Variable to type assignments produced by unification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: SmallVec<[(Arc<str>, TypeExpr); 4]>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a definition's parameter names to the arguments of `expr`.
    pub fn for_expr(expr: &TypeExpr) -> Self {
        let mut bindings = Bindings::new();
        if let TypeExpr::Named(def, args) = expr {
            for (param, arg) in def.params().iter().zip(args.iter()) {
                bindings.bind(param.name.clone(), arg.clone());
            }
        }
        bindings
    }

    pub fn get(&self, name: &str) -> Option<&TypeExpr> {
        self.entries
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, ty)| ty)
    }

    /// Sets `name`, replacing any earlier binding.
    pub fn bind(&mut self, name: Arc<str>, ty: TypeExpr) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = ty,
            None => self.entries.push((name, ty)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeExpr)> {
        self.entries.iter().map(|(n, ty)| (&**n, ty))
    }
}
