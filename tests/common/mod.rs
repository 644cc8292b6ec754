//! Shared fixtures: a generic activated object and the command handler model.
#![allow(dead_code)]

use std::sync::Arc;

use ferrous_decor::{
    Activation, AnyArc, Argument, Constructor, DecoratorPredicateContext, DiResult, InstanceFactory, TypeDef,
    TypeDefBuilder, TypeExpr,
};

/// What every fixture activator produces: the constructed type and the
/// arguments it received.
pub struct Object {
    pub ty: TypeExpr,
    pub args: Vec<Argument>,
}

impl Object {
    /// Nested form, e.g. `LogDecorator<RealCommand>(StubHandler)`.
    pub fn describe(&self) -> String {
        if self.args.is_empty() {
            return self.ty.to_string();
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                Argument::Instance(value) => match value.clone().downcast::<Object>() {
                    Ok(object) => object.describe(),
                    Err(_) => "?".to_string(),
                },
                Argument::Factory(factory) => format!("() => {}", factory.service_type()),
                Argument::Context(_) => "context".to_string(),
            })
            .collect();
        format!("{}({})", self.ty, args.join(", "))
    }

    pub fn arg(&self, index: usize) -> Arc<Object> {
        match &self.args[index] {
            Argument::Instance(value) => value.clone().downcast::<Object>().expect("argument is not an Object"),
            other => panic!("argument {} is {:?}", index, other),
        }
    }

    pub fn factory(&self, index: usize) -> InstanceFactory {
        match &self.args[index] {
            Argument::Factory(factory) => factory.clone(),
            other => panic!("argument {} is {:?}", index, other),
        }
    }

    pub fn context(&self, index: usize) -> Arc<DecoratorPredicateContext> {
        match &self.args[index] {
            Argument::Context(context) => context.clone(),
            other => panic!("argument {} is {:?}", index, other),
        }
    }
}

pub fn activate(activation: &Activation<'_>) -> DiResult<AnyArc> {
    Ok(Arc::new(Object {
        ty: activation.implementation_type().clone(),
        args: activation.arguments().to_vec(),
    }))
}

/// A class definition whose instances are [`Object`]s.
pub fn class(name: &str) -> TypeDefBuilder {
    TypeDef::class(name).activator(activate)
}

pub fn t() -> TypeExpr {
    TypeExpr::var("T")
}

/// `ICommandHandler<TCommand>` with a stub implementation and the usual
/// decorators around it.
pub struct Handlers {
    pub handler: TypeDef,
    pub real_command: TypeDef,
    pub other_command: TypeDef,
    pub stub_handler: TypeDef,
    pub other_handler: TypeDef,
    pub transaction: TypeDef,
    pub log: TypeDef,
    pub deferred: TypeDef,
}

impl Handlers {
    pub fn new() -> Self {
        let handler = TypeDef::interface("ICommandHandler").param("TCommand").build();
        let real_command = TypeDef::class("RealCommand").build();
        let other_command = TypeDef::class("OtherCommand").build();
        let stub_handler = class("StubHandler")
            .implements(handler.of([real_command.expr()]))
            .constructor(Constructor::new())
            .build();
        let other_handler = class("OtherHandler")
            .implements(handler.of([other_command.expr()]))
            .constructor(Constructor::new())
            .build();
        let transaction = generic_decorator(&handler, "TransactionDecorator");
        let log = generic_decorator(&handler, "LogDecorator");
        let deferred = class("AsyncDecorator")
            .param("T")
            .implements(handler.of([t()]))
            .constructor(Constructor::new().param("factory", ferrous_decor::builtins::func_of(handler.of([t()]))))
            .build();

        Handlers {
            handler,
            real_command,
            other_command,
            stub_handler,
            other_handler,
            transaction,
            log,
            deferred,
        }
    }

    /// `ICommandHandler<RealCommand>`
    pub fn service(&self) -> TypeExpr {
        self.handler.of([self.real_command.expr()])
    }

    /// `ICommandHandler<OtherCommand>`
    pub fn other_service(&self) -> TypeExpr {
        self.handler.of([self.other_command.expr()])
    }

    /// `decorator` closed over `RealCommand`.
    pub fn closed(&self, decorator: &TypeDef) -> TypeExpr {
        decorator.of([self.real_command.expr()])
    }
}

/// `name<T> : service<T>` taking a single `service<T>` decoratee.
pub fn generic_decorator(service: &TypeDef, name: &str) -> TypeDef {
    class(name)
        .param("T")
        .implements(service.of([t()]))
        .constructor(Constructor::new().param("decoratee", service.of([t()])))
        .build()
}

pub fn object(value: AnyArc) -> Arc<Object> {
    value.downcast::<Object>().expect("instance is not an Object")
}
