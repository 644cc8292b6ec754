mod common;

use common::{class, t, Handlers};
use ferrous_decor::{
    builtins, Constructor, DecoratorRegistration, DiError, Lifestyle, ServiceCollection, TypeDef, TypeExpr,
};

fn configuration_error(err: DiError) -> (&'static str, String) {
    match err {
        DiError::Configuration { parameter, message } => (parameter, message),
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[test]
fn test_open_decorator_for_non_generic_service_is_rejected() {
    let repository = TypeDef::interface("IRepository").build();
    let open = class("OpenDecorator")
        .param("T")
        .implements(repository.expr())
        .constructor(Constructor::new().param("decoratee", repository.expr()))
        .build();

    let mut sc = ServiceCollection::new();
    let err = sc.add_decorator(repository.expr(), open.expr()).err().unwrap();
    let (parameter, message) = configuration_error(err);

    assert_eq!(parameter, "decorator_type");
    assert!(message.contains("is an open generic type definition"));
}

#[test]
fn test_open_decorator_for_closed_service_is_rejected() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    let err = sc.add_decorator(h.service(), h.transaction.expr()).err().unwrap();
    let (parameter, message) = configuration_error(err);

    assert_eq!(parameter, "service_type");
    assert_eq!(
        message,
        "Registering a closed generic service type with an open generic decorator is not supported. \
         Instead, register the service type as open generic, and the decorator as closed generic type."
    );
}

#[test]
fn test_closed_decorator_for_closed_service_is_accepted() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    assert!(sc.add_decorator(h.service(), h.closed(&h.transaction)).is_ok());
}

#[test]
fn test_decorator_without_decoratee_is_rejected() {
    let h = Handlers::new();
    let int = TypeDef::structure("Int32").build();
    let bad = class("BadDecorator")
        .param("T")
        .implements(h.handler.of([t()]))
        .constructor(Constructor::new().param("value", int.expr()))
        .build();

    let mut sc = ServiceCollection::new();
    let err = sc.add_decorator(h.handler.expr(), bad.expr()).err().unwrap();
    let (parameter, message) = configuration_error(err);

    assert_eq!(parameter, "decorator_type");
    assert_eq!(
        message,
        "For the container to be able to use BadDecorator<T> as a decorator, its constructor must include a single \
         parameter of type ICommandHandler<T> (or Func<ICommandHandler<T>>), where ICommandHandler<T> does not \
         currently exist in the constructor of class BadDecorator<T>."
    );
}

#[test]
fn test_decorator_with_two_decoratees_is_rejected() {
    let h = Handlers::new();
    let twice = class("TwiceDecorator")
        .param("T")
        .implements(h.handler.of([t()]))
        .constructor(
            Constructor::new()
                .param("first", h.handler.of([t()]))
                .param("second", h.handler.of([t()])),
        )
        .build();

    let err = DecoratorRegistration::fixed(h.handler.expr(), twice.expr()).err().unwrap();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("where ICommandHandler<T> is defined multiple times"));
}

#[test]
fn test_decorator_with_direct_and_deferred_decoratee_is_rejected() {
    let h = Handlers::new();
    let both = class("BothDecorator")
        .param("T")
        .implements(h.handler.of([t()]))
        .constructor(
            Constructor::new()
                .param("decoratee", h.handler.of([t()]))
                .param("factory", builtins::func_of(h.handler.of([t()]))),
        )
        .build();

    let err = DecoratorRegistration::fixed(h.handler.expr(), both.expr()).err().unwrap();
    assert!(err.to_string().contains("but it contains both"));
}

#[test]
fn test_decorator_with_multiple_constructors_is_rejected() {
    let h = Handlers::new();
    let multi = class("MultiConstructorDecorator")
        .param("T")
        .implements(h.handler.of([t()]))
        .constructor(Constructor::new().param("decoratee", h.handler.of([t()])))
        .constructor(Constructor::new())
        .build();

    let err = DecoratorRegistration::fixed(h.handler.expr(), multi.expr()).err().unwrap();
    assert!(err
        .to_string()
        .contains("should contain exactly one public constructor, but it has 2"));
}

#[test]
fn test_decorator_not_implementing_service_is_rejected() {
    let h = Handlers::new();
    let logger = TypeDef::interface("ILogger").build();
    let logging = class("LoggerDecorator")
        .implements(logger.expr())
        .constructor(Constructor::new().param("decoratee", logger.expr()))
        .build();

    let err = DecoratorRegistration::fixed(h.handler.expr(), logging.expr()).err().unwrap();
    let (parameter, message) = configuration_error(err);
    assert_eq!(parameter, "decorator_type");
    assert_eq!(
        message,
        "The supplied type LoggerDecorator does not implement ICommandHandler<TCommand>."
    );
}

#[test]
fn test_decorator_with_unresolvable_arguments_is_rejected() {
    let h = Handlers::new();
    let partial = class("PartialDecorator")
        .param("T")
        .param("U")
        .implements(h.handler.of([t()]))
        .constructor(Constructor::new().param("decoratee", h.handler.of([t()])))
        .build();

    let err = DecoratorRegistration::fixed(h.handler.expr(), partial.expr()).err().unwrap();
    assert_eq!(
        err.to_string(),
        "Invalid argument 'decorator_type': The supplied decorator PartialDecorator<T, U> contains unresolvable \
         type arguments. The type would never be resolved and is therefore not suited to be used as decorator."
    );
}

#[test]
fn test_builder_requires_a_decorator_source() {
    let h = Handlers::new();
    let err = DecoratorRegistration::builder(h.handler.expr())
        .lifestyle(Lifestyle::Singleton)
        .build()
        .err()
        .unwrap();
    assert!(err.is_configuration());
}

#[test]
fn test_rejected_registration_leaves_collection_unchanged() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    sc.add_transient(h.service(), h.stub_handler.expr()).unwrap();
    assert!(sc.add_decorator(h.service(), h.transaction.expr()).is_err());

    let sp = sc.build();
    assert!(sp.get_applied_decorators(&h.service()).unwrap().is_empty());
}

#[test]
fn test_service_registration_requires_closed_types() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();

    let err = sc.add_transient(h.handler.expr(), h.stub_handler.expr()).err().unwrap();
    assert!(err.to_string().contains("is an open generic type"));

    let err = sc.add_transient(h.service(), h.handler.of([TypeExpr::var("X")])).err().unwrap();
    assert!(err.is_configuration());
}

#[test]
fn test_service_registration_requires_assignable_implementation() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    let err = sc.add_transient(h.service(), h.other_handler.expr()).err().unwrap();
    assert_eq!(
        err.to_string(),
        "Invalid argument 'implementation_type': The supplied type OtherHandler does not implement ICommandHandler<RealCommand>."
    );
}
