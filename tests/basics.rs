mod common;

use common::{object, Handlers};
use ferrous_decor::{AnyArc, Constructor, Lifestyle, Resolver, ServiceCollection, TypeDef, TypeParam};
use std::sync::Arc;

#[test]
fn test_undecorated_service_resolves_base_implementation() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    sc.add_transient(h.service(), h.stub_handler.expr()).unwrap();

    let sp = sc.build();
    let instance = object(sp.get_instance(&h.service()).unwrap());

    assert_eq!(instance.describe(), "StubHandler");
    assert!(sp.get_applied_decorators(&h.service()).unwrap().is_empty());
}

#[test]
fn test_single_open_generic_decorator_wraps_service() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    sc.add_transient(h.service(), h.stub_handler.expr()).unwrap();
    sc.add_decorator(h.handler.expr(), h.transaction.expr()).unwrap();

    let sp = sc.build();
    let instance = object(sp.get_instance(&h.service()).unwrap());

    assert_eq!(instance.ty, h.closed(&h.transaction));
    assert_eq!(instance.describe(), "TransactionDecorator<RealCommand>(StubHandler)");
}

#[test]
fn test_decorators_apply_in_registration_order() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    sc.add_transient(h.service(), h.stub_handler.expr())
        .unwrap()
        .add_decorator(h.handler.expr(), h.transaction.expr())
        .unwrap()
        .add_decorator(h.handler.expr(), h.log.expr())
        .unwrap();

    let sp = sc.build();
    let instance = object(sp.get_instance(&h.service()).unwrap());

    assert_eq!(
        instance.describe(),
        "LogDecorator<RealCommand>(TransactionDecorator<RealCommand>(StubHandler))"
    );
    assert_eq!(
        sp.get_applied_decorators(&h.service()).unwrap(),
        vec![h.closed(&h.transaction), h.closed(&h.log)]
    );
}

#[test]
fn test_decorator_registered_before_service_still_applies() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    sc.add_decorator(h.handler.expr(), h.log.expr()).unwrap();
    sc.add_singleton(h.service(), h.stub_handler.expr()).unwrap();

    let sp = sc.build();
    let instance = object(sp.get_instance(&h.service()).unwrap());
    assert_eq!(instance.describe(), "LogDecorator<RealCommand>(StubHandler)");
}

#[test]
fn test_transient_decorator_wraps_shared_singleton_decoratee() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    sc.add_singleton(h.service(), h.stub_handler.expr()).unwrap();
    sc.add_decorator(h.handler.expr(), h.transaction.expr()).unwrap();

    let sp = sc.build();
    let first = object(sp.get_instance(&h.service()).unwrap());
    let second = object(sp.get_instance(&h.service()).unwrap());

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.arg(0), &second.arg(0)));
    assert_eq!(sp.get_lifestyle(&h.service()).unwrap(), Lifestyle::Transient);
}

#[test]
fn test_decorators_apply_per_closed_service_type() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    sc.add_transient(h.service(), h.stub_handler.expr()).unwrap();
    sc.add_transient(h.other_service(), h.other_handler.expr()).unwrap();
    sc.add_decorator(h.handler.expr(), h.transaction.expr()).unwrap();

    let sp = sc.build();
    let real = object(sp.get_instance(&h.service()).unwrap());
    let other = object(sp.get_instance(&h.other_service()).unwrap());

    assert_eq!(real.describe(), "TransactionDecorator<RealCommand>(StubHandler)");
    assert_eq!(other.describe(), "TransactionDecorator<OtherCommand>(OtherHandler)");
}

#[test]
fn test_closed_decorator_only_wraps_its_own_closing() {
    let h = Handlers::new();
    let closed = h.closed(&h.log);
    let mut sc = ServiceCollection::new();
    sc.add_transient(h.service(), h.stub_handler.expr()).unwrap();
    sc.add_transient(h.other_service(), h.other_handler.expr()).unwrap();
    sc.add_decorator(h.handler.expr(), closed.clone()).unwrap();

    let sp = sc.build();
    assert_eq!(sp.get_applied_decorators(&h.service()).unwrap(), vec![closed]);
    assert!(sp.get_applied_decorators(&h.other_service()).unwrap().is_empty());
}

#[test]
fn test_non_generic_decorator_with_typed_instances() {
    struct SqlRepository;
    struct CachingRepository {
        inner: AnyArc,
    }

    let repository = TypeDef::interface("IRepository").build();
    let sql = TypeDef::class("SqlRepository")
        .implements(repository.expr())
        .constructor(Constructor::new())
        .activator(|_| Ok(Arc::new(SqlRepository)))
        .build();
    let caching = TypeDef::class("CachingRepository")
        .implements(repository.expr())
        .constructor(Constructor::new().param("inner", repository.expr()))
        .activator(|a| Ok(Arc::new(CachingRepository { inner: a.instance(0)? })))
        .build();

    let mut sc = ServiceCollection::new();
    sc.add_singleton(repository.expr(), sql.expr()).unwrap();
    sc.add_singleton_decorator(repository.expr(), caching.expr()).unwrap();

    let sp = sc.build();
    let first = sp.get_required::<CachingRepository>(&repository.expr());
    let second = sp.get_required::<CachingRepository>(&repository.expr());

    assert!(first.inner.is::<SqlRepository>());
    assert!(Arc::ptr_eq(&first, &second));
    assert!(sp.get::<SqlRepository>(&repository.expr()).is_err());
}

#[test]
fn test_instance_registration_is_decorated() {
    let h = Handlers::new();
    let stub: common::Object = common::Object {
        ty: h.stub_handler.expr(),
        args: Vec::new(),
    };

    let mut sc = ServiceCollection::new();
    sc.add_instance(h.service(), h.stub_handler.expr(), stub).unwrap();
    sc.add_decorator(h.handler.expr(), h.log.expr()).unwrap();

    let sp = sc.build();
    let first = object(sp.get_instance(&h.service()).unwrap());
    let second = object(sp.get_instance(&h.service()).unwrap());

    assert_eq!(first.describe(), "LogDecorator<RealCommand>(StubHandler)");
    assert!(Arc::ptr_eq(&first.arg(0), &second.arg(0)));
}

#[test]
fn test_factory_registration_is_decorated() {
    let h = Handlers::new();
    let stub_type = h.stub_handler.expr();

    let mut sc = ServiceCollection::new();
    sc.add_factory(h.service(), Lifestyle::Transient, move |_| {
        Ok(Arc::new(common::Object {
            ty: stub_type.clone(),
            args: Vec::new(),
        }) as AnyArc)
    })
    .unwrap();
    sc.add_decorator(h.handler.expr(), h.transaction.expr()).unwrap();

    let sp = sc.build();
    let instance = object(sp.get_instance(&h.service()).unwrap());
    assert_eq!(instance.describe(), "TransactionDecorator<RealCommand>(StubHandler)");
    assert_eq!(
        sp.get_producer(&h.service()).unwrap().implementation_type().unwrap(),
        h.service()
    );
}

#[test]
fn test_plan_description_shows_layers() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    sc.add_transient(h.service(), h.stub_handler.expr()).unwrap();
    sc.add_decorator(h.handler.expr(), h.transaction.expr()).unwrap();
    sc.add_singleton_decorator(h.handler.expr(), h.log.expr()).unwrap();

    let sp = sc.build();
    let plan = sp.get_producer(&h.service()).unwrap().plan().unwrap();
    assert_eq!(
        plan.describe(),
        "Singleton(LogDecorator<RealCommand>(TransactionDecorator<RealCommand>(StubHandler)))"
    );
}

#[test]
fn test_same_decorator_registered_twice_wraps_twice() {
    let h = Handlers::new();
    let mut sc = ServiceCollection::new();
    sc.add_transient(h.service(), h.stub_handler.expr()).unwrap();
    sc.add_decorator(h.handler.expr(), h.log.expr()).unwrap();
    sc.add_decorator(h.handler.expr(), h.log.expr()).unwrap();

    let sp = sc.build();
    let instance = object(sp.get_instance(&h.service()).unwrap());

    assert_eq!(
        instance.describe(),
        "LogDecorator<RealCommand>(LogDecorator<RealCommand>(StubHandler))"
    );
    assert_eq!(
        sp.get_applied_decorators(&h.service()).unwrap(),
        vec![h.closed(&h.log), h.closed(&h.log)]
    );
}

#[test]
fn test_constrained_decorator_only_wraps_matching_arguments() {
    let h = Handlers::new();
    let marker = TypeDef::interface("IMarker").build();
    let marked = TypeDef::class("MarkedCommand").implements(marker.expr()).build();
    let plain = TypeDef::class("PlainCommand").build();
    let marked_handler = common::class("MarkedHandler")
        .implements(h.handler.of([marked.expr()]))
        .constructor(Constructor::new())
        .build();
    let plain_handler = common::class("PlainHandler")
        .implements(h.handler.of([plain.expr()]))
        .constructor(Constructor::new())
        .build();
    let decorator = common::class("MarkedDecorator")
        .param(TypeParam::new("T").implementing(marker.expr()))
        .implements(h.handler.of([common::t()]))
        .constructor(Constructor::new().param("decoratee", h.handler.of([common::t()])))
        .build();

    let mut sc = ServiceCollection::new();
    sc.add_transient(h.handler.of([marked.expr()]), marked_handler.expr()).unwrap();
    sc.add_transient(h.handler.of([plain.expr()]), plain_handler.expr()).unwrap();
    sc.add_decorator(h.handler.expr(), decorator.expr()).unwrap();

    let sp = sc.build();
    let plain_instance = object(sp.get_instance(&h.handler.of([plain.expr()])).unwrap());
    let marked_instance = object(sp.get_instance(&h.handler.of([marked.expr()])).unwrap());

    assert_eq!(plain_instance.describe(), "PlainHandler");
    assert_eq!(marked_instance.describe(), "MarkedDecorator<MarkedCommand>(MarkedHandler)");
    assert!(sp.get_applied_decorators(&h.handler.of([plain.expr()])).unwrap().is_empty());
}
