mod common;

use common::{class, object, Object};
use ferrous_decor::{builtins, AnyArc, Constructor, Resolver, ServiceCollection, TypeDef, TypeExpr};
use std::sync::Arc;

struct Plugins {
    plugin: TypeDef,
    first: TypeDef,
    second: TypeDef,
}

impl Plugins {
    fn new() -> Self {
        let plugin = TypeDef::interface("IPlugin").build();
        let first = class("FirstPlugin")
            .implements(plugin.expr())
            .constructor(Constructor::new())
            .build();
        let second = class("SecondPlugin")
            .implements(plugin.expr())
            .constructor(Constructor::new())
            .build();
        Plugins { plugin, first, second }
    }

    fn collection(&self) -> TypeExpr {
        builtins::enumerable_of(self.plugin.expr())
    }
}

#[test]
fn test_collection_resolves_elements_in_order() {
    let p = Plugins::new();
    let mut sc = ServiceCollection::new();
    sc.add_collection(p.plugin.expr(), [p.first.expr(), p.second.expr()]).unwrap();

    let sp = sc.build();
    let plugins = sp.get_all::<Object>(&p.plugin.expr()).unwrap();
    let names: Vec<String> = plugins.iter().map(|o| o.describe()).collect();

    assert_eq!(names, vec!["FirstPlugin", "SecondPlugin"]);
}

#[test]
fn test_collection_elements_are_transient() {
    let p = Plugins::new();
    let mut sc = ServiceCollection::new();
    sc.add_collection(p.plugin.expr(), [p.first.expr()]).unwrap();

    let sp = sc.build();
    let a = sp.get_all::<Object>(&p.plugin.expr()).unwrap();
    let b = sp.get_all::<Object>(&p.plugin.expr()).unwrap();
    assert!(!Arc::ptr_eq(&a[0], &b[0]));
}

#[test]
fn test_collection_elements_must_implement_element_type() {
    let p = Plugins::new();
    let stranger = class("Stranger").constructor(Constructor::new()).build();
    let mut sc = ServiceCollection::new();

    let err = sc
        .add_collection(p.plugin.expr(), [p.first.expr(), stranger.expr()])
        .err()
        .unwrap();
    assert!(err.is_configuration());
}

#[test]
fn test_decorator_wraps_collection_as_a_whole() {
    let p = Plugins::new();
    let enumerable = builtins::enumerable();
    let composite = class("CompositePlugins")
        .param("T")
        .implements(enumerable.of([TypeExpr::var("T")]))
        .constructor(Constructor::new().param("plugins", enumerable.of([TypeExpr::var("T")])))
        .build();

    let mut sc = ServiceCollection::new();
    sc.add_collection(p.plugin.expr(), [p.first.expr(), p.second.expr()]).unwrap();
    sc.add_decorator(enumerable.expr(), composite.expr()).unwrap();

    let sp = sc.build();
    let wrapped = object(sp.get_all_instances(&p.plugin.expr()).unwrap());
    assert_eq!(wrapped.ty, composite.of([p.plugin.expr()]));

    let Object { args, .. } = &*wrapped;
    let inner = match &args[0] {
        ferrous_decor::Argument::Instance(value) => value.clone(),
        other => panic!("unexpected argument {:?}", other),
    };
    let items = inner.downcast::<Vec<AnyArc>>().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(
        sp.get_applied_decorators(&p.collection()).unwrap(),
        vec![composite.of([p.plugin.expr()])]
    );
}

#[test]
fn test_empty_collection_resolves_empty() {
    let p = Plugins::new();
    let mut sc = ServiceCollection::new();
    sc.add_collection(p.plugin.expr(), Vec::new()).unwrap();

    let sp = sc.build();
    assert!(sp.get_all::<Object>(&p.plugin.expr()).unwrap().is_empty());
}
