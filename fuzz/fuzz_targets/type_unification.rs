#![no_main]

use ferrous_decor::types::unify::{match_decorator, DecoratorMatch};
use ferrous_decor::{Activation, AnyArc, Constructor, DiResult, Lifestyle, ServiceCollection, TypeDef, TypeExpr};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fn activate(_: &Activation<'_>) -> DiResult<AnyArc> {
    Ok(Arc::new(()))
}

// Decodes a closed argument from the byte stream: leaves, List<_> and Pair<_, _>.
fn decode(bytes: &mut impl Iterator<Item = u8>, leaves: &[TypeDef], list: &TypeDef, pair: &TypeDef, depth: u8) -> TypeExpr {
    let byte = bytes.next().unwrap_or(0);
    match (byte % 4, depth) {
        (_, 0) | (0, _) | (1, _) => leaves[byte as usize % leaves.len()].expr(),
        (2, _) => list.of([decode(bytes, leaves, list, pair, depth - 1)]),
        _ => {
            let a = decode(bytes, leaves, list, pair, depth - 1);
            let b = decode(bytes, leaves, list, pair, depth - 1);
            pair.of([a, b])
        }
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let handler = TypeDef::interface("ICommandHandler").param("TCommand").build();
    let list = TypeDef::class("List").param("T").build();
    let pair = TypeDef::class("Pair").param("A").param("B").build();
    let leaves = [
        TypeDef::class("RealCommand").build(),
        TypeDef::structure("Int32").build(),
    ];
    let t = || TypeExpr::var("T");
    let open = TypeDef::class("TransactionDecorator")
        .param("T")
        .implements(handler.of([t()]))
        .constructor(Constructor::new().param("decoratee", handler.of([t()])))
        .activator(activate)
        .build();
    let list_only = TypeDef::class("ListDecorator")
        .param("T")
        .implements(handler.of([list.of([t()])]))
        .constructor(Constructor::new().param("decoratee", handler.of([list.of([t()])])))
        .activator(activate)
        .build();

    let mut bytes = data.iter().copied();
    let command = decode(&mut bytes, &leaves, &list, &pair, 6);
    let service = handler.of([command.clone()]);

    assert_eq!(
        match_decorator(&open.expr(), &service),
        DecoratorMatch::Matched(open.of([command.clone()]))
    );
    let list_match = match_decorator(&list_only.expr(), &service);
    assert_eq!(
        matches!(list_match, DecoratorMatch::Matched(_)),
        command.def() == Some(&list)
    );

    let stub = TypeDef::class("StubHandler")
        .implements(service.clone())
        .constructor(Constructor::new())
        .activator(activate)
        .build();
    let mut sc = ServiceCollection::new();
    sc.add_transient(service.clone(), stub.expr()).unwrap();
    sc.add_decorator(handler.expr(), open.expr()).unwrap();
    sc.add_decorator_with_lifestyle(handler.expr(), list_only.expr(), Lifestyle::Singleton)
        .unwrap();

    let provider = sc.build();
    assert!(provider.get_instance(&service).is_ok());
    let applied = provider.get_applied_decorators(&service).unwrap();
    assert_eq!(applied.first(), Some(&open.of([command])));
});
