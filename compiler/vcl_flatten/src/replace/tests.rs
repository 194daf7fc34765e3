use pretty_assertions::assert_eq;

use vcl_ir::{
    ClassBuilder, CompositeOrigin, DeclStore, EmitScope, Expr, ExprKind, FunctionBuilder,
    FunctionFlags, FunctionId, Origin, Param, ParamOrigin, Type, ValueId,
};

use super::*;
use crate::test_helpers::{generic_pair, OuterFixture};

fn param_names(store: &DeclStore, function: FunctionId) -> Vec<&'static str> {
    store
        .function(function)
        .explicit_params()
        .map(|p| store.name_str(p.name))
        .collect()
}

/// A top-level function taking one `o: Outer` and one `n: int`.
fn use_outer(fx: &OuterFixture, flags: FunctionFlags) -> FunctionId {
    let mut f = FunctionBuilder::new(&fx.store, "useOuter", None);
    f.flags(flags);
    f.param("o", fx.outer_ty());
    f.param("n", Type::INT);
    f.finish()
}

fn arg_for(param: &Param, _expected: &Type) -> Option<Expr> {
    Some(Expr::get(param.value, param.ty.clone()))
}

// ── Eligibility ─────────────────────────────────────────────────

#[test]
fn local_lambda_and_synthetic_functions_are_skipped() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);

    for flags in [FunctionFlags::LOCAL, FunctionFlags::LAMBDA, FunctionFlags::FOREIGN] {
        let f = use_outer(&fx, flags);
        assert!(registry.replacement_for_function(f).unwrap().is_none());
    }
    let mut synthetic = FunctionBuilder::new(&fx.store, "bridge", None);
    synthetic.origin(Origin::Synthetic);
    synthetic.param("o", fx.outer_ty());
    let synthetic = synthetic.finish();
    assert!(registry.replacement_for_function(synthetic).unwrap().is_none());
}

#[test]
fn functions_without_composites_are_not_replaced() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let mut f = FunctionBuilder::new(&fx.store, "plain", None);
    f.param("n", Type::INT);
    f.returns(fx.outer_ty());
    let f = f.finish();
    assert!(registry.replacement_for_function(f).unwrap().is_none());
}

#[test]
fn composite_members_get_static_replacements() {
    let fx = OuterFixture::new();
    let mut shift = FunctionBuilder::method(&fx.store, fx.outer, "shift");
    shift.param("by", Type::INT);
    shift.returns(fx.outer_ty());
    let shift = shift.finish();
    let registry = Replacements::new(&fx.store);

    let replacement = registry.replacement_for_function(shift).unwrap().unwrap();
    assert_eq!(replacement.kind, ReplacementKind::Static);
    let decl = fx.store.function(replacement.function);
    assert!(decl.is_static());
    assert!(decl.dispatch_receiver.is_none());
    assert_eq!(decl.origin, Origin::StaticReplacement);
    assert_eq!(decl.parent, Some(fx.outer));
    assert_eq!(
        param_names(&fx.store, replacement.function),
        vec!["$dispatchReceiver-p-a", "$dispatchReceiver-p-b", "$dispatchReceiver-c", "by"]
    );
    assert_eq!(decl.params[0].origin, ParamOrigin::FlattenedComposite);
    assert_eq!(decl.params[3].origin, ParamOrigin::Defined);

    let sizes: Vec<_> = replacement.structure.iter().map(RemappedParameter::size).collect();
    assert_eq!(sizes, vec![3, 1]);
    assert_eq!(replacement.structure[0].boxed_type(), fx.outer_ty());

    let name = fx.store.name_str(decl.name);
    assert!(name.starts_with("shift-"), "{name}");
    assert_eq!(name.len(), "shift-".len() + 7);

    assert_eq!(registry.original_for_static_replacement(replacement.function), Some(shift));
    assert_eq!(registry.original_for_method_replacement(replacement.function), None);
    assert_eq!(registry.old_structure(shift).unwrap().len(), 2);

    let again = registry.replacement_for_function(shift).unwrap().unwrap();
    assert_eq!(again.function, replacement.function);
}

#[test]
fn representation_getters_and_primary_constructors_are_skipped() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let outer = fx.store.class(fx.outer);

    let ctor = outer.primary_constructor.unwrap();
    assert!(registry.replacement_for_function(ctor).unwrap().is_none());
    for &property in &outer.properties {
        let getter = fx.store.property(property).getter.unwrap();
        assert!(registry.replacement_for_function(getter).unwrap().is_none());
    }
}

#[test]
fn builtin_stubs_keep_their_receiver() {
    let fx = OuterFixture::new();
    let mut stub = FunctionBuilder::method(&fx.store, fx.outer, "hash");
    stub.flags(FunctionFlags::BUILTIN_STUB);
    stub.returns(Type::INT);
    let stub = stub.finish();
    let registry = Replacements::new(&fx.store);

    let replacement = registry.replacement_for_function(stub).unwrap().unwrap();
    assert_eq!(replacement.kind, ReplacementKind::Method);
    let decl = fx.store.function(replacement.function);
    assert_eq!(decl.origin, Origin::MethodReplacement);
    assert_eq!(decl.dispatch_receiver.as_ref().map(|p| p.ty.clone()), Some(fx.outer_ty()));
    assert_eq!(registry.original_for_method_replacement(replacement.function), Some(stub));
}

#[test]
fn typed_equals_gets_the_specialized_name() {
    let fx = OuterFixture::new();
    let mut equals = FunctionBuilder::method(&fx.store, fx.outer, "equals");
    equals.param("other", fx.outer_ty());
    equals.returns(Type::BOOL);
    let equals = equals.finish();
    let registry = Replacements::new(&fx.store);

    let replacement = registry.replacement_for_function(equals).unwrap().unwrap();
    let decl = fx.store.function(replacement.function);
    assert_eq!(fx.store.name_str(decl.name), "equals-impl0");
    assert_eq!(decl.explicit_param_count(), 6);
}

#[test]
fn regular_functions_get_method_replacements() {
    let fx = OuterFixture::new();
    let f = use_outer(&fx, FunctionFlags::empty());
    let registry = Replacements::new(&fx.store);

    let replacement = registry.replacement_for_function(f).unwrap().unwrap();
    assert_eq!(replacement.kind, ReplacementKind::Method);
    assert_eq!(
        param_names(&fx.store, replacement.function),
        vec!["o-p-a", "o-p-b", "o-c", "n"]
    );
    let decl = fx.store.function(replacement.function);
    let size: usize = replacement.structure.iter().map(RemappedParameter::size).sum();
    assert_eq!(size, decl.explicit_param_count());
    assert_eq!(registry.new_structure(replacement.function).unwrap().len(), 2);
    assert_eq!(registry.original_for_method_replacement(replacement.function), Some(f));
}

#[test]
fn mangled_return_types_force_a_replacement() {
    let fx = OuterFixture::new();
    let mut f = FunctionBuilder::new(&fx.store, "make", None);
    f.returns(fx.outer_ty());
    f.flags(FunctionFlags::MANGLE_RETURN);
    let f = f.finish();
    let registry = Replacements::new(&fx.store);

    let replacement = registry.replacement_for_function(f).unwrap().unwrap();
    assert!(replacement.structure.is_empty());
    let name = fx.store.name_str(fx.store.function(replacement.function).name);
    assert!(name.starts_with("make-"), "{name}");
}

#[test]
fn fake_overrides_follow_their_declaration() {
    let fx = OuterFixture::new();
    let base = ClassBuilder::regular(&fx.store, "Base").finish();
    let derived = ClassBuilder::regular(&fx.store, "Derived").finish();
    let mut declared = FunctionBuilder::method(&fx.store, base, "take");
    declared.param("o", fx.outer_ty());
    let declared = declared.finish();

    let mut fake = FunctionBuilder::method(&fx.store, derived, "take");
    fake.flags(FunctionFlags::FAKE_OVERRIDE);
    fake.overrides(declared);
    fake.param("o", fx.outer_ty());
    let fake = fake.finish();

    let mut orphan = FunctionBuilder::method(&fx.store, derived, "lost");
    orphan.flags(FunctionFlags::FAKE_OVERRIDE);
    orphan.param("o", fx.outer_ty());
    let orphan = orphan.finish();

    let registry = Replacements::new(&fx.store);
    let base_replacement = registry.replacement_for_function(declared).unwrap().unwrap();
    let fake_replacement = registry.replacement_for_function(fake).unwrap().unwrap();
    assert_eq!(
        fx.store.function(fake_replacement.function).overridden,
        vec![base_replacement.function]
    );
    assert!(registry.replacement_for_function(orphan).unwrap().is_none());
}

#[test]
fn receivers_become_leading_parameters() {
    let fx = OuterFixture::new();
    let mut f = FunctionBuilder::new(&fx.store, "f", None);
    f.context_receiver(fx.pair_ty());
    f.extension_receiver(fx.outer_ty());
    f.synthetic_param("mask", Type::INT);
    let f = f.finish();
    let registry = Replacements::new(&fx.store);

    let replacement = registry.replacement_for_function(f).unwrap().unwrap();
    assert_eq!(
        param_names(&fx.store, replacement.function),
        vec![
            "contextReceiver0-a",
            "contextReceiver0-b",
            "$receiver-p-a",
            "$receiver-p-b",
            "$receiver-c",
            "mask",
        ]
    );
    let sizes: Vec<_> = replacement.structure.iter().map(RemappedParameter::size).collect();
    assert_eq!(sizes, vec![2, 3, 1]);
    let decl = fx.store.function(replacement.function);
    assert!(decl.context_receivers.is_empty());
    assert!(decl.extension_receiver.is_none());
    assert_eq!(decl.params.last().map(|p| p.origin), Some(ParamOrigin::Synthetic));
}

#[test]
fn generic_members_copy_class_type_parameters() {
    let store = DeclStore::new();
    let (generic, t) = generic_pair(&store);
    let mut peek = FunctionBuilder::method(&store, generic, "peek");
    peek.returns(Type::param(t));
    let peek = peek.finish();
    let registry = Replacements::new(&store);

    let replacement = registry.replacement_for_function(peek).unwrap().unwrap();
    let decl = store.function(replacement.function);
    assert_eq!(decl.type_params.len(), 1);
    let copy = decl.type_params[0];
    assert_ne!(copy, t);
    assert_eq!(decl.return_ty, Type::param(copy));
    let types: Vec<_> = decl.params.iter().map(|p| p.ty.clone()).collect();
    assert_eq!(types, vec![Type::param(copy), Type::INT]);
}

#[test]
fn member_type_parameter_bounds_follow_copied_class_parameters() {
    let store = DeclStore::new();
    let (generic, t) = generic_pair(&store);
    let mut narrow = FunctionBuilder::method(&store, generic, "narrow");
    let r = narrow.type_param("R", vec![Type::param(t)]);
    narrow.param("r", Type::param(r));
    narrow.returns(Type::param(r));
    let narrow = narrow.finish();
    let registry = Replacements::new(&store);

    let replacement = registry.replacement_for_function(narrow).unwrap().unwrap();
    let decl = store.function(replacement.function);
    assert_eq!(decl.type_params.len(), 2);
    let (class_copy, own_copy) = (decl.type_params[0], decl.type_params[1]);
    assert_ne!(own_copy, r);
    assert_eq!(store.type_param(own_copy).upper_bounds, vec![Type::param(class_copy)]);
    assert_eq!(decl.return_ty, Type::param(own_copy));
    assert_eq!(decl.params.last().map(|p| p.ty.clone()), Some(Type::param(own_copy)));
}

// ── Constructors ────────────────────────────────────────────────

#[test]
fn regular_constructors_are_flattened() {
    let fx = OuterFixture::new();
    let mut holder = ClassBuilder::regular(&fx.store, "Wrapper");
    holder.property("o", fx.outer_ty());
    holder.property("tag", Type::STRING);
    let holder = holder.finish();
    let ctor = fx.store.class(holder).primary_constructor.unwrap();
    let registry = Replacements::new(&fx.store);

    let replacement = registry.replacement_for_constructor(ctor).unwrap().unwrap();
    assert_eq!(replacement.kind, ReplacementKind::Constructor);
    assert_eq!(param_names(&fx.store, replacement.function), vec!["o-p-a", "o-p-b", "o-c", "tag"]);
    let decl = fx.store.function(replacement.function);
    assert!(decl.is_constructor());
    assert_eq!(decl.params[0].value, ValueId::new(1));
    assert_eq!(registry.original_for_constructor_replacement(replacement.function), Some(ctor));

    let composite_ctor = fx.store.class(fx.outer).primary_constructor.unwrap();
    assert!(registry.replacement_for_constructor(composite_ctor).unwrap().is_none());
    let f = use_outer(&fx, FunctionFlags::empty());
    assert!(registry.replacement_for_constructor(f).unwrap().is_none());
}

// ── Default arguments ───────────────────────────────────────────

#[test]
fn flattened_defaults_are_recorded_per_group() {
    let fx = OuterFixture::new();
    let mut make = FunctionBuilder::new(&fx.store, "defaultOuter", None);
    make.returns(fx.outer_ty());
    let make = make.finish();
    let scope = EmitScope::new(&fx.store, None);
    let default = scope.call(make, Vec::new(), None, Vec::new());

    let mut f = FunctionBuilder::new(&fx.store, "withDefault", None);
    f.param_with_default("o", fx.outer_ty(), default.clone());
    let f = f.finish();
    let registry = Replacements::new(&fx.store);

    let replacement = registry.replacement_for_function(f).unwrap().unwrap();
    let decl = fx.store.function(replacement.function);
    assert!(decl.params.iter().all(|p| p.default.is_some()));
    assert_eq!(registry.default_argument(replacement.function, decl.params[0].value), Some(default));
    assert_eq!(registry.default_argument(replacement.function, decl.params[1].value), None);
}

// ── Name mangling ───────────────────────────────────────────────

#[test]
fn mangled_names_are_deterministic() {
    let build = || {
        let fx = OuterFixture::new();
        let f = use_outer(&fx, FunctionFlags::empty());
        let mut g = FunctionBuilder::new(&fx.store, "useOuter", None);
        g.param("p", fx.pair_ty());
        let g = g.finish();
        let registry = Replacements::new(&fx.store);
        let name = |function| {
            let replacement = registry.replacement_for_function(function).unwrap().unwrap();
            fx.store.name_str(fx.store.function(replacement.function).name)
        };
        (name(f), name(g))
    };
    let (first_f, first_g) = build();
    let (second_f, second_g) = build();
    assert_eq!(first_f, second_f);
    assert_eq!(first_g, second_g);
    assert_ne!(first_f, first_g);

    let hash = first_f.strip_prefix("useOuter-").unwrap();
    assert_eq!(hash.len(), 7);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn local_functions_keep_their_name() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let f = use_outer(&fx, FunctionFlags::LOCAL);
    let decl = fx.store.function(f);
    assert_eq!(registry.mangled_name(&decl), decl.name);
}

#[test]
fn overloads_with_equal_flattened_signatures_get_distinct_names() {
    let fx = OuterFixture::new();
    let mut whole = FunctionBuilder::new(&fx.store, "f", None);
    whole.param("o", fx.outer_ty());
    let whole = whole.finish();
    let mut spelled_out = FunctionBuilder::new(&fx.store, "f", None);
    spelled_out.param("p", fx.pair_ty());
    spelled_out.param("c", Type::INT);
    let spelled_out = spelled_out.finish();
    let registry = Replacements::new(&fx.store);

    let whole = registry.replacement_for_function(whole).unwrap().unwrap();
    let spelled_out = registry.replacement_for_function(spelled_out).unwrap().unwrap();
    let types = |r: &Replacement| -> Vec<Type> {
        fx.store.function(r.function).explicit_params().map(|p| p.ty.clone()).collect()
    };
    assert_eq!(types(&whole), types(&spelled_out));
    assert_ne!(
        fx.store.function(whole.function).name,
        fx.store.function(spelled_out.function).name
    );
}

#[test]
fn receiver_kind_enters_the_mangled_name() {
    let fx = OuterFixture::new();
    let mut extension = FunctionBuilder::new(&fx.store, "f", None);
    extension.extension_receiver(fx.outer_ty());
    let extension = extension.finish();
    let mut value = FunctionBuilder::new(&fx.store, "f", None);
    value.param("o", fx.outer_ty());
    let value = value.finish();
    let registry = Replacements::new(&fx.store);

    let name = |function| {
        let replacement = registry.replacement_for_function(function).unwrap().unwrap();
        fx.store.function(replacement.function).name
    };
    assert_ne!(name(extension), name(value));
}

// ── Call-site remapping ─────────────────────────────────────────

struct Structures {
    fx: OuterFixture,
    original: Arc<[RemappedParameter]>,
    flattened: Arc<[RemappedParameter]>,
}

fn structures() -> Structures {
    let fx = OuterFixture::new();
    let mut f = FunctionBuilder::new(&fx.store, "take", None);
    f.param("o", fx.outer_ty());
    let f = f.finish();
    let registry = Replacements::new(&fx.store);
    let replacement = registry.replacement_for_function(f).unwrap().unwrap();
    let original = registry.old_structure(f).unwrap();
    let flattened = Arc::clone(&replacement.structure);
    drop(registry);
    Structures { fx, original, flattened }
}

#[test]
fn composite_to_composite_passes_leaves_through() {
    let s = structures();
    let mut scope = EmitScope::new(&s.fx.store, None);
    let args = map_function_structures(&mut scope, &s.flattened, &s.flattened, arg_for).unwrap();

    let expected: Vec<_> = s.flattened[0]
        .params()
        .iter()
        .map(|p| (p.value, arg_for(p, &p.ty)))
        .collect();
    assert_eq!(args, expected);
    assert!(scope.statements().is_empty());
}

#[test]
fn different_composites_are_incompatible() {
    let fx = OuterFixture::new();
    let mut f = FunctionBuilder::new(&fx.store, "f", None);
    f.param("o", fx.outer_ty());
    let f = f.finish();
    let mut g = FunctionBuilder::new(&fx.store, "g", None);
    g.param("p", fx.pair_ty());
    let g = g.finish();
    let registry = Replacements::new(&fx.store);
    let f = registry.replacement_for_function(f).unwrap().unwrap();
    let g = registry.replacement_for_function(g).unwrap().unwrap();

    let mut scope = EmitScope::new(&fx.store, None);
    let err = map_function_structures(&mut scope, &f.structure, &g.structure, arg_for).unwrap_err();
    assert_eq!(
        err,
        FlattenError::IncompatibleStructure {
            target: "Outer".to_owned(),
            argument: "Pair2Int".to_owned(),
        }
    );
}

#[test]
fn same_class_with_other_arguments_is_compatible() {
    let store = DeclStore::new();
    let (generic, _) = generic_pair(&store);
    let mut f = FunctionBuilder::new(&store, "f", None);
    f.param("x", Type::class(generic, vec![Type::LONG]));
    let f = f.finish();
    let mut g = FunctionBuilder::new(&store, "g", None);
    g.param("y", Type::class(generic, vec![Type::INT]));
    let g = g.finish();
    let registry = Replacements::new(&store);
    let f = registry.replacement_for_function(f).unwrap().unwrap();
    let g = registry.replacement_for_function(g).unwrap().unwrap();

    let mut scope = EmitScope::new(&store, None);
    let args = map_function_structures(&mut scope, &f.structure, &g.structure, arg_for).unwrap();
    assert_eq!(args.len(), 2);

    // `first` widens from `int` to `long`; `count` is `int` on both sides.
    let first = args[0].1.as_ref().unwrap();
    assert_eq!(first.ty, Type::LONG);
    let ExprKind::ImplicitCast(inner) = &first.kind else {
        panic!("expected a conversion, got {first:?}");
    };
    assert_eq!(inner.ty, Type::INT);
    let count = args[1].1.as_ref().unwrap();
    assert_eq!(count.ty, Type::INT);
    assert!(matches!(count.kind, ExprKind::Get(_)));
}

#[test]
fn regular_arguments_are_coerced_to_the_target_type() {
    let store = DeclStore::new();
    let mut scope = EmitScope::new(&store, None);
    let target = [RemappedParameter::Regular(Param::new(ValueId::new(3), store.intern("n"), Type::LONG))];
    let source = [RemappedParameter::Regular(Param::new(ValueId::new(4), store.intern("n"), Type::INT))];

    let mut expected_types = Vec::new();
    let args = map_function_structures(&mut scope, &target, &source, |p, expected| {
        expected_types.push(expected.clone());
        arg_for(p, expected)
    })
    .unwrap();
    assert_eq!(expected_types, vec![Type::LONG]);
    let argument = Expr::get(ValueId::new(4), Type::INT);
    assert_eq!(args, vec![(ValueId::new(3), Some(argument.clone().coerce_to(&Type::LONG)))]);
    assert_eq!(args[0].1.as_ref().map(|e| e.ty.clone()), Some(Type::LONG));

    // Same type on both sides: passed through untouched.
    let args = map_function_structures(&mut scope, &source, &source, arg_for).unwrap();
    assert_eq!(args, vec![(ValueId::new(4), Some(argument))]);
}

#[test]
fn regular_to_composite_reads_each_leaf() {
    let s = structures();
    let mut scope = EmitScope::new(&s.fx.store, None);
    let outer = Expr::get(ValueId::new(500), s.fx.outer_ty());

    let args = map_function_structures(&mut scope, &s.flattened, &s.original, |_, _| Some(outer.clone())).unwrap();
    assert_eq!(args.len(), 3);
    let values: Vec<_> = args.iter().map(|(_, e)| e.clone().unwrap()).collect();
    assert_eq!(scope.count_all_calls(&values), 3);
    assert_eq!(scope.count_reads(&values, ValueId::new(500)), 3);

    // No argument: every leaf falls back to its default.
    let args = map_function_structures(&mut scope, &s.flattened, &s.original, |_, _| None).unwrap();
    assert!(args.iter().all(|(_, e)| e.is_none()));
}

#[test]
fn never_arguments_become_placeholders() {
    let s = structures();
    let mut scope = EmitScope::new(&s.fx.store, None);
    let never = Expr::get(ValueId::new(7), Type::NEVER);

    let args = map_function_structures(&mut scope, &s.flattened, &s.original, |_, _| Some(never.clone())).unwrap();
    assert_eq!(args.len(), 3);
    let mut originals = 0;
    for (i, (_, arg)) in args.iter().enumerate() {
        let arg = arg.as_ref().unwrap();
        assert!(arg.is_flattened_never_default());
        let ExprKind::Composite { origin, exprs } = &arg.kind else {
            panic!("expected a placeholder");
        };
        assert_eq!(*origin, CompositeOrigin::FlattenedNeverDefault);
        assert_eq!(exprs.last(), Some(&Expr::default_value(&Type::INT)));
        assert_eq!(exprs.len(), if i == 0 { 2 } else { 1 });
        originals += exprs.iter().filter(|e| **e == never).count();
    }
    assert_eq!(originals, 1);

    // Feeding the placeholders back recovers the original expression.
    let by_value: Vec<_> = args.into_iter().collect();
    let back = map_function_structures(&mut scope, &s.original, &s.flattened, |p, _| {
        by_value.iter().find(|(v, _)| *v == p.value).and_then(|(_, e)| e.clone())
    })
    .unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].1, Some(never));
}

#[test]
fn composite_to_regular_boxes_the_leaves() {
    let s = structures();
    let mut scope = EmitScope::new(&s.fx.store, None);

    let args = map_function_structures(&mut scope, &s.original, &s.flattened, arg_for).unwrap();
    assert_eq!(args.len(), 1);
    let boxed = args[0].1.as_ref().unwrap();
    assert_eq!(boxed.ty, s.fx.outer_ty());
    let call = boxed.as_call().unwrap();
    let expected: Vec<_> = s.flattened[0].params().iter().filter_map(|p| arg_for(p, &p.ty)).collect();
    assert_eq!(call.args, expected);

    let args = map_function_structures(&mut scope, &s.original, &s.flattened, |_, _| None).unwrap();
    assert_eq!(args[0].1, None);

    let first = s.flattened[0].params()[0].value;
    let err = map_function_structures(&mut scope, &s.original, &s.flattened, |p, _| {
        (p.value == first).then(|| Expr::get(p.value, p.ty.clone()))
    })
    .unwrap_err();
    assert!(matches!(err, FlattenError::StructuralMismatch { .. }));
}

#[test]
fn extra_parameters_must_be_synthetic() {
    let store = DeclStore::new();
    let mut scope = EmitScope::new(&store, None);
    let mut extra = Param::new(ValueId::new(3), store.intern("mask"), Type::INT);
    extra.origin = ParamOrigin::Synthetic;
    let target = [RemappedParameter::Regular(extra)];

    let args = map_function_structures(&mut scope, &target, &[], arg_for).unwrap();
    assert_eq!(args, vec![(ValueId::new(3), None)]);

    let defined = [RemappedParameter::Regular(Param::new(ValueId::new(4), store.intern("x"), Type::INT))];
    let err = map_function_structures(&mut scope, &defined, &[], arg_for).unwrap_err();
    assert_eq!(
        err,
        FlattenError::UnexpectedExtraParameter {
            decl: "<top level>".to_owned(),
            side: "target",
            param: "x".to_owned(),
        }
    );
    let err = map_function_structures(&mut scope, &[], &defined, arg_for).unwrap_err();
    assert!(matches!(err, FlattenError::UnexpectedExtraParameter { side: "source", .. }));
}
