use pretty_assertions::assert_eq;

use crate::{
    Body, ClassBuilder, DeclStore, Expr, FunctionBuilder, FunctionKind, Type, TypeParamDecl,
    Visibility,
};

#[test]
fn builder_registers_members_with_their_class() {
    let store = DeclStore::new();
    let mut pair = ClassBuilder::composite(&store, "Pair2Int");
    let a = pair.property("a", Type::INT);
    pair.property("b", Type::INT);
    let pair = pair.finish();

    let class = store.class(pair);
    assert!(class.is_composite());
    assert_eq!(class.properties.len(), 2);
    assert_eq!(class.fields.len(), 2);
    // two getters plus the primary constructor
    assert_eq!(class.functions.len(), 3);

    let representation = class.representation.clone().unwrap_or_default();
    let names: Vec<_> = representation
        .iter()
        .map(|(name, _)| store.name_str(*name))
        .collect();
    assert_eq!(names, vec!["a", "b"]);

    let ctor = store.function(class.primary_constructor.unwrap());
    assert!(ctor.is_primary_constructor());
    assert_eq!(ctor.params.len(), 2);
    assert_eq!(store.property(a).parent, pair);
}

#[test]
fn default_getter_is_recognized() {
    let store = DeclStore::new();
    let mut holder = ClassBuilder::regular(&store, "Holder");
    let x = holder.property("x", Type::INT);
    let y = holder.property_with_getter("y", Type::INT, &|_this| {
        Expr::constant(crate::Const::Int(7), Type::INT)
    });
    holder.finish();

    let x = store.property(x);
    let y = store.property(y);
    let x_getter = x.getter.unwrap();
    let y_getter = y.getter.unwrap();

    assert_eq!(store.getter_field(x_getter), x.backing_field);
    assert!(store.is_default_getter(x_getter, x.backing_field));
    assert!(store.is_default_getter(x_getter, None));
    assert!(!store.is_default_getter(x_getter, y.backing_field));
    assert_eq!(store.getter_field(y_getter), None);
    assert!(!store.is_default_getter(y_getter, y.backing_field));
}

#[test]
fn getter_field_requires_this_receiver() {
    let store = DeclStore::new();
    let mut holder = ClassBuilder::regular(&store, "Holder");
    let x = holder.property("x", Type::INT);
    let holder_id = holder.id();
    holder.finish();
    let field = store.property(x).backing_field.unwrap();

    let mut other = FunctionBuilder::method(&store, holder_id, "getOther");
    let stranger = other.param("other", store.default_type(holder_id));
    other
        .kind(FunctionKind::Getter { property: x })
        .returns(Type::INT)
        .body(Body::Expr(Expr::get_field(
            Some(Expr::get(stranger, store.default_type(holder_id))),
            field,
            Type::INT,
        )));
    let other = other.finish();

    assert_eq!(store.getter_field(other), None);
}

#[test]
fn private_fields_are_visible_only_from_their_class() {
    let store = DeclStore::new();
    let mut holder = ClassBuilder::regular(&store, "Holder");
    let x = holder.property("x", Type::INT);
    let holder = holder.finish();
    let unrelated = ClassBuilder::regular(&store, "Unrelated").finish();
    let field = store.property(x).backing_field.unwrap();

    assert_eq!(store.field(field).visibility, Visibility::Private);
    assert!(store.can_access_field(field, Some(holder)));
    assert!(!store.can_access_field(field, Some(unrelated)));
    assert!(!store.can_access_field(field, None));

    store.update_field(field, |f| f.visibility = Visibility::Public);
    assert!(store.can_access_field(field, None));
}

#[test]
fn erased_class_follows_first_upper_bound() {
    let store = DeclStore::new();
    let pair = ClassBuilder::composite(&store, "Pair").finish();
    let t = store.add_type_param(TypeParamDecl {
        name: store.intern("T"),
        upper_bounds: vec![store.default_type(pair)],
    });
    let u = store.add_type_param(TypeParamDecl {
        name: store.intern("U"),
        upper_bounds: vec![Type::param(t)],
    });

    assert_eq!(store.erased_class(&Type::param(u)), Some(pair));
    assert_eq!(store.erased_class(&Type::INT), None);
}

#[test]
fn copied_type_params_rebind_their_bounds() {
    let store = DeclStore::new();
    let t = store.add_type_param(TypeParamDecl {
        name: store.intern("T"),
        upper_bounds: vec![],
    });
    let u = store.add_type_param(TypeParamDecl {
        name: store.intern("U"),
        upper_bounds: vec![Type::param(t)],
    });

    let (copies, mapping) = store.copy_type_params(&[t, u]);

    assert_eq!(copies.len(), 2);
    assert_eq!(mapping[&t], Type::param(copies[0]));
    assert_eq!(
        store.type_param(copies[1]).upper_bounds,
        vec![Type::param(copies[0])]
    );
}

#[test]
fn nested_copies_rewrite_bounds_through_the_outer_scope() {
    let store = DeclStore::new();
    let t = store.add_type_param(TypeParamDecl {
        name: store.intern("T"),
        upper_bounds: vec![],
    });
    let r = store.add_type_param(TypeParamDecl {
        name: store.intern("R"),
        upper_bounds: vec![Type::param(t)],
    });

    let (outer_copies, outer) = store.copy_type_params(&[t]);
    let (copies, mapping) = store.copy_type_params_within(&[r], outer);

    assert_eq!(copies.len(), 1);
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping[&t], Type::param(outer_copies[0]));
    assert_eq!(mapping[&r], Type::param(copies[0]));
    assert_eq!(
        store.type_param(copies[0]).upper_bounds,
        vec![Type::param(outer_copies[0])]
    );
}

#[test]
fn classes_may_skip_the_primary_constructor() {
    let store = DeclStore::new();
    let mut counter = ClassBuilder::regular(&store, "Counter");
    let fixed = counter.property("fixed", Type::INT);
    let hits = counter.mutable_property("hits", Type::INT);
    counter.without_primary_constructor();
    let counter = counter.finish();

    assert_eq!(store.class(counter).primary_constructor, None);
    let is_final = |p| store.field(store.property(p).backing_field.unwrap()).is_final;
    assert!(is_final(fixed));
    assert!(!is_final(hits));
}

#[test]
fn render_type_spells_arguments_and_nullability() {
    let store = DeclStore::new();
    let mut boxed = ClassBuilder::regular(&store, "Box");
    let t = boxed.type_param("T", vec![]);
    let boxed = boxed.finish();

    let ty = Type::class(boxed, vec![Type::INT.make_nullable()]).make_nullable();
    assert_eq!(store.render_type(&ty), "Box<int?>?");
    assert_eq!(store.render_type(&Type::param(t)), "T");
}

#[test]
fn type_arguments_of_defaults_missing_arguments() {
    let store = DeclStore::new();
    let mut boxed = ClassBuilder::regular(&store, "Box");
    let t = boxed.type_param("T", vec![]);
    let boxed = boxed.finish();

    let bound = store.type_arguments_of(&Type::class(boxed, vec![Type::LONG]));
    assert_eq!(bound[&t], Type::LONG);

    let raw = store.type_arguments_of(&Type::class(boxed, vec![]));
    assert_eq!(raw[&t], Type::param(t));
}
