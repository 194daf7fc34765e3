//! Declaration fixtures shared by the unit tests.

use vcl_ir::{
    Call, ClassBuilder, ClassId, DeclStore, Expr, FunctionId, PropertyId, Type, TypeParamId,
};

/// `Pair2Int { a: int, b: int }`
pub(crate) fn pair2int(store: &DeclStore) -> ClassId {
    let mut pair = ClassBuilder::composite(store, "Pair2Int");
    pair.property("a", Type::INT);
    pair.property("b", Type::INT);
    pair.finish()
}

/// `Outer { p: Pair2Int, c: int }`
pub(crate) fn outer(store: &DeclStore, pair: ClassId) -> ClassId {
    let mut outer = ClassBuilder::composite(store, "Outer");
    outer.property("p", Type::class(pair, vec![]));
    outer.property("c", Type::INT);
    outer.finish()
}

/// Both `Pair2Int` and `Outer`.
pub(crate) struct OuterFixture {
    pub store: DeclStore,
    pub pair: ClassId,
    pub outer: ClassId,
}

impl OuterFixture {
    pub(crate) fn new() -> Self {
        let store = DeclStore::new();
        let pair = pair2int(&store);
        let outer = outer(&store, pair);
        OuterFixture { store, pair, outer }
    }

    pub(crate) fn pair_ty(&self) -> Type {
        Type::class(self.pair, vec![])
    }

    pub(crate) fn outer_ty(&self) -> Type {
        Type::class(self.outer, vec![])
    }
}

/// Three nested levels, every accessor a plain field read:
/// `Inner { x: int, y: long }`, `Mid { i: Inner, z: double }`,
/// `Top { m: Mid, w: bool }`. Returns `Top`.
pub(crate) fn three_level(store: &DeclStore) -> ClassId {
    let mut inner = ClassBuilder::composite(store, "Inner");
    inner.property("x", Type::INT);
    inner.property("y", Type::LONG);
    let inner = inner.finish();

    let mut mid = ClassBuilder::composite(store, "Mid");
    mid.property("i", Type::class(inner, vec![]));
    mid.property("z", Type::DOUBLE);
    let mid = mid.finish();

    let mut top = ClassBuilder::composite(store, "Top");
    top.property("m", Type::class(mid, vec![]));
    top.property("w", Type::BOOL);
    top.finish()
}

/// A regular class `Holder` whose `p: Pair2Int` getter computes its value
/// by calling `this.makePair()` instead of reading its field.
pub(crate) struct CustomGetterFixture {
    pub holder: ClassId,
    pub property: PropertyId,
    pub getter: FunctionId,
    pub make_pair: FunctionId,
}

pub(crate) fn holder_with_custom_getter(store: &DeclStore, pair: ClassId) -> CustomGetterFixture {
    let pair_ty = Type::class(pair, vec![]);
    let mut holder = ClassBuilder::regular(store, "Holder");
    let mut make_pair = holder.method("makePair");
    make_pair.returns(pair_ty.clone());
    let make_pair = make_pair.finish();

    let property = holder.property_with_getter("p", pair_ty.clone(), &|this| {
        let call = Call {
            callee: make_pair,
            type_args: Vec::new(),
            dispatch_receiver: Some(this),
            args: Vec::new(),
        };
        Expr::call(call, pair_ty.clone())
    });
    let holder = holder.finish();
    let getter = store.property(property).getter.unwrap();
    CustomGetterFixture {
        holder,
        property,
        getter,
        make_pair,
    }
}

/// A regular class `Plain { p: Pair2Int }` with a default getter.
pub(crate) fn plain_holder(store: &DeclStore, pair: ClassId) -> (ClassId, PropertyId) {
    let mut plain = ClassBuilder::regular(store, "Plain");
    let property = plain.property("p", Type::class(pair, vec![]));
    (plain.finish(), property)
}

/// `Gen<T> { first: T, count: int }`.
pub(crate) fn generic_pair(store: &DeclStore) -> (ClassId, TypeParamId) {
    let mut generic = ClassBuilder::composite(store, "Gen");
    let t = generic.type_param("T", Vec::new());
    generic.property("first", Type::param(t));
    generic.property("count", Type::INT);
    (generic.finish(), t)
}
