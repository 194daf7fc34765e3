use pretty_assertions::assert_eq;
use smallvec::smallvec;

use vcl_ir::{DeclStore, EmitScope, ExprKind};

use super::*;
use crate::replace::Replacements;
use crate::test_helpers::{outer, pair2int, three_level, OuterFixture};

fn function_names(store: &DeclStore, functions: Vec<FunctionId>) -> Vec<&'static str> {
    functions
        .into_iter()
        .map(|f| store.name_str(store.function(f).name))
        .collect()
}

fn leaf_names(store: &DeclStore, node: &Node) -> Vec<&'static str> {
    node.leaves()
        .iter()
        .map(|l| store.name_str(l.name().full_field_name()))
        .collect()
}

/// Every non-leaf node's leaf count is the sum over its children.
fn assert_leaf_counts_add_up(node: &Node) {
    if let Some(children) = node.children() {
        let sum: usize = children.iter().map(FlatNode::leaf_count).sum();
        assert_eq!(node.leaf_count(), sum);
        for child in children {
            assert_leaf_counts_add_up(child);
        }
    }
}

// ── Structure ───────────────────────────────────────────────────

#[test]
fn outer_decomposes_into_three_leaves() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let root = Node::Root(registry.root_node(fx.outer).unwrap());

    assert_eq!(root.leaf_count(), 3);
    assert_eq!(root.children().unwrap().len(), 2);
    assert_eq!(leaf_names(&fx.store, &root), vec!["p-a", "p-b", "c"]);

    let p = root.child(fx.store.intern("p")).unwrap();
    assert!(matches!(p, Node::Intermediate(_)));
    assert_eq!(p.leaf_count(), 2);
    assert_eq!(p.root().unwrap().class(), fx.pair);

    let c = root.child(fx.store.intern("c")).unwrap();
    assert!(matches!(c, Node::Leaf(_)));
}

#[test]
fn ranges_follow_prefix_sums() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let root = Node::Root(registry.root_node(fx.outer).unwrap());
    let (p, c, b) = (fx.store.intern("p"), fx.store.intern("c"), fx.store.intern("b"));

    let (_, p_range) = root.subnode_and_range(p).unwrap();
    let (_, c_range) = root.subnode_and_range(c).unwrap();
    assert_eq!(p_range, 0..2);
    assert_eq!(c_range, 2..3);
    assert_eq!(root.range_of_path(&[p, b]), Some(1..2));
    assert_eq!(root.range_of_path(&[]), Some(0..3));
    assert_eq!(root.range_of_path(&[c, b]), None);
}

#[test]
fn get_path_resolves_nested_members() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let root = Node::Root(registry.root_node(fx.outer).unwrap());
    let path = [fx.store.intern("p"), fx.store.intern("a")];

    let leaf = root.get_path(&path).unwrap();
    let name = leaf.name().unwrap();
    assert_eq!(fx.store.name_str(name.full_field_name()), "p-a");
    assert_eq!(fx.store.name_str(name.full_method_name()), "unbox-impl-p-a");
    assert_eq!(leaf.ty(), &Type::INT);
    assert!(root.get_path(&[fx.store.intern("missing")]).is_none());
}

#[test]
fn leaf_counts_add_up_three_levels_deep() {
    let store = DeclStore::new();
    let top = three_level(&store);
    let registry = Replacements::new(&store);
    let root = Node::Root(registry.root_node(top).unwrap());

    assert_leaf_counts_add_up(&root);
    assert_eq!(leaf_names(&store, &root), vec!["m-i-x", "m-i-y", "m-z", "w"]);
    assert!(root.has_pure_unbox_method());
    for leaf in root.leaves() {
        assert!(leaf.has_pure_unbox_method());
    }
}

#[test]
fn unbox_method_lists() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let root = Node::Root(registry.root_node(fx.outer).unwrap());

    assert_eq!(
        function_names(&fx.store, root.leaves_unbox_methods()),
        vec!["unbox-impl-p-a", "unbox-impl-p-b", "unbox-impl-c"]
    );
    assert_eq!(
        function_names(&fx.store, root.all_unbox_methods()),
        vec!["unbox-impl-p-a", "unbox-impl-p-b", "unbox-impl-p", "unbox-impl-c"]
    );
}

#[test]
fn render_lists_every_node() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let root = Node::Root(registry.root_node(fx.outer).unwrap());

    assert_eq!(
        root.render(&fx.store),
        "Outer\n    p: Pair2Int\n        p-a: int\n        p-b: int\n    c: int\n"
    );
}

// ── Children validation ─────────────────────────────────────────

#[test]
fn duplicate_sibling_names_are_rejected() {
    let store = DeclStore::new();
    let pair = pair2int(&store);
    let registry = Replacements::new(&store);
    let root = registry.root_node(pair).unwrap();
    let a = root.children().get(store.intern("a")).unwrap().clone();

    let err = Children::new(&store, "Dup", vec![a.clone(), a]).unwrap_err();
    assert_eq!(
        err,
        FlattenError::DuplicateName {
            decl: "Dup".to_owned(),
            name: "a".to_owned(),
            count: 2,
        }
    );
}

#[test]
fn children_must_share_a_parent_path() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let pair_root = registry.root_node(fx.pair).unwrap();
    let outer_root = Node::Root(registry.root_node(fx.outer).unwrap());
    let a = pair_root.children().get(fx.store.intern("a")).unwrap().clone();
    let p_b = outer_root
        .get_path(&[fx.store.intern("p"), fx.store.intern("b")])
        .unwrap()
        .clone();

    let err = Children::new(&fx.store, "Mixed", vec![a, p_b]).unwrap_err();
    assert!(matches!(err, FlattenError::StructuralMismatch { .. }));
}

#[test]
fn fields_exist_for_all_leaves_or_none() {
    let store = DeclStore::new();
    let pair = pair2int(&store);
    let registry = Replacements::new(&store);
    let root = registry.root_node(pair).unwrap();
    let a = root.children().get(store.intern("a")).unwrap().clone();
    let Node::Leaf(b) = root.children().get(store.intern("b")).unwrap() else {
        panic!("`b` is a leaf");
    };

    let name = NodeName::new(&store, NamingMode::UnboxFunction, smallvec![store.intern("b")]);
    let storage_less = LeafNode::new(&store, Type::INT, name, None, b.accessor(), &UnboxImpl::Default).unwrap();

    let err = Children::new(&store, "Pair2Int", vec![a, Node::Leaf(Arc::new(storage_less))]).unwrap_err();
    assert_eq!(
        err,
        FlattenError::mismatch("Pair2Int", "fields can either exist for all leaves or for none")
    );
}

#[test]
fn a_root_cannot_be_a_child() {
    let store = DeclStore::new();
    let pair = pair2int(&store);
    let registry = Replacements::new(&store);
    let root = Node::Root(registry.root_node(pair).unwrap());

    let err = Children::new(&store, "Nested", vec![root]).unwrap_err();
    assert!(matches!(err, FlattenError::StructuralMismatch { .. }));
}

#[test]
fn empty_children_are_rejected() {
    let store = DeclStore::new();
    assert!(Children::new(&store, "Empty", Vec::new()).is_err());
}

// ── Unbox policies ──────────────────────────────────────────────

#[test]
fn policies_project_onto_children() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let root = Node::Root(registry.root_node(fx.outer).unwrap());
    let p = fx.store.intern("p");
    let getter = root.child(p).unwrap().unbox_method().unwrap();

    assert_eq!(UnboxImpl::Default.child(p), Some(UnboxImpl::Default));
    assert_eq!(UnboxImpl::External.child(p), Some(UnboxImpl::External));

    let custom = UnboxImpl::Custom {
        getter,
        node: root.clone(),
    };
    assert_eq!(
        custom.child(p),
        Some(UnboxImpl::Custom {
            getter,
            node: root.child(p).unwrap().clone(),
        })
    );

    let delegating = UnboxImpl::Delegating(root.child(fx.store.intern("c")).unwrap().clone());
    assert!(delegating.is_pure());
    assert_eq!(delegating.child(p), None);
    assert!(!custom.is_pure());
    assert!(!UnboxImpl::External.is_pure());
}

// ── Boxing ──────────────────────────────────────────────────────

#[test]
fn boxed_expression_calls_the_box_method() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let root = registry.root_node(fx.outer).unwrap();
    let node = Node::Root(Arc::clone(&root));
    let scope = EmitScope::new(&fx.store, None);
    let values = vec![
        Expr::constant(vcl_ir::Const::Int(1), Type::INT),
        Expr::constant(vcl_ir::Const::Int(2), Type::INT),
        Expr::constant(vcl_ir::Const::Int(3), Type::INT),
    ];

    let boxed = make_boxed_expression(&scope, &node, &TypeArguments::default(), values).unwrap();
    assert_eq!(boxed.ty, fx.outer_ty());
    let ExprKind::Call(call) = &boxed.kind else {
        panic!("expected a call, got {boxed:?}");
    };
    assert_eq!(call.callee, root.box_method());
    assert_eq!(call.args.len(), 3);
}

#[test]
fn boxed_expression_checks_the_value_count() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let node = Node::Root(registry.root_node(fx.outer).unwrap());
    let scope = EmitScope::new(&fx.store, None);

    let err = make_boxed_expression(&scope, &node, &TypeArguments::default(), Vec::new()).unwrap_err();
    assert_eq!(err, FlattenError::mismatch("Outer", "0 values for 3 leaves"));
}

#[test]
fn leaves_cannot_be_boxed() {
    let fx = OuterFixture::new();
    let registry = Replacements::new(&fx.store);
    let root = Node::Root(registry.root_node(fx.outer).unwrap());
    let c = root.child(fx.store.intern("c")).unwrap();
    let scope = EmitScope::new(&fx.store, None);

    let err = make_boxed_expression(&scope, c, &TypeArguments::default(), Vec::new()).unwrap_err();
    assert_eq!(err, FlattenError::NotComposite { ty: "int".to_owned() });
}

#[test]
fn node_identity_is_by_reference() {
    let store = DeclStore::new();
    let pair = pair2int(&store);
    let first = outer(&store, pair);
    let second = outer(&store, pair);
    let registry = Replacements::new(&store);

    let a = Node::Root(registry.root_node(first).unwrap());
    let b = Node::Root(registry.root_node(second).unwrap());
    assert_eq!(a, Node::Root(registry.root_node(first).unwrap()));
    assert!(a != b);
}
