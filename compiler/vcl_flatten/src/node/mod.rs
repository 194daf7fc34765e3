//! The node model: how one composite declaration decomposes into leaves.
//!
//! A node tree is built once per composite declaration, is independent of
//! any particular value, and is immutable afterwards. Three kinds of node
//! exist:
//!
//! - [`LeafNode`]: a non-composite member, with an optional backing field
//!   and an unbox accessor.
//! - [`IntermediateNode`]: a composite-typed member that decomposes further.
//!   It owns its children and points at the root of its own type.
//! - [`RootNode`]: the declaration as a whole, owning the box method,
//!   specialized equality, and the constructors.
//!
//! # Leaf Order
//!
//! Leaves are numbered depth-first in member-declaration order. That one
//! order fixes box-method parameters, flattened constructor parameters,
//! and flattened call-site arguments. Every node occupies a contiguous
//! range of its root's leaves, computed once per parent by prefix sums
//! over child leaf counts.

pub mod naming;

use std::fmt::Write as _;
use std::ops::Range;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use vcl_ir::{
    ClassId, DeclStore, EmitScope, Expr, FieldId, FunctionDecl, FunctionId, Name, Type,
    TypeArguments,
};

use crate::classify::FlatteningClassification;
use crate::{FlattenError, Result};

pub use naming::{NameParts, NamingMode, NodeName};

/// Shared structural queries over every node kind.
pub trait FlatNode {
    /// Declared type of the member (or, for a root, of the declaration).
    fn ty(&self) -> &Type;

    /// Number of leaves at or below this node.
    fn leaf_count(&self) -> usize;

    /// Backing fields of every leaf in leaf order, or `None` if the node
    /// has no storage.
    fn fields(&self) -> Option<Vec<FieldId>>;

    /// The accessor returning this node's value from a boxed receiver.
    /// Roots have none: the receiver already is the value.
    fn unbox_method(&self) -> Option<FunctionId>;
}

// ── Unbox accessor policy ───────────────────────────────────────────

/// Where the body of a synthesized unbox accessor comes from.
///
/// The policy is threaded down the recursive build; each child receives
/// the policy projected onto its own member name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnboxImpl {
    /// A fresh pure accessor: a direct field read.
    Default,
    /// Precompiled declaration: the accessor has a signature only.
    External,
    /// Forward to the accessor of another, already built node.
    Delegating(Node),
    /// Call an existing non-pure `getter`, then `node`'s accessor on its result.
    Custom { getter: FunctionId, node: Node },
}

impl UnboxImpl {
    /// Whether accessors built from this policy are direct field reads.
    pub fn is_pure(&self) -> bool {
        match self {
            UnboxImpl::Default => true,
            UnboxImpl::External | UnboxImpl::Custom { .. } => false,
            UnboxImpl::Delegating(node) => node.has_pure_unbox_method(),
        }
    }

    /// The policy for member `name` of the node this policy applies to.
    pub fn child(&self, name: Name) -> Option<UnboxImpl> {
        Some(match self {
            UnboxImpl::Default => UnboxImpl::Default,
            UnboxImpl::External => UnboxImpl::External,
            UnboxImpl::Delegating(node) => UnboxImpl::Delegating(node.child(name)?.clone()),
            UnboxImpl::Custom { getter, node } => UnboxImpl::Custom {
                getter: *getter,
                node: node.child(name)?.clone(),
            },
        })
    }
}

// ── Children ────────────────────────────────────────────────────────

/// The ordered children of a root or intermediate node.
#[derive(Debug)]
pub struct Children {
    nodes: Vec<Node>,
    by_name: FxHashMap<Name, usize>,
    /// `offsets[i]..offsets[i + 1]` is the leaf range of child `i`.
    offsets: Vec<usize>,
    fields: Option<Vec<FieldId>>,
}

impl Children {
    /// Validate and index `nodes`.
    ///
    /// Children must be non-empty named nodes sharing one parent path,
    /// with pairwise-distinct names, and either all or none of their
    /// leaves backed by fields.
    pub(crate) fn new(store: &DeclStore, owner: &str, nodes: Vec<Node>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(FlattenError::mismatch(owner, "a composite node needs at least one child"));
        }

        let mut prefix: Option<&[Name]> = None;
        for node in &nodes {
            let Some(name) = node.name() else {
                return Err(FlattenError::mismatch(owner, "a root node cannot be a child"));
            };
            let parts = name.parts();
            let parent_parts = &parts[..parts.len() - 1];
            match prefix {
                None => prefix = Some(parent_parts),
                Some(p) if p == parent_parts => {}
                Some(_) => {
                    return Err(FlattenError::mismatch(owner, "children disagree on their parent path"));
                }
            }
        }

        let mut by_name = FxHashMap::default();
        for (index, node) in nodes.iter().enumerate() {
            let name = node.name().map(NodeName::name).unwrap_or(Name::EMPTY);
            if by_name.insert(name, index).is_some() {
                let count = nodes
                    .iter()
                    .filter(|n| n.name().map(NodeName::name) == Some(name))
                    .count();
                return Err(FlattenError::DuplicateName {
                    decl: owner.to_owned(),
                    name: store.name_str(name).to_owned(),
                    count,
                });
            }
        }

        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        let mut offset = 0;
        offsets.push(offset);
        for node in &nodes {
            offset += node.leaf_count();
            offsets.push(offset);
        }

        let mut leaf_fields = Vec::with_capacity(offset);
        for node in &nodes {
            node.for_each_leaf(&mut |leaf| leaf_fields.push(leaf.field()));
        }
        let fields = if leaf_fields.iter().all(Option::is_none) {
            None
        } else if leaf_fields.iter().all(Option::is_some) {
            Some(leaf_fields.into_iter().flatten().collect())
        } else {
            return Err(FlattenError::mismatch(
                owner,
                "fields can either exist for all leaves or for none",
            ));
        };

        Ok(Children {
            nodes,
            by_name,
            offsets,
            fields,
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, name: Name) -> Option<&Node> {
        self.by_name.get(&name).map(|&i| &self.nodes[i])
    }

    pub fn leaf_count(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    /// Leaf range of the child at `index`, relative to the parent.
    pub fn range_at(&self, index: usize) -> Range<usize> {
        self.offsets[index]..self.offsets[index + 1]
    }

    pub fn subnode_and_range(&self, name: Name) -> Option<(&Node, Range<usize>)> {
        let &index = self.by_name.get(&name)?;
        Some((&self.nodes[index], self.range_at(index)))
    }

    pub fn fields(&self) -> Option<&[FieldId]> {
        self.fields.as_deref()
    }

    pub fn all_pure(&self) -> bool {
        self.nodes.iter().all(Node::has_pure_unbox_method)
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

// ── Node kinds ──────────────────────────────────────────────────────

/// Rejects accessors that take anything besides a dispatch receiver.
fn validate_accessor(store: &DeclStore, accessor: &FunctionDecl) -> Result<()> {
    let decl = store.name_str(accessor.name);
    if accessor.extension_receiver.is_some() {
        return Err(FlattenError::DisallowedReceiver {
            decl: decl.to_owned(),
            receiver: "extension",
        });
    }
    if !accessor.context_receivers.is_empty() {
        return Err(FlattenError::DisallowedReceiver {
            decl: decl.to_owned(),
            receiver: "context",
        });
    }
    if !accessor.params.is_empty() || !accessor.type_params.is_empty() {
        return Err(FlattenError::mismatch(
            decl,
            "an unbox accessor takes no value or type parameters",
        ));
    }
    Ok(())
}

/// A non-composite member.
#[derive(Debug)]
pub struct LeafNode {
    ty: Type,
    name: NodeName,
    field: Option<FieldId>,
    unbox_method: FunctionId,
    pure: bool,
}

impl LeafNode {
    pub(crate) fn new(
        store: &DeclStore,
        ty: Type,
        name: NodeName,
        field: Option<FieldId>,
        unbox_method: FunctionId,
        unbox_impl: &UnboxImpl,
    ) -> Result<Self> {
        let accessor = store.function(unbox_method);
        validate_accessor(store, &accessor)?;
        if let Some(field) = field {
            let field = store.field(field);
            if accessor.parent != Some(field.parent) {
                return Err(FlattenError::mismatch(
                    store.name_str(name.full_field_name()),
                    "leaf field and accessor are declared in different classes",
                ));
            }
        }
        Ok(LeafNode {
            ty,
            name,
            field,
            unbox_method,
            pure: unbox_impl.is_pure(),
        })
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    pub fn field(&self) -> Option<FieldId> {
        self.field
    }

    pub fn accessor(&self) -> FunctionId {
        self.unbox_method
    }

    pub fn has_pure_unbox_method(&self) -> bool {
        self.pure
    }
}

impl FlatNode for LeafNode {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn leaf_count(&self) -> usize {
        1
    }

    fn fields(&self) -> Option<Vec<FieldId>> {
        self.field.map(|f| vec![f])
    }

    fn unbox_method(&self) -> Option<FunctionId> {
        Some(self.unbox_method)
    }
}

/// A composite-typed member that is itself decomposed.
#[derive(Debug)]
pub struct IntermediateNode {
    ty: Type,
    name: NodeName,
    children: Children,
    unbox_method: FunctionId,
    pure: bool,
    root: Arc<RootNode>,
}

impl IntermediateNode {
    pub(crate) fn new(
        store: &DeclStore,
        ty: Type,
        name: NodeName,
        children: Children,
        unbox_method: FunctionId,
        unbox_impl: &UnboxImpl,
        root: Arc<RootNode>,
    ) -> Result<Self> {
        if !store.needs_flattening(&ty) {
            return Err(FlattenError::NotComposite {
                ty: store.render_type(&ty),
            });
        }
        if store.erased_class(&ty) != Some(root.class) {
            return Err(FlattenError::mismatch(
                store.name_str(name.full_field_name()),
                format!(
                    "root node must belong to `{}`",
                    store.render_type(&ty)
                ),
            ));
        }
        validate_accessor(store, &store.function(unbox_method))?;
        let pure = unbox_impl.is_pure() && children.all_pure();
        Ok(IntermediateNode {
            ty,
            name,
            children,
            unbox_method,
            pure,
            root,
        })
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn accessor(&self) -> FunctionId {
        self.unbox_method
    }

    /// Root of this member's own composite type.
    pub fn root(&self) -> &Arc<RootNode> {
        &self.root
    }

    pub fn has_pure_unbox_method(&self) -> bool {
        self.pure
    }
}

impl FlatNode for IntermediateNode {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn leaf_count(&self) -> usize {
        self.children.leaf_count()
    }

    fn fields(&self) -> Option<Vec<FieldId>> {
        self.children.fields().map(<[FieldId]>::to_vec)
    }

    fn unbox_method(&self) -> Option<FunctionId> {
        Some(self.unbox_method)
    }
}

/// Members synthesized for a root, validated together.
pub(crate) struct RootMembers {
    pub old_primary_constructor: Option<FunctionId>,
    pub flat_constructor: Option<FunctionId>,
    pub constructor_impl: Option<FunctionId>,
    pub box_method: FunctionId,
    pub equals_method: FunctionId,
    pub created_equals: bool,
}

/// A composite declaration as a whole.
#[derive(Debug)]
pub struct RootNode {
    class: ClassId,
    ty: Type,
    children: Children,
    old_primary_constructor: Option<FunctionId>,
    flat_constructor: Option<FunctionId>,
    constructor_impl: Option<FunctionId>,
    box_method: FunctionId,
    equals_method: FunctionId,
    created_equals: bool,
}

impl RootNode {
    pub(crate) fn new(
        store: &DeclStore,
        class: ClassId,
        children: Children,
        members: RootMembers,
    ) -> Result<Self> {
        let ty = store.default_type(class);
        let class_decl = store.class(class);
        let owner = store.name_str(class_decl.name);
        if !store.needs_flattening(&ty) {
            return Err(FlattenError::NotComposite {
                ty: store.render_type(&ty),
            });
        }

        let ctors = [members.old_primary_constructor, members.flat_constructor];
        for ctor in ctors.into_iter().flatten() {
            let ctor = store.function(ctor);
            if !ctor.is_primary_constructor() {
                return Err(FlattenError::mismatch(owner, "expected a primary constructor"));
            }
            if !ctor.type_params.is_empty() {
                return Err(FlattenError::mismatch(owner, "constructors cannot declare type parameters"));
            }
        }

        let synthesized: Vec<FunctionId> = [
            members.old_primary_constructor,
            members.flat_constructor,
            members.constructor_impl,
            Some(members.box_method),
            Some(members.equals_method),
        ]
        .into_iter()
        .flatten()
        .collect();
        for &function in &synthesized {
            let decl = store.function(function);
            if decl.parent != Some(class) {
                return Err(FlattenError::mismatch(
                    owner,
                    format!("`{}` belongs to a different class", store.name_str(decl.name)),
                ));
            }
            if decl.extension_receiver.is_some() {
                return Err(FlattenError::DisallowedReceiver {
                    decl: store.name_str(decl.name).to_owned(),
                    receiver: "extension",
                });
            }
            if !decl.context_receivers.is_empty() {
                return Err(FlattenError::DisallowedReceiver {
                    decl: store.name_str(decl.name).to_owned(),
                    receiver: "context",
                });
            }
        }

        let box_decl = store.function(members.box_method);
        if store.erased_class(&box_decl.return_ty) != Some(class) {
            return Err(FlattenError::mismatch(owner, "box method must return the composite"));
        }
        if box_decl.type_params.len() != class_decl.type_params.len() {
            return Err(FlattenError::mismatch(owner, "box method type parameters differ from the class"));
        }

        let equals = store.function(members.equals_method);
        if !equals.return_ty.is_bool() {
            return Err(FlattenError::mismatch(owner, "specialized equals must return bool"));
        }
        if equals.params.len() != 1 || !equals.type_params.is_empty() {
            return Err(FlattenError::mismatch(
                owner,
                "specialized equals takes exactly one value parameter and no type parameters",
            ));
        }

        if let Some(old) = members.old_primary_constructor {
            let count = store.function(old).params.len();
            if count != children.len() {
                return Err(FlattenError::mismatch(
                    owner,
                    format!("primary constructor has {count} parameters for {} members", children.len()),
                ));
            }
        }

        let leaf_count = children.leaf_count();
        let mut sizes = vec![("box method", box_decl.params.len())];
        if let Some(flat) = members.flat_constructor {
            sizes.push(("flattened constructor", store.function(flat).params.len()));
        }
        if let Some(ctor_impl) = members.constructor_impl {
            let ctor_impl = store.function(ctor_impl);
            if !ctor_impl.return_ty.is_unit() {
                return Err(FlattenError::mismatch(owner, "constructor-impl must return unit"));
            }
            if ctor_impl.type_params.len() != class_decl.type_params.len() {
                return Err(FlattenError::mismatch(
                    owner,
                    "constructor-impl type parameters differ from the class",
                ));
            }
            sizes.push(("constructor-impl", ctor_impl.params.len()));
        }
        for (what, size) in sizes {
            if size != leaf_count {
                return Err(FlattenError::mismatch(
                    owner,
                    format!("{what} has {size} parameters for {leaf_count} leaves"),
                ));
            }
        }

        Ok(RootNode {
            class,
            ty,
            children,
            old_primary_constructor: members.old_primary_constructor,
            flat_constructor: members.flat_constructor,
            constructor_impl: members.constructor_impl,
            box_method: members.box_method,
            equals_method: members.equals_method,
            created_equals: members.created_equals,
        })
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn box_method(&self) -> FunctionId {
        self.box_method
    }

    pub fn equals_method(&self) -> FunctionId {
        self.equals_method
    }

    /// `false` if the declaration supplied its own same-type equality.
    pub fn created_equals(&self) -> bool {
        self.created_equals
    }

    /// The user-visible constructor, now only called by the box method.
    pub fn old_primary_constructor(&self) -> Option<FunctionId> {
        self.old_primary_constructor
    }

    /// Private constructor taking one parameter per leaf.
    pub fn flat_constructor(&self) -> Option<FunctionId> {
        self.flat_constructor
    }

    pub fn constructor_impl(&self) -> Option<FunctionId> {
        self.constructor_impl
    }
}

impl FlatNode for RootNode {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn leaf_count(&self) -> usize {
        self.children.leaf_count()
    }

    fn fields(&self) -> Option<Vec<FieldId>> {
        self.children.fields().map(<[FieldId]>::to_vec)
    }

    fn unbox_method(&self) -> Option<FunctionId> {
        None
    }
}

// ── Node ────────────────────────────────────────────────────────────

/// A shared handle to any node. Equality is identity.
#[derive(Clone, Debug)]
pub enum Node {
    Leaf(Arc<LeafNode>),
    Intermediate(Arc<IntermediateNode>),
    Root(Arc<RootNode>),
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Leaf(a), Node::Leaf(b)) => Arc::ptr_eq(a, b),
            (Node::Intermediate(a), Node::Intermediate(b)) => Arc::ptr_eq(a, b),
            (Node::Root(a), Node::Root(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Node {}

impl FlatNode for Node {
    fn ty(&self) -> &Type {
        match self {
            Node::Leaf(n) => n.ty(),
            Node::Intermediate(n) => n.ty(),
            Node::Root(n) => n.ty(),
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(n) => n.leaf_count(),
            Node::Intermediate(n) => n.leaf_count(),
            Node::Root(n) => n.leaf_count(),
        }
    }

    fn fields(&self) -> Option<Vec<FieldId>> {
        match self {
            Node::Leaf(n) => n.fields(),
            Node::Intermediate(n) => n.fields(),
            Node::Root(n) => n.fields(),
        }
    }

    fn unbox_method(&self) -> Option<FunctionId> {
        match self {
            Node::Leaf(n) => n.unbox_method(),
            Node::Intermediate(n) => n.unbox_method(),
            Node::Root(n) => n.unbox_method(),
        }
    }
}

impl Node {
    /// Names of a non-root node.
    pub fn name(&self) -> Option<&NodeName> {
        match self {
            Node::Leaf(n) => Some(n.name()),
            Node::Intermediate(n) => Some(n.name()),
            Node::Root(_) => None,
        }
    }

    /// Roots count as pure: reading through them never calls an accessor.
    pub fn has_pure_unbox_method(&self) -> bool {
        match self {
            Node::Leaf(n) => n.has_pure_unbox_method(),
            Node::Intermediate(n) => n.has_pure_unbox_method(),
            Node::Root(_) => true,
        }
    }

    pub fn children(&self) -> Option<&Children> {
        match self {
            Node::Leaf(_) => None,
            Node::Intermediate(n) => Some(n.children()),
            Node::Root(n) => Some(n.children()),
        }
    }

    pub fn child(&self, name: Name) -> Option<&Node> {
        self.children()?.get(name)
    }

    /// Resolve a nested member path.
    pub fn get_path(&self, names: &[Name]) -> Option<&Node> {
        let mut current = self;
        for &name in names {
            current = current.child(name)?;
        }
        Some(current)
    }

    /// A direct child with its leaf range relative to this node.
    pub fn subnode_and_range(&self, name: Name) -> Option<(&Node, Range<usize>)> {
        self.children()?.subnode_and_range(name)
    }

    /// Leaf range of a nested member path, relative to this node.
    pub fn range_of_path(&self, names: &[Name]) -> Option<Range<usize>> {
        let mut current = self;
        let mut range = 0..self.leaf_count();
        for &name in names {
            let (child, child_range) = current.subnode_and_range(name)?;
            range = range.start + child_range.start..range.start + child_range.end;
            current = child;
        }
        Some(range)
    }

    /// The root of this node's own composite type.
    pub fn root(&self) -> Option<&Arc<RootNode>> {
        match self {
            Node::Leaf(_) => None,
            Node::Intermediate(n) => Some(n.root()),
            Node::Root(n) => Some(n),
        }
    }

    pub fn box_method(&self) -> Option<FunctionId> {
        self.root().map(|r| r.box_method())
    }

    /// Visit leaves depth-first.
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a Arc<LeafNode>)) {
        match self {
            Node::Leaf(leaf) => f(leaf),
            Node::Intermediate(_) | Node::Root(_) => {
                if let Some(children) = self.children() {
                    for child in children {
                        child.for_each_leaf(f);
                    }
                }
            }
        }
    }

    pub fn leaves(&self) -> Vec<&Arc<LeafNode>> {
        let mut leaves = Vec::with_capacity(self.leaf_count());
        self.for_each_leaf(&mut |leaf| leaves.push(leaf));
        leaves
    }

    /// Unbox accessors of every leaf, in leaf order.
    pub fn leaves_unbox_methods(&self) -> Vec<FunctionId> {
        self.leaves().iter().map(|l| l.unbox_method).collect()
    }

    /// Every unbox accessor at or below this node, children before parents.
    pub fn all_unbox_methods(&self) -> Vec<FunctionId> {
        let mut methods = Vec::new();
        self.collect_unbox_methods(&mut methods);
        methods
    }

    fn collect_unbox_methods(&self, out: &mut Vec<FunctionId>) {
        if let Some(children) = self.children() {
            for child in children {
                child.collect_unbox_methods(out);
            }
        }
        if let Some(method) = self.unbox_method() {
            out.push(method);
        }
    }

    /// Indented tree rendering for logs and error messages.
    pub fn render(&self, store: &DeclStore) -> String {
        let mut out = String::new();
        self.render_into(store, &mut out, 0);
        out
    }

    fn render_into(&self, store: &DeclStore, out: &mut String, depth: usize) {
        let indent = "    ".repeat(depth);
        let ty = store.render_type(self.ty());
        match self.name() {
            Some(name) => {
                let _ = writeln!(out, "{indent}{}: {ty}", store.name_str(name.full_field_name()));
            }
            None => {
                let _ = writeln!(out, "{indent}{ty}");
            }
        }
        if let Some(children) = self.children() {
            for child in children {
                child.render_into(store, out, depth + 1);
            }
        }
    }
}

/// Call the box method of `node`'s type with one value per leaf.
///
/// `type_args` binds the type parameters `node`'s type is written in.
pub fn make_boxed_expression(
    scope: &EmitScope<'_>,
    node: &Node,
    type_args: &TypeArguments,
    values: Vec<Expr>,
) -> Result<Expr> {
    let store = scope.store();
    let Some(root) = node.root() else {
        return Err(FlattenError::NotComposite {
            ty: store.render_type(node.ty()),
        });
    };
    let result_ty = node.ty().substitute(type_args);
    if store.erased_class(&result_ty) != Some(root.class()) {
        return Err(FlattenError::mismatch(
            store.render_type(node.ty()),
            format!("substitution led to `{}`", store.render_type(&result_ty)),
        ));
    }
    if values.len() != node.leaf_count() {
        return Err(FlattenError::mismatch(
            store.render_type(&result_ty),
            format!("{} values for {} leaves", values.len(), node.leaf_count()),
        ));
    }
    let class = store.class(root.class());
    let box_type_args = class
        .type_params
        .iter()
        .enumerate()
        .map(|(i, &p)| result_ty.args().get(i).cloned().unwrap_or(Type::param(p)))
        .collect();
    Ok(scope.call(root.box_method(), box_type_args, None, values))
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests;
