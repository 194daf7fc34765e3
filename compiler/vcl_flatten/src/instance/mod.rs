//! Node instances: a node bound to concrete storage at one emission site.
//!
//! Two kinds of storage exist:
//!
//! - [`ReceiverInstance`]: a boxed receiver expression, read through
//!   fields or unbox accessors.
//! - [`DeclaredInstance`]: one local or parameter per leaf.
//!
//! Instances live only as long as the statement being emitted. They are
//! never shared between threads.

mod declared;
mod receiver;

use vcl_ir::{DeclStore, EmitScope, Expr, ExprKind, FieldId, TypeArguments};

use crate::node::{make_boxed_expression, FlatNode, Node};
use crate::Result;

pub use declared::DeclaredInstance;
pub use receiver::ReceiverInstance;

/// How a receiver-based instance may read leaves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AccessPolicy {
    /// Read fields where the accessor is a plain field read and the field
    /// is visible; call accessors otherwise.
    #[default]
    PreferFields,
    /// Read visible fields even behind non-pure accessors. Used inside the
    /// declaring class, where the fields are the source of truth.
    UseFields,
    /// Always call accessors.
    AlwaysAccessor,
}

/// Code-generation contract shared by both instance kinds.
pub trait NodeInstance {
    fn node(&self) -> &Node;

    /// Bindings for the type parameters the node's types are written in.
    fn type_arguments(&self) -> &TypeArguments;

    /// One expression per leaf, in leaf order.
    fn flattened_getters(&self, scope: &mut EmitScope<'_>) -> Result<Vec<Expr>>;

    /// The whole node as one value: boxed for composites, the value itself
    /// for a leaf.
    fn boxed(&self, scope: &mut EmitScope<'_>) -> Result<Expr> {
        let mut values = self.flattened_getters(scope)?;
        match self.node() {
            Node::Leaf(_) if values.len() == 1 => Ok(values.remove(0)),
            node => make_boxed_expression(scope, node, self.type_arguments(), values),
        }
    }

    /// Emit assignments of `values` (one per leaf) to the storage.
    fn set(&self, scope: &mut EmitScope<'_>, values: Vec<Expr>) -> Result<()>;
}

/// Whether `expr` may be evaluated several times with the same result and
/// no side effects: constants, variable reads, and reads of final fields
/// over such.
pub fn is_repeatable(store: &DeclStore, expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Const(_) | ExprKind::Get(_) => true,
        ExprKind::GetField { receiver, field } => {
            store.field(*field).is_final && receiver.as_deref().is_none_or(|r| is_repeatable(store, r))
        }
        ExprKind::ImplicitCast(inner) => is_repeatable(store, inner),
        ExprKind::Call(_) | ExprKind::And(..) | ExprKind::Equals(..) | ExprKind::Composite { .. } => false,
    }
}

/// `receiver.field`, or a static read if the field is static.
pub(crate) fn read_field(
    store: &DeclStore,
    receiver: Option<&Expr>,
    field: FieldId,
    type_args: &TypeArguments,
) -> Expr {
    let decl = store.field(field);
    let receiver = if decl.is_static { None } else { receiver.cloned() };
    Expr::get_field(receiver, field, decl.ty.substitute(type_args))
}

impl Node {
    /// Bind this node to a boxed receiver. `receiver` is the object holding
    /// the node's storage (the composite itself for a root) and `None` for
    /// static members.
    pub fn create_instance(
        &self,
        scope: &mut EmitScope<'_>,
        type_args: TypeArguments,
        receiver: Option<Expr>,
        policy: AccessPolicy,
    ) -> ReceiverInstance {
        ReceiverInstance::new(scope, self.clone(), type_args, receiver, policy)
    }

    /// Declare one local per leaf, named `{name}-{leaf path}`.
    pub fn declare_instance(
        &self,
        scope: &mut EmitScope<'_>,
        type_args: TypeArguments,
        name: &str,
        init: Option<Vec<Expr>>,
        mutable: bool,
    ) -> Result<DeclaredInstance> {
        DeclaredInstance::declare(scope, self.clone(), type_args, name, init, mutable)
    }

    pub(crate) fn check_value_count(&self, store: &DeclStore, count: usize) -> Result<()> {
        if count == self.leaf_count() {
            return Ok(());
        }
        Err(crate::FlattenError::mismatch(
            store.render_type(self.ty()),
            format!("{count} values for {} leaves", self.leaf_count()),
        ))
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
