//! Instances backed by one boxed receiver expression.

use vcl_ir::{EmitScope, Expr, FieldId, Name, Stmt, TypeArguments};

use super::{is_repeatable, read_field, AccessPolicy, NodeInstance};
use crate::node::{make_boxed_expression, FlatNode, LeafNode, Node};
use crate::stack::ensure_sufficient_stack;
use crate::{FlattenError, Result};

/// A node read from (or written to) a boxed receiver.
///
/// A non-repeatable receiver is saved to a temporary when the instance is
/// created, so every later read observes its side effects exactly once.
#[derive(Clone, Debug)]
pub struct ReceiverInstance {
    node: Node,
    type_args: TypeArguments,
    receiver: Option<Expr>,
    fields: Option<Vec<FieldId>>,
    policy: AccessPolicy,
}

impl ReceiverInstance {
    pub fn new(
        scope: &mut EmitScope<'_>,
        node: Node,
        type_args: TypeArguments,
        receiver: Option<Expr>,
        policy: AccessPolicy,
    ) -> Self {
        let store = scope.store();
        let receiver = receiver.map(|r| {
            if is_repeatable(store, &r) {
                r
            } else {
                scope.temporary("receiver", r)
            }
        });
        let fields = node.fields();
        ReceiverInstance {
            node,
            type_args,
            receiver,
            fields,
            policy,
        }
    }

    pub fn receiver(&self) -> Option<&Expr> {
        self.receiver.as_ref()
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    /// The instance of member `name`, over the same receiver.
    pub fn child(&self, name: Name) -> Option<ReceiverInstance> {
        let child = self.node.child(name)?.clone();
        let fields = child.fields();
        Some(ReceiverInstance {
            node: child,
            type_args: self.type_args.clone(),
            receiver: self.receiver.clone(),
            fields,
            policy: self.policy,
        })
    }

    fn read_leaf(&self, scope: &mut EmitScope<'_>, leaf: &LeafNode, receiver: Option<&Expr>, type_args: &TypeArguments) -> Expr {
        let store = scope.store();
        if let Some(field) = leaf.field() {
            let allowed = match self.policy {
                AccessPolicy::AlwaysAccessor => false,
                AccessPolicy::PreferFields => leaf.has_pure_unbox_method(),
                AccessPolicy::UseFields => true,
            };
            if allowed && store.can_access_field(field, scope.context()) {
                return read_field(store, receiver, field, type_args);
            }
        }
        let receiver = if store.function(leaf.accessor()).is_static() {
            None
        } else {
            receiver.cloned()
        };
        scope.call(leaf.accessor(), Vec::new(), receiver, Vec::new())
    }

    fn collect(
        &self,
        scope: &mut EmitScope<'_>,
        node: &Node,
        receiver: Option<&Expr>,
        type_args: &TypeArguments,
        out: &mut Vec<Expr>,
    ) -> Result<()> {
        ensure_sufficient_stack(|| match node {
            Node::Leaf(leaf) => {
                out.push(self.read_leaf(scope, leaf, receiver, type_args));
                Ok(())
            }
            Node::Root(root) => {
                for child in root.children() {
                    self.collect(scope, child, receiver, type_args, out)?;
                }
                Ok(())
            }
            Node::Intermediate(n) => {
                let through_fields = n.has_pure_unbox_method()
                    || (self.policy == AccessPolicy::UseFields && n.children().fields().is_some());
                if through_fields {
                    for child in n.children() {
                        self.collect(scope, child, receiver, type_args, out)?;
                    }
                    return Ok(());
                }
                // One accessor call for the whole subtree, read through a temporary.
                let receiver = if scope.store().function(n.accessor()).is_static() {
                    None
                } else {
                    receiver.cloned()
                };
                let boxed = scope.call(n.accessor(), Vec::new(), receiver, Vec::new());
                let name = scope.store().name_str(n.name().full_field_name());
                let temp = scope.temporary(name, boxed);
                let inner_args = scope.store().type_arguments_of(&temp.ty);
                tracing::trace!(node = name, "reading impure node through a temporary");
                let root = Node::Root(n.root().clone());
                self.collect(scope, &root, Some(&temp), &inner_args, out)
            }
        })
    }
}

impl NodeInstance for ReceiverInstance {
    fn node(&self) -> &Node {
        &self.node
    }

    fn type_arguments(&self) -> &TypeArguments {
        &self.type_args
    }

    fn flattened_getters(&self, scope: &mut EmitScope<'_>) -> Result<Vec<Expr>> {
        let mut out = Vec::with_capacity(self.node.leaf_count());
        self.collect(scope, &self.node, self.receiver.as_ref(), &self.type_args, &mut out)?;
        Ok(out)
    }

    fn boxed(&self, scope: &mut EmitScope<'_>) -> Result<Expr> {
        match &self.node {
            Node::Root(_) => self
                .receiver
                .clone()
                .ok_or_else(|| FlattenError::mismatch(scope.store().render_type(self.node.ty()), "root without a receiver")),
            Node::Leaf(_) => {
                let mut values = self.flattened_getters(scope)?;
                Ok(values.remove(0))
            }
            Node::Intermediate(n) => {
                let store = scope.store();
                let fields_visible = self
                    .fields
                    .as_ref()
                    .is_some_and(|fields| fields.iter().all(|&f| store.can_access_field(f, scope.context())));
                if n.has_pure_unbox_method() && self.policy != AccessPolicy::AlwaysAccessor && fields_visible {
                    let values = self.flattened_getters(scope)?;
                    return make_boxed_expression(scope, &self.node, &self.type_args, values);
                }
                let receiver = if store.function(n.accessor()).is_static() {
                    None
                } else {
                    self.receiver.clone()
                };
                Ok(scope.call(n.accessor(), Vec::new(), receiver, Vec::new()))
            }
        }
    }

    fn set(&self, scope: &mut EmitScope<'_>, values: Vec<Expr>) -> Result<()> {
        let store = scope.store();
        let Some(fields) = self.fields.as_ref() else {
            let decl = match self.node.name() {
                Some(name) => store.name_str(name.full_field_name()).to_owned(),
                None => store.render_type(self.node.ty()),
            };
            return Err(FlattenError::MissingStorage { decl });
        };
        self.node.check_value_count(store, values.len())?;
        for (&field, value) in fields.iter().zip(values) {
            let receiver = if store.field(field).is_static {
                None
            } else {
                self.receiver.clone()
            };
            scope.push(Stmt::SetField {
                receiver,
                field,
                value,
            });
        }
        Ok(())
    }
}
