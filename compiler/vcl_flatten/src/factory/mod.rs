//! Node factory: builds node trees and synthesizes their accessors.
//!
//! The factory walks a composite's representation recursively. Each member
//! becomes a leaf or an intermediate node depending on whether its
//! (substituted) type flattens. For every node an unbox accessor is either
//! reused or synthesized, with its body chosen by the [`UnboxImpl`] policy
//! threaded down the recursion.
//!
//! Roots of member types are obtained through the registry, so building
//! the root of `Outer` builds (or reuses) the root of each composite it
//! contains.
//!
//! # Side Effects
//!
//! The factory adds declarations to the store: new per-leaf fields,
//! synthesized accessors, box and equality methods, constructors. It also
//! records superseded backing fields with the registry.

mod root;

use std::sync::Arc;

use smallvec::smallvec;
use vcl_ir::{
    Body, ClassId, DeclStore, EmitScope, Expr, FieldDecl, FieldId, FunctionDecl, FunctionFlags,
    FunctionId, FunctionKind, Name, Origin, Param, PropertyId, Type, TypeArguments, Visibility,
};

use crate::classify::FlatteningClassification;
use crate::instance::read_field;
use crate::node::{
    make_boxed_expression, Children, FlatNode, IntermediateNode, LeafNode, NameParts, NamingMode,
    Node, NodeName, UnboxImpl,
};
use crate::replace::Replacements;
use crate::stack::ensure_sufficient_stack;
use crate::{FlattenError, Result};

/// Where the nodes being built live.
#[derive(Copy, Clone, Debug)]
struct Site {
    /// Class receiving the synthesized fields and accessors.
    parent: ClassId,
    mode: NamingMode,
    is_static: bool,
    /// Storage of the member being decomposed. Leaves get fields only if
    /// the member had one.
    old_backing_field: Option<FieldId>,
}

pub(crate) struct NodeFactory<'a, 's> {
    store: &'s DeclStore,
    registry: &'a Replacements<'s>,
}

impl<'a, 's> NodeFactory<'a, 's> {
    pub(crate) fn new(registry: &'a Replacements<'s>) -> Self {
        NodeFactory {
            store: registry.store(),
            registry,
        }
    }

    fn create_named(
        &self,
        site: Site,
        ty: &Type,
        type_args: &TypeArguments,
        parts: NameParts,
        unbox_impl: Option<UnboxImpl>,
        old_getter: Option<FunctionId>,
    ) -> Result<Node> {
        ensure_sufficient_stack(|| {
            if self.store.needs_flattening(ty) {
                let node = self.create_intermediate(site, ty, type_args, parts, unbox_impl, old_getter)?;
                Ok(Node::Intermediate(Arc::new(node)))
            } else {
                let unbox_impl = unbox_impl.unwrap_or(UnboxImpl::Default);
                let node = self.create_leaf(site, ty, parts, &unbox_impl, old_getter)?;
                Ok(Node::Leaf(Arc::new(node)))
            }
        })
    }

    fn create_leaf(
        &self,
        site: Site,
        ty: &Type,
        parts: NameParts,
        unbox_impl: &UnboxImpl,
        old_getter: Option<FunctionId>,
    ) -> Result<LeafNode> {
        let store = self.store;
        let name = NodeName::new(store, site.mode, parts);
        let field = site
            .old_backing_field
            .map(|old| self.leaf_field(old, &name, ty));

        let unbox_method = self.make_unbox_method(
            site,
            name.full_method_name(),
            ty,
            unbox_impl,
            old_getter,
            |_, receiver| match field {
                Some(field) => Ok(read_field(store, receiver.as_ref(), field, &TypeArguments::default())),
                None => Err(FlattenError::MissingStorage {
                    decl: store.name_str(name.full_field_name()).to_owned(),
                }),
            },
        )?;

        LeafNode::new(store, ty.clone(), name, field, unbox_method, unbox_impl)
    }

    /// Storage for one leaf. A root member that is already a leaf keeps its
    /// own backing field; every other leaf gets a new private field named
    /// after its full path.
    fn leaf_field(&self, old: FieldId, name: &NodeName, ty: &Type) -> FieldId {
        let old_decl = self.store.field(old);
        if name.parts().len() == 1 && old_decl.name == name.full_field_name() && old_decl.ty == *ty {
            return old;
        }
        self.store.add_field(FieldDecl {
            name: name.full_field_name(),
            ty: ty.clone(),
            parent: old_decl.parent,
            is_static: old_decl.is_static,
            is_final: old_decl.is_final,
            visibility: Visibility::Private,
            property: None,
        })
    }

    fn create_intermediate(
        &self,
        site: Site,
        ty: &Type,
        type_args: &TypeArguments,
        parts: NameParts,
        given: Option<UnboxImpl>,
        old_getter: Option<FunctionId>,
    ) -> Result<IntermediateNode> {
        let store = self.store;
        let class = store
            .flattened_class(ty)
            .ok_or_else(|| FlattenError::NotComposite {
                ty: store.render_type(ty),
            })?;
        let class_decl = store.class(class);
        let Some(representation) = class_decl.representation.as_ref() else {
            return Err(FlattenError::mismatch(
                store.name_str(class_decl.name),
                "composite class has no representation",
            ));
        };
        let root = self.registry.root_node(class)?;

        let old_field = old_getter.and_then(|getter| match store.function(getter).kind {
            FunctionKind::Getter { property } => store.backing_field_if_not_delegated(property),
            _ => None,
        });
        // A getter without storage of its own that reads another property's field.
        let shadow_node = match old_field {
            Some(_) => None,
            None => match old_getter
                .and_then(|getter| store.getter_field(getter))
                .and_then(|field| store.field(field).property)
            {
                Some(property) => self.registry.property_node(property)?,
                None => None,
            },
        };
        let reused_getter = old_getter.filter(|&getter| {
            old_field.is_none() || !store.is_default_getter(getter, old_field)
        });

        let mut nodes = Vec::with_capacity(representation.len());
        for &(member, ref member_ty) in representation {
            let child_ty = member_ty.substitute(type_args);
            let mut child_args = type_args.clone();
            child_args.extend(store.type_arguments_of(&child_ty));

            let missing = || {
                FlattenError::mismatch(
                    store.render_type(ty),
                    format!("no node for member `{}`", store.name_str(member)),
                )
            };
            let child_impl = match (&given, &shadow_node, reused_getter) {
                (Some(given), _, _) => given.child(member).ok_or_else(missing)?,
                (None, Some(shadow), _) => UnboxImpl::Delegating(shadow.child(member).ok_or_else(missing)?.clone()),
                (None, None, Some(getter)) => UnboxImpl::Custom {
                    getter,
                    node: root.children().get(member).ok_or_else(missing)?.clone(),
                },
                (None, None, None) => UnboxImpl::Default,
            };

            let mut child_parts = parts.clone();
            child_parts.push(member);
            nodes.push(self.create_named(site, &child_ty, &child_args, child_parts, Some(child_impl), None)?);
        }

        let name = NodeName::new(store, site.mode, parts);
        let children = Children::new(store, store.name_str(name.full_field_name()), nodes)?;

        let (unbox_method, unbox_impl) = match reused_getter {
            Some(getter) => {
                let unbox_impl = given.unwrap_or_else(|| UnboxImpl::Custom {
                    getter,
                    node: Node::Root(Arc::clone(&root)),
                });
                (getter, unbox_impl)
            }
            None => {
                let unbox_impl = given.unwrap_or(UnboxImpl::Default);
                let root_node = Node::Root(Arc::clone(&root));
                let method = self.make_unbox_method(
                    site,
                    name.full_method_name(),
                    ty,
                    &unbox_impl,
                    old_getter,
                    |scope, receiver| {
                        let fields = children.fields().ok_or_else(|| FlattenError::MissingStorage {
                            decl: store.name_str(name.full_field_name()).to_owned(),
                        })?;
                        let values = fields
                            .iter()
                            .map(|&f| read_field(store, receiver.as_ref(), f, &TypeArguments::default()))
                            .collect();
                        make_boxed_expression(scope, &root_node, type_args, values)
                    },
                )?;
                (method, unbox_impl)
            }
        };

        IntermediateNode::new(store, ty.clone(), name, children, unbox_method, &unbox_impl, root)
    }

    /// Reuse `old_getter` or declare a new accessor, then give it a body
    /// unless the parent is an external stub.
    ///
    /// The default policy gets `optimized(receiver)`; the others chain
    /// calls to the accessors they name.
    fn make_unbox_method(
        &self,
        site: Site,
        name: Name,
        ty: &Type,
        unbox_impl: &UnboxImpl,
        old_getter: Option<FunctionId>,
        optimized: impl FnOnce(&EmitScope<'_>, Option<Expr>) -> Result<Expr>,
    ) -> Result<FunctionId> {
        let store = self.store;
        let id = match old_getter {
            Some(getter) => getter,
            None => {
                let mut decl = FunctionDecl::new(name, Some(site.parent), ty.clone());
                decl.origin = Origin::SyntheticCompositeMember;
                if site.is_static {
                    decl.flags |= FunctionFlags::STATIC;
                } else {
                    let this = decl.fresh_value();
                    decl.dispatch_receiver = Some(Param::new(
                        this,
                        store.intern("this"),
                        store.default_type(site.parent),
                    ));
                }
                store.add_function(decl)
            }
        };

        if store.class(site.parent).is_external_stub() {
            return Ok(id);
        }

        let decl = store.function(id);
        let receiver = decl
            .dispatch_receiver
            .as_ref()
            .map(|p| Expr::get(p.value, p.ty.clone()));
        let scope = EmitScope::for_function(store, &decl);
        let chain: Vec<FunctionId> = match unbox_impl {
            UnboxImpl::Default => {
                let body = optimized(&scope, receiver)?;
                store.update_function(id, |f| f.body = Some(Body::Expr(body)));
                return Ok(id);
            }
            UnboxImpl::External => {
                return Err(FlattenError::mismatch(
                    store.name_str(name),
                    "accessor without a body outside an external class",
                ));
            }
            // Delegates may live in another property's storage, so always forward.
            UnboxImpl::Delegating(node) => node.unbox_method().into_iter().collect(),
            UnboxImpl::Custom { getter, node } => std::iter::once(*getter)
                .chain(node.unbox_method())
                .collect(),
        };
        let mut value = receiver;
        for accessor in chain {
            value = Some(scope.call(accessor, vec![], value, vec![]));
        }
        let body = value.ok_or_else(|| FlattenError::mismatch(store.name_str(name), "accessor chain is empty"))?;
        store.update_function(id, |f| f.body = Some(Body::Expr(body)));
        Ok(id)
    }

    /// The intermediate node of a composite-typed property of a regular class.
    pub(crate) fn create_property_node(&self, property: PropertyId) -> Result<IntermediateNode> {
        let store = self.store;
        let decl = store.property(property);
        let old_getter = decl.getter;
        let old_field = store.backing_field_if_not_delegated(property);
        let ty = old_getter
            .map(|g| store.function(g).return_ty.clone())
            .or_else(|| old_field.map(|f| store.field(f).ty.clone()))
            .ok_or_else(|| {
                FlattenError::mismatch(store.name_str(decl.name), "property has neither getter nor field")
            })?;
        if !store.needs_flattening(&ty) {
            return Err(FlattenError::NotComposite {
                ty: store.render_type(&ty),
            });
        }
        let site = Site {
            parent: decl.parent,
            mode: NamingMode::Getter,
            is_static: store.is_static_property(property),
            old_backing_field: old_field,
        };
        let given = store
            .class(decl.parent)
            .is_external_stub()
            .then_some(UnboxImpl::External);
        let node = self.create_intermediate(
            site,
            &ty,
            &store.type_arguments_of(&ty),
            smallvec![decl.name],
            given,
            old_getter,
        )?;
        if let Some(field) = decl.backing_field {
            self.registry.add_field_to_remove(decl.parent, field);
        }
        tracing::debug!(
            property = store.name_str(decl.name),
            leaves = node.children().leaf_count(),
            pure = node.has_pure_unbox_method(),
            "built property node"
        );
        Ok(node)
    }

    /// The intermediate node of a composite-typed field with no property.
    pub(crate) fn create_field_node(&self, field: FieldId) -> Result<IntermediateNode> {
        let store = self.store;
        let decl = store.field(field);
        if !store.needs_flattening(&decl.ty) {
            return Err(FlattenError::NotComposite {
                ty: store.render_type(&decl.ty),
            });
        }
        let site = Site {
            parent: decl.parent,
            mode: NamingMode::Getter,
            is_static: decl.is_static,
            old_backing_field: Some(field),
        };
        let node = self.create_intermediate(
            site,
            &decl.ty,
            &store.type_arguments_of(&decl.ty),
            smallvec![decl.name],
            None,
            None,
        )?;
        tracing::debug!(
            field = store.name_str(decl.name),
            leaves = node.children().leaf_count(),
            "built standalone field node"
        );
        Ok(node)
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
