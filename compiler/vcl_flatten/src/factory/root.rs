//! Root nodes and the members synthesized for them.

use smallvec::smallvec;
use vcl_ir::{
    Body, Call, ClassId, Const, Expr, FieldId, FunctionDecl, FunctionFlags, FunctionId, FunctionKind,
    Name, Origin, Param, Stmt, Type, TypeArguments, Visibility,
};

use super::{NodeFactory, Site};
use crate::classify::FlatteningClassification;
use crate::node::naming::{BOX_METHOD_NAME, CONSTRUCTOR_IMPL_NAME};
use crate::node::{Children, FlatNode, NamingMode, Node, RootMembers, RootNode, UnboxImpl};
use crate::{FlattenError, Result};

/// The only element of `iter`, or `None` if it yields zero or several.
fn single<T>(mut iter: impl Iterator<Item = T>) -> Option<T> {
    let first = iter.next()?;
    iter.next().is_none().then_some(first)
}

/// Append one parameter per leaf, in leaf order.
fn leaf_params(function: &mut FunctionDecl, leaves: &[(Name, Type)], mapping: &TypeArguments) {
    for (name, ty) in leaves {
        let value = function.fresh_value();
        function
            .params
            .push(Param::new(value, *name, ty.substitute(mapping)));
    }
}

impl NodeFactory<'_, '_> {
    pub(crate) fn create_root(&self, class: ClassId) -> Result<RootNode> {
        let store = self.store;
        let decl = store.class(class);
        let owner = store.name_str(decl.name);
        let self_ty = store.default_type(class);
        if !store.needs_flattening(&self_ty) {
            return Err(FlattenError::NotComposite {
                ty: store.render_type(&self_ty),
            });
        }
        let Some(representation) = decl.representation.as_ref() else {
            return Err(FlattenError::mismatch(owner, "composite class has no representation"));
        };

        let mut nodes = Vec::with_capacity(representation.len());
        for &(member, ref member_ty) in representation {
            let Some(property) = store.find_property(class, member, false) else {
                return Err(FlattenError::mismatch(
                    owner,
                    format!("no property for member `{}`", store.name_str(member)),
                ));
            };
            let site = Site {
                parent: class,
                mode: NamingMode::UnboxFunction,
                is_static: false,
                old_backing_field: store.backing_field_if_not_delegated(property),
            };
            let node = self.create_named(
                site,
                member_ty,
                &store.type_arguments_of(member_ty),
                smallvec![member],
                Some(UnboxImpl::Default),
                None,
            )?;
            if !matches!(node, Node::Leaf(_)) {
                if let Some(field) = store.property(property).backing_field {
                    self.registry.add_field_to_remove(class, field);
                }
            }
            nodes.push(node);
        }
        let children = Children::new(store, owner, nodes)?;

        let mut leaves: Vec<(Name, Type)> = Vec::with_capacity(children.leaf_count());
        for child in &children {
            child.for_each_leaf(&mut |leaf| {
                leaves.push((leaf.name().full_field_name(), leaf.ty().clone()));
            });
        }

        let old_primary_constructor = decl.primary_constructor;
        let flat_constructor = old_primary_constructor
            .map(|old| self.make_flat_constructor(class, old, &leaves, children.fields()))
            .transpose()?;
        let constructor_impl = old_primary_constructor
            .map(|old| self.make_constructor_impl(class, old, &leaves));
        let box_method = self.make_box_method(class, &leaves, flat_constructor)?;

        let (equals_method, created_equals) = match self.find_typed_equals(class) {
            Some(existing) => (existing, false),
            None => (self.make_specialized_equals(class, &children), true),
        };

        let root = RootNode::new(
            store,
            class,
            children,
            RootMembers {
                old_primary_constructor,
                flat_constructor,
                constructor_impl,
                box_method,
                equals_method,
                created_equals,
            },
        )?;
        tracing::debug!(
            class = owner,
            leaves = root.children().leaf_count(),
            created_equals,
            "built root node"
        );
        Ok(root)
    }

    /// Primary constructor taking one parameter per leaf.
    fn make_flat_constructor(
        &self,
        class: ClassId,
        old: FunctionId,
        leaves: &[(Name, Type)],
        fields: Option<&[FieldId]>,
    ) -> Result<FunctionId> {
        let store = self.store;
        let old_decl = store.function(old);
        let mut ctor = FunctionDecl::new(old_decl.name, Some(class), old_decl.return_ty.clone());
        ctor.kind = FunctionKind::Constructor { primary: true };
        ctor.visibility = Visibility::Private;
        ctor.origin = Origin::SyntheticCompositeMember;
        let this = ctor.fresh_value();
        leaf_params(&mut ctor, leaves, &TypeArguments::default());

        if !store.class(class).is_external_stub() {
            let fields = fields.ok_or_else(|| FlattenError::MissingStorage {
                decl: store.name_str(store.class(class).name).to_owned(),
            })?;
            let self_ty = store.default_type(class);
            let stmts = ctor
                .params
                .iter()
                .zip(fields)
                .map(|(param, &field)| Stmt::SetField {
                    receiver: Some(Expr::get(this, self_ty.clone())),
                    field,
                    value: Expr::get(param.value, param.ty.clone()),
                })
                .collect();
            ctor.body = Some(Body::Block(stmts));
        }
        Ok(store.add_function(ctor))
    }

    /// Static holder of the original constructor's logic over flattened
    /// parameters. Lowering fills in the body.
    fn make_constructor_impl(&self, class: ClassId, old: FunctionId, leaves: &[(Name, Type)]) -> FunctionId {
        let store = self.store;
        let class_decl = store.class(class);
        let mut function = FunctionDecl::new(store.intern(CONSTRUCTOR_IMPL_NAME), Some(class), Type::UNIT);
        function.flags |= FunctionFlags::STATIC;
        function.origin = Origin::CompositeConstructorImpl;
        function.visibility = store.function(old).visibility;
        let (type_params, mapping) = store.copy_type_params(&class_decl.type_params);
        function.type_params = type_params;
        leaf_params(&mut function, leaves, &mapping);
        store.add_function(function)
    }

    fn make_box_method(
        &self,
        class: ClassId,
        leaves: &[(Name, Type)],
        flat_constructor: Option<FunctionId>,
    ) -> Result<FunctionId> {
        let store = self.store;
        let class_decl = store.class(class);
        let (type_params, mapping) = store.copy_type_params(&class_decl.type_params);
        let return_ty = store.default_type(class).substitute(&mapping);
        let mut function = FunctionDecl::new(store.intern(BOX_METHOD_NAME), Some(class), return_ty.clone());
        function.flags |= FunctionFlags::STATIC;
        function.origin = Origin::SyntheticCompositeMember;
        function.type_params = type_params;
        leaf_params(&mut function, leaves, &mapping);

        if !class_decl.is_external_stub() {
            let ctor = flat_constructor.ok_or_else(|| {
                FlattenError::mismatch(store.name_str(class_decl.name), "box method needs a constructor")
            })?;
            let args = function
                .params
                .iter()
                .map(|p| Expr::get(p.value, p.ty.clone()))
                .collect();
            let call = Call {
                callee: ctor,
                type_args: Vec::new(),
                dispatch_receiver: None,
                args,
            };
            function.body = Some(Body::Expr(Expr::call(call, return_ty)));
        }
        Ok(store.add_function(function))
    }

    fn is_plain_equals(&self, function: &FunctionDecl) -> bool {
        self.store.name_str(function.name) == "equals"
            && !function.is_static()
            && function.origin != Origin::GeneratedCompositeMember
            && function.type_params.is_empty()
            && function.extension_receiver.is_none()
            && function.context_receivers.is_empty()
            && function.params.len() == 1
            && function.return_ty.is_bool()
    }

    /// A user-declared `equals(other: Self)`.
    fn find_typed_equals(&self, class: ClassId) -> Option<FunctionId> {
        let store = self.store;
        single(store.class(class).functions.iter().copied().filter(|&f| {
            let decl = store.function(f);
            self.is_plain_equals(&decl) && store.erased_class(&decl.params[0].ty) == Some(class)
        }))
    }

    /// A user-declared `equals(other: any?)`.
    fn find_untyped_equals(&self, class: ClassId) -> Option<FunctionId> {
        let store = self.store;
        single(store.class(class).functions.iter().copied().filter(|&f| {
            let decl = store.function(f);
            self.is_plain_equals(&decl) && decl.params[0].ty.make_not_null() == Type::ANY
        }))
    }

    /// `equals(other: Self): bool`, forwarding to a custom untyped equals
    /// if there is one and comparing leaf by leaf otherwise.
    fn make_specialized_equals(&self, class: ClassId, children: &Children) -> FunctionId {
        let store = self.store;
        let class_decl = store.class(class);
        let self_ty = store.default_type(class);
        let mut function = FunctionDecl::new(store.intern("equals"), Some(class), Type::BOOL);
        function.origin = Origin::GeneratedCompositeMember;
        let this = function.fresh_value();
        function.dispatch_receiver = Some(Param::new(this, store.intern("this"), self_ty.clone()));
        let other = function.fresh_value();
        function
            .params
            .push(Param::new(other, store.intern("other"), self_ty.clone()));

        if !class_decl.is_external_stub() {
            let this_expr = Expr::get(this, self_ty.clone());
            let other_expr = Expr::get(other, self_ty.clone());
            let body = match self.find_untyped_equals(class) {
                Some(untyped) => {
                    let call = Call {
                        callee: untyped,
                        type_args: Vec::new(),
                        dispatch_receiver: Some(this_expr),
                        args: vec![other_expr],
                    };
                    Expr::call(call, Type::BOOL)
                }
                None => {
                    let mut leaves = Vec::with_capacity(children.leaf_count());
                    for child in children {
                        child.for_each_leaf(&mut |leaf| leaves.push(leaf));
                    }
                    let read = |receiver: &Expr, index: usize| {
                        let leaf = leaves[index];
                        match children.fields() {
                            Some(fields) => Expr::get_field(Some(receiver.clone()), fields[index], leaf.ty().clone()),
                            None => {
                                let call = Call {
                                    callee: leaf.accessor(),
                                    type_args: Vec::new(),
                                    dispatch_receiver: Some(receiver.clone()),
                                    args: Vec::new(),
                                };
                                Expr::call(call, leaf.ty().clone())
                            }
                        }
                    };
                    (0..leaves.len())
                        .map(|i| Expr::equals(read(&this_expr, i), read(&other_expr, i)))
                        .reduce(Expr::and)
                        .unwrap_or_else(|| Expr::constant(Const::Bool(true), Type::BOOL))
                }
            };
            function.body = Some(Body::Expr(body));
        }
        store.add_function(function)
    }
}
