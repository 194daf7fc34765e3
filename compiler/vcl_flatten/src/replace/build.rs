//! Construction of replacement declarations.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;
use vcl_ir::{
    Expr, FunctionDecl, FunctionFlags, FunctionId, Name, Origin, Param, ParamOrigin, TypeArguments,
    ValueId,
};

use super::{RemappedParameter, Replacement, ReplacementKind, Replacements};
use crate::classify::FlatteningClassification;
use crate::node::naming::SPECIALIZED_EQUALS_NAME;
use crate::node::{FlatNode, Node};
use crate::{FlattenError, Result};

/// Where an original parameter came from, for naming its flattened copies.
#[derive(Copy, Clone)]
enum ParamSlot {
    DispatchReceiver,
    ContextReceiver(usize),
    ExtensionReceiver,
    Value,
}

impl ParamSlot {
    fn prefix(self) -> Option<String> {
        match self {
            ParamSlot::DispatchReceiver => Some("$dispatchReceiver".to_owned()),
            ParamSlot::ContextReceiver(i) => Some(format!("contextReceiver{i}")),
            ParamSlot::ExtensionReceiver => Some("$receiver".to_owned()),
            ParamSlot::Value => None,
        }
    }

    /// Origin of a regular copy; value parameters keep their own.
    fn moved_origin(self, original: ParamOrigin) -> ParamOrigin {
        match self {
            ParamSlot::DispatchReceiver => ParamOrigin::MovedDispatchReceiver,
            ParamSlot::ContextReceiver(_) => ParamOrigin::MovedContextReceiver,
            ParamSlot::ExtensionReceiver => ParamOrigin::MovedExtensionReceiver,
            ParamSlot::Value => original,
        }
    }
}

/// Flattened defaults waiting for the replacement's ID.
type PendingDefaults = Vec<(ValueId, Expr)>;

impl Replacements<'_> {
    /// Append the flattened parameters of `old` to `new.params`.
    ///
    /// Every receiver except, unless `include_dispatch`, the dispatch
    /// receiver becomes ordinary leading parameters.
    fn group_params(
        &self,
        old: &FunctionDecl,
        new: &mut FunctionDecl,
        include_dispatch: bool,
        substitution: &TypeArguments,
        pending_defaults: &mut PendingDefaults,
    ) -> Result<Vec<RemappedParameter>> {
        let store = self.store;
        let mut slots: Vec<(ParamSlot, &Param)> = Vec::with_capacity(old.explicit_param_count());
        if include_dispatch {
            slots.extend(old.dispatch_receiver.iter().map(|p| (ParamSlot::DispatchReceiver, p)));
        }
        slots.extend(
            old.context_receivers
                .iter()
                .enumerate()
                .map(|(i, p)| (ParamSlot::ContextReceiver(i), p)),
        );
        slots.extend(old.extension_receiver.iter().map(|p| (ParamSlot::ExtensionReceiver, p)));
        slots.extend(old.params.iter().map(|p| (ParamSlot::Value, p)));

        let mut structure = Vec::with_capacity(slots.len());
        for (slot, param) in slots {
            let ty = param.ty.substitute(substitution);
            let Some(class) = store.flattened_class(&ty) else {
                let value = new.fresh_value();
                let mut copy = Param::new(value, param.name, ty);
                copy.origin = slot.moved_origin(param.origin);
                copy.default = param.default.clone();
                new.params.push(copy.clone());
                structure.push(RemappedParameter::Regular(copy));
                continue;
            };

            let root = self.root_node(class)?;
            let type_args = store.type_arguments_of(&ty);
            let base = slot
                .prefix()
                .unwrap_or_else(|| store.name_str(param.name).to_owned());
            let mut params = Vec::with_capacity(root.leaf_count());
            let root_node = Node::Root(Arc::clone(&root));
            for leaf in root_node.leaves() {
                let value = new.fresh_value();
                let leaf_ty = leaf.ty().substitute(&type_args);
                let name = format!("{base}-{}", store.name_str(leaf.name().full_field_name()));
                let mut flat = Param::new(value, store.intern(&name), leaf_ty.clone());
                flat.origin = ParamOrigin::FlattenedComposite;
                if param.default.is_some() {
                    // Marks the slot as defaulted; the real default lives in the side table.
                    flat.default = Some(Expr::get(value, leaf_ty));
                }
                params.push(flat);
            }
            if let (Some(default), Some(first)) = (&param.default, params.first()) {
                pending_defaults.push((first.value, default.clone()));
            }
            new.params.extend(params.iter().cloned());
            structure.push(RemappedParameter::Composite {
                root,
                type_args,
                params,
            });
        }
        Ok(structure)
    }

    /// `name-hash` of the original signature; local functions keep their name.
    ///
    /// Only unflattened types enter the hash, so a composite parameter and
    /// its leaves spelled out separately give different names.
    pub(super) fn mangled_name(&self, old: &FunctionDecl) -> Name {
        let store = self.store;
        if old.flags.contains(FunctionFlags::LOCAL) {
            return old.name;
        }
        let mut hasher = FxHasher::default();
        let slots = old
            .dispatch_receiver
            .iter()
            .map(|p| (ParamSlot::DispatchReceiver, p))
            .chain(old.context_receivers.iter().enumerate().map(|(i, p)| (ParamSlot::ContextReceiver(i), p)))
            .chain(old.extension_receiver.iter().map(|p| (ParamSlot::ExtensionReceiver, p)))
            .chain(old.params.iter().map(|p| (ParamSlot::Value, p)));
        for (slot, param) in slots {
            slot.prefix().hash(&mut hasher);
            store.render_type(&param.ty).hash(&mut hasher);
            param.ty.class_id().hash(&mut hasher);
        }
        if old.flags.contains(FunctionFlags::MANGLE_RETURN) {
            store.render_type(&old.return_ty).hash(&mut hasher);
        }
        let hash = hasher.finish() & 0x0fff_ffff;
        store.intern(&format!("{}-{hash:07x}", store.name_str(old.name)))
    }

    fn finish_replacement(
        &self,
        original: FunctionId,
        new: FunctionDecl,
        kind: ReplacementKind,
        structure: Vec<RemappedParameter>,
        pending_defaults: PendingDefaults,
    ) -> Result<Replacement> {
        let store = self.store;
        let name = store.name_str(new.name);
        let function = store.add_function(new);
        let structure = self.bind_new_structure(function, structure)?;
        self.bind_old_structure(original);
        for (first, default) in pending_defaults {
            self.default_arguments.insert((function, first), default);
        }
        let reverse = match kind {
            ReplacementKind::Static => &self.original_for_static,
            ReplacementKind::Method => &self.original_for_method,
            ReplacementKind::Constructor => &self.original_for_constructor,
        };
        reverse.insert(function, original);
        tracing::debug!(
            original = store.name_str(store.function(original).name),
            replacement = name,
            ?kind,
            params = structure.iter().map(RemappedParameter::size).sum::<usize>(),
            "created replacement"
        );
        Ok(Replacement {
            function,
            kind,
            structure,
        })
    }

    /// Receiver-free replacement of a member of a composite class.
    pub(super) fn create_static_replacement(&self, function: FunctionId, typed_equals: bool) -> Result<Replacement> {
        let store = self.store;
        let old = store.function(function);
        let Some(class) = old.parent else {
            return Err(FlattenError::mismatch(
                store.name_str(old.name),
                "static replacement of a top-level function",
            ));
        };
        let class_decl = store.class(class);
        let (mut type_params, class_substitution) = store.copy_type_params(&class_decl.type_params);
        let (own_params, substitution) = store.copy_type_params_within(&old.type_params, class_substitution);
        type_params.extend(own_params);

        let mut new = FunctionDecl::new(old.name, Some(class), old.return_ty.substitute(&substitution));
        new.flags = FunctionFlags::STATIC;
        new.visibility = old.visibility;
        new.type_params = type_params;
        new.origin = if old.is_constructor() {
            Origin::CompositeConstructorImpl
        } else {
            Origin::StaticReplacement
        };

        let mut pending = PendingDefaults::new();
        let structure = self.group_params(&old, &mut new, true, &substitution, &mut pending)?;
        new.name = if typed_equals {
            store.intern(SPECIALIZED_EQUALS_NAME)
        } else {
            self.mangled_name(&old)
        };
        self.finish_replacement(function, new, ReplacementKind::Static, structure, pending)
    }

    /// Replacement keeping the dispatch receiver.
    pub(super) fn create_method_replacement(&self, function: FunctionId) -> Result<Replacement> {
        let store = self.store;
        let old = store.function(function);
        let (type_params, substitution) = store.copy_type_params(&old.type_params);

        let mut new = FunctionDecl::new(old.name, old.parent, old.return_ty.substitute(&substitution));
        new.flags = old.flags;
        new.visibility = old.visibility;
        new.type_params = type_params;
        new.origin = Origin::MethodReplacement;

        let mut structure = Vec::with_capacity(old.explicit_param_count());
        if let Some(receiver) = &old.dispatch_receiver {
            let value = new.fresh_value();
            let mut copy = receiver.clone();
            copy.value = value;
            new.dispatch_receiver = Some(copy.clone());
            structure.push(RemappedParameter::Regular(copy));
        }
        let mut pending = PendingDefaults::new();
        structure.extend(self.group_params(&old, &mut new, false, &substitution, &mut pending)?);

        let mut overridden = Vec::with_capacity(old.overridden.len());
        for &parent in &old.overridden {
            if let Some(replacement) = self.replacement_for_function(parent)? {
                overridden.push(replacement.function);
            }
        }
        new.overridden = overridden;
        new.name = self.mangled_name(&old);
        self.finish_replacement(function, new, ReplacementKind::Method, structure, pending)
    }

    /// Flattened constructor of a regular class.
    pub(super) fn create_constructor_replacement(&self, constructor: FunctionId) -> Result<Replacement> {
        let store = self.store;
        let old = store.function(constructor);
        let mut new = FunctionDecl::new(old.name, old.parent, old.return_ty.clone());
        new.kind = old.kind;
        new.flags = old.flags;
        new.visibility = old.visibility;
        new.origin = old.origin;
        // Value 0 is `this`.
        new.fresh_value();
        let mut pending = PendingDefaults::new();
        let structure = self.group_params(&old, &mut new, false, &TypeArguments::default(), &mut pending)?;
        self.finish_replacement(constructor, new, ReplacementKind::Constructor, structure, pending)
    }
}
