//! The replacement registry.
//!
//! `Replacements` owns every memoized artifact of flattening for one
//! compilation session: root nodes per composite class, nodes for
//! composite-typed properties and fields of other classes, and the
//! flattened-signature replacements of functions and constructors.
//!
//! # Memoization
//!
//! Each cache maps a declaration ID to an `Arc<OnceLock<Result<T>>>`. The
//! map entry is created under a short shard lock and the value is computed
//! outside it, so building the root of `Outer` may recursively build the
//! root of `Pair` while `Outer`'s entry is in flight. Concurrent queries
//! for the same key wait for the single computation. Errors are cached like
//! values.
//!
//! # Bookkeeping
//!
//! Besides the caches the registry records which fields are superseded by
//! per-leaf fields, which original each replacement stands for, the
//! parameter structure bound to every original and replacement, and the
//! default arguments of flattened composite parameters.

mod build;
mod remap;

use std::hash::Hash;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use vcl_ir::{
    ClassId, DeclStore, Expr, FieldId, FunctionFlags, FunctionId, FunctionKind, Origin, PropertyId,
    ValueId,
};

use crate::classify::FlatteningClassification;
use crate::factory::NodeFactory;
use crate::node::{Node, RootNode};
use crate::{FlattenError, Result};

pub use remap::{map_function_structures, RemappedParameter};

type Memo<T> = Arc<OnceLock<Result<T>>>;

/// The shape of a replacement declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplacementKind {
    /// Receiver-free form: any dispatch receiver is flattened into the
    /// leading parameters.
    Static,
    /// Keeps the dispatch receiver as is.
    Method,
    /// Flattened constructor of a regular class.
    Constructor,
}

/// A generated flattened-signature declaration standing in for an
/// original one.
#[derive(Clone, Debug)]
pub struct Replacement {
    pub function: FunctionId,
    pub kind: ReplacementKind,
    /// One grouping per explicit parameter of the original.
    pub structure: Arc<[RemappedParameter]>,
}

pub struct Replacements<'s> {
    store: &'s DeclStore,
    roots: DashMap<ClassId, Memo<Arc<RootNode>>>,
    property_nodes: DashMap<PropertyId, Memo<Option<Node>>>,
    field_nodes: DashMap<FieldId, Memo<Option<Node>>>,
    function_replacements: DashMap<FunctionId, Memo<Option<Replacement>>>,
    constructor_replacements: DashMap<FunctionId, Memo<Option<Replacement>>>,
    /// Backing fields superseded by per-leaf fields, per class. Append-only.
    fields_to_remove: DashMap<ClassId, FxHashSet<FieldId>>,
    original_for_static: DashMap<FunctionId, FunctionId>,
    original_for_method: DashMap<FunctionId, FunctionId>,
    original_for_constructor: DashMap<FunctionId, FunctionId>,
    old_structures: DashMap<FunctionId, Arc<[RemappedParameter]>>,
    new_structures: DashMap<FunctionId, Arc<[RemappedParameter]>>,
    /// Defaults of flattened composite parameters, keyed by replacement and
    /// the first parameter of the group.
    default_arguments: DashMap<(FunctionId, ValueId), Expr>,
}

/// Compute-if-absent on `map`, at most once per key.
fn memoized<K, V>(map: &DashMap<K, Memo<V>>, key: K, compute: impl FnOnce() -> Result<V>) -> Result<V>
where
    K: Eq + Hash,
    V: Clone,
{
    let cell = map.entry(key).or_default().value().clone();
    cell.get_or_init(compute).clone()
}

impl<'s> Replacements<'s> {
    pub fn new(store: &'s DeclStore) -> Self {
        Replacements {
            store,
            roots: DashMap::new(),
            property_nodes: DashMap::new(),
            field_nodes: DashMap::new(),
            function_replacements: DashMap::new(),
            constructor_replacements: DashMap::new(),
            fields_to_remove: DashMap::new(),
            original_for_static: DashMap::new(),
            original_for_method: DashMap::new(),
            original_for_constructor: DashMap::new(),
            old_structures: DashMap::new(),
            new_structures: DashMap::new(),
            default_arguments: DashMap::new(),
        }
    }

    #[inline]
    pub fn store(&self) -> &'s DeclStore {
        self.store
    }

    // ── Nodes ───────────────────────────────────────────────────────

    /// The root node of composite `class`, built on first request.
    pub fn root_node(&self, class: ClassId) -> Result<Arc<RootNode>> {
        memoized(&self.roots, class, || {
            NodeFactory::new(self).create_root(class).map(Arc::new)
        })
    }

    /// Build the roots of `classes` in parallel.
    pub fn prefetch_roots(&self, classes: &[ClassId]) -> Result<()> {
        classes
            .par_iter()
            .try_for_each(|&class| self.root_node(class).map(drop))
    }

    /// The node of a composite-typed property, or `None` if the property
    /// is not flattened.
    ///
    /// Members of a composite resolve to the child of its root. Properties
    /// of other classes get a node of their own.
    pub fn property_node(&self, property: PropertyId) -> Result<Option<Node>> {
        let store = self.store;
        let decl = store.property(property);
        let parent = store.class(decl.parent);
        let getter = decl.getter.map(|g| store.function(g));
        let has_receivers = getter
            .as_ref()
            .is_some_and(|g| g.extension_receiver.is_some() || !g.context_receivers.is_empty());

        if parent.is_composite() && !store.is_static_property(property) && !has_receivers {
            let root = self.root_node(decl.parent)?;
            return Ok(root.children().get(decl.name).cloned());
        }

        memoized(&self.property_nodes, property, || {
            let field_ty = decl.backing_field.map(|f| store.field(f).ty.clone());
            let field_ok = decl.is_delegated
                || decl.backing_field.is_some_and(|f| self.is_field_to_remove(decl.parent, f))
                || field_ty.as_ref().is_none_or(|ty| store.needs_flattening(ty));
            let getter_ok = getter
                .as_ref()
                .is_none_or(|g| store.needs_flattening(&g.return_ty));
            let typed = field_ty.is_some() || getter.is_some();
            if !typed || !field_ok || !getter_ok || decl.is_fake_override || has_receivers {
                return Ok(None);
            }
            let node = NodeFactory::new(self).create_property_node(property)?;
            Ok(Some(Node::Intermediate(Arc::new(node))))
        })
    }

    /// The node of a composite-typed field: its property's node, or a
    /// standalone node for fields without a property.
    pub fn field_node(&self, field: FieldId) -> Result<Option<Node>> {
        let store = self.store;
        let decl = store.field(field);
        if let Some(property) = decl.property {
            if !store.property(property).is_delegated {
                return self.property_node(property);
            }
        }
        memoized(&self.field_nodes, field, || {
            if !store.needs_flattening(&decl.ty) {
                return Ok(None);
            }
            let node = NodeFactory::new(self).create_field_node(field)?;
            Ok(Some(Node::Intermediate(Arc::new(node))))
        })
    }

    // ── Removed fields ──────────────────────────────────────────────

    pub(crate) fn add_field_to_remove(&self, class: ClassId, field: FieldId) {
        self.fields_to_remove.entry(class).or_default().insert(field);
    }

    pub fn is_field_to_remove(&self, class: ClassId, field: FieldId) -> bool {
        self.fields_to_remove
            .get(&class)
            .is_some_and(|fields| fields.contains(&field))
    }

    /// Fields of `class` superseded by per-leaf fields, in ID order.
    pub fn fields_to_remove(&self, class: ClassId) -> Vec<FieldId> {
        let mut fields: Vec<FieldId> = self
            .fields_to_remove
            .get(&class)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        fields.sort_unstable();
        fields
    }

    // ── Replacements ────────────────────────────────────────────────

    /// The replacement of `function`, if it has one.
    ///
    /// Local, lambda, synthetic, and flattening-generated functions never
    /// do. Members of a composite get a static replacement, except the
    /// primary constructor (covered by the root's constructor-impl) and
    /// built-in stubs (method replacement). Other functions get a method
    /// replacement when a parameter, or a disambiguated return type, needs
    /// flattening.
    pub fn replacement_for_function(&self, function: FunctionId) -> Result<Option<Replacement>> {
        memoized(&self.function_replacements, function, || {
            self.compute_function_replacement(function)
        })
    }

    fn compute_function_replacement(&self, function: FunctionId) -> Result<Option<Replacement>> {
        let store = self.store;
        let decl = store.function(function);
        if decl.flags.intersects(FunctionFlags::LOCAL | FunctionFlags::LAMBDA)
            || matches!(decl.origin, Origin::Synthetic | Origin::GeneratedStub)
            || decl.origin.is_generated_by_flattening()
        {
            return Ok(None);
        }
        if let FunctionKind::Getter { property } = decl.kind {
            if self.is_representation_property(property) {
                return Ok(None);
            }
        }

        if let Some(parent) = decl.parent.filter(|&p| store.is_composite_class(p)) {
            if self.is_typed_equals(function, parent) {
                return self.create_static_replacement(function, true).map(Some);
            }
            if decl.is_primary_constructor() {
                return Ok(None);
            }
            if decl.flags.contains(FunctionFlags::BUILTIN_STUB) {
                return self.create_method_replacement(function).map(Some);
            }
            return self.create_static_replacement(function, false).map(Some);
        }

        if decl.is_constructor() || decl.flags.contains(FunctionFlags::FOREIGN) {
            return Ok(None);
        }
        let flattened_param = decl.explicit_params().any(|p| store.needs_flattening(&p.ty));
        let flattened_return = decl.flags.contains(FunctionFlags::MANGLE_RETURN)
            && store.needs_flattening(&decl.return_ty);
        if !flattened_param && !flattened_return {
            return Ok(None);
        }
        if decl.flags.contains(FunctionFlags::FAKE_OVERRIDE) {
            let Some(declaration) = self.super_declaration(function) else {
                return Ok(None);
            };
            if self.replacement_for_function(declaration)?.is_none() {
                return Ok(None);
            }
        }
        self.create_method_replacement(function).map(Some)
    }

    /// The flattened constructor of a regular class, if its parameters
    /// need flattening.
    pub fn replacement_for_constructor(&self, constructor: FunctionId) -> Result<Option<Replacement>> {
        memoized(&self.constructor_replacements, constructor, || {
            let store = self.store;
            let decl = store.function(constructor);
            if !decl.is_constructor()
                || decl.flags.contains(FunctionFlags::FOREIGN)
                || decl.origin.is_generated_by_flattening()
                || decl.parent.is_some_and(|p| store.is_composite_class(p) || store.class(p).is_foreign())
            {
                return Ok(None);
            }
            if !decl.params.iter().any(|p| store.needs_flattening(&p.ty)) {
                return Ok(None);
            }
            self.create_constructor_replacement(constructor).map(Some)
        })
    }

    /// Follow fake overrides to the first real declaration.
    fn super_declaration(&self, function: FunctionId) -> Option<FunctionId> {
        let mut current = function;
        for _ in 0..64 {
            let decl = self.store.function(current);
            if !decl.flags.contains(FunctionFlags::FAKE_OVERRIDE) {
                return Some(current);
            }
            current = *decl.overridden.first()?;
        }
        None
    }

    fn is_representation_property(&self, property: PropertyId) -> bool {
        let store = self.store;
        let decl = store.property(property);
        let class = store.class(decl.parent);
        !store.is_static_property(property)
            && class
                .representation
                .as_ref()
                .is_some_and(|members| members.iter().any(|(name, _)| *name == decl.name))
    }

    fn is_typed_equals(&self, function: FunctionId, class: ClassId) -> bool {
        let store = self.store;
        let decl = store.function(function);
        store.name_str(decl.name) == "equals"
            && !decl.is_static()
            && decl.extension_receiver.is_none()
            && decl.context_receivers.is_empty()
            && decl.type_params.is_empty()
            && decl.params.len() == 1
            && decl.return_ty.is_bool()
            && store.erased_class(&decl.params[0].ty) == Some(class)
    }

    // ── Reverse maps and structures ─────────────────────────────────

    pub fn original_for_static_replacement(&self, replacement: FunctionId) -> Option<FunctionId> {
        self.original_for_static.get(&replacement).map(|r| *r)
    }

    pub fn original_for_method_replacement(&self, replacement: FunctionId) -> Option<FunctionId> {
        self.original_for_method.get(&replacement).map(|r| *r)
    }

    pub fn original_for_constructor_replacement(&self, replacement: FunctionId) -> Option<FunctionId> {
        self.original_for_constructor.get(&replacement).map(|r| *r)
    }

    /// Parameter structure of an original function: one regular grouping
    /// per explicit parameter.
    pub fn old_structure(&self, function: FunctionId) -> Option<Arc<[RemappedParameter]>> {
        self.old_structures.get(&function).map(|s| Arc::clone(&s))
    }

    pub fn new_structure(&self, function: FunctionId) -> Option<Arc<[RemappedParameter]>> {
        self.new_structures.get(&function).map(|s| Arc::clone(&s))
    }

    fn bind_old_structure(&self, function: FunctionId) -> Arc<[RemappedParameter]> {
        let decl = self.store.function(function);
        let structure: Arc<[RemappedParameter]> = decl
            .explicit_params()
            .cloned()
            .map(RemappedParameter::Regular)
            .collect();
        self.old_structures.insert(function, Arc::clone(&structure));
        structure
    }

    fn bind_new_structure(&self, function: FunctionId, structure: Vec<RemappedParameter>) -> Result<Arc<[RemappedParameter]>> {
        let decl = self.store.function(function);
        let size: usize = structure.iter().map(RemappedParameter::size).sum();
        if size != decl.explicit_param_count() {
            return Err(FlattenError::mismatch(
                self.store.name_str(decl.name),
                format!(
                    "{} explicit parameters for a structure of size {size}",
                    decl.explicit_param_count()
                ),
            ));
        }
        let structure: Arc<[RemappedParameter]> = structure.into();
        self.new_structures.insert(function, Arc::clone(&structure));
        Ok(structure)
    }

    /// Default argument of the flattened composite parameter group starting
    /// at `first_param` of `replacement`.
    pub fn default_argument(&self, replacement: FunctionId, first_param: ValueId) -> Option<Expr> {
        self.default_arguments
            .get(&(replacement, first_param))
            .map(|e| e.clone())
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests;
