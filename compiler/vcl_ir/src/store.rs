//! The declaration store: the read-mostly oracle the lowering core queries.
//!
//! Every arena is append-only and guarded by a `parking_lot::RwLock`.
//! Entries are `Arc`s so a lookup hands out a cheap snapshot and never
//! holds a lock across caller code. Updates replace the entry with a
//! modified copy (`Arc::make_mut`), so earlier snapshots stay valid.
//!
//! The store is `Send + Sync` and shared by all backend workers.

use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    Body, ClassDecl, ClassId, ExprKind, FieldDecl, FieldId, FunctionDecl, FunctionId, Name,
    PropertyDecl, PropertyId, StringInterner, Type, TypeArguments, TypeParamDecl, TypeParamId,
    Visibility,
};

/// Append-only arenas for every declaration kind plus the name interner.
#[derive(Default)]
pub struct DeclStore {
    interner: StringInterner,
    classes: RwLock<Vec<Arc<ClassDecl>>>,
    fields: RwLock<Vec<Arc<FieldDecl>>>,
    properties: RwLock<Vec<Arc<PropertyDecl>>>,
    functions: RwLock<Vec<Arc<FunctionDecl>>>,
    type_params: RwLock<Vec<Arc<TypeParamDecl>>>,
}

fn next_id(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("declaration arena exceeded u32::MAX entries"))
}

impl DeclStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    #[inline]
    pub fn name_str(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    // ── Classes ─────────────────────────────────────────────────────

    pub fn add_class(&self, class: ClassDecl) -> ClassId {
        let mut classes = self.classes.write();
        let id = ClassId::new(next_id(classes.len()));
        classes.push(Arc::new(class));
        id
    }

    /// # Panics
    /// Panics if `id` was not allocated by this store.
    pub fn class(&self, id: ClassId) -> Arc<ClassDecl> {
        Arc::clone(&self.classes.read()[id.index()])
    }

    pub fn update_class(&self, id: ClassId, f: impl FnOnce(&mut ClassDecl)) {
        let mut classes = self.classes.write();
        f(Arc::make_mut(&mut classes[id.index()]));
    }

    pub fn is_composite_class(&self, id: ClassId) -> bool {
        self.class(id).is_composite()
    }

    /// The class type with each type parameter as its own argument.
    pub fn default_type(&self, id: ClassId) -> Type {
        let class = self.class(id);
        Type::class(
            id,
            class.type_params.iter().map(|&p| Type::param(p)).collect(),
        )
    }

    // ── Fields and properties ───────────────────────────────────────

    /// Add a field and register it with its parent class.
    pub fn add_field(&self, field: FieldDecl) -> FieldId {
        let parent = field.parent;
        let id = {
            let mut fields = self.fields.write();
            let id = FieldId::new(next_id(fields.len()));
            fields.push(Arc::new(field));
            id
        };
        self.update_class(parent, |class| class.fields.push(id));
        id
    }

    pub fn field(&self, id: FieldId) -> Arc<FieldDecl> {
        Arc::clone(&self.fields.read()[id.index()])
    }

    pub fn update_field(&self, id: FieldId, f: impl FnOnce(&mut FieldDecl)) {
        let mut fields = self.fields.write();
        f(Arc::make_mut(&mut fields[id.index()]));
    }

    /// Add a property and register it with its parent class.
    pub fn add_property(&self, property: PropertyDecl) -> PropertyId {
        let parent = property.parent;
        let id = {
            let mut properties = self.properties.write();
            let id = PropertyId::new(next_id(properties.len()));
            properties.push(Arc::new(property));
            id
        };
        self.update_class(parent, |class| class.properties.push(id));
        id
    }

    pub fn property(&self, id: PropertyId) -> Arc<PropertyDecl> {
        Arc::clone(&self.properties.read()[id.index()])
    }

    pub fn update_property(&self, id: PropertyId, f: impl FnOnce(&mut PropertyDecl)) {
        let mut properties = self.properties.write();
        f(Arc::make_mut(&mut properties[id.index()]));
    }

    /// A property is static iff its getter is static, or, without a
    /// getter, its backing field is.
    pub fn is_static_property(&self, id: PropertyId) -> bool {
        let property = self.property(id);
        if let Some(getter) = property.getter {
            return self.function(getter).is_static();
        }
        property
            .backing_field
            .is_some_and(|field| self.field(field).is_static)
    }

    /// Find a property of `class` by name and staticness.
    pub fn find_property(&self, class: ClassId, name: Name, is_static: bool) -> Option<PropertyId> {
        self.class(class)
            .properties
            .iter()
            .copied()
            .find(|&p| self.property(p).name == name && self.is_static_property(p) == is_static)
    }

    /// The backing field of a property unless the property is delegated.
    pub fn backing_field_if_not_delegated(&self, id: PropertyId) -> Option<FieldId> {
        let property = self.property(id);
        if property.is_delegated {
            None
        } else {
            property.backing_field
        }
    }

    /// Field reads are permitted from `context` iff the field is public or
    /// `context` is the declaring class.
    pub fn can_access_field(&self, field: FieldId, context: Option<ClassId>) -> bool {
        let field = self.field(field);
        match field.visibility {
            Visibility::Public => true,
            Visibility::Private => context == Some(field.parent),
        }
    }

    // ── Functions ───────────────────────────────────────────────────

    /// Add a function and register it with its parent class, if any.
    pub fn add_function(&self, function: FunctionDecl) -> FunctionId {
        let parent = function.parent;
        let id = {
            let mut functions = self.functions.write();
            let id = FunctionId::new(next_id(functions.len()));
            functions.push(Arc::new(function));
            id
        };
        if let Some(parent) = parent {
            self.update_class(parent, |class| class.functions.push(id));
        }
        id
    }

    pub fn function(&self, id: FunctionId) -> Arc<FunctionDecl> {
        Arc::clone(&self.functions.read()[id.index()])
    }

    pub fn update_function(&self, id: FunctionId, f: impl FnOnce(&mut FunctionDecl)) {
        let mut functions = self.functions.write();
        f(Arc::make_mut(&mut functions[id.index()]));
    }

    /// The field a getter returns directly, if its body is exactly
    /// `return <this>.field` (or `return Owner.field` for static fields).
    pub fn getter_field(&self, id: FunctionId) -> Option<FieldId> {
        let function = self.function(id);
        if !function.is_getter() {
            return None;
        }
        let expr = function.body.as_ref().and_then(Body::as_expr)?;
        let ExprKind::GetField { receiver, field } = &expr.kind else {
            return None;
        };
        let this = function.dispatch_receiver.as_ref().map(|p| p.value);
        let reads_this = match (receiver.as_deref(), this) {
            (None, _) => true,
            (Some(r), Some(this)) => r.kind == ExprKind::Get(this),
            (Some(_), None) => false,
        };
        reads_this.then_some(*field)
    }

    /// Returns `true` if `id` is a getter whose body is a direct read of
    /// `expected` (or of any field, when `expected` is `None`).
    pub fn is_default_getter(&self, id: FunctionId, expected: Option<FieldId>) -> bool {
        let function = self.function(id);
        if let (Some(expected), crate::FunctionKind::Getter { property }) = (expected, function.kind) {
            if self.property(property).backing_field != Some(expected) {
                return false;
            }
        }
        match (self.getter_field(id), expected) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    // ── Type parameters ─────────────────────────────────────────────

    pub fn add_type_param(&self, param: TypeParamDecl) -> TypeParamId {
        let mut params = self.type_params.write();
        let id = TypeParamId::new(next_id(params.len()));
        params.push(Arc::new(param));
        id
    }

    pub fn type_param(&self, id: TypeParamId) -> Arc<TypeParamDecl> {
        Arc::clone(&self.type_params.read()[id.index()])
    }

    /// Declare fresh copies of `params` (same names, bounds rewritten to
    /// refer to the copies). Returns the copies and the substitution from
    /// originals to copies.
    pub fn copy_type_params(&self, params: &[TypeParamId]) -> (Vec<TypeParamId>, TypeArguments) {
        self.copy_type_params_within(params, TypeArguments::default())
    }

    /// Like [`copy_type_params`](Self::copy_type_params), for parameters
    /// nested in a scope whose own parameters were already copied as
    /// `outer`. Bounds are rewritten through `outer` as well, and the
    /// returned substitution covers both.
    pub fn copy_type_params_within(
        &self,
        params: &[TypeParamId],
        outer: TypeArguments,
    ) -> (Vec<TypeParamId>, TypeArguments) {
        let mut copies = Vec::with_capacity(params.len());
        let mut mapping = outer;
        for &param in params {
            let decl = self.type_param(param);
            let copy = self.add_type_param(TypeParamDecl {
                name: decl.name,
                upper_bounds: Vec::new(),
            });
            copies.push(copy);
            mapping.insert(param, Type::param(copy));
        }
        for (&param, &copy) in params.iter().zip(&copies) {
            let bounds: Vec<Type> = self
                .type_param(param)
                .upper_bounds
                .iter()
                .map(|b| b.substitute(&mapping))
                .collect();
            let mut arena = self.type_params.write();
            Arc::make_mut(&mut arena[copy.index()]).upper_bounds = bounds;
        }
        (copies, mapping)
    }

    // ── Type queries ────────────────────────────────────────────────

    /// The class a type erases to: the class itself, or the erasure of
    /// a type parameter's first upper bound.
    pub fn erased_class(&self, ty: &Type) -> Option<ClassId> {
        self.erased_class_inner(ty, 0)
    }

    fn erased_class_inner(&self, ty: &Type, depth: u32) -> Option<ClassId> {
        // Bounds cycles are rejected upstream; this only stops runaway chains.
        if depth > 64 {
            return None;
        }
        match ty {
            Type::Class { class, .. } => Some(*class),
            Type::Param { param, .. } => self
                .type_param(*param)
                .upper_bounds
                .first()
                .and_then(|bound| self.erased_class_inner(bound, depth + 1)),
            Type::Prim { .. } => None,
        }
    }

    /// Type arguments a class type binds for its class's parameters.
    ///
    /// Missing arguments default to the parameter itself. Non-class types
    /// bind nothing.
    pub fn type_arguments_of(&self, ty: &Type) -> TypeArguments {
        let Some(class) = ty.class_id() else {
            return TypeArguments::default();
        };
        let decl = self.class(class);
        decl.type_params
            .iter()
            .enumerate()
            .map(|(i, &param)| {
                let arg = ty.args().get(i).cloned().unwrap_or(Type::param(param));
                (param, arg)
            })
            .collect()
    }

    /// Render a type for diagnostics and debug output.
    pub fn render_type(&self, ty: &Type) -> String {
        let mut out = String::new();
        self.render_into(&mut out, ty);
        out
    }

    fn render_into(&self, out: &mut String, ty: &Type) {
        match ty {
            Type::Prim { prim, .. } => out.push_str(prim.name()),
            Type::Class { class, args, .. } => {
                out.push_str(self.name_str(self.class(*class).name));
                if !args.is_empty() {
                    out.push('<');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.render_into(out, arg);
                    }
                    out.push('>');
                }
            }
            Type::Param { param, .. } => {
                let _ = write!(out, "{}", self.name_str(self.type_param(*param).name));
            }
        }
        if ty.is_nullable() {
            out.push('?');
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests;
