//! Declaration builders used by the front-end and by tests.
//!
//! Builders write into a [`DeclStore`] immediately, so IDs (and the class
//! self type) are available while members are still being added.

use crate::{
    Body, ClassDecl, ClassFlags, ClassId, DeclStore, Expr, FieldDecl, FunctionDecl, FunctionFlags,
    FunctionId, FunctionKind, Origin, Param, ParamOrigin, PropertyDecl, PropertyId, Stmt, Type,
    TypeParamDecl, TypeParamId, ValueId, Visibility,
};

/// Accessor name of a property: `p` becomes `getP`.
pub fn getter_name(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("get{}{}", first.to_uppercase(), chars.as_str()),
        None => "get".to_owned(),
    }
}

/// How a property's getter is produced.
enum GetterSpec<'a> {
    /// `return this.field`
    Default,
    /// Caller-supplied body over `this`.
    Custom(&'a dyn Fn(Expr) -> Expr),
}

pub struct ClassBuilder<'s> {
    store: &'s DeclStore,
    id: ClassId,
    /// Members in declaration order that the primary constructor initializes.
    ctor_members: Vec<(PropertyId, Type)>,
    primary_constructor: bool,
}

impl<'s> ClassBuilder<'s> {
    pub fn new(store: &'s DeclStore, name: &str, flags: ClassFlags) -> Self {
        let mut decl = ClassDecl::new(store.intern(name), flags);
        if flags.contains(ClassFlags::COMPOSITE_VALUE) {
            decl.representation = Some(Vec::new());
        }
        let id = store.add_class(decl);
        ClassBuilder {
            store,
            id,
            ctor_members: Vec::new(),
            primary_constructor: true,
        }
    }

    pub fn composite(store: &'s DeclStore, name: &str) -> Self {
        Self::new(store, name, ClassFlags::COMPOSITE_VALUE)
    }

    pub fn regular(store: &'s DeclStore, name: &str) -> Self {
        Self::new(store, name, ClassFlags::empty())
    }

    #[inline]
    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn self_type(&self) -> Type {
        self.store.default_type(self.id)
    }

    /// Skip synthesizing a primary constructor in [`finish`](Self::finish).
    pub fn without_primary_constructor(&mut self) -> &mut Self {
        self.primary_constructor = false;
        self
    }

    pub fn type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeParamId {
        let param = self.store.add_type_param(TypeParamDecl {
            name: self.store.intern(name),
            upper_bounds,
        });
        self.store.update_class(self.id, |c| c.type_params.push(param));
        param
    }

    /// A stored property with a private backing field and a default getter.
    ///
    /// For composite classes the property also becomes the next member of
    /// the representation.
    pub fn property(&mut self, name: &str, ty: Type) -> PropertyId {
        self.stored_property(name, ty, GetterSpec::Default)
    }

    /// A stored property whose getter body is `getter(this)` instead of a
    /// plain field read.
    pub fn property_with_getter(&mut self, name: &str, ty: Type, getter: &dyn Fn(Expr) -> Expr) -> PropertyId {
        self.stored_property(name, ty, GetterSpec::Custom(getter))
    }

    /// Like [`property`](Self::property), but the backing field may be
    /// reassigned after construction.
    pub fn mutable_property(&mut self, name: &str, ty: Type) -> PropertyId {
        let property = self.stored_property(name, ty, GetterSpec::Default);
        if let Some(field) = self.store.property(property).backing_field {
            self.store.update_field(field, |f| f.is_final = false);
        }
        property
    }

    /// A property without storage whose getter body is `getter(this)`.
    pub fn computed_property(&mut self, name: &str, ty: Type, getter: &dyn Fn(Expr) -> Expr) -> PropertyId {
        let property = self.store.add_property(PropertyDecl {
            name: self.store.intern(name),
            parent: self.id,
            backing_field: None,
            getter: None,
            is_delegated: false,
            is_fake_override: false,
        });
        self.add_getter(property, name, &ty, GetterSpec::Custom(getter), None);
        property
    }

    fn stored_property(&mut self, name: &str, ty: Type, spec: GetterSpec<'_>) -> PropertyId {
        let interned = self.store.intern(name);
        let property = self.store.add_property(PropertyDecl {
            name: interned,
            parent: self.id,
            backing_field: None,
            getter: None,
            is_delegated: false,
            is_fake_override: false,
        });
        let field = self.store.add_field(FieldDecl {
            name: interned,
            ty: ty.clone(),
            parent: self.id,
            is_static: false,
            is_final: true,
            visibility: Visibility::Private,
            property: Some(property),
        });
        self.store
            .update_property(property, |p| p.backing_field = Some(field));
        self.add_getter(property, name, &ty, spec, Some(field));
        self.store.update_class(self.id, |c| {
            if let Some(representation) = c.representation.as_mut() {
                representation.push((interned, ty.clone()));
            }
        });
        self.ctor_members.push((property, ty));
        property
    }

    fn add_getter(
        &mut self,
        property: PropertyId,
        name: &str,
        ty: &Type,
        spec: GetterSpec<'_>,
        field: Option<crate::FieldId>,
    ) -> FunctionId {
        let mut decl = FunctionDecl::new(self.store.intern(&getter_name(name)), Some(self.id), ty.clone());
        decl.kind = FunctionKind::Getter { property };
        let this = decl.fresh_value();
        let self_type = self.self_type();
        decl.dispatch_receiver = Some(Param::new(this, self.store.intern("this"), self_type.clone()));
        let receiver = Expr::get(this, self_type);
        let body = match (spec, field) {
            (GetterSpec::Default, Some(field)) => Expr::get_field(Some(receiver), field, ty.clone()),
            (GetterSpec::Custom(getter), _) => getter(receiver),
            (GetterSpec::Default, None) => Expr::default_value(ty),
        };
        if !self.store.class(self.id).is_external_stub() {
            decl.body = Some(Body::Expr(body));
        }
        let getter = self.store.add_function(decl);
        self.store.update_property(property, |p| p.getter = Some(getter));
        getter
    }

    /// A method on this class with a dispatch receiver.
    pub fn method(&self, name: &str) -> FunctionBuilder<'s> {
        FunctionBuilder::method(self.store, self.id, name)
    }

    /// Finish the class, synthesizing the primary constructor that assigns
    /// every stored property from a same-named parameter.
    pub fn finish(self) -> ClassId {
        if self.primary_constructor {
            let class = self.store.class(self.id);
            let self_type = self.self_type();
            let mut ctor = FunctionDecl::new(class.name, Some(self.id), self_type.clone());
            ctor.kind = FunctionKind::Constructor { primary: true };
            let this = ctor.fresh_value();
            let mut stmts = Vec::new();
            for (property, ty) in &self.ctor_members {
                let property = self.store.property(*property);
                let value = ctor.fresh_value();
                ctor.params.push(Param::new(value, property.name, ty.clone()));
                if let Some(field) = property.backing_field {
                    stmts.push(Stmt::SetField {
                        receiver: Some(Expr::get(this, self_type.clone())),
                        field,
                        value: Expr::get(value, ty.clone()),
                    });
                }
            }
            if !class.is_external_stub() {
                ctor.body = Some(Body::Block(stmts));
            }
            let ctor = self.store.add_function(ctor);
            self.store
                .update_class(self.id, |c| c.primary_constructor = Some(ctor));
        }
        self.id
    }
}

/// Builds one function declaration.
pub struct FunctionBuilder<'s> {
    store: &'s DeclStore,
    decl: FunctionDecl,
}

impl<'s> FunctionBuilder<'s> {
    /// A top-level (or, with a parent, static) function returning unit.
    pub fn new(store: &'s DeclStore, name: &str, parent: Option<ClassId>) -> Self {
        FunctionBuilder {
            store,
            decl: FunctionDecl::new(store.intern(name), parent, Type::UNIT),
        }
    }

    /// An instance method of `class`. The receiver is value 0.
    pub fn method(store: &'s DeclStore, class: ClassId, name: &str) -> Self {
        let mut builder = Self::new(store, name, Some(class));
        let this = builder.decl.fresh_value();
        builder.decl.dispatch_receiver = Some(Param::new(this, store.intern("this"), store.default_type(class)));
        builder
    }

    pub fn returns(&mut self, ty: Type) -> &mut Self {
        self.decl.return_ty = ty;
        self
    }

    pub fn flags(&mut self, flags: FunctionFlags) -> &mut Self {
        self.decl.flags |= flags;
        self
    }

    pub fn origin(&mut self, origin: Origin) -> &mut Self {
        self.decl.origin = origin;
        self
    }

    pub fn kind(&mut self, kind: FunctionKind) -> &mut Self {
        self.decl.kind = kind;
        self
    }

    pub fn overrides(&mut self, function: FunctionId) -> &mut Self {
        self.decl.overridden.push(function);
        self
    }

    pub fn body(&mut self, body: Body) -> &mut Self {
        self.decl.body = Some(body);
        self
    }

    pub fn this(&self) -> Option<ValueId> {
        self.decl.dispatch_receiver.as_ref().map(|p| p.value)
    }

    pub fn type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeParamId {
        let param = self.store.add_type_param(TypeParamDecl {
            name: self.store.intern(name),
            upper_bounds,
        });
        self.decl.type_params.push(param);
        param
    }

    fn new_param(&mut self, name: &str, ty: Type, origin: ParamOrigin) -> Param {
        let value = self.decl.fresh_value();
        let mut param = Param::new(value, self.store.intern(name), ty);
        param.origin = origin;
        param
    }

    pub fn param(&mut self, name: &str, ty: Type) -> ValueId {
        let param = self.new_param(name, ty, ParamOrigin::Defined);
        let value = param.value;
        self.decl.params.push(param);
        value
    }

    pub fn param_with_default(&mut self, name: &str, ty: Type, default: Expr) -> ValueId {
        let mut param = self.new_param(name, ty, ParamOrigin::Defined);
        param.default = Some(default);
        let value = param.value;
        self.decl.params.push(param);
        value
    }

    /// A parameter added by an earlier pass rather than the user.
    pub fn synthetic_param(&mut self, name: &str, ty: Type) -> ValueId {
        let param = self.new_param(name, ty, ParamOrigin::Synthetic);
        let value = param.value;
        self.decl.params.push(param);
        value
    }

    pub fn extension_receiver(&mut self, ty: Type) -> ValueId {
        let param = self.new_param("<this>", ty, ParamOrigin::Defined);
        let value = param.value;
        self.decl.extension_receiver = Some(param);
        value
    }

    pub fn context_receiver(&mut self, ty: Type) -> ValueId {
        let index = self.decl.context_receivers.len();
        let param = self.new_param(&format!("<context{index}>"), ty, ParamOrigin::Defined);
        let value = param.value;
        self.decl.context_receivers.push(param);
        value
    }

    pub fn finish(self) -> FunctionId {
        self.store.add_function(self.decl)
    }
}
