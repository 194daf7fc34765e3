//! Declarations: classes, fields, properties, type parameters, functions.
//!
//! Declarations are plain data. They are owned by the
//! [`DeclStore`](crate::DeclStore) and addressed by ID; cross references
//! between declarations are IDs, never pointers.

use bitflags::bitflags;

use crate::{Body, ClassId, Expr, FieldId, FunctionId, Name, PropertyId, Type, TypeParamId, ValueId};

bitflags! {
    /// Class-level properties decided by the front-end.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ClassFlags: u8 {
        /// A multi-member value type, flattened wherever it is non-nullable.
        const COMPOSITE_VALUE = 1 << 0;
        /// Declared in a precompiled dependency: members have signatures but no bodies.
        const EXTERNAL_STUB = 1 << 1;
        /// Declared in a foreign-language module; its signatures are never rewritten.
        const FOREIGN = 1 << 2;
    }
}

bitflags! {
    /// Function-level properties.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct FunctionFlags: u16 {
        /// No dispatch receiver, even though declared inside a class.
        const STATIC = 1 << 0;
        /// Declared inside another function body.
        const LOCAL = 1 << 1;
        /// A lifted lambda body.
        const LAMBDA = 1 << 2;
        /// A compiler-provided stub for a built-in collection method.
        const BUILTIN_STUB = 1 << 3;
        /// Declared in a foreign-language module.
        const FOREIGN = 1 << 4;
        /// Inherited member materialized in a subclass without its own body.
        const FAKE_OVERRIDE = 1 << 5;
        /// The return type takes part in name mangling.
        const MANGLE_RETURN = 1 << 6;
    }
}

/// Where a declaration came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Origin {
    /// Written by the user.
    #[default]
    Defined,
    /// Synthesized by an earlier pass (bridges, lifted closures).
    Synthetic,
    /// A stub the backend generates and must not rewrite.
    GeneratedStub,
    /// Unbox accessor, box method, or flattened constructor of a composite.
    SyntheticCompositeMember,
    /// Same-type equality synthesized for a composite.
    GeneratedCompositeMember,
    /// Static constructor body holder of a composite.
    CompositeConstructorImpl,
    /// Flattened replacement with the receiver moved into the parameters.
    StaticReplacement,
    /// Flattened replacement that keeps its dispatch receiver.
    MethodReplacement,
}

impl Origin {
    /// Declarations produced by the flattening machinery itself.
    pub fn is_generated_by_flattening(self) -> bool {
        matches!(
            self,
            Origin::SyntheticCompositeMember
                | Origin::GeneratedCompositeMember
                | Origin::CompositeConstructorImpl
                | Origin::StaticReplacement
                | Origin::MethodReplacement
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    /// Visible only inside the declaring class.
    Private,
}

/// A class declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
    pub name: Name,
    pub flags: ClassFlags,
    pub type_params: Vec<TypeParamId>,
    /// Ordered `(member, type)` list for composite value types, `None` otherwise.
    pub representation: Option<Vec<(Name, Type)>>,
    pub properties: Vec<PropertyId>,
    pub fields: Vec<FieldId>,
    pub functions: Vec<FunctionId>,
    pub primary_constructor: Option<FunctionId>,
}

impl ClassDecl {
    pub fn new(name: Name, flags: ClassFlags) -> Self {
        ClassDecl {
            name,
            flags,
            type_params: Vec::new(),
            representation: None,
            properties: Vec::new(),
            fields: Vec::new(),
            functions: Vec::new(),
            primary_constructor: None,
        }
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        self.flags.contains(ClassFlags::COMPOSITE_VALUE)
    }

    #[inline]
    pub fn is_external_stub(&self) -> bool {
        self.flags.contains(ClassFlags::EXTERNAL_STUB)
    }

    #[inline]
    pub fn is_foreign(&self) -> bool {
        self.flags.contains(ClassFlags::FOREIGN)
    }
}

/// Backing storage slot.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: Name,
    pub ty: Type,
    pub parent: ClassId,
    pub is_static: bool,
    /// Assigned only during construction.
    pub is_final: bool,
    pub visibility: Visibility,
    pub property: Option<PropertyId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub name: Name,
    pub parent: ClassId,
    pub backing_field: Option<FieldId>,
    pub getter: Option<FunctionId>,
    pub is_delegated: bool,
    pub is_fake_override: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeParamDecl {
    pub name: Name,
    pub upper_bounds: Vec<Type>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Simple,
    Getter { property: PropertyId },
    Constructor { primary: bool },
}

/// Where a value parameter came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ParamOrigin {
    /// Explicitly declared by the user.
    #[default]
    Defined,
    MovedDispatchReceiver,
    MovedContextReceiver,
    MovedExtensionReceiver,
    /// One leaf slot of a flattened composite parameter.
    FlattenedComposite,
    /// Added by an earlier pass (continuations, default masks).
    Synthetic,
}

/// A value parameter, receiver, or context receiver.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub value: ValueId,
    pub name: Name,
    pub ty: Type,
    pub origin: ParamOrigin,
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(value: ValueId, name: Name, ty: Type) -> Self {
        Param {
            value,
            name,
            ty,
            origin: ParamOrigin::Defined,
            default: None,
        }
    }
}

/// A function, property accessor, or constructor.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Name,
    /// Declaring class. `None` for top-level and local functions.
    pub parent: Option<ClassId>,
    pub kind: FunctionKind,
    pub flags: FunctionFlags,
    pub origin: Origin,
    pub visibility: Visibility,
    pub type_params: Vec<TypeParamId>,
    pub dispatch_receiver: Option<Param>,
    pub context_receivers: Vec<Param>,
    pub extension_receiver: Option<Param>,
    pub params: Vec<Param>,
    pub return_ty: Type,
    pub body: Option<Body>,
    pub overridden: Vec<FunctionId>,
    /// Number of `ValueId`s already allocated in this function.
    pub value_count: u32,
}

impl FunctionDecl {
    pub fn new(name: Name, parent: Option<ClassId>, return_ty: Type) -> Self {
        FunctionDecl {
            name,
            parent,
            kind: FunctionKind::Simple,
            flags: FunctionFlags::empty(),
            origin: Origin::Defined,
            visibility: Visibility::Public,
            type_params: Vec::new(),
            dispatch_receiver: None,
            context_receivers: Vec::new(),
            extension_receiver: None,
            params: Vec::new(),
            return_ty,
            body: None,
            overridden: Vec::new(),
            value_count: 0,
        }
    }

    /// Allocate a fresh local value ID.
    pub fn fresh_value(&mut self) -> ValueId {
        let value = ValueId::new(self.value_count);
        self.value_count += 1;
        value
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FunctionFlags::STATIC)
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, FunctionKind::Constructor { .. })
    }

    #[inline]
    pub fn is_primary_constructor(&self) -> bool {
        matches!(self.kind, FunctionKind::Constructor { primary: true })
    }

    #[inline]
    pub fn is_getter(&self) -> bool {
        matches!(self.kind, FunctionKind::Getter { .. })
    }

    /// Receivers and value parameters in calling-convention order:
    /// dispatch receiver, context receivers, extension receiver, then
    /// value parameters.
    pub fn explicit_params(&self) -> impl Iterator<Item = &Param> {
        self.dispatch_receiver
            .iter()
            .chain(self.context_receivers.iter())
            .chain(self.extension_receiver.iter())
            .chain(self.params.iter())
    }

    pub fn explicit_param_count(&self) -> usize {
        usize::from(self.dispatch_receiver.is_some())
            + self.context_receivers.len()
            + usize::from(self.extension_receiver.is_some())
            + self.params.len()
    }

    /// Look up a parameter or receiver by its value ID.
    pub fn param(&self, value: ValueId) -> Option<&Param> {
        self.explicit_params().find(|p| p.value == value)
    }
}
