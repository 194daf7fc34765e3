//! The type model: scalars, class types, and type-parameter references.
//!
//! Types are small trees compared structurally. Class identity inside a type
//! is by [`ClassId`], so two class types are equal iff they name the same
//! declaration with equal arguments and nullability.

use rustc_hash::FxHashMap;

use crate::{ClassId, TypeParamId};

/// A substitution from type parameters to concrete types.
///
/// Threaded explicitly through every recursive lowering step; never stored
/// in ambient state.
pub type TypeArguments = FxHashMap<TypeParamId, Type>;

/// Built-in scalar and top/bottom types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Prim {
    Int,
    Long,
    Short,
    Byte,
    Float,
    Double,
    Bool,
    Char,
    Unit,
    /// The bottom type. Expressions of this type never produce a value.
    Never,
    /// The top reference type.
    Any,
    String,
}

impl Prim {
    /// Source-level spelling, used when rendering types.
    pub const fn name(self) -> &'static str {
        match self {
            Prim::Int => "int",
            Prim::Long => "long",
            Prim::Short => "short",
            Prim::Byte => "byte",
            Prim::Float => "float",
            Prim::Double => "double",
            Prim::Bool => "bool",
            Prim::Char => "char",
            Prim::Unit => "unit",
            Prim::Never => "never",
            Prim::Any => "any",
            Prim::String => "string",
        }
    }
}

/// A (possibly nullable) type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    Prim { prim: Prim, nullable: bool },
    Class {
        class: ClassId,
        args: Vec<Type>,
        nullable: bool,
    },
    Param { param: TypeParamId, nullable: bool },
}

impl Type {
    pub const INT: Type = Type::prim(Prim::Int);
    pub const LONG: Type = Type::prim(Prim::Long);
    pub const DOUBLE: Type = Type::prim(Prim::Double);
    pub const BOOL: Type = Type::prim(Prim::Bool);
    pub const CHAR: Type = Type::prim(Prim::Char);
    pub const UNIT: Type = Type::prim(Prim::Unit);
    pub const NEVER: Type = Type::prim(Prim::Never);
    pub const ANY: Type = Type::prim(Prim::Any);
    pub const STRING: Type = Type::prim(Prim::String);

    /// A non-nullable primitive type.
    pub const fn prim(prim: Prim) -> Type {
        Type::Prim {
            prim,
            nullable: false,
        }
    }

    /// A non-nullable class type.
    pub fn class(class: ClassId, args: Vec<Type>) -> Type {
        Type::Class {
            class,
            args,
            nullable: false,
        }
    }

    /// A non-nullable reference to a type parameter.
    pub const fn param(param: TypeParamId) -> Type {
        Type::Param {
            param,
            nullable: false,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            Type::Prim { nullable, .. }
            | Type::Class { nullable, .. }
            | Type::Param { nullable, .. } => *nullable,
        }
    }

    /// Returns `true` for the non-nullable bottom type.
    pub fn is_never(&self) -> bool {
        matches!(
            self,
            Type::Prim {
                prim: Prim::Never,
                nullable: false
            }
        )
    }

    pub fn is_unit(&self) -> bool {
        matches!(
            self,
            Type::Prim {
                prim: Prim::Unit,
                ..
            }
        )
    }

    pub fn is_bool(&self) -> bool {
        matches!(
            self,
            Type::Prim {
                prim: Prim::Bool,
                nullable: false
            }
        )
    }

    #[must_use]
    pub fn make_nullable(&self) -> Type {
        self.with_nullability(true)
    }

    #[must_use]
    pub fn make_not_null(&self) -> Type {
        self.with_nullability(false)
    }

    fn with_nullability(&self, value: bool) -> Type {
        let mut ty = self.clone();
        match &mut ty {
            Type::Prim { nullable, .. }
            | Type::Class { nullable, .. }
            | Type::Param { nullable, .. } => *nullable = value,
        }
        ty
    }

    /// The class this type directly names, if any.
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            Type::Class { class, .. } => Some(*class),
            _ => None,
        }
    }

    /// Type arguments of a class type; empty for everything else.
    pub fn args(&self) -> &[Type] {
        match self {
            Type::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// Apply a substitution.
    ///
    /// A nullable parameter reference `T?` substituted with `X` yields `X?`.
    /// Parameters absent from `arguments` are left untouched.
    #[must_use]
    pub fn substitute(&self, arguments: &TypeArguments) -> Type {
        if arguments.is_empty() {
            return self.clone();
        }
        match self {
            Type::Prim { .. } => self.clone(),
            Type::Class {
                class,
                args,
                nullable,
            } => Type::Class {
                class: *class,
                args: args.iter().map(|arg| arg.substitute(arguments)).collect(),
                nullable: *nullable,
            },
            Type::Param { param, nullable } => match arguments.get(param) {
                Some(replacement) if *nullable => replacement.make_nullable(),
                Some(replacement) => replacement.clone(),
                None => self.clone(),
            },
        }
    }
}
