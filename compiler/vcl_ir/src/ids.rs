//! Index newtypes for declarations and values.
//!
//! Every declaration lives in an arena of the [`DeclStore`](crate::DeclStore)
//! and is referred to by one of these handles. Identity of a declaration is
//! identity of its handle: two structurally equal classes declared twice are
//! two different `ClassId`s.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an ID from a raw index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into arenas).
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// A class declaration (composite value type or regular class).
    ClassId
);
define_id!(
    /// A function, accessor, or constructor declaration.
    FunctionId
);
define_id!(
    /// A backing field declaration.
    FieldId
);
define_id!(
    /// A property declaration (getter plus optional backing field).
    PropertyId
);
define_id!(
    /// A generic type parameter declaration.
    TypeParamId
);
define_id!(
    /// A local value inside one function body: a parameter, a local
    /// variable, or a temporary. Unique per function, not globally.
    ValueId
);
