//! Flattening classification.
//!
//! Decides, per type, whether a value of that type is passed and stored
//! as one slot or as the ordered leaf sequence of a composite.
//!
//! Only non-nullable composite types flatten. A nullable composite needs a
//! way to represent absence that a slot sequence does not have, so it always
//! stays boxed. A type parameter flattens when it is non-nullable and one of
//! its upper bounds flattens.

use vcl_ir::{ClassId, DeclStore, Type};

/// How values of a type are represented in signatures and storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueShape {
    /// One slot: a scalar, a reference, or a boxed composite.
    Single,
    /// The leaf sequence of the given composite class.
    Flattened(ClassId),
}

/// Bound-chasing stops here. Cyclic bounds are rejected upstream.
const MAX_BOUND_DEPTH: u32 = 64;

/// Classification queries over the declaration model.
pub trait FlatteningClassification {
    /// Classify a type.
    fn value_shape(&self, ty: &Type) -> ValueShape;

    /// Returns `true` if values of `ty` are flattened.
    fn needs_flattening(&self, ty: &Type) -> bool {
        matches!(self.value_shape(ty), ValueShape::Flattened(_))
    }

    /// The composite class values of `ty` flatten into, if any.
    fn flattened_class(&self, ty: &Type) -> Option<ClassId> {
        match self.value_shape(ty) {
            ValueShape::Flattened(class) => Some(class),
            ValueShape::Single => None,
        }
    }
}

impl FlatteningClassification for DeclStore {
    fn value_shape(&self, ty: &Type) -> ValueShape {
        shape_of(self, ty, 0)
    }
}

fn shape_of(store: &DeclStore, ty: &Type, depth: u32) -> ValueShape {
    if depth > MAX_BOUND_DEPTH {
        return ValueShape::Single;
    }
    match ty {
        Type::Class {
            class,
            nullable: false,
            ..
        } if store.is_composite_class(*class) => ValueShape::Flattened(*class),
        Type::Param {
            param,
            nullable: false,
        } => store
            .type_param(*param)
            .upper_bounds
            .iter()
            .map(|bound| shape_of(store, bound, depth + 1))
            .find(|shape| matches!(shape, ValueShape::Flattened(_)))
            .unwrap_or(ValueShape::Single),
        _ => ValueShape::Single,
    }
}
