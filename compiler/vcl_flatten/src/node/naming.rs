//! Names of synthesized accessors, fields, and flattened parameters.
//!
//! A node's name path is the list of member names from its root down to
//! itself. Every synthesized name is derived from the path by joining with
//! `-`, which cannot appear in a source identifier, so derived names never
//! collide with user declarations.

use smallvec::SmallVec;
use vcl_ir::{getter_name, DeclStore, Name};

/// Name of the static box method of every composite.
pub const BOX_METHOD_NAME: &str = "box-impl";

/// Prefix of every unbox accessor of a composite's own members.
pub const UNBOX_METHOD_PREFIX: &str = "unbox-impl";

/// Name of the static constructor body holder of a composite.
pub const CONSTRUCTOR_IMPL_NAME: &str = "constructor-impl";

/// Name of the static replacement of a composite's typed equality.
pub const SPECIALIZED_EQUALS_NAME: &str = "equals-impl0";

/// Name path from a root to a node. Most paths are short.
pub type NameParts = SmallVec<[Name; 4]>;

/// How the accessor of a named node is spelled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum NamingMode {
    /// Members of a composite itself: `unbox-impl-p-a`.
    UnboxFunction,
    /// Composite-typed properties of other classes: `getP-a`.
    Getter,
}

/// The precomputed names of a non-root node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeName {
    parts: NameParts,
    full_method_name: Name,
    full_field_name: Name,
}

impl NodeName {
    /// # Panics
    /// Panics if `parts` is empty; every named node has at least its own name.
    pub fn new(store: &DeclStore, mode: NamingMode, parts: NameParts) -> Self {
        assert!(!parts.is_empty(), "name must contain at least one part");
        let full_method_name = store.intern(&full_method_name(store, mode, &parts));
        let full_field_name = store.intern(&full_field_name(store, &parts));
        NodeName {
            parts,
            full_method_name,
            full_field_name,
        }
    }

    pub fn parts(&self) -> &[Name] {
        &self.parts
    }

    /// The last part: the member name under the parent.
    pub fn name(&self) -> Name {
        self.parts[self.parts.len() - 1]
    }

    pub fn full_method_name(&self) -> Name {
        self.full_method_name
    }

    pub fn full_field_name(&self) -> Name {
        self.full_field_name
    }
}

pub fn full_method_name(store: &DeclStore, mode: NamingMode, parts: &[Name]) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(parts.len() + 1);
    match mode {
        NamingMode::UnboxFunction => {
            segments.push(UNBOX_METHOD_PREFIX.to_owned());
            segments.extend(parts.iter().map(|&p| store.name_str(p).to_owned()));
        }
        NamingMode::Getter => {
            if let Some((&first, rest)) = parts.split_first() {
                segments.push(getter_name(store.name_str(first)));
                segments.extend(rest.iter().map(|&p| store.name_str(p).to_owned()));
            }
        }
    }
    segments.join("-")
}

pub fn full_field_name(store: &DeclStore, parts: &[Name]) -> String {
    parts
        .iter()
        .map(|&p| store.name_str(p))
        .collect::<Vec<_>>()
        .join("-")
}
