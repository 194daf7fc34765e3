//! Flattening errors.
//!
//! Every variant is an internal-consistency violation: the declaration
//! model handed to this crate is malformed, or an upstream pass asked for
//! something it must never ask for. None are user diagnostics and none are
//! recovered from; the compilation driver aborts on the first one.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FlattenError {
    /// Leaf, parameter, or field counts disagree.
    #[error("structural mismatch in `{decl}`: {detail}")]
    StructuralMismatch { decl: String, detail: String },

    /// Two sibling nodes share a name.
    #[error("repeated node name `{name}` under `{decl}` ({count} nodes)")]
    DuplicateName {
        decl: String,
        name: String,
        count: usize,
    },

    /// Assignment to a node that has no backing fields.
    #[error("`{decl}` has no backing fields to assign")]
    MissingStorage { decl: String },

    /// Two composite groupings at a call site name different declarations.
    #[error("incompatible parameter structures: `{target}` cannot receive `{argument}`")]
    IncompatibleStructure { target: String, argument: String },

    /// A synthesized member declares an extension or context receiver.
    #[error("{receiver} receiver is not expected for `{decl}`")]
    DisallowedReceiver {
        decl: String,
        receiver: &'static str,
    },

    /// A flattened composite type was required.
    #[error("`{ty}` does not require flattening")]
    NotComposite { ty: String },

    /// A parameter grouping with no counterpart is user-declared or composite.
    #[error("unexpected {side} parameter `{param}` in structure of `{decl}`")]
    UnexpectedExtraParameter {
        decl: String,
        side: &'static str,
        param: String,
    },
}

impl FlattenError {
    pub fn mismatch(decl: impl Into<String>, detail: impl Into<String>) -> Self {
        FlattenError::StructuralMismatch {
            decl: decl.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T, E = FlattenError> = std::result::Result<T, E>;
