//! Composite value type flattening.
//!
//! A composite value type is an aggregate of several members that the
//! target can only pass around as one reference. This crate lowers such
//! values to an ordered list of scalar slots wherever possible:
//!
//! - [`node`]: the immutable decomposition tree of one composite
//!   declaration (leaves, intermediate nodes, root).
//! - `factory`: builds node trees and synthesizes the accessors, box
//!   method, constructors and equality they need.
//! - [`instance`]: binds a node to storage at one emission site and emits
//!   flattened or boxed reads and assignments.
//! - [`replace`]: the memoizing registry of node trees and of flattened
//!   replacements for functions and constructors, plus call-site argument
//!   remapping.
//!
//! All failures are [`FlattenError`]s: internal-consistency violations
//! that abort compilation.

mod classify;
mod error;
mod factory;
pub mod instance;
pub mod node;
pub mod replace;
mod stack;

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "fixtures unwrap declarations they just built"
)]
mod test_helpers;
#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

use std::sync::Once;

pub use classify::{FlatteningClassification, ValueShape};
pub use error::{FlattenError, Result};
pub use instance::{is_repeatable, AccessPolicy, DeclaredInstance, NodeInstance, ReceiverInstance};
pub use node::naming::{BOX_METHOD_NAME, CONSTRUCTOR_IMPL_NAME, SPECIALIZED_EQUALS_NAME, UNBOX_METHOD_PREFIX};
pub use node::{
    make_boxed_expression, Children, FlatNode, IntermediateNode, LeafNode, NameParts, NamingMode, Node,
    NodeName, RootNode, UnboxImpl,
};
pub use replace::{map_function_structures, RemappedParameter, Replacement, ReplacementKind, Replacements};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=vcl_flatten=debug` or `RUST_LOG=vcl_flatten=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
