//! VCL IR - declaration model and emitted-code IR for value-class lowering.
//!
//! This crate is everything the composite value lowering core consumes
//! but does not own:
//! - Interned names (`Name`, `StringInterner`)
//! - Declaration IDs and the type model (`Type`, `TypeArguments`)
//! - Declarations and the shared `DeclStore` oracle
//! - The emitted expression/statement tree and the `EmitScope` builder
//!
//! # Design Philosophy
//!
//! - **Identity by ID**: declarations are compared by handle, never by shape
//! - **Append-only store**: declarations are added and updated, never removed
//! - **Typed expressions**: every emitted `Expr` knows its static type

mod builder;
mod decl;
mod emit;
mod expr;
mod ids;
mod interner;
mod name;
mod store;
mod ty;

pub use builder::{getter_name, ClassBuilder, FunctionBuilder};
pub use decl::{
    ClassDecl, ClassFlags, FieldDecl, FunctionDecl, FunctionFlags, FunctionKind, Origin, Param,
    ParamOrigin, PropertyDecl, TypeParamDecl, Visibility,
};
pub use emit::EmitScope;
pub use expr::{Body, Call, CompositeOrigin, Const, Expr, ExprKind, Stmt};
pub use ids::{ClassId, FieldId, FunctionId, PropertyId, TypeParamId, ValueId};
pub use interner::StringInterner;
pub use name::Name;
pub use store::DeclStore;
pub use ty::{Prim, Type, TypeArguments};
