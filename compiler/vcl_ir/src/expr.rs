//! Emitted-code IR: expressions, statements, and function bodies.
//!
//! This is the tree the lowering backend produces. It is intentionally
//! small: reads of locals and fields, calls, the two boolean combinators
//! synthesized equality needs, a statement-sequence expression, and
//! implicit conversions at call sites.
//!
//! Every [`Expr`] carries its static type, which call-site remapping
//! inspects (a never-typed argument is an unreachable placeholder).

use crate::{FieldId, FunctionId, Name, Prim, Type, ValueId};

/// A literal constant.
///
/// Floating-point constants are stored as raw bits so `Const` stays `Eq + Hash`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Const {
    Int(i64),
    Long(i64),
    Float(u32),
    Double(u64),
    Bool(bool),
    Char(char),
    Str(Name),
    Null,
    Unit,
}

/// Why a [`ExprKind::Composite`] was emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeOrigin {
    /// A plain statement sequence whose value is the last expression.
    Block,
    /// One slot of a never-typed argument split across the leaves of a
    /// composite parameter. Only the first slot evaluates the original
    /// expression; the rest only hold a default value.
    FlattenedNeverDefault,
}

/// A direct call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Call {
    pub callee: FunctionId,
    pub type_args: Vec<Type>,
    pub dispatch_receiver: Option<Expr>,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Const(Const),
    /// Read of a parameter, local, or temporary.
    Get(ValueId),
    /// Field read. `receiver` is `None` for static fields.
    GetField {
        receiver: Option<Box<Expr>>,
        field: FieldId,
    },
    Call(Box<Call>),
    /// Short-circuiting logical AND.
    And(Box<Expr>, Box<Expr>),
    /// Value equality of two scalars.
    Equals(Box<Expr>, Box<Expr>),
    Composite {
        origin: CompositeOrigin,
        exprs: Vec<Expr>,
    },
    /// Conversion of the operand to the expression's type.
    ImplicitCast(Box<Expr>),
}

/// A typed expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
}

impl Expr {
    pub fn constant(value: Const, ty: Type) -> Expr {
        Expr {
            kind: ExprKind::Const(value),
            ty,
        }
    }

    pub fn get(value: ValueId, ty: Type) -> Expr {
        Expr {
            kind: ExprKind::Get(value),
            ty,
        }
    }

    pub fn get_field(receiver: Option<Expr>, field: FieldId, ty: Type) -> Expr {
        Expr {
            kind: ExprKind::GetField {
                receiver: receiver.map(Box::new),
                field,
            },
            ty,
        }
    }

    pub fn call(call: Call, ty: Type) -> Expr {
        Expr {
            kind: ExprKind::Call(Box::new(call)),
            ty,
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr {
            kind: ExprKind::And(Box::new(lhs), Box::new(rhs)),
            ty: Type::BOOL,
        }
    }

    pub fn equals(lhs: Expr, rhs: Expr) -> Expr {
        Expr {
            kind: ExprKind::Equals(Box::new(lhs), Box::new(rhs)),
            ty: Type::BOOL,
        }
    }

    pub fn composite(origin: CompositeOrigin, exprs: Vec<Expr>, ty: Type) -> Expr {
        Expr {
            kind: ExprKind::Composite { origin, exprs },
            ty,
        }
    }

    /// `self` converted to `ty`. Values already of that type, and
    /// never-typed values, are returned unchanged.
    #[must_use]
    pub fn coerce_to(self, ty: &Type) -> Expr {
        if self.ty == *ty || self.ty.is_never() {
            return self;
        }
        Expr {
            kind: ExprKind::ImplicitCast(Box::new(self)),
            ty: ty.clone(),
        }
    }

    /// The zero value of `ty`: `0`, `false`, `'\0'`, `unit`, or `null` for
    /// every reference type.
    pub fn default_value(ty: &Type) -> Expr {
        let value = match ty {
            Type::Prim {
                prim,
                nullable: false,
            } => match prim {
                Prim::Int | Prim::Short | Prim::Byte => Const::Int(0),
                Prim::Long => Const::Long(0),
                Prim::Float => Const::Float(0),
                Prim::Double => Const::Double(0),
                Prim::Bool => Const::Bool(false),
                Prim::Char => Const::Char('\0'),
                Prim::Unit => Const::Unit,
                Prim::Never | Prim::Any | Prim::String => Const::Null,
            },
            _ => Const::Null,
        };
        Expr::constant(value, ty.clone())
    }

    /// Returns the call payload if this is a call expression.
    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Returns `true` if this is a [`CompositeOrigin::FlattenedNeverDefault`] slot.
    pub fn is_flattened_never_default(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Composite {
                origin: CompositeOrigin::FlattenedNeverDefault,
                ..
            }
        )
    }

    /// Visit this expression and every sub-expression in evaluation order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match &self.kind {
            ExprKind::Const(_) | ExprKind::Get(_) => {}
            ExprKind::GetField { receiver, .. } => {
                if let Some(receiver) = receiver {
                    receiver.walk(f);
                }
            }
            ExprKind::Call(call) => {
                if let Some(receiver) = &call.dispatch_receiver {
                    receiver.walk(f);
                }
                for arg in &call.args {
                    arg.walk(f);
                }
            }
            ExprKind::And(lhs, rhs) | ExprKind::Equals(lhs, rhs) => {
                lhs.walk(f);
                rhs.walk(f);
            }
            ExprKind::Composite { exprs, .. } => {
                for expr in exprs {
                    expr.walk(f);
                }
            }
            ExprKind::ImplicitCast(inner) => inner.walk(f),
        }
    }
}

/// A statement in a block body or an emission scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stmt {
    /// Declare a local. Temporaries are immutable and always initialized.
    Let {
        var: ValueId,
        name: Name,
        ty: Type,
        init: Option<Expr>,
        mutable: bool,
    },
    SetVar {
        var: ValueId,
        value: Expr,
    },
    /// Field write. `receiver` is `None` for static fields.
    SetField {
        receiver: Option<Expr>,
        field: FieldId,
        value: Expr,
    },
    Expr(Expr),
}

impl Stmt {
    /// Visit every expression reachable from this statement.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        match self {
            Stmt::Let { init, .. } => {
                if let Some(init) = init {
                    init.walk(f);
                }
            }
            Stmt::SetVar { value, .. } => value.walk(f),
            Stmt::SetField {
                receiver, value, ..
            } => {
                if let Some(receiver) = receiver {
                    receiver.walk(f);
                }
                value.walk(f);
            }
            Stmt::Expr(expr) => expr.walk(f),
        }
    }
}

/// A function body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Body {
    /// `= expr`
    Expr(Expr),
    /// `{ stmts }` with no result value.
    Block(Vec<Stmt>),
}

impl Body {
    /// The single returned expression, if this is an expression body.
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Body::Expr(expr) => Some(expr),
            Body::Block(_) => None,
        }
    }

    /// Visit every expression in the body.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        match self {
            Body::Expr(expr) => expr.walk(f),
            Body::Block(stmts) => {
                for stmt in stmts {
                    stmt.walk(f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
