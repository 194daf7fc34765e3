//! Emission scope: the builder the lowering core emits code through.
//!
//! One `EmitScope` exists per code-generation site. It allocates fresh
//! local value IDs, owns the ordered statement sink that temporaries and
//! setter statements are appended to, and builds typed call expressions.
//! Expressions are returned to the caller; only statements accumulate.

use crate::{Call, ClassId, DeclStore, Expr, FunctionDecl, FunctionId, Name, Stmt, Type, TypeArguments, ValueId};

pub struct EmitScope<'s> {
    store: &'s DeclStore,
    /// Lexical class the emitted code lives in. Decides field visibility.
    context: Option<ClassId>,
    next_value: u32,
    stmts: Vec<Stmt>,
}

impl<'s> EmitScope<'s> {
    pub fn new(store: &'s DeclStore, context: Option<ClassId>) -> Self {
        EmitScope {
            store,
            context,
            next_value: 0,
            stmts: Vec::new(),
        }
    }

    /// A scope emitting into the body of `function`. Fresh values continue
    /// after the function's own parameters.
    pub fn for_function(store: &'s DeclStore, function: &FunctionDecl) -> Self {
        EmitScope {
            store,
            context: function.parent,
            next_value: function.value_count,
            stmts: Vec::new(),
        }
    }

    #[inline]
    pub fn store(&self) -> &'s DeclStore {
        self.store
    }

    #[inline]
    pub fn context(&self) -> Option<ClassId> {
        self.context
    }

    pub fn fresh_value(&mut self) -> ValueId {
        let value = ValueId::new(self.next_value);
        self.next_value += 1;
        value
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    /// Declare a local and append its declaration to the sink.
    pub fn variable(&mut self, name: Name, ty: Type, init: Option<Expr>, mutable: bool) -> ValueId {
        let var = self.fresh_value();
        self.stmts.push(Stmt::Let {
            var,
            name,
            ty,
            init,
            mutable,
        });
        var
    }

    /// Evaluate `init` once into an immutable temporary and return a read of it.
    pub fn temporary(&mut self, name: &str, init: Expr) -> Expr {
        let ty = init.ty.clone();
        let name = self.store.intern(name);
        let var = self.variable(name, ty.clone(), Some(init), false);
        Expr::get(var, ty)
    }

    /// A typed call.
    ///
    /// The result type is the callee's return type with the callee's own
    /// type parameters bound to `type_args` and its class's parameters bound
    /// from the dispatch receiver's type.
    pub fn call(
        &self,
        callee: FunctionId,
        type_args: Vec<Type>,
        dispatch_receiver: Option<Expr>,
        args: Vec<Expr>,
    ) -> Expr {
        let decl = self.store.function(callee);
        let mut substitution: TypeArguments = decl
            .type_params
            .iter()
            .copied()
            .zip(type_args.iter().cloned())
            .collect();
        if let Some(receiver) = &dispatch_receiver {
            substitution.extend(self.store.type_arguments_of(&receiver.ty));
        }
        let ty = decl.return_ty.substitute(&substitution);
        Expr::call(
            Call {
                callee,
                type_args,
                dispatch_receiver,
                args,
            },
            ty,
        )
    }

    pub fn statements(&self) -> &[Stmt] {
        &self.stmts
    }

    /// Consume the scope, returning the emitted statements and the next
    /// unallocated value index.
    pub fn finish(self) -> (Vec<Stmt>, u32) {
        (self.stmts, self.next_value)
    }

    // ── Inspection ──────────────────────────────────────────────────

    fn visit<'a>(&'a self, results: &'a [Expr], mut f: impl FnMut(&'a Expr)) {
        for stmt in &self.stmts {
            stmt.walk(&mut f);
        }
        for expr in results {
            expr.walk(&mut f);
        }
    }

    /// Calls to `callee` in the sink plus `results`.
    pub fn count_calls(&self, results: &[Expr], callee: FunctionId) -> usize {
        let mut count = 0;
        self.visit(results, |e| {
            if e.as_call().is_some_and(|c| c.callee == callee) {
                count += 1;
            }
        });
        count
    }

    /// Calls to any function in the sink plus `results`.
    pub fn count_all_calls(&self, results: &[Expr]) -> usize {
        let mut count = 0;
        self.visit(results, |e| {
            if e.as_call().is_some() {
                count += 1;
            }
        });
        count
    }

    /// Reads of `var` in the sink plus `results`.
    pub fn count_reads(&self, results: &[Expr], var: ValueId) -> usize {
        let mut count = 0;
        self.visit(results, |e| {
            if e.kind == crate::ExprKind::Get(var) {
                count += 1;
            }
        });
        count
    }

    /// Temporaries declared so far, in order.
    pub fn temporaries(&self) -> Vec<ValueId> {
        self.stmts
            .iter()
            .filter_map(|s| match s {
                Stmt::Let {
                    var, mutable: false, ..
                } => Some(*var),
                _ => None,
            })
            .collect()
    }
}
