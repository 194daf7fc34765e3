//! Instances backed by one local or parameter per leaf.

use vcl_ir::{EmitScope, Expr, Name, Stmt, Type, TypeArguments, ValueId};

use super::NodeInstance;
use crate::node::{FlatNode, Node};
use crate::Result;

#[derive(Clone, Debug)]
pub struct DeclaredInstance {
    node: Node,
    type_args: TypeArguments,
    /// One variable per leaf, in leaf order.
    values: Vec<(ValueId, Type)>,
}

impl DeclaredInstance {
    /// Wrap existing variables, such as the flattened parameters of a
    /// replacement.
    pub fn new(
        scope: &EmitScope<'_>,
        node: Node,
        type_args: TypeArguments,
        values: Vec<(ValueId, Type)>,
    ) -> Result<Self> {
        node.check_value_count(scope.store(), values.len())?;
        Ok(DeclaredInstance {
            node,
            type_args,
            values,
        })
    }

    /// Declare one variable per leaf, named `{name}-{leaf path}`,
    /// optionally initialized from `init` (one value per leaf).
    pub fn declare(
        scope: &mut EmitScope<'_>,
        node: Node,
        type_args: TypeArguments,
        name: &str,
        init: Option<Vec<Expr>>,
        mutable: bool,
    ) -> Result<Self> {
        let store = scope.store();
        if let Some(init) = &init {
            node.check_value_count(store, init.len())?;
        }
        let mut init = init.map(Vec::into_iter);
        let mut values = Vec::with_capacity(node.leaf_count());
        for leaf in node.leaves() {
            let leaf_name = store.name_str(leaf.name().full_field_name());
            let ty = leaf.ty().substitute(&type_args);
            let value = scope.variable(
                store.intern(&format!("{name}-{leaf_name}")),
                ty.clone(),
                init.as_mut().and_then(Iterator::next),
                mutable,
            );
            values.push((value, ty));
        }
        Ok(DeclaredInstance {
            node,
            type_args,
            values,
        })
    }

    pub fn values(&self) -> &[(ValueId, Type)] {
        &self.values
    }

    /// The slice of variables member `name` occupies.
    pub fn child(&self, name: Name) -> Option<DeclaredInstance> {
        let (child, range) = self.node.subnode_and_range(name)?;
        Some(DeclaredInstance {
            node: child.clone(),
            type_args: self.type_args.clone(),
            values: self.values[range].to_vec(),
        })
    }
}

impl NodeInstance for DeclaredInstance {
    fn node(&self) -> &Node {
        &self.node
    }

    fn type_arguments(&self) -> &TypeArguments {
        &self.type_args
    }

    fn flattened_getters(&self, _scope: &mut EmitScope<'_>) -> Result<Vec<Expr>> {
        Ok(self
            .values
            .iter()
            .map(|(value, ty)| Expr::get(*value, ty.clone()))
            .collect())
    }

    fn set(&self, scope: &mut EmitScope<'_>, values: Vec<Expr>) -> Result<()> {
        self.node.check_value_count(scope.store(), values.len())?;
        for (&(var, _), value) in self.values.iter().zip(values) {
            scope.push(Stmt::SetVar { var, value });
        }
        Ok(())
    }
}
