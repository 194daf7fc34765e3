//! Parameter groupings and call-site argument remapping.

use std::sync::Arc;

use vcl_ir::{CompositeOrigin, EmitScope, Expr, ExprKind, Param, ParamOrigin, Type, TypeArguments, ValueId};

use crate::instance::{AccessPolicy, NodeInstance};
use crate::node::{make_boxed_expression, FlatNode, Node, RootNode};
use crate::{FlattenError, Result};

/// How one original parameter maps onto a flattened parameter list.
#[derive(Clone, Debug)]
pub enum RemappedParameter {
    /// One parameter, unchanged in shape.
    Regular(Param),
    /// A composite spread over one parameter per leaf of `root`.
    Composite {
        root: Arc<RootNode>,
        /// Bindings for the root class's type parameters.
        type_args: TypeArguments,
        params: Vec<Param>,
    },
}

impl RemappedParameter {
    pub fn params(&self) -> &[Param] {
        match self {
            RemappedParameter::Regular(param) => std::slice::from_ref(param),
            RemappedParameter::Composite { params, .. } => params,
        }
    }

    /// Number of flattened parameters this grouping occupies.
    pub fn size(&self) -> usize {
        self.params().len()
    }

    /// The type the grouping has as a single boxed value.
    pub fn boxed_type(&self) -> Type {
        match self {
            RemappedParameter::Regular(param) => param.ty.clone(),
            RemappedParameter::Composite { root, type_args, .. } => root.ty().substitute(type_args),
        }
    }

    fn is_synthetic(&self) -> bool {
        match self {
            RemappedParameter::Regular(param) => param.origin != ParamOrigin::Defined,
            RemappedParameter::Composite { .. } => false,
        }
    }

    fn describe(&self, scope: &EmitScope<'_>) -> String {
        let store = scope.store();
        match self {
            RemappedParameter::Regular(param) => store.name_str(param.name).to_owned(),
            RemappedParameter::Composite { params, .. } => params
                .iter()
                .map(|p| store.name_str(p.name))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Check that `source` can feed `target` grouping by grouping.
///
/// Composite groupings at the same position must belong to the same
/// class. Positions present on one side only must be synthetic.
pub(crate) fn verify_compatibility(
    scope: &EmitScope<'_>,
    target: &[RemappedParameter],
    source: &[RemappedParameter],
) -> Result<()> {
    let store = scope.store();
    for (t, s) in target.iter().zip(source) {
        if let (
            RemappedParameter::Composite { root: t_root, type_args: t_args, .. },
            RemappedParameter::Composite { root: s_root, type_args: s_args, .. },
        ) = (t, s)
        {
            if t_root.class() != s_root.class() {
                return Err(FlattenError::IncompatibleStructure {
                    target: store.render_type(&t_root.ty().substitute(t_args)),
                    argument: store.render_type(&s_root.ty().substitute(s_args)),
                });
            }
        }
    }
    let common = target.len().min(source.len());
    let extras = target[common..]
        .iter()
        .map(|g| ("target", g))
        .chain(source[common..].iter().map(|g| ("source", g)));
    for (side, grouping) in extras {
        if !grouping.is_synthetic() {
            let decl = match scope.context() {
                Some(class) => store.name_str(store.class(class).name).to_owned(),
                None => "<top level>".to_owned(),
            };
            return Err(FlattenError::UnexpectedExtraParameter {
                decl,
                side,
                param: grouping.describe(scope),
            });
        }
    }
    Ok(())
}

/// Arguments for every `target` parameter, computed from the source
/// function's arguments.
///
/// `get_argument` yields the argument passed for a source parameter, or
/// `None` where the call site leaves it to its default. It also receives
/// the type the argument is about to be used at. Each source argument is
/// requested at most once. Arguments landing in a slot of another type
/// are coerced to the slot's type.
pub fn map_function_structures(
    scope: &mut EmitScope<'_>,
    target: &[RemappedParameter],
    source: &[RemappedParameter],
    mut get_argument: impl FnMut(&Param, &Type) -> Option<Expr>,
) -> Result<Vec<(ValueId, Option<Expr>)>> {
    verify_compatibility(scope, target, source)?;
    let mut out = Vec::with_capacity(target.iter().map(RemappedParameter::size).sum());

    for (t, s) in target.iter().zip(source) {
        match (t, s) {
            (RemappedParameter::Regular(t_param), RemappedParameter::Regular(s_param)) => {
                let argument = get_argument(s_param, &t_param.ty).map(|a| a.coerce_to(&t_param.ty));
                out.push((t_param.value, argument));
            }
            (RemappedParameter::Composite { root, type_args, params }, RemappedParameter::Regular(s_param)) => {
                let boxed_ty = t.boxed_type();
                let Some(argument) = get_argument(s_param, &boxed_ty) else {
                    out.extend(params.iter().map(|p| (p.value, None)));
                    continue;
                };
                if argument.ty.is_never() {
                    // The first slot keeps the unreachable expression; the rest are placeholders.
                    let mut argument = Some(argument);
                    for param in params {
                        let mut exprs = Vec::with_capacity(2);
                        exprs.extend(argument.take());
                        exprs.push(Expr::default_value(&param.ty));
                        let placeholder = Expr::composite(CompositeOrigin::FlattenedNeverDefault, exprs, param.ty.clone());
                        out.push((param.value, Some(placeholder)));
                    }
                    continue;
                }
                let node = Node::Root(Arc::clone(root));
                let argument = argument.coerce_to(&boxed_ty);
                let instance = node.create_instance(scope, type_args.clone(), Some(argument), AccessPolicy::PreferFields);
                let values = instance.flattened_getters(scope)?;
                out.extend(params.iter().map(|p| p.value).zip(values.into_iter().map(Some)));
            }
            (RemappedParameter::Regular(t_param), RemappedParameter::Composite { root, type_args, params }) => {
                let arguments: Vec<Option<Expr>> = params.iter().map(|p| get_argument(p, &p.ty)).collect();
                if arguments.iter().all(Option::is_none) {
                    out.push((t_param.value, None));
                    continue;
                }
                let Some(values) = arguments.into_iter().collect::<Option<Vec<Expr>>>() else {
                    return Err(FlattenError::mismatch(
                        scope.store().name_str(t_param.name),
                        "composite argument is only partially supplied",
                    ));
                };
                if values.iter().all(Expr::is_flattened_never_default) {
                    let never = match &values[0].kind {
                        ExprKind::Composite { exprs, .. } => exprs.first().cloned(),
                        _ => None,
                    };
                    out.push((t_param.value, never));
                    continue;
                }
                let node = Node::Root(Arc::clone(root));
                let boxed = make_boxed_expression(scope, &node, type_args, values)?;
                out.push((t_param.value, Some(boxed)));
            }
            (
                RemappedParameter::Composite { params: t_params, .. },
                RemappedParameter::Composite { params: s_params, .. },
            ) => {
                for (t_param, s_param) in t_params.iter().zip(s_params) {
                    let argument = get_argument(s_param, &t_param.ty).map(|a| a.coerce_to(&t_param.ty));
                    out.push((t_param.value, argument));
                }
            }
        }
    }

    for extra in target.iter().skip(source.len()) {
        out.extend(extra.params().iter().map(|p| (p.value, None)));
    }
    tracing::trace!(
        target = target.len(),
        source = source.len(),
        arguments = out.len(),
        "remapped call arguments"
    );
    Ok(out)
}
