use pretty_assertions::assert_eq;

use super::*;

#[test]
fn default_values_match_scalar_kinds() {
    assert_eq!(
        Expr::default_value(&Type::INT).kind,
        ExprKind::Const(Const::Int(0))
    );
    assert_eq!(
        Expr::default_value(&Type::BOOL).kind,
        ExprKind::Const(Const::Bool(false))
    );
    assert_eq!(
        Expr::default_value(&Type::INT.make_nullable()).kind,
        ExprKind::Const(Const::Null)
    );
    assert_eq!(
        Expr::default_value(&Type::class(crate::ClassId::new(0), vec![])).kind,
        ExprKind::Const(Const::Null)
    );
}

#[test]
fn walk_visits_receivers_before_arguments() {
    let receiver = Expr::get(ValueId::new(0), Type::ANY);
    let arg = Expr::get(ValueId::new(1), Type::INT);
    let call = Expr::call(
        Call {
            callee: FunctionId::new(7),
            type_args: vec![],
            dispatch_receiver: Some(receiver),
            args: vec![arg],
        },
        Type::INT,
    );

    let mut seen = Vec::new();
    call.walk(&mut |e| {
        if let ExprKind::Get(v) = e.kind {
            seen.push(v.raw());
        }
    });

    assert_eq!(seen, vec![0, 1]);
}
