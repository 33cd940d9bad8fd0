//! MAP and ARRAY value construction.
//!
//! Both constructors bind a fresh empty collection, then emit one insertion
//! statement per element in operand order.

use sqlcg_core::{LoweringError, Repr, ScalarExpr, SqlKind};

use crate::conversion;
use crate::ir::{Expression, Method, Statement};
use crate::translator::Translator;

pub(crate) fn translate_constructor<'ast>(
    translator: &Translator<'_, 'ast>,
    operands: &'ast [ScalarExpr<'ast>],
    kind: SqlKind,
) -> Result<Expression, LoweringError> {
    match kind {
        SqlKind::MapValueConstructor => build_map(translator, operands),
        SqlKind::ArrayValueConstructor => build_list(translator, operands),
        other => Err(LoweringError::UnsupportedConstructor {
            kind: format!("{other:?}"),
        }),
    }
}

/// Keys and values alternate. A repeated key overwrites the earlier value
/// in place.
fn build_map<'ast>(
    translator: &Translator<'_, 'ast>,
    operands: &'ast [ScalarExpr<'ast>],
) -> Result<Expression, LoweringError> {
    if operands.len() % 2 != 0 {
        return Err(LoweringError::OperandCount {
            op: "MAP".to_string(),
            expected: "an even number of".to_string(),
            found: operands.len(),
        });
    }
    let map = translator.append("map", Expression::new_instance(Repr::Map, vec![]));
    for pair in operands.chunks(2) {
        let key = element(translator, &pair[0])?;
        let value = element(translator, &pair[1])?;
        translator.add(Statement::Expr(Expression::method_call(
            map.clone(),
            Method::MapPut,
            vec![key, value],
            Repr::Object,
        )));
    }
    Ok(map)
}

fn build_list<'ast>(
    translator: &Translator<'_, 'ast>,
    operands: &'ast [ScalarExpr<'ast>],
) -> Result<Expression, LoweringError> {
    let list = translator.append("list", Expression::new_instance(Repr::List, vec![]));
    for operand in operands {
        let value = element(translator, operand)?;
        translator.add(Statement::Expr(Expression::method_call(
            list.clone(),
            Method::ListAdd,
            vec![value],
            Repr::BOOL,
        )));
    }
    Ok(list)
}

/// Collections hold references, so primitive elements are boxed.
fn element<'ast>(
    translator: &Translator<'_, 'ast>,
    operand: &'ast ScalarExpr<'ast>,
) -> Result<Expression, LoweringError> {
    Ok(conversion::box_value(translator.translate_default(operand)?))
}
