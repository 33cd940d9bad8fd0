//! Human-readable rendering of emitted code, used in logs and tests.

use std::fmt::{self, Display, Formatter};

use super::{Block, Expression, Statement};

fn write_args(f: &mut Formatter<'_>, args: &[Expression]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant { value, .. } => write!(f, "{value}"),
            Expression::Variable { name, .. } | Expression::Parameter { name, .. } => {
                f.write_str(name)
            }
            Expression::Field { target, index, .. } => write!(f, "{target}[{index}]"),
            Expression::Convert { operand, to } => write!(f, "({to}) {operand}"),
            Expression::BoxPrimitive { operand, .. } => write!(f, "box({operand})"),
            Expression::Unbox { operand, kind } => write!(f, "{operand}.{kind}_value()"),
            Expression::New { class, args } => {
                write!(f, "new {class}(")?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expression::Call { builtin, args, .. } => {
                write!(f, "{}(", builtin.name())?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expression::MethodCall {
                target,
                method,
                args,
                ..
            } => {
                write!(f, "{target}.{}(", method.name())?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expression::Binary {
                op, left, right, ..
            } => write!(f, "({left} {} {right})", op.symbol()),
            Expression::Not(operand) => write!(f, "!{operand}"),
            Expression::Condition {
                test,
                if_true,
                if_false,
                ..
            } => write!(f, "({test} ? {if_true} : {if_false})"),
            Expression::Scope { statements, result } => {
                f.write_str("{ ")?;
                for statement in statements {
                    write!(f, "{statement} ")?;
                }
                write!(f, "{result} }}")
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Declare { name, value } => {
                write!(f, "let {name}: {} = {value};", value.repr())
            }
            Statement::Expr(expr) => write!(f, "{expr};"),
        }
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{statement}")?;
        }
        write!(f, "return {};", self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, Builtin};
    use sqlcg_core::{PrimitiveKind, Repr};

    #[test]
    fn render_expressions() {
        let x = Expression::variable("x", Repr::Boxed(PrimitiveKind::Int32));
        let guarded = Expression::condition(
            Expression::is_null(x.clone()),
            Expression::typed_null(Repr::String),
            Expression::call(Builtin::ToString, vec![x.clone()]),
        );
        assert_eq!(guarded.to_string(), "((x == null) ? null : to_string(x))");

        let sum = Expression::binary(
            BinaryOp::Add,
            Expression::unbox(x, PrimitiveKind::Int32),
            Expression::int32(1),
        );
        assert_eq!(sum.to_string(), "(x.i32_value() + 1)");
    }

    #[test]
    fn render_scope() {
        let x = Expression::variable("x", Repr::Boxed(PrimitiveKind::Int32));
        let x1 = Expression::variable("x1", Repr::Primitive(PrimitiveKind::Int32));
        let scope = Expression::scope(
            vec![Statement::Declare {
                name: "x1".into(),
                value: Expression::unbox(x, PrimitiveKind::Int32),
            }],
            Expression::binary(BinaryOp::Add, x1.clone(), Expression::int32(1)),
        );
        assert_eq!(
            scope.to_string(),
            "{ let x1: i32 = x.i32_value(); (x1 + 1) }"
        );
        assert_eq!(Expression::scope(vec![], x1.clone()), x1);
    }

    #[test]
    fn render_block() {
        let row = Expression::parameter("row", Repr::List);
        let block = Block {
            statements: vec![Statement::Declare {
                name: "v".into(),
                value: Expression::field(row, 0, Repr::Primitive(PrimitiveKind::Int32)),
            }],
            result: Expression::variable("v", Repr::Primitive(PrimitiveKind::Int32)),
        };
        assert_eq!(block.to_string(), "let v: i32 = row[0];\nreturn v;");
    }
}
