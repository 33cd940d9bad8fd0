//! Target expression tree.
//!
//! Lowering produces [`Expression`] trees and [`Statement`]s. Every node
//! carries, or can compute, its [`Repr`]; there is no separate type-checking
//! pass over the output.
//!
//! The constructors here fold the obvious constant cases (`!true`, `x && false`,
//! `true ? a : b`) so the translator never has to.

mod constant;
mod display;

pub use constant::Constant;

use sqlcg_core::{PrimitiveKind, Repr};

/// Runtime library functions callable from emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `is_true(b?)`: true iff the boxed boolean is non-null and true.
    IsTrue,
    /// `is_not_false(b?)`: true iff the boxed boolean is null or true.
    IsNotFalse,
    /// Three-valued AND over boxed booleans.
    And3,
    /// Three-valued OR over boxed booleans.
    Or3,
    /// `truncate(s, n)`: first `n` characters.
    Truncate,
    /// `trim_trailing(s)`: strip trailing spaces.
    TrimTrailing,
    /// `unix_date_to_string(days)`: `YYYY-MM-DD`.
    UnixDateToString,
    /// Float rendering in SQL form.
    FloatToString,
    /// Integer or boolean rendering.
    NumberToString,
    /// Rendering of any non-null reference value.
    ToString,
    Upper,
    CharLength,
    /// `substring(s, start[, length])`: characters from the 1-based
    /// `start`, to the end or for `length` characters.
    Substring,
}

impl Builtin {
    /// Name used when rendering emitted code.
    pub const fn name(self) -> &'static str {
        match self {
            Builtin::IsTrue => "is_true",
            Builtin::IsNotFalse => "is_not_false",
            Builtin::And3 => "and3",
            Builtin::Or3 => "or3",
            Builtin::Truncate => "truncate",
            Builtin::TrimTrailing => "trim_trailing",
            Builtin::UnixDateToString => "unix_date_to_string",
            Builtin::FloatToString => "float_to_string",
            Builtin::NumberToString => "number_to_string",
            Builtin::ToString => "to_string",
            Builtin::Upper => "upper",
            Builtin::CharLength => "char_length",
            Builtin::Substring => "substring",
        }
    }

    /// The representation of the function's result.
    pub const fn result_repr(self) -> Repr {
        match self {
            Builtin::IsTrue | Builtin::IsNotFalse => Repr::BOOL,
            Builtin::And3 | Builtin::Or3 => Repr::BOXED_BOOL,
            Builtin::CharLength => Repr::Primitive(PrimitiveKind::Int32),
            Builtin::Truncate
            | Builtin::TrimTrailing
            | Builtin::UnixDateToString
            | Builtin::FloatToString
            | Builtin::NumberToString
            | Builtin::ToString
            | Builtin::Upper
            | Builtin::Substring => Repr::String,
        }
    }

    /// The fewest and most arguments the function accepts.
    pub const fn arity(self) -> (usize, usize) {
        match self {
            Builtin::And3 | Builtin::Or3 => (0, usize::MAX),
            Builtin::Truncate => (2, 2),
            Builtin::Substring => (2, 3),
            _ => (1, 1),
        }
    }
}

/// Methods invoked on collection values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `map.put(key, value)`.
    MapPut,
    /// `list.add(value)`.
    ListAdd,
    /// `group.count()`.
    Count,
    /// `group.sum(accessor)`.
    Sum,
    /// `group.min(accessor)`.
    Min,
    /// `group.max(accessor)`.
    Max,
}

impl Method {
    pub const fn name(self) -> &'static str {
        match self {
            Method::MapPut => "put",
            Method::ListAdd => "add",
            Method::Count => "count",
            Method::Sum => "sum",
            Method::Min => "min",
            Method::Max => "max",
        }
    }

    /// Whether the method mutates its target.
    pub const fn is_mutating(self) -> bool {
        matches!(self, Method::MapPut | Method::ListAdd)
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    /// Short-circuit AND over primitive booleans.
    AndAlso,
    /// Short-circuit OR over primitive booleans.
    OrElse,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }

    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide
        )
    }
}

/// A target expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Constant {
        value: Constant,
        repr: Repr,
    },
    /// A variable declared earlier in the block.
    Variable {
        name: String,
        repr: Repr,
    },
    /// A value bound by the caller of the block.
    Parameter {
        name: String,
        repr: Repr,
    },
    /// Positional field access on a row value.
    Field {
        target: Box<Expression>,
        index: usize,
        repr: Repr,
    },
    /// Direct representation cast.
    Convert {
        operand: Box<Expression>,
        to: Repr,
    },
    /// Wrap a primitive in its nullable box.
    BoxPrimitive {
        operand: Box<Expression>,
        kind: PrimitiveKind,
    },
    /// Extract the primitive from a box. Null is a runtime error.
    Unbox {
        operand: Box<Expression>,
        kind: PrimitiveKind,
    },
    /// Construct a new decimal, list or map.
    New {
        class: Repr,
        args: Vec<Expression>,
    },
    Call {
        builtin: Builtin,
        args: Vec<Expression>,
        repr: Repr,
    },
    MethodCall {
        target: Box<Expression>,
        method: Method,
        args: Vec<Expression>,
        repr: Repr,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        repr: Repr,
    },
    Not(Box<Expression>),
    /// `test ? if_true : if_false`.
    Condition {
        test: Box<Expression>,
        if_true: Box<Expression>,
        if_false: Box<Expression>,
        repr: Repr,
    },
    /// `{ statements; result }`: a nested block run where the expression is
    /// evaluated. Its declarations are not visible outside it.
    Scope {
        statements: Vec<Statement>,
        result: Box<Expression>,
    },
}

impl Expression {
    /// The `true` constant.
    pub const TRUE: Expression = Expression::Constant {
        value: Constant::Bool(true),
        repr: Repr::BOOL,
    };

    /// The `false` constant.
    pub const FALSE: Expression = Expression::Constant {
        value: Constant::Bool(false),
        repr: Repr::BOOL,
    };

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn constant(value: Constant, repr: Repr) -> Self {
        Expression::Constant { value, repr }
    }

    /// A null constant of the given representation.
    pub fn typed_null(repr: Repr) -> Self {
        Expression::Constant {
            value: Constant::Null,
            repr,
        }
    }

    pub fn bool(value: bool) -> Self {
        if value { Self::TRUE } else { Self::FALSE }
    }

    pub fn int32(value: i32) -> Self {
        Self::constant(
            Constant::Int32(value),
            Repr::Primitive(PrimitiveKind::Int32),
        )
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::constant(Constant::String(value.into()), Repr::String)
    }

    pub fn variable(name: impl Into<String>, repr: Repr) -> Self {
        Expression::Variable {
            name: name.into(),
            repr,
        }
    }

    pub fn parameter(name: impl Into<String>, repr: Repr) -> Self {
        Expression::Parameter {
            name: name.into(),
            repr,
        }
    }

    pub fn field(target: Expression, index: usize, repr: Repr) -> Self {
        Expression::Field {
            target: Box::new(target),
            index,
            repr,
        }
    }

    /// A direct cast. See [`crate::conversion`] for representation-aware
    /// conversion.
    pub fn convert(operand: Expression, to: Repr) -> Self {
        Expression::Convert {
            operand: Box::new(operand),
            to,
        }
    }

    pub fn box_primitive(operand: Expression, kind: PrimitiveKind) -> Self {
        Expression::BoxPrimitive {
            operand: Box::new(operand),
            kind,
        }
    }

    pub fn unbox(operand: Expression, kind: PrimitiveKind) -> Self {
        Expression::Unbox {
            operand: Box::new(operand),
            kind,
        }
    }

    pub fn new_instance(class: Repr, args: Vec<Expression>) -> Self {
        Expression::New { class, args }
    }

    pub fn call(builtin: Builtin, args: Vec<Expression>) -> Self {
        Expression::Call {
            builtin,
            args,
            repr: builtin.result_repr(),
        }
    }

    pub fn method_call(target: Expression, method: Method, args: Vec<Expression>, repr: Repr) -> Self {
        Expression::MethodCall {
            target: Box::new(target),
            method,
            args,
            repr,
        }
    }

    /// A binary expression. Comparisons and connectives produce `bool`;
    /// arithmetic takes the left operand's representation.
    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        let repr = if op.is_comparison() || op.is_logical() {
            Repr::BOOL
        } else {
            left.repr()
        };
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            repr,
        }
    }

    pub fn equal(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::Equal, left, right)
    }

    pub fn not_equal(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::NotEqual, left, right)
    }

    /// `x == null`; `false` when `x` can never be null.
    pub fn is_null(operand: Expression) -> Self {
        if operand.is_never_null() {
            return Self::FALSE;
        }
        let null = Self::typed_null(operand.repr());
        Self::equal(operand, null)
    }

    /// `x != null`; `true` when `x` can never be null.
    pub fn is_not_null(operand: Expression) -> Self {
        if operand.is_never_null() {
            return Self::TRUE;
        }
        let null = Self::typed_null(operand.repr());
        Self::not_equal(operand, null)
    }

    pub fn not(operand: Expression) -> Self {
        match operand {
            Expression::Constant {
                value: Constant::Bool(b),
                ..
            } => Self::bool(!b),
            Expression::Not(inner) => *inner,
            other => Expression::Not(Box::new(other)),
        }
    }

    pub fn and_also(left: Expression, right: Expression) -> Self {
        Self::and_all([left, right])
    }

    pub fn or_else(left: Expression, right: Expression) -> Self {
        Self::or_all([left, right])
    }

    /// Short-circuit conjunction. `true` operands are dropped; a `false`
    /// operand makes the whole conjunction `false`; no operands is `true`.
    pub fn and_all(operands: impl IntoIterator<Item = Expression>) -> Self {
        Self::fold_connective(BinaryOp::AndAlso, true, operands)
    }

    /// Short-circuit disjunction, folded like [`Expression::and_all`].
    pub fn or_all(operands: impl IntoIterator<Item = Expression>) -> Self {
        Self::fold_connective(BinaryOp::OrElse, false, operands)
    }

    fn fold_connective(
        op: BinaryOp,
        identity: bool,
        operands: impl IntoIterator<Item = Expression>,
    ) -> Self {
        let mut result: Option<Expression> = None;
        for operand in operands {
            match operand.as_bool() {
                Some(b) if b == identity => continue,
                Some(_) => return Self::bool(!identity),
                None => {}
            }
            result = Some(match result {
                None => operand,
                Some(acc) => Expression::Binary {
                    op,
                    left: Box::new(acc),
                    right: Box::new(operand),
                    repr: Repr::BOOL,
                },
            });
        }
        result.unwrap_or_else(|| Self::bool(identity))
    }

    /// A nested block. With no statements this is just `result`.
    pub fn scope(statements: Vec<Statement>, result: Expression) -> Self {
        if statements.is_empty() {
            return result;
        }
        Expression::Scope {
            statements,
            result: Box::new(result),
        }
    }

    /// Apply `f` to the value this expression produces: inside a scope
    /// that is its result, otherwise the expression itself.
    pub fn map_result(self, f: impl FnOnce(Expression) -> Expression) -> Self {
        match self {
            Expression::Scope { statements, result } => Expression::Scope {
                statements,
                result: Box::new(f(*result)),
            },
            other => f(other),
        }
    }

    /// A conditional. The representation is that of the non-null branch.
    pub fn condition(test: Expression, if_true: Expression, if_false: Expression) -> Self {
        if let Some(b) = test.as_bool() {
            return if b { if_true } else { if_false };
        }
        let repr = if if_true.is_null_constant() {
            if_false.repr()
        } else {
            if_true.repr()
        };
        Expression::Condition {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
            repr,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The representation of the value this expression produces.
    pub fn repr(&self) -> Repr {
        match self {
            Expression::Constant { repr, .. }
            | Expression::Variable { repr, .. }
            | Expression::Parameter { repr, .. }
            | Expression::Field { repr, .. }
            | Expression::Call { repr, .. }
            | Expression::MethodCall { repr, .. }
            | Expression::Binary { repr, .. }
            | Expression::Condition { repr, .. } => *repr,
            Expression::Convert { to, .. } => *to,
            Expression::BoxPrimitive { kind, .. } => Repr::Boxed(*kind),
            Expression::Unbox { kind, .. } => Repr::Primitive(*kind),
            Expression::New { class, .. } => *class,
            Expression::Not(_) => Repr::BOOL,
            Expression::Scope { result, .. } => result.repr(),
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Constant { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The value of a boolean constant.
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_constant() {
            Some(Constant::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null_constant(&self) -> bool {
        self.as_constant().is_some_and(Constant::is_null)
    }

    /// Constants, variables and parameters. These are never bound to a
    /// fresh variable.
    pub fn is_trivial(&self) -> bool {
        matches!(
            self,
            Expression::Constant { .. } | Expression::Variable { .. } | Expression::Parameter { .. }
        )
    }

    /// Whether the expression statically cannot produce null.
    pub fn is_never_null(&self) -> bool {
        match self {
            Expression::Constant { value, .. } => !value.is_null(),
            Expression::New { .. } | Expression::BoxPrimitive { .. } => true,
            // Library functions only return null for a null argument, except
            // the three-valued connectives. Truth tests map null to a bool.
            Expression::Call { builtin, args, .. } => match builtin {
                Builtin::IsTrue | Builtin::IsNotFalse => true,
                Builtin::And3 | Builtin::Or3 => false,
                _ => args.iter().all(Expression::is_never_null),
            },
            Expression::Condition {
                if_true, if_false, ..
            } => if_true.is_never_null() && if_false.is_never_null(),
            Expression::Scope { result, .. } => result.is_never_null(),
            other => other.repr().is_primitive(),
        }
    }

    /// Whether two evaluations of this expression are interchangeable.
    ///
    /// Collection construction yields a distinct value each time and
    /// mutating methods have effects, so neither may be shared.
    pub fn is_reusable(&self) -> bool {
        match self {
            Expression::New {
                class: Repr::List | Repr::Map,
                ..
            } => false,
            Expression::MethodCall { method, .. } if method.is_mutating() => false,
            other => other.children().into_iter().all(Expression::is_reusable),
        }
    }

    /// Direct sub-expressions, in evaluation order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Constant { .. }
            | Expression::Variable { .. }
            | Expression::Parameter { .. } => Vec::new(),
            Expression::Field { target, .. } => vec![target.as_ref()],
            Expression::Convert { operand, .. }
            | Expression::BoxPrimitive { operand, .. }
            | Expression::Unbox { operand, .. }
            | Expression::Not(operand) => vec![operand.as_ref()],
            Expression::New { args, .. } | Expression::Call { args, .. } => args.iter().collect(),
            Expression::MethodCall { target, args, .. } => {
                std::iter::once(target.as_ref()).chain(args).collect()
            }
            Expression::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expression::Condition {
                test,
                if_true,
                if_false,
                ..
            } => vec![test.as_ref(), if_true.as_ref(), if_false.as_ref()],
            Expression::Scope { statements, result } => statements
                .iter()
                .map(Statement::value)
                .chain(std::iter::once(result.as_ref()))
                .collect(),
        }
    }
}

/// A statement in an emitted block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// Bind `value` to a fresh, immutable variable.
    Declare { name: String, value: Expression },
    /// Evaluate for effect.
    Expr(Expression),
}

impl Statement {
    /// The expression the statement evaluates.
    pub fn value(&self) -> &Expression {
        match self {
            Statement::Declare { value, .. } | Statement::Expr(value) => value,
        }
    }
}

/// A finished block: statements followed by a result expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub result: Expression,
}

impl Block {
    /// Names of the variables the block declares, in order.
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Declare { name, .. } => Some(name.as_str()),
            Statement::Expr(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed_int(name: &str) -> Expression {
        Expression::variable(name, Repr::Boxed(PrimitiveKind::Int32))
    }

    #[test]
    fn connectives_fold_constants() {
        let x = Expression::variable("x", Repr::BOOL);
        assert_eq!(Expression::and_all([]), Expression::TRUE);
        assert_eq!(Expression::or_all([]), Expression::FALSE);
        assert_eq!(Expression::and_also(Expression::TRUE, x.clone()), x);
        assert_eq!(
            Expression::and_also(x.clone(), Expression::FALSE),
            Expression::FALSE
        );
        assert_eq!(Expression::or_else(x.clone(), Expression::TRUE), Expression::TRUE);
    }

    #[test]
    fn not_folds() {
        let x = Expression::variable("x", Repr::BOOL);
        assert_eq!(Expression::not(Expression::not(x.clone())), x);
        assert_eq!(Expression::not(Expression::TRUE), Expression::FALSE);
    }

    #[test]
    fn null_checks_on_primitives_fold() {
        let p = Expression::variable("p", Repr::Primitive(PrimitiveKind::Int32));
        assert_eq!(Expression::is_null(p.clone()), Expression::FALSE);
        assert_eq!(Expression::is_not_null(p), Expression::TRUE);

        let b = boxed_int("b");
        assert!(matches!(
            Expression::is_null(b),
            Expression::Binary {
                op: BinaryOp::Equal,
                ..
            }
        ));
    }

    #[test]
    fn condition_takes_non_null_branch_repr() {
        let test = Expression::variable("t", Repr::BOOL);
        let value = Expression::box_primitive(
            Expression::int32(1),
            PrimitiveKind::Int32,
        );
        let cond = Expression::condition(
            test,
            Expression::typed_null(Repr::Boxed(PrimitiveKind::Int32)),
            value,
        );
        assert_eq!(cond.repr(), Repr::Boxed(PrimitiveKind::Int32));
    }

    #[test]
    fn collection_construction_is_not_reusable() {
        let list = Expression::new_instance(Repr::List, vec![]);
        assert!(!list.is_reusable());
        let put = Expression::method_call(
            Expression::variable("m", Repr::Map),
            Method::MapPut,
            vec![Expression::int32(1), Expression::int32(2)],
            Repr::Object,
        );
        assert!(!put.is_reusable());
        let wrapped = Expression::is_null(put);
        assert!(!wrapped.is_reusable());

        let sum = Expression::binary(BinaryOp::Add, boxed_int("a"), boxed_int("b"));
        assert!(sum.is_reusable());
    }

    #[test]
    fn truth_tests_are_never_null() {
        let flag = Expression::variable("f", Repr::Boxed(PrimitiveKind::Bool));
        let is_true = Expression::call(Builtin::IsTrue, vec![flag.clone()]);
        assert!(is_true.is_never_null());
        assert_eq!(Expression::is_null(is_true), Expression::FALSE);
        assert!(!Expression::call(Builtin::And3, vec![flag.clone(), flag]).is_never_null());
    }

    #[test]
    fn map_result_reaches_inside_a_scope() {
        let one = Expression::variable("one", Repr::Primitive(PrimitiveKind::Int32));
        let scope = Expression::scope(
            vec![Statement::Declare {
                name: "one".into(),
                value: Expression::int32(1),
            }],
            one.clone(),
        );
        let boxed = scope.map_result(|v| Expression::box_primitive(v, PrimitiveKind::Int32));
        assert_eq!(boxed.repr(), Repr::Boxed(PrimitiveKind::Int32));
        assert!(boxed.is_never_null());
        match boxed {
            Expression::Scope { statements, result } => {
                assert_eq!(statements.len(), 1);
                assert_eq!(*result, Expression::box_primitive(one, PrimitiveKind::Int32));
            }
            other => panic!("expected a scope, got {other}"),
        }
    }

    #[test]
    fn arithmetic_takes_left_repr() {
        let sum = Expression::binary(BinaryOp::Add, Expression::int32(1), Expression::int32(2));
        assert_eq!(sum.repr(), Repr::Primitive(PrimitiveKind::Int32));
        let cmp = Expression::binary(BinaryOp::LessThan, Expression::int32(1), Expression::int32(2));
        assert_eq!(cmp.repr(), Repr::BOOL);
    }
}
