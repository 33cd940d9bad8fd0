//! Row-at-a-time interpreter for lowered blocks.
//!
//! A [`Vm`] runs one [`Block`] against bound parameters, normally a single
//! row bound to `row`.
//!
//! ## Evaluation order
//!
//! - Statements run eagerly, in block order. A declaration evaluates its
//!   value before the next statement runs.
//! - A nested scope runs its own statements each time it is evaluated,
//!   then yields its result. Lowering puts the work a null test guards
//!   inside such a scope.
//! - A conditional evaluates its test and then only the taken branch.
//! - `&&` and `||` short-circuit.

mod runtime;
mod value;

pub use runtime::{format_f32, format_f64, unix_date_to_string};
pub use value::Value;

use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tracing::trace;

use sqlcg_compiler::{BinaryOp, Block, Constant, Expression, Method, RowAccessor, Statement};
use sqlcg_core::{Repr, RuntimeError};

use value::mismatch;

/// Executes one block.
#[derive(Debug, Clone, Copy)]
pub struct Vm<'b> {
    block: &'b Block,
}

impl<'b> Vm<'b> {
    pub fn new(block: &'b Block) -> Self {
        Self { block }
    }

    /// Run the block with `row` bound to the row parameter.
    pub fn run(&self, row: Vec<Value>) -> Result<Value, RuntimeError> {
        self.run_with([(RowAccessor::ROW_PARAMETER, Value::list(row))])
    }

    /// Run the block with the given parameter bindings.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run_with<'p>(
        &self,
        params: impl IntoIterator<Item = (&'p str, Value)>,
    ) -> Result<Value, RuntimeError> {
        let mut frame = Frame::new(params);
        frame.run(&self.block.statements)?;
        frame.eval(&self.block.result)
    }
}

/// Variable and parameter state for one run.
struct Frame<'b> {
    params: FxHashMap<String, Value>,
    values: FxHashMap<&'b str, Value>,
}

impl<'b> Frame<'b> {
    fn new<'p>(params: impl IntoIterator<Item = (&'p str, Value)>) -> Self {
        Self {
            params: params
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            values: FxHashMap::default(),
        }
    }

    /// A frame with the same variables and `name` rebound.
    fn rebind(&self, name: &str, value: Value) -> Frame<'b> {
        let mut params = self.params.clone();
        params.insert(name.to_string(), value);
        Frame {
            params,
            values: self.values.clone(),
        }
    }

    /// Run `statements` in order.
    fn run(&mut self, statements: &'b [Statement]) -> Result<(), RuntimeError> {
        for statement in statements {
            match statement {
                Statement::Declare { name, value } => {
                    let value = self.eval(value)?;
                    trace!(variable = %name, value = %value, "declared");
                    self.values.insert(name.as_str(), value);
                }
                Statement::Expr(expr) => {
                    self.eval(expr)?;
                }
            }
        }
        Ok(())
    }

    fn variable(&self, name: &str) -> Result<Value, RuntimeError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownVariable {
                name: name.to_string(),
            })
    }

    fn eval(&mut self, expr: &'b Expression) -> Result<Value, RuntimeError> {
        match expr {
            Expression::Constant { value, .. } => Ok(constant(value)),
            Expression::Variable { name, .. } => self.variable(name),
            Expression::Parameter { name, .. } => {
                self.params
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UnboundParameter {
                        name: name.clone(),
                    })
            }
            Expression::Field { target, index, .. } => match self.eval(target)? {
                Value::List(values) => {
                    let values = values.borrow();
                    values
                        .get(*index)
                        .cloned()
                        .ok_or(RuntimeError::FieldOutOfRange {
                            index: *index,
                            len: values.len(),
                        })
                }
                other => Err(mismatch("list", &other)),
            },
            Expression::Convert { operand, to } => convert(self.eval(operand)?, *to),
            Expression::BoxPrimitive { operand, .. } => self.eval(operand),
            Expression::Unbox { operand, kind } => self.eval(operand)?.to_kind(*kind),
            Expression::New { class, args } => {
                let args = self.eval_all(args)?;
                new_instance(*class, args)
            }
            Expression::Call { builtin, args, .. } => {
                let args = self.eval_all(args)?;
                runtime::call(*builtin, &args)
            }
            Expression::MethodCall {
                target,
                method,
                args,
                ..
            } => self.method_call(target, *method, args),
            Expression::Binary {
                op: BinaryOp::AndAlso,
                left,
                right,
                ..
            } => Ok(Value::Bool(
                self.eval(left)?.as_bool()? && self.eval(right)?.as_bool()?,
            )),
            Expression::Binary {
                op: BinaryOp::OrElse,
                left,
                right,
                ..
            } => Ok(Value::Bool(
                self.eval(left)?.as_bool()? || self.eval(right)?.as_bool()?,
            )),
            Expression::Binary {
                op, left, right, ..
            } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, left, right)
            }
            Expression::Not(operand) => Ok(Value::Bool(!self.eval(operand)?.as_bool()?)),
            Expression::Condition {
                test,
                if_true,
                if_false,
                ..
            } => {
                if self.eval(test)?.as_bool()? {
                    self.eval(if_true)
                } else {
                    self.eval(if_false)
                }
            }
            Expression::Scope { statements, result } => {
                self.run(statements)?;
                self.eval(result)
            }
        }
    }

    fn eval_all(&mut self, exprs: &'b [Expression]) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn method_call(
        &mut self,
        target: &'b Expression,
        method: Method,
        args: &'b [Expression],
    ) -> Result<Value, RuntimeError> {
        let target = self.eval(target)?;
        match (method, &target) {
            (Method::MapPut, Value::Map(entries)) => {
                let [key, value] = two_args(self.eval_all(args)?)?;
                Ok(entries.borrow_mut().insert(key, value).unwrap_or(Value::Null))
            }
            (Method::ListAdd, Value::List(values)) => {
                let mut args = self.eval_all(args)?;
                let value = args.pop().ok_or_else(|| RuntimeError::TypeMismatch {
                    message: "add expects one argument".to_string(),
                })?;
                values.borrow_mut().push(value);
                Ok(Value::Bool(true))
            }
            (Method::Count, Value::List(rows)) => {
                let count = rows.borrow().len();
                i64::try_from(count)
                    .map(Value::Int64)
                    .map_err(|_| RuntimeError::Overflow {
                        op: "count".to_string(),
                    })
            }
            (Method::Sum | Method::Min | Method::Max, Value::List(rows)) => {
                let accessor = args.first().ok_or_else(|| RuntimeError::TypeMismatch {
                    message: format!("{} expects an accessor", method.name()),
                })?;
                let rows = rows.borrow().clone();
                let mut acc = Value::Null;
                for row in rows {
                    let value = self
                        .rebind(RowAccessor::ROW_PARAMETER, row)
                        .eval(accessor)?;
                    acc = fold(method, acc, value)?;
                }
                Ok(acc)
            }
            (_, other) => Err(RuntimeError::TypeMismatch {
                message: format!("{} is not a method of {}", method.name(), other.type_name()),
            }),
        }
    }
}

fn two_args(args: Vec<Value>) -> Result<[Value; 2], RuntimeError> {
    let found = args.len();
    <[Value; 2]>::try_from(args).map_err(|_| RuntimeError::TypeMismatch {
        message: format!("put expects two arguments, found {found}"),
    })
}

/// One step of SUM, MIN or MAX. Nulls are skipped; an empty or all-null
/// group stays null.
fn fold(method: Method, acc: Value, value: Value) -> Result<Value, RuntimeError> {
    if value.is_null() {
        return Ok(acc);
    }
    if acc.is_null() {
        return Ok(value);
    }
    match method {
        Method::Sum => binary(BinaryOp::Add, acc, value),
        Method::Min => Ok(if compare(&value, &acc)? == Ordering::Less {
            value
        } else {
            acc
        }),
        Method::Max => Ok(if compare(&value, &acc)? == Ordering::Greater {
            value
        } else {
            acc
        }),
        other => Err(RuntimeError::Unsupported {
            message: format!("{} is not an aggregate", other.name()),
        }),
    }
}

fn constant(value: &Constant) -> Value {
    match value {
        Constant::Null => Value::Null,
        Constant::Bool(b) => Value::Bool(*b),
        Constant::Int8(v) => Value::Int8(*v),
        Constant::Int16(v) => Value::Int16(*v),
        Constant::Int32(v) => Value::Int32(*v),
        Constant::Int64(v) => Value::Int64(*v),
        Constant::Float32(v) => Value::Float32(*v),
        Constant::Float64(v) => Value::Float64(*v),
        Constant::String(s) => Value::Str(s.clone()),
    }
}

fn convert(value: Value, to: Repr) -> Result<Value, RuntimeError> {
    match to {
        Repr::Primitive(kind) => value.to_kind(kind),
        Repr::Boxed(_) if value.is_null() => Ok(Value::Null),
        Repr::Boxed(kind) => value.to_kind(kind),
        Repr::Decimal => value.to_decimal(),
        Repr::String => match value {
            Value::Null | Value::Str(_) => Ok(value),
            other => Ok(Value::Str(other.to_string())),
        },
        Repr::Number | Repr::Object | Repr::List | Repr::Map => Ok(value),
    }
}

fn new_instance(class: Repr, mut args: Vec<Value>) -> Result<Value, RuntimeError> {
    match class {
        Repr::List => Ok(Value::list(args)),
        Repr::Map if args.is_empty() => Ok(Value::map(Default::default())),
        Repr::Decimal if args.len() == 1 => args.remove(0).to_decimal(),
        other => Err(RuntimeError::Unsupported {
            message: format!("new {other} with {} arguments", args.len()),
        }),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Equal => Ok(Value::Bool(equals(&left, &right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!equals(&left, &right))),
        BinaryOp::LessThan => Ok(Value::Bool(compare(&left, &right)? == Ordering::Less)),
        BinaryOp::LessThanOrEqual => Ok(Value::Bool(compare(&left, &right)? != Ordering::Greater)),
        BinaryOp::GreaterThan => Ok(Value::Bool(compare(&left, &right)? == Ordering::Greater)),
        BinaryOp::GreaterThanOrEqual => Ok(Value::Bool(compare(&left, &right)? != Ordering::Less)),
        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
            arithmetic(op, left, right)
        }
        BinaryOp::AndAlso => Ok(Value::Bool(left.as_bool()? && right.as_bool()?)),
        BinaryOp::OrElse => Ok(Value::Bool(left.as_bool()? || right.as_bool()?)),
    }
}

/// Reference equality semantics: null equals only null.
fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => left.is_null() && right.is_null(),
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Result<Ordering, RuntimeError> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Float32(a), Value::Float32(b)) => Ok(a.cmp(b)),
        (Value::Float64(a), Value::Float64(b)) => Ok(a.cmp(b)),
        (Value::Decimal(a), Value::Decimal(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) if std::mem::discriminant(left) == std::mem::discriminant(right) => {
                Ok(a.cmp(&b))
            }
            _ => Err(RuntimeError::TypeMismatch {
                message: format!("cannot compare {} with {}", left.type_name(), right.type_name()),
            }),
        },
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    let overflow = || RuntimeError::Overflow {
        op: op.symbol().to_string(),
    };
    match (&left, &right) {
        (Value::Int8(a), Value::Int8(b)) => int_op(op, *a, *b).ok_or_else(overflow)?.map(Value::Int8),
        (Value::Int16(a), Value::Int16(b)) => {
            int_op(op, *a, *b).ok_or_else(overflow)?.map(Value::Int16)
        }
        (Value::Int32(a), Value::Int32(b)) => {
            int_op(op, *a, *b).ok_or_else(overflow)?.map(Value::Int32)
        }
        (Value::Int64(a), Value::Int64(b)) => {
            int_op(op, *a, *b).ok_or_else(overflow)?.map(Value::Int64)
        }
        (Value::Float32(a), Value::Float32(b)) => {
            Ok(Value::Float32(OrderedFloat(float_op(op, a.0, b.0))))
        }
        (Value::Float64(a), Value::Float64(b)) => {
            Ok(Value::Float64(OrderedFloat(float_op(op, a.0, b.0))))
        }
        (Value::Decimal(a), Value::Decimal(b)) => decimal_op(op, *a, *b)
            .ok_or_else(overflow)?
            .map(Value::Decimal),
        _ => Err(RuntimeError::TypeMismatch {
            message: format!(
                "cannot apply {} to {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
        }),
    }
}

/// Checked integer arithmetic. `None` is overflow; the inner error is
/// division by zero.
fn int_op<T>(op: BinaryOp, a: T, b: T) -> Option<Result<T, RuntimeError>>
where
    T: num_like::CheckedInt,
{
    match op {
        BinaryOp::Add => a.add(b).map(Ok),
        BinaryOp::Subtract => a.sub(b).map(Ok),
        BinaryOp::Multiply => a.mul(b).map(Ok),
        BinaryOp::Divide if b.is_zero() => Some(Err(RuntimeError::DivisionByZero)),
        BinaryOp::Divide => a.div(b).map(Ok),
        _ => Some(Err(RuntimeError::Unsupported {
            message: format!("{} is not arithmetic", op.symbol()),
        })),
    }
}

fn float_op<T>(op: BinaryOp, a: T, b: T) -> T
where
    T: std::ops::Add<Output = T>
        + std::ops::Sub<Output = T>
        + std::ops::Mul<Output = T>
        + std::ops::Div<Output = T>,
{
    match op {
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => a / b,
        _ => a + b,
    }
}

fn decimal_op(op: BinaryOp, a: Decimal, b: Decimal) -> Option<Result<Decimal, RuntimeError>> {
    match op {
        BinaryOp::Add => a.checked_add(b).map(Ok),
        BinaryOp::Subtract => a.checked_sub(b).map(Ok),
        BinaryOp::Multiply => a.checked_mul(b).map(Ok),
        BinaryOp::Divide if b.is_zero() => Some(Err(RuntimeError::DivisionByZero)),
        BinaryOp::Divide => a.checked_div(b).map(Ok),
        _ => Some(Err(RuntimeError::Unsupported {
            message: format!("{} is not arithmetic", op.symbol()),
        })),
    }
}

mod num_like {
    /// The checked operations shared by the integer kinds.
    pub trait CheckedInt: Copy {
        fn add(self, other: Self) -> Option<Self>;
        fn sub(self, other: Self) -> Option<Self>;
        fn mul(self, other: Self) -> Option<Self>;
        fn div(self, other: Self) -> Option<Self>;
        fn is_zero(self) -> bool;
    }

    macro_rules! checked_int {
        ($($t:ty),*) => {$(
            impl CheckedInt for $t {
                fn add(self, other: Self) -> Option<Self> { self.checked_add(other) }
                fn sub(self, other: Self) -> Option<Self> { self.checked_sub(other) }
                fn mul(self, other: Self) -> Option<Self> { self.checked_mul(other) }
                fn div(self, other: Self) -> Option<Self> { self.checked_div(other) }
                fn is_zero(self) -> bool { self == 0 }
            }
        )*};
    }

    checked_int!(i8, i16, i32, i64);
}
