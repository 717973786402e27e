use super::*;
use minic_parser::ast::{BinaryOp, Builtin, Expr, ExprKind, UnaryOp};

/// Generate a comparison producing `1` or `0`.
macro_rules! gen_comparison {
    ($a: expr, $op: tt, $b: expr) => {
        $crate::value::Value::Int(($a $op $b) as i64)
    };
}

fn int_binary_op(op: BinaryOp, a: i64, b: i64, pos: Position) -> Result<Value, RuntimeError> {
    Ok(match op {
        BinaryOp::Add => Value::Int(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => {
            return Err(RuntimeError::DivisionByZero { pos })
        }
        // truncates toward zero
        BinaryOp::Div => Value::Int(a.wrapping_div(b)),
        BinaryOp::Rem => Value::Int(a.wrapping_rem(b)),
        BinaryOp::Eq => gen_comparison!(a, ==, b),
        BinaryOp::Ne => gen_comparison!(a, !=, b),
        BinaryOp::Lt => gen_comparison!(a, <, b),
        BinaryOp::Le => gen_comparison!(a, <=, b),
        BinaryOp::Gt => gen_comparison!(a, >, b),
        BinaryOp::Ge => gen_comparison!(a, >=, b),
        BinaryOp::And => gen_comparison!(a != 0, &&, b != 0),
        BinaryOp::Or => gen_comparison!(a != 0, ||, b != 0),
    })
}

fn float_binary_op(op: BinaryOp, a: f64, b: f64, pos: Position) -> Result<Value, RuntimeError> {
    Ok(match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div if b == 0.0 => return Err(RuntimeError::DivisionByZero { pos }),
        BinaryOp::Div => Value::Float(a / b),
        BinaryOp::Rem => {
            return Err(RuntimeError::TypeMismatch {
                message: "operands of `%` must be `int`".to_string(),
                pos,
            })
        }
        BinaryOp::Eq => gen_comparison!(a, ==, b),
        BinaryOp::Ne => gen_comparison!(a, !=, b),
        BinaryOp::Lt => gen_comparison!(a, <, b),
        BinaryOp::Le => gen_comparison!(a, <=, b),
        BinaryOp::Gt => gen_comparison!(a, >, b),
        BinaryOp::Ge => gen_comparison!(a, >=, b),
        BinaryOp::And => gen_comparison!(a != 0.0, &&, b != 0.0),
        BinaryOp::Or => gen_comparison!(a != 0.0, ||, b != 0.0),
    })
}

/// Applies a strict binary operator. Mixed `int`/`float` operands are promoted to `float`.
fn binary_op(op: BinaryOp, lhs: Value, rhs: Value, pos: Position) -> Result<Value, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        return int_binary_op(op, *a, *b, pos);
    }
    match (lhs.cast_to_number(), rhs.cast_to_number()) {
        (Some(a), Some(b)) => float_binary_op(op, a, b, pos),
        _ => Err(RuntimeError::TypeMismatch {
            message: format!(
                "operands of `{}` must be numbers, found `{}` and `{}`",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            ),
            pos,
        }),
    }
}

impl<'a, 'io> Interpreter<'a, 'io> {
    /// Evaluates an expression that must produce a value.
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        grow_stack(|| match &expr.kind {
            ExprKind::IntLit(val) => Ok(Value::Int(*val)),
            ExprKind::FloatLit(val) => Ok(Value::Float(*val)),
            ExprKind::StringLit(val) => Ok(Value::Str(val.clone())),
            ExprKind::Identifier(ident) => Ok(self.lookup(ident, expr.pos)?.value.clone()),
            ExprKind::Binary { lhs, op, rhs } => self.eval_binary_expr(lhs, *op, rhs, expr.pos),
            ExprKind::Unary { op, arg } => self.eval_unary_expr(*op, arg, expr.pos),
            ExprKind::FnCall { ident, args } => {
                self.eval_call(ident, args, expr.pos)?
                    .ok_or_else(|| RuntimeError::TypeMismatch {
                        message: format!("`{}` does not return a value", ident),
                        pos: expr.pos,
                    })
            }
        })
    }

    /// Evaluates an expression statement. Calls may produce no value here.
    pub(crate) fn eval_expr_stmt(&mut self, expr: &Expr) -> Result<(), RuntimeError> {
        match &expr.kind {
            ExprKind::FnCall { ident, args } => self.eval_call(ident, args, expr.pos).map(|_| ()),
            _ => self.eval_expr(expr).map(|_| ()),
        }
    }

    /// Evaluates a condition of `if`, `while`, `!`, `&&` or `||`.
    pub(crate) fn eval_condition(&mut self, expr: &Expr) -> Result<bool, RuntimeError> {
        let value = self.eval_expr(expr)?;
        value.is_truthy().ok_or_else(|| RuntimeError::TypeMismatch {
            message: format!("expected a number as condition, found `{}`", value.type_name()),
            pos: expr.pos,
        })
    }

    fn eval_binary_expr(
        &mut self,
        lhs: &Expr,
        op: BinaryOp,
        rhs: &Expr,
        pos: Position,
    ) -> Result<Value, RuntimeError> {
        match op {
            // short-circuit
            BinaryOp::And => {
                let result = self.eval_condition(lhs)? && self.eval_condition(rhs)?;
                Ok(Value::Int(result as i64))
            }
            BinaryOp::Or => {
                let result = self.eval_condition(lhs)? || self.eval_condition(rhs)?;
                Ok(Value::Int(result as i64))
            }
            _ => {
                let lhs = self.eval_expr(lhs)?;
                let rhs = self.eval_expr(rhs)?;
                binary_op(op, lhs, rhs, pos)
            }
        }
    }

    fn eval_unary_expr(
        &mut self,
        op: UnaryOp,
        arg: &Expr,
        pos: Position,
    ) -> Result<Value, RuntimeError> {
        match op {
            UnaryOp::Not => Ok(Value::Int(!self.eval_condition(arg)? as i64)),
            UnaryOp::Neg => match self.eval_expr(arg)? {
                Value::Int(val) => Ok(Value::Int(val.wrapping_neg())),
                Value::Float(val) => Ok(Value::Float(-val)),
                val => Err(RuntimeError::TypeMismatch {
                    message: format!(
                        "operand of `-` must be a number, found `{}`",
                        val.type_name()
                    ),
                    pos,
                }),
            },
        }
    }

    /// Calls a built-in or user function.
    /// The arity is checked before any argument is evaluated.
    pub(crate) fn eval_call(
        &mut self,
        ident: &str,
        args: &[Expr],
        pos: Position,
    ) -> Result<Option<Value>, RuntimeError> {
        if let Some(builtin) = Builtin::from_ident(ident) {
            return self.call_builtin(builtin, args, pos);
        }

        let program = self.program;
        let func = program
            .function(ident)
            .ok_or_else(|| RuntimeError::UndefinedFunction {
                ident: ident.to_string(),
                pos,
            })?;
        if args.len() != func.params.len() {
            return Err(RuntimeError::Arity {
                ident: ident.to_string(),
                expected: func.params.len(),
                found: args.len(),
                pos,
            });
        }

        let args = args
            .iter()
            .map(|arg| self.eval_expr(arg))
            .collect::<Result<Vec<_>, _>>()?;
        self.call_function(func, args, pos)
    }
}
