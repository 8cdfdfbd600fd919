//! Expression evaluation.

use std::cmp::Ordering;

use gable_escape::SafeString;

use crate::ast::{BinOp, Expr, Test};
use crate::error::ErrorKind;
use crate::render::State;
use crate::value::{Map, Value};

impl State<'_> {
    pub(crate) fn eval(&self, expr: &Expr) -> Result<Value, ErrorKind> {
        match expr {
            Expr::Const(value) => Ok(value.clone()),
            Expr::Var(name) => self.lookup(name),
            Expr::Attr { base, name } => self.eval(base)?.get_attr(name),
            Expr::Item { base, key } => {
                let base = self.eval(base)?;
                base.get_item(&self.eval(key)?)
            }
            Expr::Call { name, args } => {
                let function = self
                    .engine
                    .functions()
                    .function(name)
                    .ok_or_else(|| ErrorKind::UnknownFunction(name.clone()))?;
                function.call(&self.eval_all(args)?)
            }
            Expr::Filter { name, input, args } => {
                let filter = self
                    .engine
                    .functions()
                    .filter(name)
                    .ok_or_else(|| ErrorKind::UnknownFilter(name.clone()))?;
                filter.apply(&self.eval(input)?, &self.eval_all(args)?)
            }
            Expr::Escape { input, strategy } => self.escape(self.eval(input)?, strategy),
            Expr::Not(inner) => Ok(Value::Bool(!self.eval(inner)?.is_truthy())),
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Is { input, test } => self.test(input, *test).map(Value::Bool),
            Expr::List(items) => Ok(Value::from(self.eval_all(items)?)),
            Expr::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value)?);
                }
                Ok(Value::from(map))
            }
        }
    }

    fn eval_all(&self, exprs: &[Expr]) -> Result<Vec<Value>, ErrorKind> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    fn lookup(&self, name: &str) -> Result<Value, ErrorKind> {
        match self.scope.lookup(name, &self.loops) {
            Some(value) => Ok(value),
            None if self.engine.config().strict_variables => Err(ErrorKind::UndefinedVariable {
                name: name.to_string(),
            }),
            None => Ok(Value::Undefined),
        }
    }

    /// Explicit escape. Numbers and booleans pass through, null becomes an
    /// empty string, everything else is escaped into a safe string.
    fn escape(&self, value: Value, strategy: &str) -> Result<Value, ErrorKind> {
        match value {
            Value::Undefined | Value::Null => Ok(Value::Safe(SafeString::new(strategy, ""))),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => Ok(value),
            other => {
                let safe = self.engine.escapers().apply(&other.to_markup(), strategy)?;
                Ok(Value::Safe(safe))
            }
        }
    }

    fn binary(&self, op: BinOp, left: &Expr, right: &Expr) -> Result<Value, ErrorKind> {
        let lhs = self.eval(left)?;
        let value = match op {
            BinOp::And => Value::Bool(lhs.is_truthy() && self.eval(right)?.is_truthy()),
            BinOp::Or => Value::Bool(lhs.is_truthy() || self.eval(right)?.is_truthy()),
            BinOp::Eq => Value::Bool(lhs == self.eval(right)?),
            BinOp::Ne => Value::Bool(lhs != self.eval(right)?),
            BinOp::Lt => Value::Bool(self.ordering(&lhs, right)?.is_some_and(Ordering::is_lt)),
            BinOp::Le => Value::Bool(self.ordering(&lhs, right)?.is_some_and(Ordering::is_le)),
            BinOp::Gt => Value::Bool(self.ordering(&lhs, right)?.is_some_and(Ordering::is_gt)),
            BinOp::Ge => Value::Bool(self.ordering(&lhs, right)?.is_some_and(Ordering::is_ge)),
            BinOp::Concat => Value::from(format!("{}{}", lhs, self.eval(right)?)),
            BinOp::In => Value::Bool(self.eval(right)?.contains(&lhs)),
        };
        Ok(value)
    }

    fn ordering(&self, lhs: &Value, right: &Expr) -> Result<Option<Ordering>, ErrorKind> {
        Ok(lhs.compare(&self.eval(right)?))
    }

    fn test(&self, input: &Expr, test: Test) -> Result<bool, ErrorKind> {
        if test == Test::Defined {
            return match self.eval(input) {
                Ok(value) => Ok(!value.is_undefined()),
                Err(ErrorKind::AttributeError { .. } | ErrorKind::UndefinedVariable { .. }) => {
                    Ok(false)
                }
                Err(err) => Err(err),
            };
        }
        let value = self.eval(input)?;
        Ok(match test {
            Test::Defined => !value.is_undefined(),
            Test::Empty => value.is_empty(),
            Test::Null => value.is_none(),
            Test::Iterable => value.is_iterable(),
        })
    }
}
