//! Expression values and their evaluation against widget state
//!
//! Evaluation never fails: undefined names, division by zero and type
//! mismatches are logged and replaced by a default value.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Scalar result of evaluating an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Integer view of the value; non-numeric strings become 0
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Bool(b) => i64::from(*b),
            Self::Int(i) => *i,
            Self::Float(f) => *f as i64,
            Self::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => i,
                Err(_) => {
                    warn!(value = %s, "Expected a number, using 0");
                    0
                }
            },
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// Expression appearing in a condition or a numeric argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expr {
    Literal(Value),
    Var {
        var: String,
    },
    Not {
        not: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Self::Literal(Value::Int(value))
    }

    pub fn zero() -> Self {
        Self::int(0)
    }

    pub fn one() -> Self {
        Self::int(1)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Var { var: name.into() }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn not(expr: Expr) -> Self {
        Self::Not {
            not: Box::new(expr),
        }
    }

    /// Integer value when the expression is a plain literal
    pub fn literal_i64(&self) -> Option<i64> {
        match self {
            Self::Literal(value) => Some(value.as_i64()),
            _ => None,
        }
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::int(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Self::int(i64::from(value))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Literal(Value::Bool(value))
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Literal(Value::Str(value.to_string()))
    }
}

/// External provider of named values (datasets, user variables)
pub trait VariableSource: fmt::Debug + Send + Sync {
    fn lookup(&self, name: &str) -> Option<Value>;
}

/// Variable environment for one program run
#[derive(Debug, Clone, Default)]
pub struct Variables {
    pub widget_x: i32,
    pub widget_y: i32,
    pub widget_width: i32,
    pub widget_height: i32,
    pub container_width: i32,
    pub container_height: i32,
    pub constants: BTreeMap<String, Value>,
    pub source: Option<Arc<dyn VariableSource>>,
}

impl Variables {
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let builtin = match name {
            "widget.x" => Some(self.widget_x),
            "widget.y" => Some(self.widget_y),
            "widget.width" => Some(self.widget_width),
            "widget.height" => Some(self.widget_height),
            "container.width" => Some(self.container_width),
            "container.height" => Some(self.container_height),
            _ => None,
        };
        if let Some(value) = builtin {
            return Some(Value::Int(i64::from(value)));
        }
        if let Some(value) = self.constants.get(name) {
            return Some(value.clone());
        }
        self.source.as_ref().and_then(|source| source.lookup(name))
    }

    pub fn eval(&self, expr: &Expr) -> Value {
        match expr {
            Expr::Literal(value) => value.clone(),
            Expr::Var { var } => self.lookup(var).unwrap_or_else(|| {
                warn!(name = %var, "Undefined variable, using 0");
                Value::Int(0)
            }),
            Expr::Not { not } => Value::Bool(!self.eval(not).truthy()),
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::And => Value::Bool(self.eval(lhs).truthy() && self.eval(rhs).truthy()),
                BinaryOp::Or => Value::Bool(self.eval(lhs).truthy() || self.eval(rhs).truthy()),
                _ => apply(*op, self.eval(lhs), self.eval(rhs)),
            },
        }
    }

    pub fn eval_i64(&self, expr: &Expr) -> i64 {
        self.eval(expr).as_i64()
    }

    /// Evaluate to a pixel/tick count clamped into `i32`
    pub fn eval_i32(&self, expr: &Expr) -> i32 {
        self.eval_i64(expr).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    pub fn eval_bool(&self, expr: &Expr) -> bool {
        self.eval(expr).truthy()
    }
}

fn apply(op: BinaryOp, lhs: Value, rhs: Value) -> Value {
    use BinaryOp::*;

    match op {
        Eq => Value::Bool(values_equal(&lhs, &rhs)),
        Ne => Value::Bool(!values_equal(&lhs, &rhs)),
        Lt | Le | Gt | Ge => Value::Bool(compare(op, &lhs, &rhs)),
        Add | Sub | Mul | Div | Rem => arithmetic(op, lhs, rhs),
        And | Or => unreachable!("logical operators short-circuit in Variables::eval"),
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> bool {
    let ordering = match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };

    let Some(ordering) = ordering else {
        warn!(lhs = %lhs, rhs = %rhs, op = op.as_str(), "Cannot compare values, using false");
        return false;
    };

    match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => false,
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Value {
    if let (Value::Str(a), Value::Str(b), BinaryOp::Add) = (&lhs, &rhs, op) {
        return Value::Str(format!("{}{}", a, b));
    }

    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div | BinaryOp::Rem if b == 0 => {
                    warn!(op = op.as_str(), lhs = a, "Division by zero, using 0");
                    return Value::Int(0);
                }
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Rem => a.checked_rem(b),
                _ => None,
            };
            result.map(Value::Int).unwrap_or_else(|| {
                warn!(op = op.as_str(), lhs = a, rhs = b, "Integer overflow, using 0");
                Value::Int(0)
            })
        }
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => {
                if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0.0 {
                    warn!(op = op.as_str(), lhs = a, "Division by zero, using 0");
                    return Value::Int(0);
                }
                let result = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                };
                Value::Float(result)
            }
            _ => {
                warn!(lhs = %lhs, rhs = %rhs, op = op.as_str(), "Type mismatch, using 0");
                Value::Int(0)
            }
        },
    }
}
