//! The where-condition language.
//!
//! An [`Expression`] is a literal, a variable, or a call to one of a fixed
//! set of [`Builtin`] functions. Expressions are type-checked as they are
//! built, so evaluation only has to deal with missing variables and
//! arithmetic that has no answer (division by zero). Both evaluate to
//! *indeterminate* (`None`), which callers treat as "no match".
//!
//! ```text
//! and(
//!   greaterThan(host.n_free_mem, 1024),
//!   equal(s_gpu_vendor, gpu.s_vendor)
//! )
//! ```

use std::fmt;

use bigdecimal::Zero;

use crate::error::ExpressionError;
use crate::kind::ResourceKind;
use crate::property::{PropertyValue, Scope, ValueType};

/// Builtin functions callable from an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Not,
    Add,
    Sub,
    Multiply,
    Divide,
    GreaterThan,
    LessThan,
    Equal,
    And,
    Or,
}

impl Builtin {
    pub const ALL: [Builtin; 10] = [
        Builtin::Not,
        Builtin::Add,
        Builtin::Sub,
        Builtin::Multiply,
        Builtin::Divide,
        Builtin::GreaterThan,
        Builtin::LessThan,
        Builtin::Equal,
        Builtin::And,
        Builtin::Or,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Not => "not",
            Builtin::Add => "add",
            Builtin::Sub => "sub",
            Builtin::Multiply => "multiply",
            Builtin::Divide => "divide",
            Builtin::GreaterThan => "greaterThan",
            Builtin::LessThan => "lessThan",
            Builtin::Equal => "equal",
            Builtin::And => "and",
            Builtin::Or => "or",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Result type for the given argument types, `None` if no overload fits.
    pub fn result_type(self, args: &[ValueType]) -> Option<ValueType> {
        use ValueType::{Boolean, Number};
        match (self, args) {
            (Builtin::Not, [Boolean]) => Some(Boolean),
            (Builtin::Add | Builtin::Sub | Builtin::Multiply | Builtin::Divide, [Number, Number]) => {
                Some(Number)
            }
            (Builtin::GreaterThan | Builtin::LessThan, [Number, Number]) => Some(Boolean),
            (Builtin::Equal, [a, b]) if a == b => Some(Boolean),
            (Builtin::And | Builtin::Or, [Boolean, Boolean]) => Some(Boolean),
            _ => None,
        }
    }

    fn apply(self, args: &[PropertyValue]) -> Option<PropertyValue> {
        use PropertyValue::{Boolean, Number};
        let value = match (self, args) {
            (Builtin::Not, [Boolean(a)]) => Boolean(!a),
            (Builtin::Add, [Number(a), Number(b)]) => PropertyValue::number(a + b),
            (Builtin::Sub, [Number(a), Number(b)]) => PropertyValue::number(a - b),
            (Builtin::Multiply, [Number(a), Number(b)]) => PropertyValue::number(a * b),
            (Builtin::Divide, [Number(a), Number(b)]) => {
                if b.is_zero() {
                    return None;
                }
                PropertyValue::number(a / b)
            }
            (Builtin::GreaterThan, [Number(a), Number(b)]) => Boolean(a > b),
            (Builtin::LessThan, [Number(a), Number(b)]) => Boolean(a < b),
            (Builtin::Equal, [a, b]) => Boolean(a == b),
            (Builtin::And, [Boolean(a), Boolean(b)]) => Boolean(*a && *b),
            (Builtin::Or, [Boolean(a), Boolean(b)]) => Boolean(*a || *b),
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed, immutable expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    node: Node,
    value_type: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Literal(PropertyValue),
    Variable(String),
    Call(Builtin, Vec<Expression>),
}

impl Expression {
    pub fn literal(value: impl Into<PropertyValue>) -> Self {
        let value = value.into();
        Expression {
            value_type: value.value_type(),
            node: Node::Literal(value),
        }
    }

    /// The literal `true`, the condition of a requirement that names none.
    pub fn always() -> Self {
        Expression::literal(true)
    }

    /// A variable reference.
    ///
    /// Work tags are referenced bare (`s_gpu_vendor`); specification
    /// properties are qualified with the owning kind (`host.n_free_mem`).
    /// The type comes from the property prefix.
    pub fn variable(name: &str) -> Result<Self, ExpressionError> {
        let property = match name.split_once('.') {
            Some((kind, property)) => {
                if ResourceKind::from_name(kind).is_none() {
                    return Err(ExpressionError::InvalidVariable(name.to_string()));
                }
                property
            }
            None => name,
        };
        let value_type = ValueType::of_name(property)
            .map_err(|_| ExpressionError::InvalidVariable(name.to_string()))?;
        Ok(Expression {
            node: Node::Variable(name.to_string()),
            value_type,
        })
    }

    /// A call to the builtin named `function`.
    pub fn call(function: &str, args: Vec<Expression>) -> Result<Self, ExpressionError> {
        let builtin = Builtin::from_name(function)
            .ok_or_else(|| ExpressionError::UnknownFunction(function.to_string()))?;
        let arg_types: Vec<ValueType> = args.iter().map(Expression::value_type).collect();
        let value_type =
            builtin
                .result_type(&arg_types)
                .ok_or_else(|| ExpressionError::SignatureMismatch {
                    function: function.to_string(),
                    args: arg_types
                        .iter()
                        .map(ValueType::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                })?;
        Ok(Expression {
            node: Node::Call(builtin, args),
            value_type,
        })
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Evaluate against `scope`.
    ///
    /// `Ok(None)` is indeterminate: a variable the scope does not hold, or
    /// arithmetic without an answer. A scope value whose type disagrees with
    /// the variable's prefix is an error.
    pub fn evaluate(&self, scope: &dyn Scope) -> Result<Option<PropertyValue>, ExpressionError> {
        match &self.node {
            Node::Literal(value) => Ok(Some(value.clone())),
            Node::Variable(name) => match scope.lookup(name) {
                Some(value) if value.value_type() != self.value_type => {
                    Err(ExpressionError::VariableType {
                        name: name.clone(),
                        expected: self.value_type,
                        actual: value.value_type(),
                    })
                }
                Some(value) => Ok(Some(value.clone())),
                None => Ok(None),
            },
            Node::Call(builtin, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    match arg.evaluate(scope)? {
                        Some(value) => values.push(value),
                        None => return Ok(None),
                    }
                }
                Ok(builtin.apply(&values))
            }
        }
    }

    /// True only when the expression evaluates to boolean `true`.
    pub fn is_satisfied(&self, scope: &dyn Scope) -> Result<bool, ExpressionError> {
        Ok(matches!(self.evaluate(scope)?, Some(PropertyValue::Boolean(true))))
    }
}

impl Default for Expression {
    fn default() -> Self {
        Expression::always()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Node::Literal(value) => write!(f, "{value}"),
            Node::Variable(name) => f.write_str(name),
            Node::Call(builtin, args) => {
                write!(f, "{builtin}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
