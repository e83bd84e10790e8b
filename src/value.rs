use std::{cmp::Ordering, collections::HashMap, fmt};

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

/// A runtime value flowing through filters and extractors.
///
/// Cache entries, literals and bind variables are all represented as `Value`s.
/// Integer, floating point and big-decimal numbers stay distinct so literal
/// types survive compilation.
///
/// # Examples
///
/// ```
/// use cohql::Value;
/// use std::collections::HashMap;
///
/// let age = Value::Integer(42);
/// let price = Value::Float(3.5);
///
/// let mut obj = HashMap::new();
/// obj.insert("age".to_string(), age);
/// obj.insert("price".to_string(), price);
/// let record = Value::Object(obj);
/// assert_eq!(record.type_name(), "object");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    Boolean(bool),

    /// Integer number (short, int and long literals all land here)
    Integer(i64),

    /// Floating-point number (float and double literals)
    Float(f64),

    /// Exact decimal number (big-decimal literals and `bd_*` aggregates)
    Decimal(Decimal),

    String(String),

    /// Ordered list; set literals are de-duplicated lists
    Array(Vec<Value>),

    Object(HashMap<String, Value>),
}

/// Arithmetic operators shared by extractors and constant folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        }
    }
}

impl Value {
    /// Human-readable type name, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Check if the value is truthy (for conditions)
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Float(n) => *n != 0.0,
            Integer(n) => *n != 0,
            Decimal(d) => !d.is_zero(),
            String(s) => !s.is_empty(),
            Array(arr) => !arr.is_empty(),
            Object(obj) => !obj.is_empty(),
        }
    }

    /// Convert to boolean for conditions
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            _ => self.is_truthy(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_) | Value::Decimal(_))
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) => Some(n.round() as i64),
            Value::Decimal(d) => d.round().to_i64(),
            _ => None,
        }
    }

    /// Get as exact decimal; NaN and infinities have no decimal form
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(n) => Decimal::from_i64(*n),
            Value::Float(n) => Decimal::from_f64(*n),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as string (concatenation)
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            _ => format!("{}", self),
        }
    }

    /// Equality used by filters: numbers compare by magnitude across types,
    /// everything else structurally.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        if self.is_numeric() && other.is_numeric() {
            return self.compare(other) == Some(Ordering::Equal);
        }
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            _ => self == other,
        }
    }

    /// Ordering used by relational filters. `None` when the two values are not
    /// comparable (including any comparison against null).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Decimal(_), _) | (_, Value::Decimal(_))
                if self.is_numeric() && other.is_numeric() =>
            {
                match (self.as_decimal(), other.as_decimal()) {
                    (Some(a), Some(b)) => Some(a.cmp(&b)),
                    _ => self.as_float()?.partial_cmp(&other.as_float()?),
                }
            }
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Arithmetic that keeps integers integral when the exact result is whole.
    ///
    /// Mixed integer/float operands go through `Decimal` first so that
    /// `0.1 + 0.2`-style artefacts do not leak into results.
    pub fn arithmetic(&self, op: ArithmeticOp, other: &Value) -> Result<Value, String> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_arithmetic(op, *a, *b))),
            (Value::Decimal(a), Value::Decimal(b)) => decimal_arithmetic(op, *a, *b).map(Value::Decimal),
            (Value::Decimal(_), _) | (_, Value::Decimal(_)) if self.is_numeric() && other.is_numeric() => {
                match (self.as_decimal(), other.as_decimal()) {
                    (Some(a), Some(b)) => decimal_arithmetic(op, a, b).map(Value::Decimal),
                    _ => Err(format!("Cannot apply {} to non-finite operands", op.symbol())),
                }
            }
            (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
                if let Some(ad) = self.as_decimal()
                    && let Some(bd) = other.as_decimal()
                    && let Ok(rd) = decimal_arithmetic(op, ad, bd)
                {
                    if rd.is_integer()
                        && let Some(r) = rd.to_i64()
                    {
                        return Ok(Value::Integer(r));
                    } else if let Some(r) = rd.to_f64() {
                        return Ok(Value::Float(r));
                    }
                }
                // Both sides are numeric here.
                let a = self.as_float().unwrap_or(f64::NAN);
                let b = other.as_float().unwrap_or(f64::NAN);
                Ok(Value::Float(float_arithmetic(op, a, b)))
            }
            (Value::String(a), Value::String(b)) if op == ArithmeticOp::Add => {
                Ok(Value::String(format!("{}{}", a, b)))
            }
            (a, b) => Err(format!(
                "Cannot apply {} to {} and {}",
                op.symbol(),
                a.type_name(),
                b.type_name()
            )),
        }
    }

    /// Navigate a single property of an object value.
    pub fn property(&self, name: &str) -> Value {
        match self {
            Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

fn integer_arithmetic(op: ArithmeticOp, a: i64, b: i64) -> Result<Value, String> {
    let result = match op {
        ArithmeticOp::Add => a.checked_add(b),
        ArithmeticOp::Subtract => a.checked_sub(b),
        ArithmeticOp::Multiply => a.checked_mul(b),
        ArithmeticOp::Divide => {
            if b == 0 {
                return Err("Division by zero".to_string());
            }
            // Exact quotients stay integers; `i64::MIN / -1` overflows both ways
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b),
                Some(_) => return Ok(Value::Float(a as f64 / b as f64)),
                None => None,
            }
        }
    };
    result
        .map(Value::Integer)
        .ok_or_else(|| format!("Integer overflow in {} {} {}", a, op.symbol(), b))
}

fn float_arithmetic(op: ArithmeticOp, a: f64, b: f64) -> f64 {
    match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Subtract => a - b,
        ArithmeticOp::Multiply => a * b,
        ArithmeticOp::Divide => a / b,
    }
}

fn decimal_arithmetic(op: ArithmeticOp, a: Decimal, b: Decimal) -> Result<Decimal, String> {
    let result = match op {
        ArithmeticOp::Add => a.checked_add(b),
        ArithmeticOp::Subtract => a.checked_sub(b),
        ArithmeticOp::Multiply => a.checked_mul(b),
        ArithmeticOp::Divide => {
            if b.is_zero() {
                return Err("Division by zero".to_string());
            }
            a.checked_div(b)
        }
    };
    result.ok_or_else(|| format!("Decimal overflow in {} {} {}", a, op.symbol(), b))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                // Sort keys for deterministic output
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                f.write_str("{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}': {}", key, map[*key])?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_arithmetic_keeps_integers() {
        let result = Value::Integer(2).arithmetic(ArithmeticOp::Multiply, &Value::Float(1.5));
        assert_eq!(result, Ok(Value::Integer(3)));
    }

    #[test]
    fn test_compare_against_null_is_undefined() {
        assert_eq!(Value::Integer(1).compare(&Value::Null), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_loose_numeric_equality() {
        assert!(Value::Integer(5).loosely_equals(&Value::Float(5.0)));
        assert!(Value::Decimal(Decimal::new(500, 2)).loosely_equals(&Value::Integer(5)));
        assert!(!Value::String("5".into()).loosely_equals(&Value::Integer(5)));
    }
}
