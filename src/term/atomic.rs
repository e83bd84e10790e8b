use std::fmt;

use crate::value::Value;

/// Source type of a literal, preserved from the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigDecimal,
    Boolean,
    Null,
}

impl LiteralKind {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LiteralKind::Short
                | LiteralKind::Integer
                | LiteralKind::Long
                | LiteralKind::Float
                | LiteralKind::Double
                | LiteralKind::BigDecimal
        )
    }
}

/// Leaf of a term tree: either a bare symbol (identifier names, functor-like
/// words) or a typed literal.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicTerm {
    Symbol(String),
    Literal { kind: LiteralKind, value: Value },
}

impl AtomicTerm {
    pub fn symbol(name: impl Into<String>) -> Self {
        AtomicTerm::Symbol(name.into())
    }

    pub fn literal(kind: LiteralKind, value: Value) -> Self {
        AtomicTerm::Literal { kind, value }
    }

    pub fn string(s: impl Into<String>) -> Self {
        AtomicTerm::literal(LiteralKind::String, Value::String(s.into()))
    }

    pub fn integer(n: i64) -> Self {
        AtomicTerm::literal(LiteralKind::Integer, Value::Integer(n))
    }

    pub fn double(n: f64) -> Self {
        AtomicTerm::literal(LiteralKind::Double, Value::Float(n))
    }

    pub fn boolean(b: bool) -> Self {
        AtomicTerm::literal(LiteralKind::Boolean, Value::Boolean(b))
    }

    pub fn null() -> Self {
        AtomicTerm::literal(LiteralKind::Null, Value::Null)
    }

    /// The symbol name or the literal rendered as text.
    pub fn text(&self) -> String {
        match self {
            AtomicTerm::Symbol(name) => name.clone(),
            AtomicTerm::Literal { value, .. } => value.as_string(),
        }
    }

    pub fn kind(&self) -> Option<LiteralKind> {
        match self {
            AtomicTerm::Symbol(_) => None,
            AtomicTerm::Literal { kind, .. } => Some(*kind),
        }
    }

    /// Runtime value of the atom; symbols evaluate to their name.
    pub fn value(&self) -> Value {
        match self {
            AtomicTerm::Symbol(name) => Value::String(name.clone()),
            AtomicTerm::Literal { value, .. } => value.clone(),
        }
    }

    pub fn is_number(&self) -> bool {
        self.kind().is_some_and(|k| k.is_numeric())
    }

    /// Negates a numeric literal in place of a runtime negation.
    ///
    /// Returns `None` for non-numeric atoms and `Some(Err)` on overflow.
    pub fn negate(&self) -> Option<Result<AtomicTerm, String>> {
        let AtomicTerm::Literal { kind, value } = self else {
            return None;
        };
        if !kind.is_numeric() {
            return None;
        }
        let negated = match value {
            Value::Integer(n) => n.checked_neg().map(Value::Integer),
            Value::Float(n) => Some(Value::Float(-n)),
            Value::Decimal(d) => Some(Value::Decimal(-*d)),
            _ => None,
        };
        Some(
            negated
                .map(|value| AtomicTerm::literal(*kind, value))
                .ok_or_else(|| self.to_string()),
        )
    }
}

impl fmt::Display for AtomicTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomicTerm::Symbol(name) => f.write_str(name),
            AtomicTerm::Literal { kind, value } => match (kind, value) {
                (LiteralKind::String, Value::String(s)) => {
                    write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
                }
                (LiteralKind::Long, Value::Integer(n)) => write!(f, "{}L", n),
                (LiteralKind::Short, Value::Integer(n)) => write!(f, "{}S", n),
                (_, Value::Float(n)) if n.is_nan() => f.write_str("nan"),
                (_, Value::Float(n)) if n.is_infinite() && *n > 0.0 => f.write_str("infinity"),
                (_, Value::Float(n)) if n.is_infinite() => f.write_str("-infinity"),
                (LiteralKind::Float, Value::Float(n)) => write!(f, "{:?}F", *n as f32),
                (_, Value::Float(n)) => write!(f, "{:?}", n),
                (_, Value::Decimal(d)) => write!(f, "{}B", d),
                (_, other) => write!(f, "{}", other),
            },
        }
    }
}
