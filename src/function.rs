//! Built-in functions, aggregators and `new` constructors.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use rust_decimal::Decimal;

use crate::{
    error::CompileError,
    extractor::{Entry, ValueExtractor},
    filter_builder::Compiled,
    value::{ArithmeticOp, Value},
};

/// Builds a compiled result from compiled call arguments.
pub type Function = Arc<dyn Fn(Vec<Compiled>) -> Result<Compiled, CompileError> + Send + Sync>;

/// Builds a value for `new T(args)` from constant arguments.
pub type Constructor = Arc<dyn Fn(Vec<Value>) -> Result<Value, CompileError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    LongSum,
    LongMin,
    LongMax,
    BdSum,
    BdAvg,
    BdMin,
    BdMax,
}

impl AggregateKind {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Count => "count",
            AggregateKind::Sum => "sum",
            AggregateKind::Avg => "avg",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
            AggregateKind::LongSum => "long_sum",
            AggregateKind::LongMin => "long_min",
            AggregateKind::LongMax => "long_max",
            AggregateKind::BdSum => "bd_sum",
            AggregateKind::BdAvg => "bd_avg",
            AggregateKind::BdMin => "bd_min",
            AggregateKind::BdMax => "bd_max",
        }
    }
}

/// Reduces the entries of a group to one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregator {
    pub kind: AggregateKind,
    pub extractor: ValueExtractor,
}

impl Aggregator {
    pub fn new(kind: AggregateKind, extractor: ValueExtractor) -> Self {
        Aggregator { kind, extractor }
    }

    /// Aggregates `entries`. Apart from `count`, which counts entries, nulls
    /// are skipped and an empty input yields null.
    pub fn aggregate<'a>(&self, entries: impl IntoIterator<Item = &'a Entry>) -> Value {
        let entries: Vec<&Entry> = entries.into_iter().collect();
        let values: Vec<Value> = entries
            .iter()
            .map(|e| self.extractor.extract(e))
            .filter(|v| !v.is_null())
            .collect();

        match self.kind {
            AggregateKind::Count => Value::Integer(entries.len() as i64),
            AggregateKind::Sum => fold_float(&values, |a, b| a + b),
            AggregateKind::Min => fold_float(&values, f64::min),
            AggregateKind::Max => fold_float(&values, f64::max),
            AggregateKind::Avg => match fold_float(&values, |a, b| a + b) {
                Value::Float(total) => Value::Float(total / values.len() as f64),
                other => other,
            },
            AggregateKind::LongSum => fold_long(&values, |a, b| a.checked_add(b)),
            AggregateKind::LongMin => fold_long(&values, |a, b| Some(a.min(b))),
            AggregateKind::LongMax => fold_long(&values, |a, b| Some(a.max(b))),
            AggregateKind::BdSum => fold_decimal(&values, |a, b| a.checked_add(b)),
            AggregateKind::BdMin => fold_decimal(&values, |a, b| Some(a.min(b))),
            AggregateKind::BdMax => fold_decimal(&values, |a, b| Some(a.max(b))),
            AggregateKind::BdAvg => match fold_decimal(&values, |a, b| a.checked_add(b)) {
                Value::Decimal(total) => total
                    .checked_div(Decimal::from(values.len() as i64))
                    .map(Value::Decimal)
                    .unwrap_or(Value::Null),
                other => other,
            },
        }
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AggregateKind::Count => f.write_str("count()"),
            kind => write!(f, "{}({})", kind.name(), self.extractor),
        }
    }
}

fn fold_float(values: &[Value], op: impl Fn(f64, f64) -> f64) -> Value {
    values
        .iter()
        .filter_map(Value::as_float)
        .reduce(op)
        .map(Value::Float)
        .unwrap_or(Value::Null)
}

fn fold_long(values: &[Value], op: impl Fn(i64, i64) -> Option<i64>) -> Value {
    let mut numbers = values.iter().filter_map(Value::as_int);
    let Some(mut acc) = numbers.next() else {
        return Value::Null;
    };
    for n in numbers {
        match op(acc, n) {
            Some(next) => acc = next,
            None => return Value::Null,
        }
    }
    Value::Integer(acc)
}

fn fold_decimal(values: &[Value], op: impl Fn(Decimal, Decimal) -> Option<Decimal>) -> Value {
    let mut numbers = values.iter().filter_map(Value::as_decimal);
    let Some(mut acc) = numbers.next() else {
        return Value::Null;
    };
    for n in numbers {
        match op(acc, n) {
            Some(next) => acc = next,
            None => return Value::Null,
        }
    }
    Value::Decimal(acc)
}

fn function(
    f: impl Fn(Vec<Compiled>) -> Result<Compiled, CompileError> + Send + Sync + 'static,
) -> Function {
    Arc::new(f)
}

fn constructor(
    f: impl Fn(Vec<Value>) -> Result<Value, CompileError> + Send + Sync + 'static,
) -> Constructor {
    Arc::new(f)
}

fn aggregate_function(kind: AggregateKind) -> Function {
    function(move |args: Vec<Compiled>| {
        let extractor = match (kind, args.len()) {
            (AggregateKind::Count, 0) => ValueExtractor::Identity,
            (_, 1) => args
                .into_iter()
                .next()
                .map_or(Ok(ValueExtractor::Identity), Compiled::into_extractor)?,
            (_, n) => {
                return Err(CompileError::invalid_operand(
                    kind.name(),
                    format!("takes one argument, got {}", n),
                ));
            }
        };
        Ok(Compiled::Aggregator(Aggregator::new(kind, extractor)))
    })
}

fn no_arguments(name: &'static str, extractor: ValueExtractor) -> Function {
    function(move |args: Vec<Compiled>| {
        if !args.is_empty() {
            return Err(CompileError::invalid_operand(name, "takes no arguments"));
        }
        Ok(Compiled::Extractor(extractor.clone()))
    })
}

/// The functions every language starts with.
pub fn standard_functions() -> Vec<(&'static str, Function)> {
    let mut functions = vec![
        ("key", no_arguments("key", ValueExtractor::Key)),
        ("value", no_arguments("value", ValueExtractor::Identity)),
        (
            "concat",
            function(|args: Vec<Compiled>| {
                let parts = args
                    .into_iter()
                    .map(Compiled::into_extractor)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Compiled::Extractor(ValueExtractor::Concat(parts)))
            }),
        ),
    ];

    for kind in [
        AggregateKind::Count,
        AggregateKind::Sum,
        AggregateKind::Avg,
        AggregateKind::Min,
        AggregateKind::Max,
        AggregateKind::LongSum,
        AggregateKind::LongMin,
        AggregateKind::LongMax,
        AggregateKind::BdSum,
        AggregateKind::BdAvg,
        AggregateKind::BdMin,
        AggregateKind::BdMax,
    ] {
        functions.push((kind.name(), aggregate_function(kind)));
    }
    functions
}

fn single(type_name: &str, args: Vec<Value>) -> Result<Value, CompileError> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(CompileError::invalid_operand(
            "new",
            format!("{} takes exactly one argument", type_name),
        )),
    }
}

fn cannot_convert(type_name: &str, value: &Value) -> CompileError {
    CompileError::invalid_operand("new", format!("cannot convert {} to {}", value, type_name))
}

fn to_integer(type_name: &str, value: Value, min: i64, max: i64) -> Result<Value, CompileError> {
    let n = match &value {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        Value::Integer(n) => Some(*n),
        Value::Decimal(d) if d.is_integer() => value.as_int(),
        _ => None,
    };
    n.filter(|n| (min..=max).contains(n))
        .map(Value::Integer)
        .ok_or_else(|| cannot_convert(type_name, &value))
}

/// Types `new` can instantiate.
pub fn standard_constructors() -> Vec<(&'static str, Constructor)> {
    vec![
        (
            "String",
            constructor(|args: Vec<Value>| match args.len() {
                0 => Ok(Value::String(String::new())),
                _ => single("String", args).map(|v| Value::String(v.as_string())),
            }),
        ),
        (
            "Integer",
            constructor(|args: Vec<Value>| {
                to_integer("Integer", single("Integer", args)?, i32::MIN as i64, i32::MAX as i64)
            }),
        ),
        (
            "Long",
            constructor(|args: Vec<Value>| to_integer("Long", single("Long", args)?, i64::MIN, i64::MAX)),
        ),
        (
            "Double",
            constructor(|args: Vec<Value>| {
                let value = single("Double", args)?;
                let n = match &value {
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    other => other.as_float(),
                };
                n.map(Value::Float).ok_or_else(|| cannot_convert("Double", &value))
            }),
        ),
        (
            "BigDecimal",
            constructor(|args: Vec<Value>| {
                let value = single("BigDecimal", args)?;
                let d = match &value {
                    Value::String(s) => Decimal::from_str(s.trim())
                        .or_else(|_| Decimal::from_scientific(s.trim()))
                        .ok(),
                    other => other.as_decimal(),
                };
                d.map(Value::Decimal).ok_or_else(|| cannot_convert("BigDecimal", &value))
            }),
        ),
        ("List", constructor(|args: Vec<Value>| Ok(Value::Array(args)))),
        (
            "Set",
            constructor(|args: Vec<Value>| {
                let mut set: Vec<Value> = Vec::new();
                for arg in args {
                    if !set.iter().any(|v| v.loosely_equals(&arg)) {
                        set.push(arg);
                    }
                }
                Ok(Value::Array(set))
            }),
        ),
        (
            "Map",
            constructor(|args: Vec<Value>| {
                if args.len() % 2 != 0 {
                    return Err(CompileError::invalid_operand(
                        "new",
                        "Map takes key/value argument pairs",
                    ));
                }
                let mut map = HashMap::new();
                let mut args = args.into_iter();
                while let (Some(k), Some(v)) = (args.next(), args.next()) {
                    map.insert(k.as_string(), v);
                }
                Ok(Value::Object(map))
            }),
        ),
        (
            "Pair",
            constructor(|args: Vec<Value>| match <[Value; 2]>::try_from(args) {
                Ok([a, b]) => Ok(Value::Array(vec![a, b])),
                Err(_) => Err(CompileError::invalid_operand("new", "Pair takes two arguments")),
            }),
        ),
    ]
}

/// Folds a constant arithmetic expression at compile time.
pub fn fold_arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Result<Value, CompileError> {
    left.arithmetic(op, right)
        .map_err(|reason| CompileError::invalid_operand(op.symbol(), reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<Entry> {
        vec![
            Entry::new(1, 10),
            Entry::new(2, Value::Null),
            Entry::new(3, 5),
        ]
    }

    #[test]
    fn test_aggregates_skip_nulls() {
        let entries = entries();
        let count = Aggregator::new(AggregateKind::Count, ValueExtractor::Identity);
        assert_eq!(count.aggregate(&entries), Value::Integer(3));

        let sum = Aggregator::new(AggregateKind::LongSum, ValueExtractor::Identity);
        assert_eq!(sum.aggregate(&entries), Value::Integer(15));

        let avg = Aggregator::new(AggregateKind::Avg, ValueExtractor::Identity);
        assert_eq!(avg.aggregate(&entries), Value::Float(7.5));

        let max = Aggregator::new(AggregateKind::BdMax, ValueExtractor::Identity);
        assert_eq!(max.aggregate(&entries), Value::Decimal(Decimal::from(10)));
    }

    #[test]
    fn test_aggregate_of_nothing_is_null() {
        let min = Aggregator::new(AggregateKind::Min, ValueExtractor::Identity);
        assert_eq!(min.aggregate(Vec::<Entry>::new().iter()), Value::Null);
    }
}
