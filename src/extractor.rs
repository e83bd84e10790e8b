//! Value extractors: projections over cache entries.

use std::{fmt, sync::Arc};

use log::debug;

use crate::value::{ArithmeticOp, Value};

/// A key/value pair as stored in a cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Value,
    pub value: Value,
}

impl Entry {
    pub fn new(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Entry {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Which half of an entry an extractor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Key,
    Value,
}

pub type ExtractorFn = Arc<dyn Fn(&Entry) -> Value + Send + Sync>;

#[derive(Clone)]
pub enum ValueExtractor {
    /// The whole entry value
    Identity,

    /// The whole entry key
    Key,

    Constant(Value),

    /// Property path navigated from the key or the value
    Chained { target: Target, path: Vec<String> },

    Arithmetic {
        op: ArithmeticOp,
        left: Box<ValueExtractor>,
        right: Box<ValueExtractor>,
    },

    /// String concatenation of every element
    Concat(Vec<ValueExtractor>),

    /// Array built from every element
    Collection(Vec<ValueExtractor>),

    Custom { name: String, function: ExtractorFn },
}

impl ValueExtractor {
    /// Property path relative to the entry value.
    pub fn path<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        ValueExtractor::Chained {
            target: Target::Value,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn custom(name: impl Into<String>, function: impl Fn(&Entry) -> Value + Send + Sync + 'static) -> Self {
        ValueExtractor::Custom {
            name: name.into(),
            function: Arc::new(function),
        }
    }

    pub fn is_constant(&self) -> bool {
        match self {
            ValueExtractor::Constant(_) => true,
            ValueExtractor::Collection(items) | ValueExtractor::Concat(items) => {
                items.iter().all(ValueExtractor::is_constant)
            }
            ValueExtractor::Arithmetic { left, right, .. } => left.is_constant() && right.is_constant(),
            _ => false,
        }
    }

    pub fn extract(&self, entry: &Entry) -> Value {
        match self {
            ValueExtractor::Identity => entry.value.clone(),
            ValueExtractor::Key => entry.key.clone(),
            ValueExtractor::Constant(value) => value.clone(),
            ValueExtractor::Chained { target, path } => {
                let root = match target {
                    Target::Key => &entry.key,
                    Target::Value => &entry.value,
                };
                let mut current = root.clone();
                for property in path {
                    current = current.property(property);
                    if current.is_null() {
                        break;
                    }
                }
                current
            }
            ValueExtractor::Arithmetic { op, left, right } => {
                let a = left.extract(entry);
                let b = right.extract(entry);
                a.arithmetic(*op, &b).unwrap_or_else(|e| {
                    debug!("{}: {}", self, e);
                    Value::Null
                })
            }
            ValueExtractor::Concat(parts) => {
                let mut result = String::new();
                for part in parts {
                    match part.extract(entry) {
                        Value::Null => {}
                        value => result.push_str(&value.as_string()),
                    }
                }
                Value::String(result)
            }
            ValueExtractor::Collection(items) => {
                Value::Array(items.iter().map(|item| item.extract(entry)).collect())
            }
            ValueExtractor::Custom { function, .. } => function(entry),
        }
    }
}

impl fmt::Debug for ValueExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExtractor::Identity => f.write_str("Identity"),
            ValueExtractor::Key => f.write_str("Key"),
            ValueExtractor::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ValueExtractor::Chained { target, path } => f
                .debug_struct("Chained")
                .field("target", target)
                .field("path", path)
                .finish(),
            ValueExtractor::Arithmetic { op, left, right } => f
                .debug_struct("Arithmetic")
                .field("op", op)
                .field("left", left)
                .field("right", right)
                .finish(),
            ValueExtractor::Concat(parts) => f.debug_tuple("Concat").field(parts).finish(),
            ValueExtractor::Collection(items) => f.debug_tuple("Collection").field(items).finish(),
            ValueExtractor::Custom { name, .. } => f.debug_tuple("Custom").field(name).finish(),
        }
    }
}

impl PartialEq for ValueExtractor {
    fn eq(&self, other: &Self) -> bool {
        use ValueExtractor::*;
        match (self, other) {
            (Identity, Identity) | (Key, Key) => true,
            (Constant(a), Constant(b)) => a == b,
            (Chained { target: t1, path: p1 }, Chained { target: t2, path: p2 }) => t1 == t2 && p1 == p2,
            (
                Arithmetic { op: o1, left: l1, right: r1 },
                Arithmetic { op: o2, left: l2, right: r2 },
            ) => o1 == o2 && l1 == l2 && r1 == r2,
            (Concat(a), Concat(b)) | (Collection(a), Collection(b)) => a == b,
            (Custom { name: n1, function: f1 }, Custom { name: n2, function: f2 }) => {
                n1 == n2 && Arc::ptr_eq(f1, f2)
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExtractor::Identity => f.write_str("value()"),
            ValueExtractor::Key => f.write_str("key()"),
            ValueExtractor::Constant(v) => write!(f, "{}", v),
            ValueExtractor::Chained { target, path } => {
                if *target == Target::Key {
                    f.write_str("key().")?;
                }
                f.write_str(&path.join("."))
            }
            ValueExtractor::Arithmetic { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            ValueExtractor::Concat(parts) => write!(f, "concat({})", join(parts)),
            ValueExtractor::Collection(items) => write!(f, "[{}]", join(items)),
            ValueExtractor::Custom { name, .. } => write!(f, "{}()", name),
        }
    }
}

fn join(items: &[ValueExtractor]) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

/// Resolves a property path to an extractor.
///
/// Builders are consulted in order; `None` means "not mine" and lets the next
/// builder try.
pub trait ExtractorBuilder: Send + Sync + fmt::Debug {
    fn realize(&self, cache: Option<&str>, target: Target, path: &[String]) -> Option<ValueExtractor>;
}

/// Accepts any path: `getName()`, `isActive()` and `name` all read property
/// `name`/`active`/`name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniversalExtractorBuilder;

impl UniversalExtractorBuilder {
    /// Property named by a path element.
    pub fn property_name(element: &str) -> String {
        let element = element.strip_suffix("()").unwrap_or(element);
        for prefix in ["get", "is"] {
            if let Some(rest) = element.strip_prefix(prefix)
                && rest.chars().next().is_some_and(char::is_uppercase)
            {
                let mut chars = rest.chars();
                if let Some(first) = chars.next() {
                    return first.to_lowercase().chain(chars).collect();
                }
            }
        }
        element.to_string()
    }
}

impl ExtractorBuilder for UniversalExtractorBuilder {
    fn realize(&self, _cache: Option<&str>, target: Target, path: &[String]) -> Option<ValueExtractor> {
        if path.is_empty() {
            return Some(match target {
                Target::Key => ValueExtractor::Key,
                Target::Value => ValueExtractor::Identity,
            });
        }
        Some(ValueExtractor::Chained {
            target,
            path: path.iter().map(|p| UniversalExtractorBuilder::property_name(p)).collect(),
        })
    }
}

/// Tries each builder in order; the first `Some` wins.
#[derive(Debug, Clone, Default)]
pub struct ChainedExtractorBuilder {
    builders: Vec<Arc<dyn ExtractorBuilder>>,
}

impl ChainedExtractorBuilder {
    pub fn new(builders: Vec<Arc<dyn ExtractorBuilder>>) -> Self {
        ChainedExtractorBuilder { builders }
    }

    pub fn push(&mut self, builder: Arc<dyn ExtractorBuilder>) {
        self.builders.push(builder);
    }
}

impl ExtractorBuilder for ChainedExtractorBuilder {
    fn realize(&self, cache: Option<&str>, target: Target, path: &[String]) -> Option<ValueExtractor> {
        self.builders
            .iter()
            .find_map(|builder| builder.realize(cache, target, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_property_names() {
        assert_eq!(UniversalExtractorBuilder::property_name("getName()"), "name");
        assert_eq!(UniversalExtractorBuilder::property_name("isActive()"), "active");
        assert_eq!(UniversalExtractorBuilder::property_name("city"), "city");
        assert_eq!(UniversalExtractorBuilder::property_name("getaway"), "getaway");
    }

    #[test]
    fn test_chained_path_stops_at_null() {
        let mut address = HashMap::new();
        address.insert("city".to_string(), Value::from("Oslo"));
        let mut person = HashMap::new();
        person.insert("address".to_string(), Value::Object(address));
        let entry = Entry::new(1, Value::Object(person));

        assert_eq!(
            ValueExtractor::path(["address", "city"]).extract(&entry),
            Value::from("Oslo")
        );
        assert_eq!(ValueExtractor::path(["phone", "area"]).extract(&entry), Value::Null);
    }
}
