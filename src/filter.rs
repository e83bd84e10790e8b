//! Boolean predicates over cache entries.

use std::{cmp::Ordering, fmt, sync::Arc};

use regex::Regex;

use crate::{
    extractor::{Entry, ValueExtractor},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
        }
    }

    /// Null equals only null; null never orders against anything.
    pub fn test(&self, left: &Value, right: &Value) -> bool {
        let equal = || match (left, right) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ => left.loosely_equals(right),
        };
        match self {
            Comparison::Equal => equal(),
            Comparison::NotEqual => !equal(),
            Comparison::Less => left.compare(right) == Some(Ordering::Less),
            Comparison::LessOrEqual => {
                matches!(left.compare(right), Some(Ordering::Less | Ordering::Equal))
            }
            Comparison::Greater => left.compare(right) == Some(Ordering::Greater),
            Comparison::GreaterOrEqual => {
                matches!(left.compare(right), Some(Ordering::Greater | Ordering::Equal))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainsMode {
    One,
    All,
    Any,
}

/// SQL `LIKE` pattern: `%` matches any run, `_` any single character.
#[derive(Debug, Clone)]
pub struct LikePattern {
    pattern: String,
    escape: Option<char>,
    ignore_case: bool,
    regex: Regex,
}

impl LikePattern {
    pub fn new(pattern: &str, escape: Option<char>, ignore_case: bool) -> Result<Self, regex::Error> {
        let mut source = String::from(if ignore_case { "(?is)^" } else { "(?s)^" });
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                c if Some(c) == escape => {
                    if let Some(literal) = chars.next() {
                        source.push_str(&regex::escape(&literal.to_string()));
                    }
                }
                '%' => source.push_str(".*"),
                '_' => source.push('.'),
                c => source.push_str(&regex::escape(&c.to_string())),
            }
        }
        source.push('$');

        Ok(LikePattern {
            pattern: pattern.to_string(),
            escape,
            ignore_case,
            regex: Regex::new(&source)?,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn escape(&self) -> Option<char> {
        self.escape
    }

    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.escape == other.escape
            && self.ignore_case == other.ignore_case
    }
}

pub type PredicateFn = Arc<dyn Fn(&Entry) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Filter {
    Always,
    Never,
    Not(Box<Filter>),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Xor(Box<Filter>, Box<Filter>),
    Compare {
        op: Comparison,
        left: ValueExtractor,
        right: ValueExtractor,
    },
    /// Inclusive on both ends
    Between {
        value: ValueExtractor,
        low: ValueExtractor,
        high: ValueExtractor,
    },
    Like {
        value: ValueExtractor,
        pattern: LikePattern,
    },
    In {
        value: ValueExtractor,
        candidates: ValueExtractor,
    },
    Contains {
        collection: ValueExtractor,
        mode: ContainsMode,
        operand: ValueExtractor,
    },
    /// Truthiness of an extracted value
    Predicate(ValueExtractor),
    Custom { name: String, predicate: PredicateFn },
}

impl Filter {
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn and(left: Filter, right: Filter) -> Self {
        Filter::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Filter, right: Filter) -> Self {
        Filter::Or(Box::new(left), Box::new(right))
    }

    pub fn xor(left: Filter, right: Filter) -> Self {
        Filter::Xor(Box::new(left), Box::new(right))
    }

    pub fn compare(op: Comparison, left: ValueExtractor, right: ValueExtractor) -> Self {
        Filter::Compare { op, left, right }
    }

    pub fn custom(name: impl Into<String>, predicate: impl Fn(&Entry) -> bool + Send + Sync + 'static) -> Self {
        Filter::Custom {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn from_bool(b: bool) -> Self {
        if b { Filter::Always } else { Filter::Never }
    }

    pub fn evaluate(&self, entry: &Entry) -> bool {
        match self {
            Filter::Always => true,
            Filter::Never => false,
            Filter::Not(f) => !f.evaluate(entry),
            Filter::And(a, b) => a.evaluate(entry) && b.evaluate(entry),
            Filter::Or(a, b) => a.evaluate(entry) || b.evaluate(entry),
            Filter::Xor(a, b) => a.evaluate(entry) ^ b.evaluate(entry),
            Filter::Compare { op, left, right } => op.test(&left.extract(entry), &right.extract(entry)),
            Filter::Between { value, low, high } => {
                let v = value.extract(entry);
                Comparison::GreaterOrEqual.test(&v, &low.extract(entry))
                    && Comparison::LessOrEqual.test(&v, &high.extract(entry))
            }
            Filter::Like { value, pattern } => match value.extract(entry) {
                Value::Null => false,
                Value::String(s) => pattern.matches(&s),
                other => pattern.matches(&other.as_string()),
            },
            Filter::In { value, candidates } => {
                let v = value.extract(entry);
                match candidates.extract(entry) {
                    Value::Array(items) => items.iter().any(|c| Comparison::Equal.test(&v, c)),
                    single => Comparison::Equal.test(&v, &single),
                }
            }
            Filter::Contains {
                collection,
                mode,
                operand,
            } => {
                let Value::Array(items) = collection.extract(entry) else {
                    return false;
                };
                let has = |needle: &Value| items.iter().any(|item| Comparison::Equal.test(item, needle));
                let operand = operand.extract(entry);
                match (mode, operand) {
                    (ContainsMode::One, needle) => has(&needle),
                    (ContainsMode::All, Value::Array(needles)) => needles.iter().all(has),
                    (ContainsMode::Any, Value::Array(needles)) => needles.iter().any(has),
                    (_, needle) => has(&needle),
                }
            }
            Filter::Predicate(extractor) => extractor.extract(entry).as_bool(),
            Filter::Custom { predicate, .. } => predicate(entry),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self)
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        use Filter::*;
        match (self, other) {
            (Always, Always) | (Never, Never) => true,
            (Not(a), Not(b)) => a == b,
            (And(a1, b1), And(a2, b2)) | (Or(a1, b1), Or(a2, b2)) | (Xor(a1, b1), Xor(a2, b2)) => {
                a1 == a2 && b1 == b2
            }
            (
                Compare { op: o1, left: l1, right: r1 },
                Compare { op: o2, left: l2, right: r2 },
            ) => o1 == o2 && l1 == l2 && r1 == r2,
            (
                Between { value: v1, low: l1, high: h1 },
                Between { value: v2, low: l2, high: h2 },
            ) => v1 == v2 && l1 == l2 && h1 == h2,
            (Like { value: v1, pattern: p1 }, Like { value: v2, pattern: p2 }) => v1 == v2 && p1 == p2,
            (In { value: v1, candidates: c1 }, In { value: v2, candidates: c2 }) => v1 == v2 && c1 == c2,
            (
                Contains { collection: c1, mode: m1, operand: o1 },
                Contains { collection: c2, mode: m2, operand: o2 },
            ) => c1 == c2 && m1 == m2 && o1 == o2,
            (Predicate(a), Predicate(b)) => a == b,
            (Custom { name: n1, predicate: p1 }, Custom { name: n2, predicate: p2 }) => {
                n1 == n2 && Arc::ptr_eq(p1, p2)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Always => f.write_str("true"),
            Filter::Never => f.write_str("false"),
            Filter::Not(inner) => write!(f, "!({})", inner),
            Filter::And(a, b) => write!(f, "({} && {})", a, b),
            Filter::Or(a, b) => write!(f, "({} || {})", a, b),
            Filter::Xor(a, b) => write!(f, "({} xor {})", a, b),
            Filter::Compare { op, left, right } => write!(f, "{} {} {}", left, op.symbol(), right),
            Filter::Between { value, low, high } => write!(f, "{} between {} and {}", value, low, high),
            Filter::Like { value, pattern } => {
                let keyword = if pattern.ignore_case { "ilike" } else { "like" };
                write!(f, "{} {} '{}'", value, keyword, pattern.pattern)?;
                if let Some(escape) = pattern.escape {
                    write!(f, " escape '{}'", escape)?;
                }
                Ok(())
            }
            Filter::In { value, candidates } => write!(f, "{} in {}", value, candidates),
            Filter::Contains {
                collection,
                mode,
                operand,
            } => {
                let keyword = match mode {
                    ContainsMode::One => "contains",
                    ContainsMode::All => "contains all",
                    ContainsMode::Any => "contains any",
                };
                write!(f, "{} {} {}", collection, keyword, operand)
            }
            Filter::Predicate(extractor) => write!(f, "{}", extractor),
            Filter::Custom { name, .. } => write!(f, "{}(...)", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_wildcards() {
        let p = LikePattern::new("A%", None, false).unwrap();
        assert!(p.matches("Alice"));
        assert!(p.matches("A"));
        assert!(!p.matches("Bob"));

        let p = LikePattern::new("_ob", None, false).unwrap();
        assert!(p.matches("Bob"));
        assert!(!p.matches("Boob"));
    }

    #[test]
    fn test_like_escape_and_case() {
        let p = LikePattern::new("100\\%", Some('\\'), false).unwrap();
        assert!(p.matches("100%"));
        assert!(!p.matches("1000"));

        let p = LikePattern::new("a.c", None, false).unwrap();
        assert!(!p.matches("abc"));

        let p = LikePattern::new("ali%", None, true).unwrap();
        assert!(p.matches("ALICE"));
    }

    #[test]
    fn test_null_never_orders() {
        assert!(!Comparison::Less.test(&Value::Null, &Value::Integer(1)));
        assert!(!Comparison::GreaterOrEqual.test(&Value::Null, &Value::Integer(1)));
        assert!(Comparison::Equal.test(&Value::Null, &Value::Null));
        assert!(Comparison::NotEqual.test(&Value::Integer(1), &Value::Null));
        assert!(Comparison::Equal.test(&Value::Integer(2), &Value::Float(2.0)));
    }
}
