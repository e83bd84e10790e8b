// tests/filter_builder_tests.rs

use std::collections::HashMap;

use assert_matches::assert_matches;
use cohql::error::{CompileError, QueryError};
use cohql::extractor::Target;
use cohql::filter::Filter;
use cohql::{Entry, ExtractorBuilder, FilterBuilder, NamedBindings, QueryLanguage, Value, ValueExtractor};

fn object(fields: &[(&str, Value)]) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

fn person(age: i64, name: &str) -> Entry {
    Entry::new(
        name,
        object(&[("age", Value::Integer(age)), ("name", Value::from(name))]),
    )
}

fn filter(text: &str) -> Filter {
    QueryLanguage::default().filter(text, &[], None).unwrap()
}

fn extractor(text: &str) -> ValueExtractor {
    QueryLanguage::default().extractor(text).unwrap()
}

fn compile_error(text: &str) -> CompileError {
    match QueryLanguage::default().filter(text, &[], None) {
        Err(QueryError::Compile(e)) => e,
        other => panic!("Expected a compile error for {}, got {:?}", text, other),
    }
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_logical_filter_over_people() {
    let f = filter("age >= 18 and (name like 'A%' or name like 'B%')");
    assert!(f.evaluate(&person(20, "Bob")));
    assert!(!f.evaluate(&person(15, "Bob")));
    assert!(!f.evaluate(&person(30, "Carl")));
}

#[test]
fn test_arithmetic_in_comparison() {
    let f = filter("age * 2 > 50");
    assert!(f.evaluate(&person(26, "Ann")));
    assert!(!f.evaluate(&person(25, "Ann")));
}

#[test]
fn test_membership_and_ranges() {
    let ann = person(30, "Ann");
    assert!(filter("name in ('Ann', 'Bob')").evaluate(&ann));
    assert!(!filter("name not in ('Ann', 'Bob')").evaluate(&ann));
    assert!(filter("age between 30 and 40").evaluate(&ann));
    assert!(!filter("age between 31 and 40").evaluate(&ann));
}

#[test]
fn test_collection_containment() {
    let entry = Entry::new(
        1,
        object(&[("tags", Value::Array(vec![Value::from("y"), Value::from("z")]))]),
    );
    assert!(filter("tags contains 'z'").evaluate(&entry));
    assert!(filter("tags contains any ('x', 'y')").evaluate(&entry));
    assert!(!filter("tags contains all ('x', 'y')").evaluate(&entry));
}

#[test]
fn test_is_not_null() {
    let f = filter("nickname is not null");
    assert!(!f.evaluate(&person(30, "Ann")));
    let entry = Entry::new(1, object(&[("nickname", Value::from("Annie"))]));
    assert!(f.evaluate(&entry));
}

#[test]
fn test_boolean_constants_become_trivial_filters() {
    assert_eq!(filter("true"), Filter::Always);
    assert_eq!(filter("not true"), Filter::Never);
}

// ============================================================================
// Bindings
// ============================================================================

#[test]
fn test_positional_and_named_bindings() {
    let mut named = NamedBindings::new();
    named.insert("who".to_string(), Value::from("Bob"));
    let f = QueryLanguage::default()
        .filter("age > ?1 and name == :who", &[Value::Integer(18)], Some(&named))
        .unwrap();
    assert!(f.evaluate(&person(20, "Bob")));
    assert!(!f.evaluate(&person(20, "Ann")));
}

#[test]
fn test_unbound_variable() {
    let result = QueryLanguage::default().filter("age > ?2", &[Value::Integer(1)], None);
    assert_matches!(
        result,
        Err(QueryError::Compile(CompileError::UnboundVariable(name))) if name == "?2"
    );
}

// ============================================================================
// Constants
// ============================================================================

#[test]
fn test_negative_literals_fold() {
    assert_eq!(extractor("-5"), ValueExtractor::Constant(Value::Integer(-5)));
    assert_eq!(extractor("-2.5"), ValueExtractor::Constant(Value::Float(-2.5)));
}

#[test]
fn test_negating_a_property_is_rejected() {
    assert_matches!(compile_error("-age > 1"), CompileError::NonNumericNegation(_));
}

#[test]
fn test_literal_words() {
    assert_eq!(extractor("null"), ValueExtractor::Constant(Value::Null));
    assert_eq!(extractor("FALSE"), ValueExtractor::Constant(Value::Boolean(false)));
    assert_matches!(extractor("infinity"), ValueExtractor::Constant(Value::Float(f)) if f.is_infinite());
    assert_matches!(extractor("NaN"), ValueExtractor::Constant(Value::Float(f)) if f.is_nan());
}

#[test]
fn test_constructors() {
    assert_eq!(extractor("new Integer(5)"), ValueExtractor::Constant(Value::Integer(5)));
    assert_eq!(extractor("new Long('42')"), ValueExtractor::Constant(Value::Integer(42)));
    assert_matches!(compile_error("x == new Integer('five')"), CompileError::InvalidOperand { .. });
    assert_matches!(
        compile_error("x == new Widget(1)"),
        CompileError::UnknownType(name) if name == "Widget"
    );
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_getters_resolve_to_properties() {
    assert_eq!(extractor("address.getCity()"), ValueExtractor::path(["address", "city"]));
    assert_eq!(extractor("isActive()"), ValueExtractor::path(["active"]));
}

#[test]
fn test_key_paths() {
    assert_eq!(
        extractor("key().id"),
        ValueExtractor::Chained {
            target: Target::Key,
            path: vec!["id".to_string()],
        }
    );
    assert_eq!(extractor("key()"), ValueExtractor::Key);
    assert_eq!(extractor("this"), ValueExtractor::Identity);
}

#[test]
fn test_alias_names_the_entry_value() {
    let language = QueryLanguage::default();
    let term = language.parse_filter("p.age > 21").unwrap();
    let f = FilterBuilder::new(&language, Some("people"), &[], None)
        .with_alias(Some("p"))
        .make_filter(&term)
        .unwrap();
    assert!(f.evaluate(&person(30, "Ann")));
    assert!(!f.evaluate(&person(20, "Ann")));
}

#[derive(Debug)]
struct NothingBuilder;

impl ExtractorBuilder for NothingBuilder {
    fn realize(&self, _cache: Option<&str>, _target: Target, _path: &[String]) -> Option<ValueExtractor> {
        None
    }
}

/// Resolves `magic` in cache `special` to a constant.
#[derive(Debug)]
struct MagicBuilder;

impl ExtractorBuilder for MagicBuilder {
    fn realize(&self, cache: Option<&str>, _target: Target, path: &[String]) -> Option<ValueExtractor> {
        match (cache, path) {
            (Some("special"), [name]) if name == "magic" => Some(ValueExtractor::Constant(Value::from("X"))),
            _ => None,
        }
    }
}

#[test]
fn test_extractor_builders_are_chained() {
    let language = QueryLanguage::builder()
        .extractor_builder(NothingBuilder)
        .extractor_builder(MagicBuilder)
        .build();
    let term = language.parse_filter("magic").unwrap();

    let special = FilterBuilder::new(&language, Some("special"), &[], None);
    assert_eq!(
        special.make_extractor(&term).unwrap(),
        ValueExtractor::Constant(Value::from("X"))
    );

    let other = FilterBuilder::new(&language, Some("other"), &[], None);
    assert_eq!(other.make_extractor(&term).unwrap(), ValueExtractor::path(["magic"]));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_operator_without_builder() {
    assert_matches!(
        compile_error("age ** 2 > 4"),
        CompileError::UnknownOperator(op) if op == "**"
    );
}

#[test]
fn test_values_are_not_filters() {
    assert_matches!(compile_error("age + 1"), CompileError::FilterNotSpecified(_));
    assert_matches!(compile_error("'abc'"), CompileError::FilterNotSpecified(_));
}

#[test]
fn test_removed_function_is_unknown() {
    let language = QueryLanguage::builder().remove_function("concat").build();
    assert_matches!(
        language.extractor("concat(a, b)"),
        Err(QueryError::Compile(CompileError::UnknownFunction(name))) if name == "concat"
    );

    let mut seen = HashMap::new();
    seen.insert("a".to_string(), Value::from("x"));
    seen.insert("b".to_string(), Value::from("y"));
    let concat = QueryLanguage::default().extractor("concat(a, b)").unwrap();
    assert_eq!(concat.extract(&Entry::new(1, Value::Object(seen))), Value::from("xy"));
}

// ============================================================================
// Integer overflow
// ============================================================================

#[test]
fn test_negating_smallest_integer_overflows() {
    assert_matches!(
        QueryLanguage::default().extractor("-(-9223372036854775807 - 1)"),
        Err(QueryError::Compile(CompileError::NegationOverflow(_)))
    );
}

#[test]
fn test_dividing_smallest_integer_by_minus_one() {
    assert_matches!(
        QueryLanguage::default().extractor("(-9223372036854775807 - 1) / -1"),
        Err(QueryError::Compile(CompileError::InvalidOperand { .. }))
    );

    let negated = extractor("n / -1");
    let entry = Entry::new(1, object(&[("n", Value::Integer(i64::MIN))]));
    assert_eq!(negated.extract(&entry), Value::Null);
    assert_eq!(extractor("7 / 2"), ValueExtractor::Constant(Value::Float(3.5)));
    assert_eq!(extractor("-8 / -2"), ValueExtractor::Constant(Value::Integer(4)));
}

#[test]
fn test_alias_follows_language_case() {
    let language = QueryLanguage::builder().ignore_case(false).build();
    let term = language.parse_filter("P.age").unwrap();
    let extractor = FilterBuilder::new(&language, Some("people"), &[], None)
        .with_alias(Some("p"))
        .make_extractor(&term)
        .unwrap();
    assert_eq!(extractor, ValueExtractor::path(["P", "age"]));
}
