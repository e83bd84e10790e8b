//! One-call helpers over the default language.

use std::sync::OnceLock;

use crate::{
    error::QueryError,
    extractor::ValueExtractor,
    filter::Filter,
    filter_builder::NamedBindings,
    language::QueryLanguage,
    value::Value,
};

fn default_language() -> &'static QueryLanguage {
    static LANGUAGE: OnceLock<QueryLanguage> = OnceLock::new();
    LANGUAGE.get_or_init(QueryLanguage::default)
}

/// Compiles `text` into a filter with the default language.
///
/// ```
/// use cohql::{Entry, Value, create_filter};
///
/// let filter = create_filter("age >= ?1", &[Value::Integer(21)], None).unwrap();
/// let mut person = std::collections::HashMap::new();
/// person.insert("age".to_string(), Value::Integer(30));
/// assert!(filter.evaluate(&Entry::new(1, Value::Object(person))));
/// ```
pub fn create_filter(
    text: &str,
    bind_vars: &[Value],
    named: Option<&NamedBindings>,
) -> Result<Filter, QueryError> {
    default_language().filter(text, bind_vars, named)
}

/// Compiles `text` into an extractor with the default language.
pub fn create_extractor(text: &str) -> Result<ValueExtractor, QueryError> {
    default_language().extractor(text)
}
