// tests/integration_tests.rs

use std::collections::HashMap;

use cohql::{Entry, QueryLanguage, Value, create_extractor, create_filter, unparse};

fn person(name: &str, age: i64, city: &str) -> Entry {
    let mut address = HashMap::new();
    address.insert("city".to_string(), Value::from(city));
    let mut fields = HashMap::new();
    fields.insert("name".to_string(), Value::from(name));
    fields.insert("age".to_string(), Value::Integer(age));
    fields.insert("address".to_string(), Value::Object(address));
    Entry::new(name.to_lowercase(), Value::Object(fields))
}

// ============================================================================
// Helpers over the default language
// ============================================================================

#[test]
fn test_create_filter_end_to_end() {
    let people = [
        person("Ann", 31, "Oslo"),
        person("Bob", 17, "Oslo"),
        person("Cid", 45, "Bergen"),
    ];
    let filter = create_filter(
        "getAddress().getCity() == ?1 and age >= 18",
        &[Value::from("Oslo")],
        None,
    )
    .unwrap();
    let names: Vec<Value> = people
        .iter()
        .filter(|p| filter.evaluate(p))
        .map(|p| p.value.property("name"))
        .collect();
    assert_eq!(names, vec![Value::from("Ann")]);
}

#[test]
fn test_create_extractor_end_to_end() {
    let extractor = create_extractor("address.city").unwrap();
    assert_eq!(extractor.extract(&person("Ann", 31, "Oslo")), Value::from("Oslo"));

    let key = create_extractor("key()").unwrap();
    assert_eq!(key.extract(&person("Ann", 31, "Oslo")), Value::from("ann"));
}

#[test]
fn test_filter_display_is_readable() {
    let filter = create_filter("age > 21 and name like 'J%'", &[], None).unwrap();
    assert_eq!(filter.to_string(), "(age > 21 && name like 'J%')");
}

// ============================================================================
// Unparse
// ============================================================================

#[test]
fn test_unparse_is_stable() {
    let language = QueryLanguage::default();
    for text in [
        "a.b == 'x' and not (c > 2 or d <= -3)",
        "x not in (1, 2) xor y between 1 and 2",
        "tags contains all ('a', 'b')",
        "select name, age from 'people' where age > 21",
        "update 'people' set age = age + 1 where name == 'Ann'",
        "drop cache 'people'",
    ] {
        let first = unparse(&language.parse_statement(text).unwrap());
        let second = unparse(&language.parse_statement(&first).unwrap());
        assert_eq!(first, second, "{}", text);
    }
}

#[test]
fn test_unparse_extended_literals() {
    let language = QueryLanguage::builder().extended(true).build();
    let term = language
        .parse_statement("insert into 'c' key 'k' value {'a': [1, 2]}")
        .unwrap();
    let reparsed = language.parse_statement(&unparse(&term)).unwrap();
    assert_eq!(reparsed, term);
}

// ============================================================================
// CLI check
// ============================================================================

#[cfg(feature = "cli")]
mod cli {
    use assert_matches::assert_matches;
    use cohql::cli::{CheckOptions, CheckResult, CliError, execute_check, parse_bindings};
    use serde_json::json;

    #[test]
    fn test_filter_over_json_array() {
        let options = CheckOptions {
            query: "age > ?1".to_string(),
            input: Some(r#"[{"name": "Ann", "age": 31}, {"name": "Bob", "age": 17}]"#.to_string()),
            bind: parse_bindings("[21]").unwrap(),
            ..CheckOptions::default()
        };
        assert_matches!(
            execute_check(&options),
            Ok(CheckResult::Success(output)) if output == json!([{"name": "Ann", "age": 31}])
        );
    }

    #[test]
    fn test_statements_over_json_caches() {
        let options = CheckOptions {
            query: "select name from people where age > 21".to_string(),
            input: Some(r#"{"people": {"a": {"name": "Ann", "age": 31}, "b": {"name": "Bob", "age": 17}}}"#.to_string()),
            sql: true,
            ..CheckOptions::default()
        };
        assert_matches!(
            execute_check(&options),
            Ok(CheckResult::Success(output)) if output == json!(["Ann"])
        );
    }

    #[test]
    fn test_script_results_are_listed() {
        let options = CheckOptions {
            query: "create cache c; insert into c key 1 value 'one'; select * from c".to_string(),
            sql: true,
            ..CheckOptions::default()
        };
        assert_matches!(
            execute_check(&options),
            Ok(CheckResult::Success(output))
                if output == json!(["cache 'c' ready", {"affected": 1}, ["one"]])
        );
    }

    #[test]
    fn test_syntax_only() {
        let options = CheckOptions {
            query: "a == (1".to_string(),
            syntax_only: true,
            ..CheckOptions::default()
        };
        assert!(execute_check(&options).is_err());

        let options = CheckOptions {
            query: "a == 1".to_string(),
            syntax_only: true,
            ..CheckOptions::default()
        };
        assert_matches!(execute_check(&options), Ok(CheckResult::SyntaxValid));
    }

    #[test]
    fn test_filter_needs_input() {
        let options = CheckOptions {
            query: "a == 1".to_string(),
            ..CheckOptions::default()
        };
        assert_matches!(execute_check(&options), Err(CliError::NoInput));
    }

    #[test]
    fn test_bindings_must_be_an_array() {
        assert_matches!(parse_bindings(r#"{"a": 1}"#), Err(CliError::InvalidInput(_)));
    }
}
