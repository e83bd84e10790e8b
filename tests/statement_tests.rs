// tests/statement_tests.rs

use assert_matches::assert_matches;
use cohql::error::{CompileError, ExecutionError, QueryError};
use cohql::{ExecutionContext, QueryLanguage, StatementResult, Value};

fn language() -> QueryLanguage {
    QueryLanguage::builder().extended(true).build()
}

fn run(ctx: &mut ExecutionContext, text: &str) -> StatementResult {
    let language = ctx.language().clone();
    language
        .execute(text, ctx)
        .unwrap_or_else(|e| panic!("{} failed: {}", text, e))
}

fn rows(ctx: &mut ExecutionContext, text: &str) -> Vec<Value> {
    match run(ctx, text) {
        StatementResult::Rows(rows) => rows,
        other => panic!("Expected rows from {}, got {:?}", text, other),
    }
}

fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(|s| Value::from(*s)).collect()
}

/// A `people` cache with three entries keyed by lower-case name.
fn people() -> ExecutionContext {
    let mut ctx = ExecutionContext::new(language());
    run(&mut ctx, "create cache people");
    for (key, name, age, dept) in [
        ("ann", "Ann", 31, "eng"),
        ("bob", "Bob", 25, "ops"),
        ("cid", "Cid", 40, "eng"),
    ] {
        run(
            &mut ctx,
            &format!(
                "insert into people key '{}' value {{ 'name': '{}', 'age': {}, 'dept': '{}' }}",
                key, name, age, dept
            ),
        );
    }
    ctx
}

// ============================================================================
// Select
// ============================================================================

#[test]
fn test_select_single_field_gives_bare_values() {
    let mut ctx = people();
    assert_eq!(
        rows(&mut ctx, "select name from people where age > 30"),
        strings(&["Ann", "Cid"])
    );
}

#[test]
fn test_select_several_fields_gives_arrays() {
    let mut ctx = people();
    assert_eq!(
        rows(&mut ctx, "select name, age from people where name == 'Bob'"),
        vec![Value::Array(vec![Value::from("Bob"), Value::Integer(25)])]
    );
}

#[test]
fn test_select_star_gives_values() {
    let mut ctx = people();
    let all = rows(&mut ctx, "select * from people");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].property("name"), Value::from("Ann"));
}

#[test]
fn test_select_with_alias() {
    let mut ctx = people();
    assert_eq!(
        rows(&mut ctx, "select p.name from people p where p.age < 30"),
        strings(&["Bob"])
    );
}

#[test]
fn test_select_keys() {
    let mut ctx = people();
    assert_eq!(
        rows(&mut ctx, "select key() from people where dept == 'eng'"),
        strings(&["ann", "cid"])
    );
}

#[test]
fn test_aggregates_without_group_by_give_one_row() {
    let mut ctx = people();
    assert_eq!(rows(&mut ctx, "select count() from people"), vec![Value::Integer(3)]);
    assert_eq!(
        rows(&mut ctx, "select long_max(age), long_min(age) from people"),
        vec![Value::Array(vec![Value::Integer(40), Value::Integer(25)])]
    );
}

#[test]
fn test_group_by() {
    let mut ctx = people();
    assert_eq!(
        rows(&mut ctx, "select dept, count(), long_sum(age) from people group by dept"),
        vec![
            Value::Array(vec![Value::from("eng"), Value::Integer(2), Value::Integer(71)]),
            Value::Array(vec![Value::from("ops"), Value::Integer(1), Value::Integer(25)]),
        ]
    );
}

#[test]
fn test_mixed_aggregates_need_group_by() {
    let result = language().prepare("select dept, count() from people", &[], None);
    assert_matches!(result, Err(QueryError::Compile(CompileError::InvalidOperand { .. })));
}

#[test]
fn test_distinct() {
    let mut ctx = people();
    assert_eq!(rows(&mut ctx, "select distinct dept from people"), strings(&["eng", "ops"]));
}

#[test]
fn test_bind_variables_in_where() {
    let mut ctx = people();
    let statement = language()
        .prepare("select name from people where age >= ?1", &[Value::Integer(40)], None)
        .unwrap();
    assert_eq!(
        statement.execute(&mut ctx).unwrap(),
        StatementResult::Rows(strings(&["Cid"]))
    );
}

// ============================================================================
// Insert, update, delete
// ============================================================================

#[test]
fn test_insert_without_key_uses_value() {
    let mut ctx = ExecutionContext::new(language());
    run(&mut ctx, "create cache numbers");
    assert_eq!(run(&mut ctx, "insert into numbers value 5"), StatementResult::Affected(1));
    assert_eq!(rows(&mut ctx, "select key() from numbers"), vec![Value::Integer(5)]);
}

#[test]
fn test_insert_replaces_existing_key() {
    let mut ctx = people();
    run(&mut ctx, "insert into people key 'bob' value { 'name': 'Robert', 'age': 26 }");
    assert_eq!(rows(&mut ctx, "select count() from people"), vec![Value::Integer(3)]);
    assert_eq!(
        rows(&mut ctx, "select name from people where key() == 'bob'"),
        strings(&["Robert"])
    );
}

#[test]
fn test_update_reads_old_values() {
    let mut ctx = people();
    assert_eq!(
        run(&mut ctx, "update people set age = age + 1, older = age where dept == 'eng'"),
        StatementResult::Affected(2)
    );
    assert_eq!(
        rows(&mut ctx, "select age, older from people where name == 'Ann'"),
        vec![Value::Array(vec![Value::Integer(32), Value::Integer(31)])]
    );
}

#[test]
fn test_update_nested_property() {
    let mut ctx = people();
    run(&mut ctx, "update people set address.city = 'Oslo' where name == 'Bob'");
    assert_eq!(
        rows(&mut ctx, "select name from people where address.city == 'Oslo'"),
        strings(&["Bob"])
    );
}

#[test]
fn test_update_requires_assignments() {
    let result = language().prepare("update people set age > 1", &[], None);
    assert_matches!(result, Err(QueryError::Compile(CompileError::InvalidOperand { .. })));
}

#[test]
fn test_delete() {
    let mut ctx = people();
    assert_eq!(
        run(&mut ctx, "delete from people where age < 35"),
        StatementResult::Affected(2)
    );
    assert_eq!(rows(&mut ctx, "select name from people"), strings(&["Cid"]));
}

// ============================================================================
// Cache and index administration
// ============================================================================

#[test]
fn test_create_cache_is_idempotent() {
    let mut ctx = people();
    run(&mut ctx, "ensure cache people");
    assert_eq!(rows(&mut ctx, "select count() from people"), vec![Value::Integer(3)]);
}

#[test]
fn test_truncate_and_drop() {
    let mut ctx = people();
    assert_eq!(run(&mut ctx, "truncate cache people"), StatementResult::Affected(3));
    assert!(rows(&mut ctx, "select * from people").is_empty());

    run(&mut ctx, "drop cache people");
    let language = language();
    assert_matches!(
        language.execute("select * from people", &mut ctx),
        Err(QueryError::Execution(ExecutionError::NoSuchCache(name))) if name == "people"
    );
}

#[test]
fn test_missing_cache() {
    let mut ctx = ExecutionContext::new(language());
    let language = language();
    for text in ["drop cache nothing", "truncate cache nothing", "delete from nothing"] {
        assert_matches!(
            language.execute(text, &mut ctx),
            Err(QueryError::Execution(ExecutionError::NoSuchCache(_))),
            "{}",
            text
        );
    }
}

#[test]
fn test_indexes() {
    let mut ctx = people();
    run(&mut ctx, "create index on people age");
    run(&mut ctx, "create index on people age");
    assert_eq!(ctx.store().cache("people").unwrap().indexes().len(), 1);

    run(&mut ctx, "drop index people age");
    assert!(ctx.store().cache("people").unwrap().indexes().is_empty());

    assert_matches!(
        language().prepare("create index on people 1", &[], None),
        Err(QueryError::Compile(CompileError::ExtractorNotSpecified(_)))
    );
}

// ============================================================================
// Explain and trace
// ============================================================================

#[test]
fn test_explain_describes_without_running() {
    let mut ctx = people();
    let result = run(&mut ctx, "explain plan for delete from people where age > 1");
    assert_matches!(result, StatementResult::Message(plan) if plan.starts_with("delete from 'people'"));
    assert_eq!(rows(&mut ctx, "select count() from people"), vec![Value::Integer(3)]);
}

#[test]
fn test_trace_runs_and_times() {
    let mut ctx = people();
    let result = run(&mut ctx, "trace select name from people where age == 25");
    let StatementResult::Batch(parts) = result else {
        panic!("Expected a batch from trace");
    };
    assert_eq!(parts[0], StatementResult::Rows(strings(&["Bob"])));
    assert_matches!(&parts[1], StatementResult::Message(m) if m.contains("executed in"));
}

#[test]
fn test_nested_explain_is_rejected() {
    assert_matches!(
        language().prepare("explain plan for trace select * from people", &[], None),
        Err(QueryError::Compile(CompileError::UnknownStatement(_)))
    );
}

#[test]
fn test_removed_statement_is_unknown() {
    let language = QueryLanguage::builder()
        .remove_statement(cohql::sql::functor::TRUNCATE)
        .build();
    assert_matches!(
        language.prepare("truncate cache people", &[], None),
        Err(QueryError::Compile(CompileError::UnknownStatement(_)))
    );
}
