//! Validate and run cohql filters and statements against JSON input

use log::debug;

use super::{CliError, json_to_value, result_to_json, value_to_json};
use crate::{
    Entry, QueryLanguage, Value,
    filter_builder::NamedBindings,
    statement::{ExecutionContext, StatementResult},
    term::Term,
};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The filter, or the statements when `sql` is set
    pub query: String,
    /// JSON input string
    pub input: Option<String>,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
    /// Treat the query as `;`-separated SQL statements
    pub sql: bool,
    /// Enable `[...]`, `{...}` and `k: v` literals
    pub extended: bool,
    /// Reject unknown operator symbols
    pub strict: bool,
    /// Values for `?1`, `?2`, ...
    pub bind: Vec<Value>,
    /// Values for `:name`
    pub named: NamedBindings,
}

impl CheckOptions {
    fn language(&self) -> QueryLanguage {
        QueryLanguage::builder()
            .extended(self.extended)
            .strict(self.strict)
            .build()
    }
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Query executed successfully with JSON output
    Success(serde_json::Value),
}

/// Parses the query without compiling it.
pub fn parse_term(options: &CheckOptions) -> Result<Vec<Term>, CliError> {
    let language = options.language();
    if options.sql {
        Ok(language.parse_statements(&options.query)?)
    } else {
        Ok(vec![language.parse_filter(&options.query)?])
    }
}

/// Execute a cohql check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let language = options.language();
    if options.sql {
        run_statements(&language, options)
    } else {
        run_filter(&language, options)
    }
}

fn run_filter(language: &QueryLanguage, options: &CheckOptions) -> Result<CheckResult, CliError> {
    if options.syntax_only {
        language.parse_filter(&options.query)?;
        return Ok(CheckResult::SyntaxValid);
    }
    let filter = language.filter(&options.query, &options.bind, Some(&options.named))?;
    debug!("filter: {}", filter);

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let input = entries(serde_json::from_str(json_str)?)?;

    let matching = input
        .into_iter()
        .filter(|entry| filter.evaluate(entry))
        .map(|entry| value_to_json(entry.value))
        .collect();
    Ok(CheckResult::Success(serde_json::Value::Array(matching)))
}

fn run_statements(language: &QueryLanguage, options: &CheckOptions) -> Result<CheckResult, CliError> {
    let terms = language.parse_statements(&options.query)?;
    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let mut ctx = ExecutionContext::new(language.clone());
    if let Some(json_str) = &options.input {
        load_caches(&mut ctx, serde_json::from_str(json_str)?)?;
    }

    let mut results = Vec::with_capacity(terms.len());
    for term in &terms {
        let statement = language.prepare_statement(term, &options.bind, Some(&options.named))?;
        results.push(statement.execute(&mut ctx)?);
    }

    let output = match <[StatementResult; 1]>::try_from(results) {
        Ok([single]) => result_to_json(single),
        Err(results) => serde_json::Value::Array(results.into_iter().map(result_to_json).collect()),
    };
    Ok(CheckResult::Success(output))
}

/// Entries from JSON input: an array is keyed by position, an object by
/// property name.
fn entries(json: serde_json::Value) -> Result<Vec<Entry>, CliError> {
    match json {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, item)| Entry::new(i as i64, json_to_value(item)))
            .collect()),
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| Entry::new(k, json_to_value(v)))
            .collect()),
        other => Err(CliError::InvalidInput(format!(
            "expected an array or an object of entries, found {}",
            other
        ))),
    }
}

/// Input for statements: `{"cache": <entries>, ...}`.
fn load_caches(ctx: &mut ExecutionContext, json: serde_json::Value) -> Result<(), CliError> {
    let serde_json::Value::Object(caches) = json else {
        return Err(CliError::InvalidInput("expected an object of caches".to_string()));
    };
    for (name, content) in caches {
        ctx.store_mut().ensure_cache(&name);
        let cache = ctx.store_mut().cache_mut(&name)?;
        for entry in entries(content)? {
            cache.put(entry.key, entry.value);
        }
    }
    Ok(())
}

/// Positional bind variables from a JSON array.
pub fn parse_bindings(json: &str) -> Result<Vec<Value>, CliError> {
    match serde_json::from_str::<serde_json::Value>(json)? {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(json_to_value).collect()),
        _ => Err(CliError::InvalidInput("--bind expects a JSON array".to_string())),
    }
}

/// Named bind variables from a JSON object.
pub fn parse_named_bindings(json: &str) -> Result<NamedBindings, CliError> {
    match serde_json::from_str::<serde_json::Value>(json)? {
        serde_json::Value::Object(map) => Ok(map.into_iter().map(|(k, v)| (k, json_to_value(v))).collect()),
        _ => Err(CliError::InvalidInput("--named expects a JSON object".to_string())),
    }
}
