//! Executable statements built from parsed SQL terms.
//!
//! A [`StatementBuilder`] is registered per statement functor
//! (`sqlSelectNode`, ...) and turns a parsed term into a [`Statement`], which
//! runs against an [`ExecutionContext`].

mod admin;
mod query;
mod script;
mod store;

use std::{fmt, sync::Arc};

use crate::{
    error::{CompileError, ExecutionError},
    filter::Filter,
    filter_builder::{FilterBuilder, NamedBindings},
    language::QueryLanguage,
    sql::functor,
    term::{AtomicTerm, NodeTerm, Term},
    value::Value,
};

pub use admin::{CacheStatementBuilder, IndexStatementBuilder};
pub use query::{DeleteStatementBuilder, InsertStatementBuilder, SelectStatementBuilder, UpdateStatementBuilder};
pub use script::{ExplainStatementBuilder, SourceStatementBuilder};
pub use store::{Cache, CacheStore, ExecutionContext};

#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// Rows produced by a query: a bare value per row for single-field
    /// selects, an array otherwise
    Rows(Vec<Value>),
    /// Number of entries changed
    Affected(usize),
    Message(String),
    /// One result per statement of a script
    Batch(Vec<StatementResult>),
}

impl fmt::Display for StatementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementResult::Rows(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", row)?;
                }
                Ok(())
            }
            StatementResult::Affected(n) => write!(f, "{} entries affected", n),
            StatementResult::Message(message) => f.write_str(message),
            StatementResult::Batch(results) => {
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", result)?;
                }
                Ok(())
            }
        }
    }
}

pub trait Statement: fmt::Debug {
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError>;

    /// Human-readable plan, used by `explain plan for`.
    fn description(&self) -> String;
}

pub trait StatementBuilder: Send + Sync + fmt::Debug {
    fn realize(
        &self,
        language: &QueryLanguage,
        term: &NodeTerm,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError>;
}

/// The statement builders every language starts with, keyed by functor.
pub fn standard_builders() -> Vec<(&'static str, Arc<dyn StatementBuilder>)> {
    vec![
        (functor::SELECT, Arc::new(SelectStatementBuilder)),
        (functor::DELETE, Arc::new(DeleteStatementBuilder)),
        (functor::UPDATE, Arc::new(UpdateStatementBuilder)),
        (functor::INSERT, Arc::new(InsertStatementBuilder)),
        (functor::CREATE_CACHE, Arc::new(CacheStatementBuilder)),
        (functor::DROP_CACHE, Arc::new(CacheStatementBuilder)),
        (functor::TRUNCATE, Arc::new(CacheStatementBuilder)),
        (functor::CREATE_INDEX, Arc::new(IndexStatementBuilder)),
        (functor::DROP_INDEX, Arc::new(IndexStatementBuilder)),
        (functor::EXPLAIN, Arc::new(ExplainStatementBuilder)),
        (functor::TRACE, Arc::new(ExplainStatementBuilder)),
        (functor::SOURCE, Arc::new(SourceStatementBuilder)),
    ]
}

/// Text of the single atom under clause `name`, e.g. the cache in `from('c')`.
fn clause_text(term: &NodeTerm, name: &str) -> Option<String> {
    term.find_attribute(name).and_then(Term::as_atom).map(|atom| atom.text())
}

fn cache_name(term: &NodeTerm) -> Result<String, CompileError> {
    clause_text(term, functor::FROM)
        .ok_or_else(|| CompileError::MalformedTerm(format!("{} has no cache name", term.functor())))
}

/// The `whereClause(...)` filter, or [`Filter::Always`] when absent.
fn where_filter(
    language: &QueryLanguage,
    term: &NodeTerm,
    cache: &str,
    bind_vars: &[Value],
    named: Option<&NamedBindings>,
) -> Result<Filter, CompileError> {
    match term.find_attribute(functor::WHERE) {
        Some(condition) => builder(language, term, cache, bind_vars, named).make_filter(condition),
        None => Ok(Filter::Always),
    }
}

/// Children of clause `name`, empty when the clause is absent.
fn clause_children<'t>(term: &'t NodeTerm, name: &str) -> &'t [Term] {
    term.find_child(name).map(NodeTerm::children).unwrap_or(&[])
}

/// Builder bound to the statement's cache, alias and bind variables.
fn builder<'a>(
    language: &'a QueryLanguage,
    term: &'a NodeTerm,
    cache: &'a str,
    bind_vars: &'a [Value],
    named: Option<&'a NamedBindings>,
) -> FilterBuilder<'a> {
    let alias = term
        .find_attribute(functor::ALIAS)
        .and_then(Term::as_atom)
        .and_then(|atom| match atom {
            AtomicTerm::Literal { value: Value::String(alias), .. } => Some(alias.as_str()),
            _ => None,
        });
    FilterBuilder::new(language, Some(cache), bind_vars, named).with_alias(alias)
}
