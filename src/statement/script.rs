use std::{fs, time::Instant};

use log::{info, warn};

use crate::{
    error::{CompileError, ExecutionError},
    filter_builder::NamedBindings,
    language::QueryLanguage,
    sql::functor,
    term::NodeTerm,
    value::Value,
};

use super::{ExecutionContext, Statement, StatementBuilder, StatementResult, clause_text};

/// `explain plan for <statement>` describes; `trace <statement>` runs and times.
#[derive(Debug)]
pub struct ExplainStatement {
    inner: Box<dyn Statement>,
    trace: bool,
}

impl Statement for ExplainStatement {
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError> {
        if !self.trace {
            return Ok(StatementResult::Message(self.inner.description()));
        }
        let started = Instant::now();
        let result = self.inner.execute(ctx)?;
        let elapsed = started.elapsed();
        info!("trace: {} took {:?}", self.inner.description(), elapsed);
        Ok(StatementResult::Batch(vec![
            result,
            StatementResult::Message(format!("{} executed in {:?}", self.inner.description(), elapsed)),
        ]))
    }

    fn description(&self) -> String {
        let verb = if self.trace { "trace" } else { "explain plan for" };
        format!("{} {}", verb, self.inner.description())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExplainStatementBuilder;

impl StatementBuilder for ExplainStatementBuilder {
    fn realize(
        &self,
        language: &QueryLanguage,
        term: &NodeTerm,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError> {
        let trace = match term.functor() {
            functor::EXPLAIN => false,
            functor::TRACE => true,
            other => return Err(CompileError::UnknownStatement(other.to_string())),
        };
        let plan = term
            .find_attribute(functor::PLAN)
            .ok_or_else(|| CompileError::MalformedTerm(format!("{} has no statement", term.functor())))?;
        if plan.is_functor(functor::EXPLAIN) || plan.is_functor(functor::TRACE) {
            return Err(CompileError::UnknownStatement(format!("nested {}", plan.functor())));
        }

        Ok(Box::new(ExplainStatement {
            inner: language.prepare_statement(plan, bind_vars, named)?,
            trace,
        }))
    }
}

/// Runs every statement of a script file against the current context.
#[derive(Debug)]
pub struct SourceStatement {
    path: String,
}

impl SourceStatement {
    fn run(&self, text: &str, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError> {
        let language = ctx.language().clone();
        let terms = language
            .parse_statements(text)
            .map_err(|e| ExecutionError::Failed(format!("{}: {}", self.path, e)))?;

        let mut results = Vec::with_capacity(terms.len());
        for (i, term) in terms.iter().enumerate() {
            let outcome = language
                .prepare_statement(term, &[], None)
                .map_err(|e| ExecutionError::Failed(e.to_string()))
                .and_then(|statement| statement.execute(ctx));
            match outcome {
                Ok(result) => results.push(result),
                Err(e) if ctx.stop_on_error() => {
                    return Err(ExecutionError::Failed(format!(
                        "{}: statement {} failed: {}",
                        self.path,
                        i + 1,
                        e
                    )));
                }
                Err(e) => {
                    warn!("{}: statement {} failed: {}", self.path, i + 1, e);
                    results.push(StatementResult::Message(format!("error: {}", e)));
                }
            }
        }
        Ok(StatementResult::Batch(results))
    }
}

impl Statement for SourceStatement {
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError> {
        let text = fs::read_to_string(&self.path).map_err(|e| ExecutionError::Source {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        info!("sourcing {}", self.path);
        self.run(&text, ctx)
    }

    fn description(&self) -> String {
        format!("source from file '{}'", self.path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SourceStatementBuilder;

impl StatementBuilder for SourceStatementBuilder {
    fn realize(
        &self,
        _language: &QueryLanguage,
        term: &NodeTerm,
        _bind_vars: &[Value],
        _named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError> {
        let path = clause_text(term, functor::FILE)
            .ok_or_else(|| CompileError::MalformedTerm(format!("{} has no file", term.functor())))?;
        Ok(Box::new(SourceStatement { path }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_runs_script_in_order() {
        let mut ctx = ExecutionContext::default();
        let source = SourceStatement { path: "inline".to_string() };
        let result = source
            .run(
                "create cache 'c'; insert into 'c' key 1 value 10; select * from 'c'",
                &mut ctx,
            )
            .unwrap();
        let StatementResult::Batch(results) = result else {
            panic!("expected a batch, got {:?}", result);
        };
        assert_eq!(results.len(), 3);
        assert_eq!(results[2], StatementResult::Rows(vec![Value::Integer(10)]));
    }

    #[test]
    fn test_source_continues_when_not_stopping_on_error() {
        let mut ctx = ExecutionContext::default().with_stop_on_error(false);
        let source = SourceStatement { path: "inline".to_string() };
        let result = source
            .run("select * from 'missing'; create cache 'c'", &mut ctx)
            .unwrap();
        assert!(matches!(result, StatementResult::Batch(ref r) if r.len() == 2));
        assert!(ctx.store().contains("c"));
    }

    #[test]
    fn test_source_stops_on_error() {
        let mut ctx = ExecutionContext::default();
        let source = SourceStatement { path: "inline".to_string() };
        let err = source
            .run("select * from 'missing'; create cache 'c'", &mut ctx)
            .unwrap_err();
        assert!(err.to_string().contains("statement 1"));
        assert!(!ctx.store().contains("c"));
    }

    #[test]
    fn test_missing_file_is_a_source_error() {
        let mut ctx = ExecutionContext::default();
        let source = SourceStatement {
            path: "/nonexistent/cohql/script.cql".to_string(),
        };
        assert!(matches!(source.execute(&mut ctx), Err(ExecutionError::Source { .. })));
    }
}
