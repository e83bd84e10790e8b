use log::{debug, info};

use crate::{
    error::{CompileError, ExecutionError},
    extractor::ValueExtractor,
    filter_builder::NamedBindings,
    language::QueryLanguage,
    sql::functor,
    term::NodeTerm,
    value::Value,
};

use super::{ExecutionContext, Statement, StatementBuilder, StatementResult, builder, cache_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheAction {
    Create,
    Drop,
    Truncate,
}

#[derive(Debug)]
pub struct CacheStatement {
    action: CacheAction,
    cache: String,
}

impl Statement for CacheStatement {
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError> {
        let store = ctx.store_mut();
        match self.action {
            CacheAction::Create => {
                let created = store.ensure_cache(&self.cache);
                if !created {
                    debug!("cache '{}' already exists", self.cache);
                }
                Ok(StatementResult::Message(format!("cache '{}' ready", self.cache)))
            }
            CacheAction::Drop => {
                let dropped = store.drop_cache(&self.cache)?;
                info!("dropped cache '{}' with {} entries", self.cache, dropped.len());
                Ok(StatementResult::Message(format!("cache '{}' dropped", self.cache)))
            }
            CacheAction::Truncate => {
                let removed = store.cache_mut(&self.cache)?.truncate();
                Ok(StatementResult::Affected(removed))
            }
        }
    }

    fn description(&self) -> String {
        let verb = match self.action {
            CacheAction::Create => "create cache",
            CacheAction::Drop => "drop cache",
            CacheAction::Truncate => "truncate cache",
        };
        format!("{} '{}'", verb, self.cache)
    }
}

/// Builds `create cache`, `drop cache` and `truncate cache`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStatementBuilder;

impl StatementBuilder for CacheStatementBuilder {
    fn realize(
        &self,
        _language: &QueryLanguage,
        term: &NodeTerm,
        _bind_vars: &[Value],
        _named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError> {
        let action = match term.functor() {
            functor::CREATE_CACHE => CacheAction::Create,
            functor::DROP_CACHE => CacheAction::Drop,
            functor::TRUNCATE => CacheAction::Truncate,
            other => return Err(CompileError::UnknownStatement(other.to_string())),
        };
        Ok(Box::new(CacheStatement {
            action,
            cache: cache_name(term)?,
        }))
    }
}

#[derive(Debug)]
pub struct IndexStatement {
    create: bool,
    cache: String,
    extractor: ValueExtractor,
}

impl Statement for IndexStatement {
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError> {
        let cache = ctx.store_mut().cache_mut(&self.cache)?;
        let message = if self.create {
            if cache.add_index(self.extractor.clone()) {
                format!("index {} created on '{}'", self.extractor, self.cache)
            } else {
                format!("index {} already exists on '{}'", self.extractor, self.cache)
            }
        } else if cache.remove_index(&self.extractor) {
            format!("index {} dropped from '{}'", self.extractor, self.cache)
        } else {
            format!("no index {} on '{}'", self.extractor, self.cache)
        };
        Ok(StatementResult::Message(message))
    }

    fn description(&self) -> String {
        let verb = if self.create { "create index on" } else { "drop index on" };
        format!("{} '{}' {}", verb, self.cache, self.extractor)
    }
}

/// Builds `create index` and `drop index`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStatementBuilder;

impl StatementBuilder for IndexStatementBuilder {
    fn realize(
        &self,
        language: &QueryLanguage,
        term: &NodeTerm,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError> {
        let create = match term.functor() {
            functor::CREATE_INDEX => true,
            functor::DROP_INDEX => false,
            other => return Err(CompileError::UnknownStatement(other.to_string())),
        };
        let cache = cache_name(term)?;
        let extractor = term
            .find_attribute(functor::EXTRACTOR)
            .ok_or(CompileError::ExtractorNotSpecified("an empty index clause"))?;
        let extractor = builder(language, term, &cache, bind_vars, named).make_extractor(extractor)?;
        if extractor.is_constant() {
            return Err(CompileError::ExtractorNotSpecified("a constant"));
        }

        Ok(Box::new(IndexStatement { create, cache, extractor }))
    }
}
