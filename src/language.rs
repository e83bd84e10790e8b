//! The query language facade.
//!
//! A [`QueryLanguage`] is an immutable configuration: three token tables
//! (filters, SQL, extended SQL), the operator, function and constructor
//! registries, the statement builders and the extractor builder chain. It is
//! assembled once by a [`LanguageBuilder`]; customising an existing language
//! goes through [`QueryLanguage::to_builder`] and produces a new value.
//!
//! ```
//! use cohql::QueryLanguage;
//!
//! let language = QueryLanguage::default();
//! let filter = language.filter("age > 21 and name like 'J%'", &[], None).unwrap();
//! assert_eq!(filter.to_string(), "(age > 21 && name like 'J%')");
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use log::debug;

use crate::{
    error::{CompileError, ParseError, QueryError},
    extractor::{ChainedExtractorBuilder, ExtractorBuilder, UniversalExtractorBuilder, ValueExtractor},
    filter::Filter,
    filter_builder::{FilterBuilder, NamedBindings},
    function::{self, Constructor, Function},
    operator::{self, BaseOperator},
    parser::OpParser,
    scanner::OpScanner,
    sql::{self, StatementKind},
    statement::{self, ExecutionContext, Statement, StatementBuilder, StatementResult},
    term::{AtomicTerm, Term, functor},
    token::{OpToken, PeekBranch, precedence},
    token_table::TokenTable,
    value::Value,
};

#[derive(Clone)]
pub struct QueryLanguage {
    inner: Arc<Config>,
}

struct Config {
    ignore_case: bool,
    strict: bool,
    extended: bool,
    filter_tokens: TokenTable,
    sql_tokens: TokenTable,
    extended_tokens: TokenTable,
    operators: HashMap<String, Arc<dyn BaseOperator>>,
    functions: HashMap<String, Function>,
    constructors: HashMap<String, Constructor>,
    statements: HashMap<String, Arc<dyn StatementBuilder>>,
    extractor_builder: ChainedExtractorBuilder,
    /// Registration order of everything above, kept for `to_builder`
    source: LanguageBuilder,
}

impl QueryLanguage {
    /// A builder seeded with the standard operators, functions,
    /// constructors and statements.
    pub fn builder() -> LanguageBuilder {
        LanguageBuilder::standard()
    }

    /// A builder seeded with this language's configuration.
    pub fn to_builder(&self) -> LanguageBuilder {
        self.inner.source.clone()
    }

    /// Case folding used for every key of this language.
    fn fold(&self, name: &str) -> String {
        fold(self.inner.ignore_case, name)
    }

    pub fn ignores_case(&self) -> bool {
        self.inner.ignore_case
    }

    pub fn is_strict(&self) -> bool {
        self.inner.strict
    }

    pub fn is_extended(&self) -> bool {
        self.inner.extended
    }

    pub fn filter_tokens(&self) -> &TokenTable {
        &self.inner.filter_tokens
    }

    pub fn sql_tokens(&self) -> &TokenTable {
        &self.inner.sql_tokens
    }

    pub fn extended_sql_tokens(&self) -> &TokenTable {
        &self.inner.extended_tokens
    }

    /// The table statements are parsed with: extended when the language
    /// was built with extended literals, standard SQL otherwise.
    pub fn statement_tokens(&self) -> &TokenTable {
        if self.inner.extended {
            &self.inner.extended_tokens
        } else {
            &self.inner.sql_tokens
        }
    }

    pub fn operator(&self, symbol: &str) -> Option<&Arc<dyn BaseOperator>> {
        self.inner.operators.get(&self.fold(symbol))
    }

    /// Registered operator symbols, sorted.
    pub fn operators(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.inner.operators.values().map(|op| op.symbol()).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Key a function name is stored under.
    pub fn function_key(&self, name: &str) -> String {
        self.fold(name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.inner.functions.get(&self.function_key(name))
    }

    /// Whether `name` refers to the function registered as `function`.
    pub fn is_function(&self, name: &str, function: &str) -> bool {
        self.function_key(name) == self.function_key(function) && self.function(name).is_some()
    }

    pub fn constructor(&self, type_name: &str) -> Option<&Constructor> {
        self.inner.constructors.get(&self.fold(type_name))
    }

    pub fn statement_builder(&self, functor: &str) -> Option<&Arc<dyn StatementBuilder>> {
        self.inner.statements.get(functor)
    }

    pub fn extractor_builder(&self) -> &dyn ExtractorBuilder {
        &self.inner.extractor_builder
    }

    fn parse_with(&self, table: &TokenTable, text: &str) -> Result<Term, ParseError> {
        let scanner = OpScanner::with_strictness(table, text, self.inner.strict)?;
        OpParser::new(scanner).parse()
    }

    /// Parses filter text into a term.
    pub fn parse_filter(&self, text: &str) -> Result<Term, ParseError> {
        self.parse_with(&self.inner.filter_tokens, text)
    }

    /// Parses one statement.
    pub fn parse_statement(&self, text: &str) -> Result<Term, ParseError> {
        self.parse_with(self.statement_tokens(), text)
    }

    /// Parses a `;`-separated script.
    pub fn parse_statements(&self, text: &str) -> Result<Vec<Term>, ParseError> {
        let scanner = OpScanner::with_strictness(self.statement_tokens(), text, self.inner.strict)?;
        OpParser::new(scanner).parse_all()
    }

    /// Compiles filter text.
    pub fn filter(
        &self,
        text: &str,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Filter, QueryError> {
        let term = self.parse_filter(text)?;
        Ok(FilterBuilder::new(self, None, bind_vars, named).make_filter(&term)?)
    }

    /// Compiles extractor text such as `address.city`.
    pub fn extractor(&self, text: &str) -> Result<ValueExtractor, QueryError> {
        let term = self.parse_filter(text)?;
        Ok(FilterBuilder::for_language(self).make_extractor(&term)?)
    }

    /// Builds the statement for a parsed statement term.
    pub fn prepare_statement(
        &self,
        term: &Term,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError> {
        let node = term
            .as_node()
            .ok_or_else(|| CompileError::UnknownStatement(term.to_string()))?;
        let builder = self
            .statement_builder(node.functor())
            .ok_or_else(|| CompileError::UnknownStatement(node.functor().to_string()))?;
        let statement = builder.realize(self, node, bind_vars, named)?;
        debug!("prepared: {}", statement.description());
        Ok(statement)
    }

    pub fn prepare(
        &self,
        text: &str,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, QueryError> {
        let term = self.parse_statement(text)?;
        Ok(self.prepare_statement(&term, bind_vars, named)?)
    }

    /// Parses, prepares and runs one statement.
    pub fn execute(&self, text: &str, ctx: &mut ExecutionContext) -> Result<StatementResult, QueryError> {
        let statement = self.prepare(text, &[], None)?;
        Ok(statement.execute(ctx)?)
    }
}

impl Default for QueryLanguage {
    fn default() -> Self {
        QueryLanguage::builder().build()
    }
}

impl fmt::Debug for QueryLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&String> = self.inner.functions.keys().collect();
        functions.sort();
        f.debug_struct("QueryLanguage")
            .field("ignore_case", &self.inner.ignore_case)
            .field("strict", &self.inner.strict)
            .field("extended", &self.inner.extended)
            .field("operators", &self.operators())
            .field("functions", &functions)
            .finish()
    }
}

fn fold(ignore_case: bool, name: &str) -> String {
    if ignore_case {
        name.to_lowercase()
    } else {
        name.to_string()
    }
}

/// Assembles a [`QueryLanguage`].
///
/// Later registrations under the same name replace earlier ones.
#[derive(Clone)]
pub struct LanguageBuilder {
    ignore_case: bool,
    strict: bool,
    extended: bool,
    operators: Vec<Arc<dyn BaseOperator>>,
    functions: Vec<(String, Function)>,
    constructors: Vec<(String, Constructor)>,
    statements: Vec<(String, Arc<dyn StatementBuilder>)>,
    extractor_builders: Vec<Arc<dyn ExtractorBuilder>>,
}

impl LanguageBuilder {
    /// A builder with nothing registered.
    pub fn empty() -> Self {
        LanguageBuilder {
            ignore_case: true,
            strict: false,
            extended: false,
            operators: Vec::new(),
            functions: Vec::new(),
            constructors: Vec::new(),
            statements: Vec::new(),
            extractor_builders: Vec::new(),
        }
    }

    fn standard() -> Self {
        let mut builder = LanguageBuilder::empty();
        builder.operators = operator::standard_operators();
        builder.functions = function::standard_functions()
            .into_iter()
            .map(|(name, f)| (name.to_string(), f))
            .collect();
        builder.constructors = function::standard_constructors()
            .into_iter()
            .map(|(name, c)| (name.to_string(), c))
            .collect();
        builder.statements = statement::standard_builders()
            .into_iter()
            .map(|(name, s)| (name.to_string(), s))
            .collect();
        builder
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Reject unknown operator symbols instead of reading them as identifiers.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse statements with `[...]`, `{...}` and `k: v` literals.
    pub fn extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    pub fn operator(mut self, operator: impl BaseOperator + 'static) -> Self {
        self.operators.push(Arc::new(operator));
        self
    }

    pub fn remove_operator(mut self, symbol: &str) -> Self {
        self.operators.retain(|op| op.symbol() != symbol);
        self
    }

    pub fn function(mut self, name: impl Into<String>, function: Function) -> Self {
        self.functions.push((name.into(), function));
        self
    }

    pub fn remove_function(mut self, name: &str) -> Self {
        let name = fold(self.ignore_case, name);
        let ignore_case = self.ignore_case;
        self.functions.retain(|(n, _)| fold(ignore_case, n) != name);
        self
    }

    pub fn constructor(mut self, type_name: impl Into<String>, constructor: Constructor) -> Self {
        self.constructors.push((type_name.into(), constructor));
        self
    }

    pub fn statement(mut self, functor: impl Into<String>, builder: impl StatementBuilder + 'static) -> Self {
        self.statements.push((functor.into(), Arc::new(builder)));
        self
    }

    pub fn remove_statement(mut self, functor: &str) -> Self {
        self.statements.retain(|(f, _)| f != functor);
        self
    }

    /// Adds an extractor builder ahead of those already registered; the
    /// universal builder always runs last.
    pub fn extractor_builder(mut self, builder: impl ExtractorBuilder + 'static) -> Self {
        self.extractor_builders.insert(0, Arc::new(builder));
        self
    }

    pub fn build(self) -> QueryLanguage {
        let ignore_case = self.ignore_case;

        let mut filter_tokens = common_table(ignore_case);
        for op in &self.operators {
            op.add_to_token_table(&mut filter_tokens);
        }
        let sql_tokens = sql_table(filter_tokens.clone());
        let extended_tokens = extended_table(sql_tokens.clone());

        let operators = self
            .operators
            .iter()
            .map(|op| (fold(ignore_case, op.symbol()), op.clone()))
            .collect();
        let functions = self
            .functions
            .iter()
            .map(|(name, f)| (fold(ignore_case, name), f.clone()))
            .collect();
        let constructors = self
            .constructors
            .iter()
            .map(|(name, c)| (fold(ignore_case, name), c.clone()))
            .collect();
        let statements = self.statements.iter().cloned().collect();

        let mut extractor_builder = ChainedExtractorBuilder::new(self.extractor_builders.clone());
        extractor_builder.push(Arc::new(UniversalExtractorBuilder));

        debug!(
            "built language: ignore_case={} strict={} extended={} operators={}",
            ignore_case,
            self.strict,
            self.extended,
            self.operators.len()
        );

        QueryLanguage {
            inner: Arc::new(Config {
                ignore_case,
                strict: self.strict,
                extended: self.extended,
                filter_tokens,
                sql_tokens,
                extended_tokens,
                operators,
                functions,
                constructors,
                statements,
                extractor_builder,
                source: self,
            }),
        }
    }
}

impl Default for LanguageBuilder {
    fn default() -> Self {
        LanguageBuilder::standard()
    }
}

impl fmt::Debug for LanguageBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageBuilder")
            .field("ignore_case", &self.ignore_case)
            .field("strict", &self.strict)
            .field("extended", &self.extended)
            .field("operators", &self.operators)
            .field("extractor_builders", &self.extractor_builders)
            .finish_non_exhaustive()
    }
}

/// Tokens shared by every table: grouping, paths, bindings, unary
/// operators and literal words.
fn common_table(ignore_case: bool) -> TokenTable {
    let mut table = TokenTable::new(Some(functor::IDENTIFIER), Some(functor::LITERAL), ignore_case);

    table.add_token(OpToken::paren(
        "(",
        precedence::PARENTHESES,
        Some(functor::CALL),
        Some(functor::LIST),
    ));
    table.add_token(OpToken::path(".", precedence::PARENTHESES, functor::DEREF));
    table.add_token(OpToken::punctuation(","));
    table.add_token(OpToken::end_of_statement());

    table.add_token(OpToken::infix_right("**", precedence::EXPONENT, functor::BINARY_OPERATOR));
    table.add_token(OpToken::not("!", precedence::UNARY, functor::UNARY_OPERATOR));
    table.alias("not", "!");
    table.add_token(OpToken::prefix("new", precedence::UNARY, functor::UNARY_OPERATOR));
    table.add_token(OpToken::prefix("~", precedence::UNARY, functor::UNARY_OPERATOR));
    table.add_token(OpToken::prefix("?", precedence::UNARY, functor::BINDING));
    table.add_token(OpToken::prefix(":", precedence::UNARY, functor::BINDING));

    for (word, atom) in [
        ("true", AtomicTerm::boolean(true)),
        ("false", AtomicTerm::boolean(false)),
        ("null", AtomicTerm::null()),
        ("nan", AtomicTerm::double(f64::NAN)),
        ("infinity", AtomicTerm::double(f64::INFINITY)),
    ] {
        table.add_token_as(word, OpToken::literal(atom, Some(functor::LITERAL)));
    }
    table
}

fn sql_table(mut table: TokenTable) -> TokenTable {
    for keyword in sql::KEYWORDS {
        table.add_token(OpToken::keyword(*keyword));
    }
    for (word, kind) in [
        ("select", StatementKind::Select),
        ("delete", StatementKind::Delete),
        ("update", StatementKind::Update),
        ("insert", StatementKind::Insert),
        ("truncate", StatementKind::Truncate),
        ("explain", StatementKind::Explain),
        ("trace", StatementKind::Trace),
        ("source", StatementKind::Source),
        ("@", StatementKind::Source),
    ] {
        table.add_token(OpToken::statement(word, kind));
    }

    let branch = |keyword: &str, id: &str, kind| PeekBranch {
        keyword: keyword.to_string(),
        token: Arc::new(OpToken::statement(id, kind)),
    };
    table.add_token(OpToken::peek(
        "create",
        vec![
            branch("cache", "create cache", StatementKind::CreateCache),
            branch("index", "create index", StatementKind::CreateIndex),
        ],
    ));
    table.alias("ensure", "create");
    table.add_token(OpToken::peek(
        "drop",
        vec![
            branch("cache", "drop cache", StatementKind::DropCache),
            branch("index", "drop index", StatementKind::DropIndex),
        ],
    ));
    table
}

fn extended_table(mut table: TokenTable) -> TokenTable {
    table.add_token(OpToken::list_literal("[", precedence::PARENTHESES, functor::LIST_LITERAL));
    table.add_token(OpToken::curly("{", precedence::PARENTHESES));
    table.add_token(OpToken::colon(":", precedence::PARENTHESES));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::CustomOperator;

    #[test]
    fn test_default_language_is_lenient_and_case_insensitive() {
        let language = QueryLanguage::default();
        assert!(language.ignores_case());
        assert!(!language.is_strict());
        assert!(language.filter_tokens().contains("AND"));
        assert!(language.function("COUNT").is_some());
    }

    #[test]
    fn test_extended_literals_only_in_extended_table() {
        let language = QueryLanguage::default();
        assert!(!language.sql_tokens().contains("["));
        assert!(language.extended_sql_tokens().contains("["));
        assert!(!language.filter_tokens().contains("select"));
        assert!(language.sql_tokens().contains("select"));
    }

    #[test]
    fn test_to_builder_leaves_source_untouched() {
        let language = QueryLanguage::default();
        let custom = language
            .to_builder()
            .operator(CustomOperator::new("~=", precedence::RELATIONAL, |a, b| {
                a.as_string().eq_ignore_ascii_case(&b.as_string())
            }))
            .build();
        assert!(custom.operator("~=").is_some());
        assert!(custom.filter_tokens().contains("~="));
        assert!(language.operator("~=").is_none());
        assert!(!language.filter_tokens().contains("~="));
    }

    #[test]
    fn test_removed_function_is_no_longer_callable() {
        let language = QueryLanguage::builder().remove_function("concat").build();
        assert!(language.function("concat").is_none());
        assert!(language.function("key").is_some());
    }

    #[test]
    fn test_case_sensitive_language_keeps_case() {
        let language = QueryLanguage::builder().ignore_case(false).build();
        assert!(language.function("count").is_some());
        assert!(language.function("COUNT").is_none());
        assert!(!language.filter_tokens().contains("AND"));

        let unchanged = QueryLanguage::builder()
            .ignore_case(false)
            .remove_function("COUNT")
            .build();
        assert!(unchanged.function("count").is_some());

        let removed = QueryLanguage::builder().remove_function("COUNT").build();
        assert!(removed.function("count").is_none());
    }
}
