//! SQL statement grammar.
//!
//! Statement keywords are tokens whose nud reads a whole statement into a
//! term such as `sqlSelectNode(isDistinct(false), fieldList(...), from('c'), ...)`.
//! Clause order inside each node is fixed so builders can read them by name.

use crate::{
    error::ParseError,
    parser::OpParser,
    term::{AtomicTerm, Term},
    token::{OpTokenKind, precedence},
};

/// Functor names of statement nodes and their clauses.
pub mod functor {
    pub const SELECT: &str = "sqlSelectNode";
    pub const DELETE: &str = "sqlDeleteNode";
    pub const UPDATE: &str = "sqlUpdateNode";
    pub const INSERT: &str = "sqlInsertNode";
    pub const CREATE_CACHE: &str = "sqlCreateCacheNode";
    pub const CREATE_INDEX: &str = "sqlCreateIndexNode";
    pub const DROP_CACHE: &str = "sqlDropCacheNode";
    pub const DROP_INDEX: &str = "sqlDropIndexNode";
    pub const TRUNCATE: &str = "sqlTruncateCacheNode";
    pub const EXPLAIN: &str = "sqlExplainNode";
    pub const TRACE: &str = "sqlTraceNode";
    pub const SOURCE: &str = "sqlSourceNode";

    pub const IS_DISTINCT: &str = "isDistinct";
    pub const FIELD_LIST: &str = "fieldList";
    pub const FROM: &str = "from";
    pub const ALIAS: &str = "alias";
    pub const WHERE: &str = "whereClause";
    pub const GROUP_BY: &str = "groupBy";
    pub const SET_LIST: &str = "setList";
    pub const KEY: &str = "key";
    pub const VALUE: &str = "value";
    pub const EXTRACTOR: &str = "extractor";
    pub const PLAN: &str = "plan";
    pub const FILE: &str = "file";
}

/// Words reserved by the SQL token tables.
pub const KEYWORDS: &[&str] = &[
    "by", "cache", "check", "distinct", "escape", "file", "from", "group", "having", "index",
    "into", "key", "off", "on", "order", "plan", "service", "set", "show", "to", "value", "where",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Delete,
    Update,
    Insert,
    CreateCache,
    CreateIndex,
    DropCache,
    DropIndex,
    Truncate,
    Explain,
    Trace,
    Source,
}

/// Parses the statement introduced by a keyword the scanner has already
/// consumed.
pub fn parse_statement(kind: StatementKind, p: &mut OpParser<'_>) -> Result<Term, ParseError> {
    match kind {
        StatementKind::Select => parse_select(p),
        StatementKind::Delete => {
            p.scanner().advance_expect("from")?;
            let from = cache_clause(p)?;
            let alias = alias_clause(p)?;
            let filter = where_clause(p)?;
            Ok(Term::node(functor::DELETE, vec![from, alias, filter]))
        }
        StatementKind::Update => {
            let from = cache_clause(p)?;
            let alias = alias_clause(p)?;
            p.scanner().advance_expect("set")?;
            let assignments = comma_list(p)?;
            let filter = where_clause(p)?;
            Ok(Term::node(
                functor::UPDATE,
                vec![from, Term::node(functor::SET_LIST, assignments), alias, filter],
            ))
        }
        StatementKind::Insert => {
            p.scanner().advance_expect("into")?;
            let from = cache_clause(p)?;
            let key = if p.scanner().advance_when_matching("key")? {
                vec![p.expression(precedence::IDENTIFIER)?]
            } else {
                Vec::new()
            };
            p.scanner().advance_expect("value")?;
            let value = p.expression(precedence::IDENTIFIER)?;
            Ok(Term::node(
                functor::INSERT,
                vec![
                    from,
                    Term::node(functor::KEY, key),
                    Term::node(functor::VALUE, vec![value]),
                ],
            ))
        }
        StatementKind::CreateCache => {
            let from = cache_clause(p)?;
            Ok(Term::node(functor::CREATE_CACHE, vec![from]))
        }
        StatementKind::DropCache => {
            let from = cache_clause(p)?;
            Ok(Term::node(functor::DROP_CACHE, vec![from]))
        }
        StatementKind::CreateIndex => index_statement(functor::CREATE_INDEX, p),
        StatementKind::DropIndex => index_statement(functor::DROP_INDEX, p),
        StatementKind::Truncate => {
            p.scanner().advance_expect("cache")?;
            let from = cache_clause(p)?;
            Ok(Term::node(functor::TRUNCATE, vec![from]))
        }
        StatementKind::Explain => {
            p.scanner().advance_expect("plan")?;
            p.scanner().advance_expect("for")?;
            let plan = p.expression(precedence::IDENTIFIER)?;
            Ok(Term::node(functor::EXPLAIN, vec![Term::node(functor::PLAN, vec![plan])]))
        }
        StatementKind::Trace => {
            let plan = p.expression(precedence::IDENTIFIER)?;
            Ok(Term::node(functor::TRACE, vec![Term::node(functor::PLAN, vec![plan])]))
        }
        StatementKind::Source => {
            p.scanner().advance_when_matching("from")?;
            p.scanner().advance_when_matching("file")?;
            let path = name(p, "file name")?;
            Ok(Term::node(
                functor::SOURCE,
                vec![Term::node(functor::FILE, vec![Term::string(path)])],
            ))
        }
    }
}

fn parse_select(p: &mut OpParser<'_>) -> Result<Term, ParseError> {
    let distinct = p.scanner().advance_when_matching("distinct")?;
    let fields = if p.scanner().matches("*") {
        p.scanner().next()?;
        p.scanner().advance_expect("from")?;
        Vec::new()
    } else {
        p.node_list("from")?
    };
    let from = cache_clause(p)?;
    let alias = alias_clause(p)?;
    let filter = where_clause(p)?;
    let group_by = if p.scanner().advance_when_matching("group")? {
        p.scanner().advance_when_matching("by")?;
        comma_list(p)?
    } else {
        Vec::new()
    };

    Ok(Term::node(
        functor::SELECT,
        vec![
            Term::node(functor::IS_DISTINCT, vec![Term::atom(AtomicTerm::boolean(distinct))]),
            Term::node(functor::FIELD_LIST, fields),
            from,
            alias,
            filter,
            Term::node(functor::GROUP_BY, group_by),
        ],
    ))
}

fn index_statement(node: &str, p: &mut OpParser<'_>) -> Result<Term, ParseError> {
    p.scanner().advance_when_matching("on")?;
    let from = cache_clause(p)?;
    let extractor = p.expression(precedence::IDENTIFIER)?;
    Ok(Term::node(
        node,
        vec![from, Term::node(functor::EXTRACTOR, vec![extractor])],
    ))
}

/// Expressions separated by commas, ending at the first token that is not a
/// comma after an expression.
fn comma_list(p: &mut OpParser<'_>) -> Result<Vec<Term>, ParseError> {
    let mut list = vec![p.expression(precedence::IDENTIFIER)?];
    while p.scanner().advance_when_matching(",")? {
        list.push(p.expression(precedence::IDENTIFIER)?);
    }
    Ok(list)
}

/// Cache and file names: a bare word or a quoted string.
fn name(p: &mut OpParser<'_>, what: &str) -> Result<String, ParseError> {
    let scanner = p.scanner();
    let current = scanner.current();
    let text = match current.token.kind() {
        OpTokenKind::Literal(atom) if atom.kind().is_some_and(|k| !k.is_numeric()) => atom.text(),
        OpTokenKind::Identifier | OpTokenKind::Keyword => current.text.clone(),
        _ => {
            return Err(ParseError::Expected {
                expected: what.to_string(),
                found: scanner.found(),
            });
        }
    };
    scanner.next()?;
    Ok(text)
}

fn cache_clause(p: &mut OpParser<'_>) -> Result<Term, ParseError> {
    let cache = name(p, "cache name")?;
    Ok(Term::node(functor::FROM, vec![Term::string(cache)]))
}

/// `[as] alias`; only a plain identifier can be an alias without `as`.
fn alias_clause(p: &mut OpParser<'_>) -> Result<Term, ParseError> {
    let explicit = p.scanner().advance_when_matching("as")?;
    let implicit = matches!(p.scanner().current_token().kind(), OpTokenKind::Identifier);
    if explicit || implicit {
        let alias = name(p, "alias")?;
        return Ok(Term::node(functor::ALIAS, vec![Term::string(alias)]));
    }
    Ok(Term::node(functor::ALIAS, Vec::new()))
}

fn where_clause(p: &mut OpParser<'_>) -> Result<Term, ParseError> {
    if p.scanner().advance_when_matching("where")? {
        let filter = p.expression(precedence::IDENTIFIER)?;
        return Ok(Term::node(functor::WHERE, vec![filter]));
    }
    Ok(Term::node(functor::WHERE, Vec::new()))
}
