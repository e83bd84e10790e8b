//! Operator-precedence tokens.
//!
//! Every lexical class the parser understands is an [`OpToken`]: an id, a left
//! binding power and the two parse rules of top-down operator precedence:
//!
//! - **nud** (null denotation): the token appears with nothing on its left
//!   (literals, identifiers, prefix operators, bracketed groups);
//! - **led** (left denotation): the token appears after a complete left
//!   operand (infix and postfix operators, calls, paths).
//!
//! Tokens are immutable. Per-occurrence state (the contents of a bracketed
//! group) travels next to the token in the scanner, never inside it.

use std::sync::Arc;

use log::trace;

use crate::{
    error::{Denotation, ParseError},
    lexer::BaseToken,
    parser::OpParser,
    sql::{self, StatementKind},
    term::{AtomicTerm, Term, functor},
};

/// Binding powers; higher binds tighter.
pub mod precedence {
    pub const END: i32 = -1;
    pub const IDENTIFIER: i32 = 0;
    pub const KEYWORD: i32 = 0;
    pub const ASSIGNMENT: i32 = 20;
    pub const LOGICAL: i32 = 30;
    pub const LOGICAL_BITWISE: i32 = 35;
    pub const RELATIONAL: i32 = 40;
    pub const BITWISE: i32 = 45;
    pub const SUM: i32 = 50;
    pub const PRODUCT: i32 = 60;
    pub const EXPONENT: i32 = 61;
    pub const UNARY: i32 = 70;
    pub const UNARY_POST: i32 = 75;
    pub const PARENTHESES: i32 = 80;
}

#[derive(Debug, Clone)]
pub struct OpToken {
    id: String,
    binding_power: i32,
    led_functor: Option<String>,
    nud_functor: Option<String>,
    kind: OpTokenKind,
}

/// One alternative of a multi-word keyword: when the word following the
/// peek token matches `keyword`, parsing continues with `token`.
#[derive(Debug, Clone)]
pub struct PeekBranch {
    pub keyword: String,
    pub token: Arc<OpToken>,
}

#[derive(Debug, Clone)]
pub enum OpTokenKind {
    Identifier,
    Literal(AtomicTerm),
    /// Reserved word; parses like an identifier and stops expressions
    Keyword,
    /// Left-associative binary operator, optionally also a prefix operator
    Infix,
    /// Right-associative binary operator
    InfixRight,
    Prefix,
    Not,
    Between,
    Like,
    Contains,
    /// `.` dereference, flattened into one path node
    Path,
    /// `(` grouping and calls
    Paren,
    /// `[` list literal
    ListLiteral,
    /// `{` set or map literal
    Curly,
    /// `:` map-entry pair (infix) and named binding (prefix)
    Colon,
    Punctuation,
    EndOfStatement,
    End,
    /// Multi-word keyword dispatch such as `create cache` / `create index`
    Peek(Vec<PeekBranch>),
    /// Whole SQL statement introduced by a keyword
    Statement(StatementKind),
}

impl OpToken {
    fn with_kind(id: impl Into<String>, binding_power: i32, kind: OpTokenKind) -> Self {
        OpToken {
            id: id.into(),
            binding_power,
            led_functor: None,
            nud_functor: None,
            kind,
        }
    }

    pub fn identifier(id: impl Into<String>, functor: Option<&str>) -> Self {
        OpToken::with_kind(id, precedence::IDENTIFIER, OpTokenKind::Identifier)
            .with_nud(functor)
    }

    pub fn literal(atom: AtomicTerm, functor: Option<&str>) -> Self {
        OpToken::with_kind(atom.to_string(), precedence::IDENTIFIER, OpTokenKind::Literal(atom))
            .with_nud(functor)
    }

    pub fn keyword(id: impl Into<String>) -> Self {
        OpToken::with_kind(id, precedence::KEYWORD, OpTokenKind::Keyword)
    }

    /// Binary operator node `led_functor(id, left, right)`.
    pub fn infix(id: impl Into<String>, binding_power: i32, led_functor: &str) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Infix).with_led(Some(led_functor))
    }

    /// Infix operator that may also start an expression (`-x`, `+x`).
    pub fn infix_with_prefix(
        id: impl Into<String>,
        binding_power: i32,
        led_functor: &str,
        nud_functor: &str,
    ) -> Self {
        OpToken::infix(id, binding_power, led_functor).with_nud(Some(nud_functor))
    }

    pub fn infix_right(id: impl Into<String>, binding_power: i32, led_functor: &str) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::InfixRight).with_led(Some(led_functor))
    }

    pub fn prefix(id: impl Into<String>, binding_power: i32, nud_functor: &str) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Prefix).with_nud(Some(nud_functor))
    }

    pub fn not(id: impl Into<String>, binding_power: i32, functor: &str) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Not)
            .with_nud(Some(functor))
            .with_led(Some(functor))
    }

    pub fn between(id: impl Into<String>, binding_power: i32, led_functor: &str) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Between).with_led(Some(led_functor))
    }

    pub fn like(id: impl Into<String>, binding_power: i32, led_functor: &str) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Like).with_led(Some(led_functor))
    }

    pub fn contains(id: impl Into<String>, binding_power: i32, led_functor: &str) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Contains).with_led(Some(led_functor))
    }

    pub fn path(id: impl Into<String>, binding_power: i32, led_functor: &str) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Path).with_led(Some(led_functor))
    }

    /// `(`: `led_functor` wraps calls, `nud_functor` wraps multi-element groups.
    ///
    /// Without a led functor a call becomes a node named after its target,
    /// which is how the term language reads `functor(args)`.
    pub fn paren(
        id: impl Into<String>,
        binding_power: i32,
        led_functor: Option<&str>,
        nud_functor: Option<&str>,
    ) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Paren)
            .with_led(led_functor)
            .with_nud(nud_functor)
    }

    pub fn list_literal(id: impl Into<String>, binding_power: i32, nud_functor: &str) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::ListLiteral).with_nud(Some(nud_functor))
    }

    pub fn curly(id: impl Into<String>, binding_power: i32) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Curly)
            .with_nud(Some(functor::BAG_LITERAL))
    }

    pub fn colon(id: impl Into<String>, binding_power: i32) -> Self {
        OpToken::with_kind(id, binding_power, OpTokenKind::Colon)
            .with_led(Some(functor::PAIR))
            .with_nud(Some(functor::BINDING))
    }

    pub fn punctuation(id: impl Into<String>) -> Self {
        OpToken::with_kind(id, precedence::IDENTIFIER, OpTokenKind::Punctuation)
    }

    pub fn end_of_statement() -> Self {
        OpToken::with_kind(";", precedence::IDENTIFIER, OpTokenKind::EndOfStatement)
    }

    pub fn end() -> Self {
        OpToken::with_kind("<end>", precedence::END, OpTokenKind::End)
    }

    pub fn peek(id: impl Into<String>, branches: Vec<PeekBranch>) -> Self {
        OpToken::with_kind(id, precedence::KEYWORD, OpTokenKind::Peek(branches))
    }

    pub fn statement(id: impl Into<String>, kind: StatementKind) -> Self {
        OpToken::with_kind(id, precedence::KEYWORD, OpTokenKind::Statement(kind))
    }

    pub fn with_led(mut self, functor: Option<&str>) -> Self {
        self.led_functor = functor.map(str::to_string);
        self
    }

    pub fn with_nud(mut self, functor: Option<&str>) -> Self {
        self.nud_functor = functor.map(str::to_string);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Left binding power.
    pub fn binding_power(&self) -> i32 {
        self.binding_power
    }

    pub fn led_functor(&self) -> Option<&str> {
        self.led_functor.as_deref()
    }

    pub fn nud_functor(&self) -> Option<&str> {
        self.nud_functor.as_deref()
    }

    pub fn kind(&self) -> &OpTokenKind {
        &self.kind
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, OpTokenKind::End)
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            OpTokenKind::Identifier => "identifier",
            OpTokenKind::Literal(_) => "literal",
            OpTokenKind::Keyword | OpTokenKind::Peek(_) | OpTokenKind::Statement(_) => "keyword",
            OpTokenKind::Punctuation => "punctuation",
            OpTokenKind::EndOfStatement | OpTokenKind::End => "end of statement",
            _ => "operator",
        }
    }

    fn unexpected(&self, denotation: Denotation) -> ParseError {
        ParseError::Unexpected {
            kind: self.kind_name(),
            token: self.id.clone(),
            denotation,
        }
    }

    fn led_name(&self) -> &str {
        self.led_functor.as_deref().unwrap_or(functor::BINARY_OPERATOR)
    }

    fn nud_name(&self) -> &str {
        self.nud_functor.as_deref().unwrap_or(functor::UNARY_OPERATOR)
    }

    /// Parses this token in prefix position.
    pub fn nud(&self, p: &mut OpParser<'_>, nested: Option<Vec<BaseToken>>) -> Result<Term, ParseError> {
        trace!("nud '{}'", self.id);
        match &self.kind {
            OpTokenKind::Identifier => Ok(match &self.nud_functor {
                Some(f) => Term::node(f.as_str(), vec![Term::symbol(self.id.as_str())]),
                None => Term::symbol(self.id.as_str()),
            }),
            OpTokenKind::Literal(atom) => Ok(match &self.nud_functor {
                Some(f) => Term::node(f.as_str(), vec![Term::atom(atom.clone())]),
                None => Term::atom(atom.clone()),
            }),
            OpTokenKind::Keyword => Ok(Term::identifier(self.id.as_str())),
            OpTokenKind::Infix => match &self.nud_functor {
                Some(f) => {
                    let operand = p.expression(precedence::UNARY)?;
                    Ok(Term::node(f.as_str(), vec![Term::string(self.id.as_str()), operand]))
                }
                None => Err(self.unexpected(Denotation::Prefix)),
            },
            OpTokenKind::Prefix | OpTokenKind::Not | OpTokenKind::Colon => {
                let operand = p.expression(self.binding_power)?;
                Ok(Term::node(self.nud_name(), vec![Term::string(self.id.as_str()), operand]))
            }
            OpTokenKind::Paren => {
                let mut elements = p.read_nested_comma_separated_list(nested)?;
                if elements.len() == 1 {
                    return Ok(elements.remove(0));
                }
                match &self.nud_functor {
                    Some(f) => Ok(Term::node(f.as_str(), elements)),
                    None => Err(self.unexpected(Denotation::Prefix)),
                }
            }
            OpTokenKind::ListLiteral | OpTokenKind::Curly => {
                let elements = p.read_nested_comma_separated_list(nested)?;
                Ok(Term::node(self.nud_name(), elements))
            }
            OpTokenKind::Peek(branches) => match self.select_branch(p, branches)? {
                Some(token) => token.nud(p, nested),
                None => Ok(Term::identifier(self.id.as_str())),
            },
            OpTokenKind::Statement(kind) => sql::parse_statement(*kind, p),
            OpTokenKind::EndOfStatement | OpTokenKind::End => Ok(Term::null()),
            OpTokenKind::InfixRight
            | OpTokenKind::Between
            | OpTokenKind::Like
            | OpTokenKind::Contains
            | OpTokenKind::Path
            | OpTokenKind::Punctuation => Err(self.unexpected(Denotation::Prefix)),
        }
    }

    /// Parses this token in infix position with `left` already parsed.
    pub fn led(
        &self,
        p: &mut OpParser<'_>,
        left: Term,
        nested: Option<Vec<BaseToken>>,
    ) -> Result<Term, ParseError> {
        trace!("led '{}'", self.id);
        match &self.kind {
            OpTokenKind::Infix => {
                let right = p.expression(self.binding_power)?;
                Ok(self.binary(left, right))
            }
            OpTokenKind::InfixRight => {
                let right = p.expression(self.binding_power - 1)?;
                Ok(self.binary(left, right))
            }
            OpTokenKind::Not => {
                // `x not in (...)`: let the following operator build its node
                // around `left`, then negate the whole thing.
                let next = p.scanner().advance_token()?;
                let inner = next.token.led(p, left, next.nested)?;
                Ok(Term::node(self.nud_name(), vec![Term::string(self.id.as_str()), inner]))
            }
            OpTokenKind::Between => {
                let low = p.expression(self.binding_power + 1)?;
                p.scanner().advance_expect("and")?;
                let high = p.expression(self.binding_power + 1)?;
                Ok(self.binary(left, Term::node(functor::LIST, vec![low, high])))
            }
            OpTokenKind::Like => {
                let pattern = p.expression(self.binding_power + 1)?;
                let right = if p.scanner().advance_when_matching("escape")? {
                    let escape = p.expression(self.binding_power + 1)?;
                    Term::node(functor::LIST, vec![pattern, escape])
                } else {
                    pattern
                };
                Ok(self.binary(left, right))
            }
            OpTokenKind::Contains => {
                let scanner = p.scanner();
                let symbol = if scanner.matches_ignore_case("all") {
                    scanner.next()?;
                    format!("{}_all", self.id)
                } else if scanner.matches_ignore_case("any") {
                    scanner.next()?;
                    format!("{}_any", self.id)
                } else {
                    self.id.clone()
                };
                let right = p.expression(self.binding_power)?;
                Ok(Term::node(self.led_name(), vec![Term::string(symbol), left, right]))
            }
            OpTokenKind::Path => {
                let right = p.expression(self.binding_power)?;
                Ok(self.flatten_path(left, right))
            }
            OpTokenKind::Paren => {
                let args = p.read_nested_comma_separated_list(nested)?;
                self.call(left, args)
            }
            OpTokenKind::Colon => {
                let right = p.expression(self.binding_power)?;
                Ok(Term::node(self.led_name(), vec![left, right]))
            }
            OpTokenKind::Keyword => Ok(left),
            OpTokenKind::Peek(branches) => match self.select_branch(p, branches)? {
                Some(token) => token.led(p, left, nested),
                None => Err(self.unexpected(Denotation::Infix)),
            },
            OpTokenKind::Identifier
            | OpTokenKind::Literal(_)
            | OpTokenKind::Prefix
            | OpTokenKind::ListLiteral
            | OpTokenKind::Curly
            | OpTokenKind::Punctuation
            | OpTokenKind::EndOfStatement
            | OpTokenKind::End
            | OpTokenKind::Statement(_) => Err(self.unexpected(Denotation::Infix)),
        }
    }

    fn binary(&self, left: Term, right: Term) -> Term {
        Term::node(self.led_name(), vec![Term::string(self.id.as_str()), left, right])
    }

    /// Merges `left . right` into one path node, splicing nested path nodes.
    fn flatten_path(&self, left: Term, right: Term) -> Term {
        let name = self.led_name();
        let mut children = Vec::new();
        for side in [left, right] {
            match side {
                Term::Node(node) if node.functor() == name => children.extend(node.into_children()),
                other => children.push(other),
            }
        }
        Term::node(name, children)
    }

    fn call(&self, target: Term, args: Vec<Term>) -> Result<Term, ParseError> {
        let Some(call_functor) = &self.led_functor else {
            // Term language: `name(args)` is a node named `name`
            return match target {
                Term::Atomic(AtomicTerm::Symbol(name)) => Ok(Term::node(name, args)),
                other => Err(ParseError::Unexpected {
                    kind: "call target",
                    token: other.to_string(),
                    denotation: Denotation::Infix,
                }),
            };
        };

        if let Some(name) = target.identifier_name() {
            let call = Term::node(name, args);
            return Ok(Term::node(call_functor.as_str(), vec![call]));
        }

        // `a.b(x)`: the call replaces the last element of the path
        if let Term::Node(path) = &target
            && path.functor() == functor::DEREF
            && let Some(name) = path.children().last().and_then(Term::identifier_name)
        {
            let mut children = path.children().to_vec();
            let call = Term::node(call_functor.as_str(), vec![Term::node(name, args)]);
            if let Some(last) = children.last_mut() {
                *last = call;
            }
            return Ok(Term::node(functor::DEREF, children));
        }

        Err(ParseError::Unexpected {
            kind: "call target",
            token: target.to_string(),
            denotation: Denotation::Infix,
        })
    }

    /// One-token lookahead over the branch keywords; consumes the keyword only
    /// once a branch matches.
    fn select_branch(
        &self,
        p: &mut OpParser<'_>,
        branches: &[PeekBranch],
    ) -> Result<Option<Arc<OpToken>>, ParseError> {
        let scanner = p.scanner();
        for branch in branches {
            if scanner.matches(&branch.keyword) {
                scanner.next()?;
                return Ok(Some(branch.token.clone()));
            }
        }
        Ok(None)
    }
}

impl PartialEq for OpToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
