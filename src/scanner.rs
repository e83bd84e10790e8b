//! Classifies base tokens into operator-precedence tokens.

use std::{sync::Arc, vec};

use log::warn;

use crate::{
    error::{ParseError, Position},
    lexer::{BaseToken, BaseTokenKind, Lexer},
    token::OpToken,
    token_table::TokenTable,
};

/// The scanner's current token: a prototype from the table plus the
/// per-occurrence data the prototype must not hold.
#[derive(Debug, Clone)]
pub struct Scanned {
    pub token: Arc<OpToken>,
    /// Contents of a bracketed group
    pub nested: Option<Vec<BaseToken>>,
    /// Spelling as written
    pub text: String,
    pub position: Option<Position>,
}

struct Frame {
    stream: vec::IntoIter<BaseToken>,
    current: Scanned,
}

pub struct OpScanner<'t> {
    table: &'t TokenTable,
    stream: vec::IntoIter<BaseToken>,
    saved: Vec<Frame>,
    current: Scanned,
    strict: bool,
}

impl<'t> OpScanner<'t> {
    /// Scanner over `text`, rejecting unknown operator symbols.
    pub fn new(table: &'t TokenTable, text: &str) -> Result<Self, ParseError> {
        OpScanner::with_strictness(table, text, true)
    }

    /// Scanner over `text`; a lenient scanner turns unknown operator symbols
    /// into identifiers instead of failing.
    pub fn with_strictness(
        table: &'t TokenTable,
        text: &str,
        strict: bool,
    ) -> Result<Self, ParseError> {
        let tokens = Lexer::new(text)
            .with_operators(table.spellings())
            .tokenize()?;
        OpScanner::from_tokens(table, tokens, strict)
    }

    pub fn from_tokens(
        table: &'t TokenTable,
        tokens: Vec<BaseToken>,
        strict: bool,
    ) -> Result<Self, ParseError> {
        let mut scanner = OpScanner {
            table,
            stream: tokens.into_iter(),
            saved: Vec::new(),
            current: Scanned {
                token: table.end_token(),
                nested: None,
                text: String::new(),
                position: None,
            },
            strict,
        };
        scanner.next()?;
        Ok(scanner)
    }

    pub fn table(&self) -> &'t TokenTable {
        self.table
    }

    pub fn current(&self) -> &Scanned {
        &self.current
    }

    pub fn current_token(&self) -> &OpToken {
        &self.current.token
    }

    pub fn current_text(&self) -> &str {
        &self.current.text
    }

    pub fn is_end(&self) -> bool {
        self.current.token.is_end()
    }

    /// Spelling of the token after the current one, if any.
    pub fn peek_text(&self) -> Option<String> {
        self.stream.as_slice().first().map(BaseToken::text)
    }

    /// Moves to the next token.
    pub fn next(&mut self) -> Result<(), ParseError> {
        self.advance_token().map(|_| ())
    }

    /// Moves to the next token, handing back the one left behind.
    pub fn advance_token(&mut self) -> Result<Scanned, ParseError> {
        let next = match self.stream.next() {
            Some(base) => self.classify(base)?,
            None => self.end(),
        };
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Does the current token read `word`, using the table's case folding?
    pub fn matches(&self, word: &str) -> bool {
        if self.table.is_ignoring_case() {
            self.matches_ignore_case(word)
        } else {
            !self.is_end() && self.current.text == word
        }
    }

    pub fn matches_ignore_case(&self, word: &str) -> bool {
        !self.is_end() && self.current.text.eq_ignore_ascii_case(word)
    }

    /// Consumes `word` or fails with an unfulfilled expectation.
    pub fn advance_expect(&mut self, word: &str) -> Result<(), ParseError> {
        if self.matches(word) {
            self.next()
        } else {
            Err(ParseError::Expected {
                expected: word.to_string(),
                found: self.found(),
            })
        }
    }

    /// Consumes `word` if it is current.
    pub fn advance_when_matching(&mut self, word: &str) -> Result<bool, ParseError> {
        if self.matches(word) {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Current spelling for error messages.
    pub fn found(&self) -> String {
        if self.is_end() {
            "end of input".to_string()
        } else {
            self.current.text.clone()
        }
    }

    /// Scans the contents of a bracketed group, saving the outer position.
    pub fn push_stream(&mut self, tokens: Vec<BaseToken>) -> Result<(), ParseError> {
        let outer = std::mem::replace(&mut self.stream, tokens.into_iter());
        let end = self.end();
        let current = std::mem::replace(&mut self.current, end);
        self.saved.push(Frame {
            stream: outer,
            current,
        });
        self.next()
    }

    /// Returns to the stream saved by the matching [`push_stream`](Self::push_stream).
    pub fn pop_stream(&mut self) {
        if let Some(frame) = self.saved.pop() {
            self.stream = frame.stream;
            self.current = frame.current;
        }
    }

    fn end(&self) -> Scanned {
        Scanned {
            token: self.table.end_token(),
            nested: None,
            text: String::new(),
            position: None,
        }
    }

    fn classify(&self, base: BaseToken) -> Result<Scanned, ParseError> {
        let text = base.text();
        let position = Some(base.position);
        let (token, nested) = match base.kind {
            BaseTokenKind::Nested { open, tokens, .. } => {
                let token = self
                    .table
                    .lookup(&text)
                    .ok_or_else(|| ParseError::UnknownNesting(open.to_string()))?;
                (token, Some(tokens))
            }
            BaseTokenKind::Literal(atom) => (self.table.new_literal(atom), None),
            BaseTokenKind::Identifier(name) => {
                let token = self
                    .table
                    .lookup(&name)
                    .unwrap_or_else(|| self.table.new_identifier(&name));
                (token, None)
            }
            BaseTokenKind::Operator(_) | BaseTokenKind::Punctuation(_) => {
                match self.table.lookup(&text) {
                    Some(token) => (token, None),
                    None if self.strict => {
                        return Err(ParseError::UnknownToken {
                            token: text,
                            position: base.position,
                        });
                    }
                    None => {
                        warn!("unknown token '{}' at {}; treating as identifier", text, base.position);
                        (self.table.new_identifier(&text), None)
                    }
                }
            }
        };
        Ok(Scanned {
            token,
            nested,
            text,
            position,
        })
    }
}
