//! Base tokenizer.
//!
//! Turns query text into a flat sequence of primitive tokens in which every
//! bracketed region (`()`, `[]`, `{}`) is already folded into a single
//! [`BaseTokenKind::Nested`] token holding its contents. The operator-precedence
//! layer classifies these tokens against a token table.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::{
    error::{ParseError, Position},
    term::{AtomicTerm, LiteralKind},
    value::Value,
};

/// Characters that make up operator symbols.
const OPERATOR_CHARS: &str = "+-*/%<>=!&|^~?:@#";

/// Multi-character operators recognised even without a token table.
pub const DEFAULT_OPERATORS: &[&str] = &["==", "!=", "<>", "<=", ">=", "**", "&&", "||", "^^"];

#[derive(Debug, Clone, PartialEq)]
pub struct BaseToken {
    pub kind: BaseTokenKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BaseTokenKind {
    /// Name made of letters, digits, `_` and `$`
    Identifier(String),

    /// Typed literal value
    Literal(AtomicTerm),

    /// One of `,` `;` `.`
    Punctuation(char),

    /// Operator symbol such as `==` or `+`
    Operator(String),

    /// Bracketed group with its inner tokens
    Nested {
        open: char,
        close: char,
        tokens: Vec<BaseToken>,
    },
}

impl BaseToken {
    /// The spelling used for token-table lookups and error messages.
    pub fn text(&self) -> String {
        match &self.kind {
            BaseTokenKind::Identifier(name) => name.clone(),
            BaseTokenKind::Literal(atom) => atom.to_string(),
            BaseTokenKind::Punctuation(ch) => ch.to_string(),
            BaseTokenKind::Operator(op) => op.clone(),
            BaseTokenKind::Nested { open, .. } => open.to_string(),
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Known multi-character operators, longest first
    operators: Vec<Vec<char>>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            operators: Vec::new(),
        }
        .with_operators(DEFAULT_OPERATORS.iter().copied())
    }

    /// Registers additional operator spellings for maximal-munch scanning.
    pub fn with_operators<'a>(mut self, operators: impl IntoIterator<Item = &'a str>) -> Self {
        for op in operators {
            let chars: Vec<char> = op.chars().collect();
            if chars.len() > 1
                && chars.iter().all(|c| OPERATOR_CHARS.contains(*c))
                && !self.operators.contains(&chars)
            {
                self.operators.push(chars);
            }
        }
        self.operators.sort_by(|a, b| b.len().cmp(&a.len()));
        self
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '-' && self.peek_char(1) == Some('-') {
                while let Some(c) = self.current_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Tokenizes the whole input, folding bracketed regions into nested tokens.
    pub fn tokenize(&mut self) -> Result<Vec<BaseToken>, ParseError> {
        // Each frame: (open char, close char, position of opener, collected tokens)
        let mut stack: Vec<(char, char, Position, Vec<BaseToken>)> = Vec::new();
        let mut top: Vec<BaseToken> = Vec::new();

        loop {
            self.skip_whitespace_and_comments();
            let Some(ch) = self.current_char() else {
                break;
            };
            let position = self.here();

            match ch {
                '(' | '[' | '{' => {
                    self.advance();
                    let close = match ch {
                        '(' => ')',
                        '[' => ']',
                        _ => '}',
                    };
                    stack.push((ch, close, position, std::mem::take(&mut top)));
                }
                ')' | ']' | '}' => {
                    self.advance();
                    match stack.pop() {
                        Some((open, close, opened_at, outer)) if close == ch => {
                            let inner = std::mem::replace(&mut top, outer);
                            top.push(BaseToken {
                                kind: BaseTokenKind::Nested {
                                    open,
                                    close,
                                    tokens: inner,
                                },
                                position: opened_at,
                            });
                        }
                        _ => {
                            return Err(ParseError::UnbalancedNesting {
                                delimiter: ch,
                                position,
                            });
                        }
                    }
                }
                _ => {
                    let kind = self.read_token(ch, position)?;
                    top.push(BaseToken { kind, position });
                }
            }
        }

        if let Some((open, _, position, _)) = stack.pop() {
            return Err(ParseError::UnbalancedNesting {
                delimiter: open,
                position,
            });
        }
        Ok(top)
    }

    fn read_token(&mut self, ch: char, position: Position) -> Result<BaseTokenKind, ParseError> {
        match ch {
            ',' | ';' | '.' => {
                self.advance();
                Ok(BaseTokenKind::Punctuation(ch))
            }
            '\'' | '"' => {
                let s = self.read_string(ch, position)?;
                Ok(BaseTokenKind::Literal(AtomicTerm::string(s)))
            }
            c if c.is_ascii_digit() => self.read_number(position),
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                Ok(BaseTokenKind::Identifier(self.read_identifier()))
            }
            c if OPERATOR_CHARS.contains(c) => Ok(BaseTokenKind::Operator(self.read_operator())),
            c => Err(ParseError::UnexpectedCharacter { ch: c, position }),
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_operator(&mut self) -> String {
        let matched = self
            .operators
            .iter()
            .find(|op| {
                op.iter()
                    .enumerate()
                    .all(|(i, c)| self.peek_char(i) == Some(*c))
            })
            .map(|op| op.len())
            .unwrap_or(1);

        let mut result = String::new();
        for _ in 0..matched {
            if let Some(ch) = self.current_char() {
                result.push(ch);
                self.advance();
            }
        }
        result
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<String, ParseError> {
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    // A doubled quote is an escaped quote
                    if self.current_char() == Some(quote) {
                        result.push(quote);
                        self.advance();
                        continue;
                    }
                    return Ok(result);
                }
                '\\' => {
                    let escape_at = self.here();
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            return Err(ParseError::InvalidEscape {
                                ch,
                                position: escape_at,
                            });
                        }
                        None => return Err(ParseError::UnterminatedString(start)),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(ParseError::UnterminatedString(start))
    }

    fn read_number(&mut self, position: Position) -> Result<BaseTokenKind, ParseError> {
        let mut number = String::new();
        let mut is_float = false;
        let mut has_exponent = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && !has_exponent
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E')
                && !has_exponent
                && (self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
                    || (matches!(self.peek_char(1), Some('+') | Some('-'))
                        && self.peek_char(2).is_some_and(|c| c.is_ascii_digit())))
            {
                has_exponent = true;
                number.push(ch);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current_char() {
                    number.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        let suffix = match self.current_char() {
            Some(c @ ('l' | 'L' | 's' | 'S' | 'f' | 'F' | 'd' | 'D' | 'b' | 'B')) => {
                self.advance();
                Some(c.to_ascii_uppercase())
            }
            _ => None,
        };

        let invalid = |text: String| ParseError::InvalidNumber { text, position };

        // A number glued to a name (`10abc`) is malformed
        if self
            .current_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            let mut text = number.clone();
            text.extend(suffix);
            text.push_str(&self.read_identifier());
            return Err(invalid(text));
        }

        let mut text = number.clone();
        text.extend(suffix);
        let fractional = is_float || has_exponent;

        let atom = match suffix {
            Some('B') => {
                let decimal = if has_exponent {
                    Decimal::from_scientific(&number)
                } else {
                    Decimal::from_str(&number)
                };
                let d = decimal.map_err(|_| invalid(text.clone()))?;
                AtomicTerm::literal(LiteralKind::BigDecimal, Value::Decimal(d))
            }
            Some('F') => {
                let n = number.parse::<f32>().map_err(|_| invalid(text.clone()))?;
                AtomicTerm::literal(LiteralKind::Float, Value::Float(n as f64))
            }
            Some('D') => {
                let n = number.parse::<f64>().map_err(|_| invalid(text.clone()))?;
                AtomicTerm::literal(LiteralKind::Double, Value::Float(n))
            }
            None if fractional => {
                let n = number.parse::<f64>().map_err(|_| invalid(text.clone()))?;
                AtomicTerm::literal(LiteralKind::Double, Value::Float(n))
            }
            Some('S') if !fractional => {
                let n = number.parse::<i16>().map_err(|_| invalid(text.clone()))?;
                AtomicTerm::literal(LiteralKind::Short, Value::Integer(n as i64))
            }
            Some('L') if !fractional => {
                let n = number.parse::<i64>().map_err(|_| invalid(text.clone()))?;
                AtomicTerm::literal(LiteralKind::Long, Value::Integer(n))
            }
            None => {
                let n = number.parse::<i64>().map_err(|_| invalid(text.clone()))?;
                let kind = if i32::try_from(n).is_ok() {
                    LiteralKind::Integer
                } else {
                    LiteralKind::Long
                };
                AtomicTerm::literal(kind, Value::Integer(n))
            }
            _ => return Err(invalid(text)),
        };

        Ok(BaseTokenKind::Literal(atom))
    }
}

#[test]
fn test_operators_use_maximal_munch() {
    let tokens = Lexer::new("a<=b<>c").tokenize().unwrap();
    let texts: Vec<String> = tokens.iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["a", "<=", "b", "<>", "c"]);
}

#[test]
fn test_nested_groups() {
    let tokens = Lexer::new("f(1, [2])").tokenize().unwrap();
    assert_eq!(tokens.len(), 2);
    match &tokens[1].kind {
        BaseTokenKind::Nested { open, tokens, .. } => {
            assert_eq!(*open, '(');
            assert_eq!(tokens.len(), 3);
        }
        other => panic!("Expected nested group, got {:?}", other),
    }
}
