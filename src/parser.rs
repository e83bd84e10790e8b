use log::debug;

use crate::{
    error::ParseError,
    lexer::BaseToken,
    scanner::OpScanner,
    term::Term,
    token::precedence,
    token_table::TokenTable,
};

/// Top-down operator-precedence parser.
///
/// Drives an [`OpScanner`]; all grammar lives in the tokens' nud/led rules.
pub struct OpParser<'t> {
    scanner: OpScanner<'t>,
}

impl<'t> OpParser<'t> {
    pub fn new(scanner: OpScanner<'t>) -> Self {
        OpParser { scanner }
    }

    /// Parser over `text` using `table`.
    pub fn for_text(table: &'t TokenTable, text: &str) -> Result<Self, ParseError> {
        Ok(OpParser::new(OpScanner::new(table, text)?))
    }

    pub fn scanner(&mut self) -> &mut OpScanner<'t> {
        &mut self.scanner
    }

    /// Parses one expression whose operators bind tighter than `rbp`.
    pub fn expression(&mut self, rbp: i32) -> Result<Term, ParseError> {
        if self.scanner.is_end() {
            return Ok(Term::null());
        }

        let first = self.scanner.advance_token()?;
        let mut left = first.token.nud(self, first.nested)?;

        while self.scanner.current_token().binding_power() > rbp {
            let next = self.scanner.advance_token()?;
            left = next.token.led(self, left, next.nested)?;
        }

        Ok(left)
    }

    /// Comma-separated expressions up to and including `end`.
    pub fn node_list(&mut self, end: &str) -> Result<Vec<Term>, ParseError> {
        let mut list = Vec::new();
        if self.scanner.advance_when_matching(end)? {
            return Ok(list);
        }

        loop {
            if self.scanner.is_end() {
                return Err(ParseError::UnterminatedList(end.to_string()));
            }
            list.push(self.expression(precedence::IDENTIFIER)?);
            if self.scanner.advance_when_matching(end)? {
                return Ok(list);
            }
            if self.scanner.is_end() {
                return Err(ParseError::UnterminatedList(end.to_string()));
            }
            self.scanner.advance_expect(",")?;
        }
    }

    /// Comma-separated expressions up to the end of the current stream.
    pub fn node_list_to_end(&mut self) -> Result<Vec<Term>, ParseError> {
        let mut list = Vec::new();
        while !self.scanner.is_end() {
            list.push(self.expression(precedence::IDENTIFIER)?);
            if self.scanner.is_end() {
                break;
            }
            self.scanner.advance_expect(",")?;
        }
        Ok(list)
    }

    /// Parses the contents of a bracketed group as a comma-separated list,
    /// then resumes after the group.
    pub fn read_nested_comma_separated_list(
        &mut self,
        nested: Option<Vec<BaseToken>>,
    ) -> Result<Vec<Term>, ParseError> {
        self.scanner.push_stream(nested.unwrap_or_default())?;
        let list = self.node_list_to_end();
        self.scanner.pop_stream();
        list
    }

    /// Parses a single statement; anything left over is an error.
    pub fn parse(&mut self) -> Result<Term, ParseError> {
        let term = self.expression(precedence::IDENTIFIER)?;
        self.scanner.advance_when_matching(";")?;
        if !self.scanner.is_end() {
            return Err(ParseError::TrailingInput(self.scanner.found()));
        }
        debug!("parsed: {}", term);
        Ok(term)
    }

    /// Parses `;`-separated statements until the input ends.
    pub fn parse_all(&mut self) -> Result<Vec<Term>, ParseError> {
        let mut terms = Vec::new();
        while !self.scanner.is_end() {
            if self.scanner.advance_when_matching(";")? {
                continue;
            }
            let term = self.expression(precedence::IDENTIFIER)?;
            if !self.scanner.is_end() && !self.scanner.advance_when_matching(";")? {
                return Err(ParseError::TrailingInput(self.scanner.found()));
            }
            debug!("parsed: {}", term);
            terms.push(term);
        }
        Ok(terms)
    }
}
