//! Name → token registry used by the scanner.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::debug;

use crate::{term::AtomicTerm, token::OpToken};

/// Maps token spellings (and aliases) to their prototype tokens.
///
/// Case folding is fixed when the table is created; lookups, registrations
/// and aliases all fold the same way for the lifetime of the table.
#[derive(Debug, Clone)]
pub struct TokenTable {
    tokens: HashMap<String, Arc<OpToken>>,
    disabled: HashSet<String>,
    ignore_case: bool,
    identifier_functor: Option<String>,
    literal_functor: Option<String>,
    end: Arc<OpToken>,
}

impl TokenTable {
    pub fn new(
        identifier_functor: Option<&str>,
        literal_functor: Option<&str>,
        ignore_case: bool,
    ) -> Self {
        TokenTable {
            tokens: HashMap::new(),
            disabled: HashSet::new(),
            ignore_case,
            identifier_functor: identifier_functor.map(str::to_string),
            literal_functor: literal_functor.map(str::to_string),
            end: Arc::new(OpToken::end()),
        }
    }

    fn key(&self, name: &str) -> String {
        if self.ignore_case {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn is_ignoring_case(&self) -> bool {
        self.ignore_case
    }

    /// Registers `token` under its own id, replacing any previous token.
    pub fn add_token(&mut self, token: OpToken) -> Arc<OpToken> {
        let name = token.id().to_string();
        self.add_token_as(&name, token)
    }

    /// Registers `token` under `name`.
    pub fn add_token_as(&mut self, name: &str, token: OpToken) -> Arc<OpToken> {
        let token = Arc::new(token);
        let key = self.key(name);
        debug!("token table: register '{}'", key);
        self.tokens.insert(key, token.clone());
        token
    }

    /// Makes `alias` resolve to the token registered as `existing`.
    ///
    /// Returns `false` when `existing` is unknown.
    pub fn alias(&mut self, alias: &str, existing: &str) -> bool {
        match self.tokens.get(&self.key(existing)).cloned() {
            Some(token) => {
                let key = self.key(alias);
                self.tokens.insert(key, token);
                true
            }
            None => false,
        }
    }

    /// The token for `name`, unless unknown or disabled.
    pub fn lookup(&self, name: &str) -> Option<Arc<OpToken>> {
        let key = self.key(name);
        if self.disabled.contains(&key) {
            return None;
        }
        self.tokens.get(&key).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<OpToken>> {
        let key = self.key(name);
        self.tokens.remove(&key)
    }

    /// Hides `name` from lookups without forgetting its token.
    pub fn disable(&mut self, name: &str) {
        let key = self.key(name);
        self.disabled.insert(key);
    }

    pub fn enable(&mut self, name: &str) {
        let key = self.key(name);
        self.disabled.remove(&key);
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(&self.key(name))
    }

    /// A fresh identifier token carrying this table's identifier functor.
    pub fn new_identifier(&self, name: &str) -> Arc<OpToken> {
        Arc::new(OpToken::identifier(name, self.identifier_functor.as_deref()))
    }

    /// A fresh literal token carrying this table's literal functor.
    pub fn new_literal(&self, atom: AtomicTerm) -> Arc<OpToken> {
        Arc::new(OpToken::literal(atom, self.literal_functor.as_deref()))
    }

    pub fn end_token(&self) -> Arc<OpToken> {
        self.end.clone()
    }

    /// Registered spellings, for teaching the lexer custom operators.
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .keys()
            .filter(|k| !self.disabled.contains(*k))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::precedence;

    #[test]
    fn test_alias_resolves_to_same_token() {
        let mut table = TokenTable::new(None, None, true);
        table.add_token(OpToken::infix("&&", precedence::LOGICAL, "binaryOperatorNode"));
        assert!(table.alias("and", "&&"));
        let token = table.lookup("AND").unwrap();
        assert_eq!(token.id(), "&&");
        assert!(!table.alias("xor", "^^"));
    }

    #[test]
    fn test_disabled_tokens_are_hidden() {
        let mut table = TokenTable::new(None, None, false);
        table.add_token(OpToken::keyword("from"));
        table.disable("from");
        assert!(table.lookup("from").is_none());
        table.enable("from");
        assert!(table.contains("from"));
    }

    #[test]
    fn test_case_sensitive_table() {
        let mut table = TokenTable::new(None, None, false);
        table.add_token(OpToken::keyword("from"));
        assert!(table.lookup("FROM").is_none());
    }
}
