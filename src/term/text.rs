//! Parser for the textual term notation produced by `Display`.

use std::sync::OnceLock;

use crate::{
    error::{Denotation, ParseError},
    parser::OpParser,
    term::{AtomicTerm, Term},
    token::{OpToken, precedence},
    token_table::TokenTable,
};

const NEGATE: &str = "-";

fn term_table() -> &'static TokenTable {
    static TABLE: OnceLock<TokenTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        // No identifier or literal functors: names and literals stay atoms
        let mut table = TokenTable::new(None, None, false);
        table.add_token(OpToken::paren("(", precedence::PARENTHESES, None, None));
        table.add_token(OpToken::punctuation(","));
        table.add_token(OpToken::prefix(NEGATE, precedence::UNARY, NEGATE));
        for (name, atom) in [
            ("true", AtomicTerm::boolean(true)),
            ("false", AtomicTerm::boolean(false)),
            ("null", AtomicTerm::null()),
            ("nan", AtomicTerm::double(f64::NAN)),
            ("infinity", AtomicTerm::double(f64::INFINITY)),
        ] {
            table.add_token_as(name, OpToken::literal(atom, None));
        }
        table
    })
}

/// Parses term notation such as `literal('x')` back into a [`Term`].
pub fn create(text: &str) -> Result<Term, ParseError> {
    let term = OpParser::for_text(term_table(), text)?.parse()?;
    fold_negation(term)
}

/// Turns `-(number)` into a negative numeric atom.
fn fold_negation(term: Term) -> Result<Term, ParseError> {
    match term {
        Term::Node(node) if node.functor() == NEGATE && node.len() == 2 => {
            let mut children = node.into_children();
            let operand = fold_negation(children.remove(1))?;
            let negated = match &operand {
                Term::Atomic(atom) => atom.negate().and_then(Result::ok),
                Term::Node(_) => None,
            };
            negated.map(Term::Atomic).ok_or_else(|| ParseError::Unexpected {
                kind: "operand",
                token: operand.to_string(),
                denotation: Denotation::Prefix,
            })
        }
        Term::Node(node) => {
            let functor = node.functor().to_string();
            let children = node
                .into_children()
                .into_iter()
                .map(fold_negation)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Term::node(functor, children))
        }
        atom => Ok(atom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::LiteralKind;

    #[test]
    fn test_parse_nested_term() {
        let t = create("binaryOperatorNode('==', identifier(foo), literal('bar'))").unwrap();
        assert_eq!(t.functor(), "binaryOperatorNode");
        assert_eq!(t.child(1).unwrap().identifier_name(), Some("foo"));
        assert_eq!(
            t.child(2).unwrap().child(0).unwrap().as_atom(),
            Some(&AtomicTerm::string("bar"))
        );
    }

    #[test]
    fn test_negative_and_special_numbers() {
        let t = create("literal(-5)").unwrap();
        assert_eq!(t.child(0).unwrap().as_atom(), Some(&AtomicTerm::integer(-5)));

        let t = create("literal(-infinity)").unwrap();
        let atom = t.child(0).unwrap().as_atom().unwrap();
        assert_eq!(atom.kind(), Some(LiteralKind::Double));
        assert_eq!(atom.to_string(), "-infinity");
    }

    #[test]
    fn test_display_round_trip() {
        let text = "derefNode(identifier(a), callNode(b(literal(1L), literal(2.5))))";
        assert_eq!(create(text).unwrap().to_string(), text);
    }
}
