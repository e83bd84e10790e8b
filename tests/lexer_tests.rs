// tests/lexer_tests.rs

use assert_matches::assert_matches;
use cohql::error::ParseError;
use cohql::lexer::{BaseToken, BaseTokenKind, Lexer};
use cohql::term::LiteralKind;
use cohql::value::Value;

fn tokenize(input: &str) -> Vec<BaseToken> {
    Lexer::new(input).tokenize().unwrap()
}

fn texts(input: &str) -> Vec<String> {
    tokenize(input).iter().map(BaseToken::text).collect()
}

fn literal(input: &str) -> (LiteralKind, Value) {
    let tokens = tokenize(input);
    assert_eq!(tokens.len(), 1, "expected one token for {}", input);
    match &tokens[0].kind {
        BaseTokenKind::Literal(atom) => (atom.kind().unwrap(), atom.value()),
        other => panic!("Expected literal, got {:?}", other),
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_integer_sizes() {
    assert_eq!(literal("42"), (LiteralKind::Integer, Value::Integer(42)));
    assert_eq!(literal("5000000000"), (LiteralKind::Long, Value::Integer(5_000_000_000)));
    assert_eq!(literal("7L"), (LiteralKind::Long, Value::Integer(7)));
    assert_eq!(literal("3s"), (LiteralKind::Short, Value::Integer(3)));
}

#[test]
fn test_fractional_numbers() {
    assert_eq!(literal("1.5"), (LiteralKind::Double, Value::Float(1.5)));
    assert_eq!(literal("2e3"), (LiteralKind::Double, Value::Float(2000.0)));
    assert_eq!(literal("2.5F"), (LiteralKind::Float, Value::Float(2.5)));
    assert_eq!(literal("4D"), (LiteralKind::Double, Value::Float(4.0)));
    assert_matches!(literal("1.25B"), (LiteralKind::BigDecimal, Value::Decimal(_)));
}

#[test]
fn test_string_escapes_and_doubled_quotes() {
    assert_eq!(literal(r"'a\tb'").1, Value::String("a\tb".to_string()));
    assert_eq!(literal("'it''s'").1, Value::String("it's".to_string()));
    assert_eq!(literal(r#""say \"hi\"""#).1, Value::String("say \"hi\"".to_string()));
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_identifiers_and_punctuation() {
    assert_eq!(texts("a.b_c, $x;"), vec!["a", ".", "b_c", ",", "$x", ";"]);
}

#[test]
fn test_custom_operators_lex_as_one_symbol() {
    let tokens = Lexer::new("a ~= b").with_operators(["~="]).tokenize().unwrap();
    let texts: Vec<String> = tokens.iter().map(BaseToken::text).collect();
    assert_eq!(texts, vec!["a", "~=", "b"]);
}

#[test]
fn test_line_comments_are_skipped() {
    assert_eq!(texts("a -- the rest is ignored\n== 1"), vec!["a", "==", "1"]);
}

#[test]
fn test_nested_group_keeps_inner_tokens() {
    let tokens = tokenize("x in (1, (2, 3))");
    assert_eq!(tokens.len(), 3);
    assert_matches!(
        &tokens[2].kind,
        BaseTokenKind::Nested { open: '(', close: ')', tokens } if tokens.len() == 3
    );
}

#[test]
fn test_positions_track_lines() {
    let tokens = tokenize("a\n  b");
    assert_eq!(tokens[1].position.line, 2);
    assert_eq!(tokens[1].position.column, 3);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unterminated_string() {
    assert_matches!(Lexer::new("'abc").tokenize(), Err(ParseError::UnterminatedString(_)));
}

#[test]
fn test_number_glued_to_name() {
    assert_matches!(
        Lexer::new("10abc").tokenize(),
        Err(ParseError::InvalidNumber { text, .. }) if text == "10abc"
    );
}

#[test]
fn test_mismatched_nesting() {
    assert_matches!(
        Lexer::new("(a]").tokenize(),
        Err(ParseError::UnbalancedNesting { delimiter: ']', .. })
    );
    assert_matches!(
        Lexer::new("f(a").tokenize(),
        Err(ParseError::UnbalancedNesting { delimiter: '(', .. })
    );
}

#[test]
fn test_unexpected_character() {
    assert_matches!(
        Lexer::new("a ` b").tokenize(),
        Err(ParseError::UnexpectedCharacter { ch: '`', .. })
    );
}
