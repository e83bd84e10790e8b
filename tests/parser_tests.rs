// tests/parser_tests.rs

use assert_matches::assert_matches;
use cohql::error::{Denotation, ParseError};
use cohql::sql::functor as sql;
use cohql::term::{self, AtomicTerm, Term, functor};
use cohql::QueryLanguage;

fn parse(text: &str) -> Term {
    QueryLanguage::default().parse_filter(text).unwrap()
}

fn statement(text: &str) -> Term {
    QueryLanguage::default().parse_statement(text).unwrap()
}

fn int(n: i64) -> Term {
    Term::literal(AtomicTerm::integer(n))
}

fn ident(name: &str) -> Term {
    Term::identifier(name)
}

fn binary(op: &str, left: Term, right: Term) -> Term {
    Term::node(functor::BINARY_OPERATOR, vec![Term::string(op), left, right])
}

fn unary(op: &str, operand: Term) -> Term {
    Term::node(functor::UNARY_OPERATOR, vec![Term::string(op), operand])
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_product_binds_tighter_than_sum() {
    assert_eq!(
        parse("1 + 2 * 3"),
        binary("+", int(1), binary("*", int(2), int(3)))
    );
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(
        parse("(1 + 2) * 3"),
        binary("*", binary("+", int(1), int(2)), int(3))
    );
}

#[test]
fn test_exponent_is_right_associative() {
    assert_eq!(
        parse("2 ** 3 ** 2"),
        binary("**", int(2), binary("**", int(3), int(2)))
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(
        parse("a == 1 or b == 2 and c == 3"),
        binary(
            "||",
            binary("==", ident("a"), int(1)),
            binary("&&", binary("==", ident("b"), int(2)), binary("==", ident("c"), int(3)))
        )
    );
}

#[test]
fn test_comparison_binds_tighter_than_logic() {
    assert_eq!(
        parse("age > 18 && age < 65"),
        binary(
            "&&",
            binary(">", ident("age"), int(18)),
            binary("<", ident("age"), int(65))
        )
    );
}

// ============================================================================
// Paths and calls
// ============================================================================

#[test]
fn test_dotted_path_is_flattened() {
    assert_eq!(
        parse("a.b.c == 1"),
        binary(
            "==",
            Term::node(functor::DEREF, vec![ident("a"), ident("b"), ident("c")]),
            int(1)
        )
    );
}

#[test]
fn test_method_call_ends_a_path() {
    let expected = Term::node(
        functor::DEREF,
        vec![
            ident("address"),
            Term::node(functor::CALL, vec![Term::node("getCity", vec![])]),
        ],
    );
    assert_eq!(parse("address.getCity() == 'Oslo'").child(1), Some(&expected));
}

#[test]
fn test_function_call_arguments() {
    assert_eq!(
        parse("sum(price)"),
        Term::node(functor::CALL, vec![Term::node("sum", vec![ident("price")])])
    );
}

// ============================================================================
// Literals and bindings
// ============================================================================

#[test]
fn test_literal_words_ignore_case() {
    assert_eq!(parse("TRUE"), Term::literal(AtomicTerm::boolean(true)));
    assert_eq!(parse("Null"), Term::literal(AtomicTerm::null()));
}

#[test]
fn test_bindings() {
    assert_eq!(
        parse("?1"),
        Term::node(functor::BINDING, vec![Term::string("?"), int(1)])
    );
    assert_eq!(
        parse(":name"),
        Term::node(functor::BINDING, vec![Term::string(":"), ident("name")])
    );
}

#[test]
fn test_in_list() {
    assert_eq!(
        parse("x in (1, 2, 3)"),
        binary("in", ident("x"), Term::node(functor::LIST, vec![int(1), int(2), int(3)]))
    );
}

#[test]
fn test_groups_nest_inside_lists() {
    assert_eq!(
        parse("x in (1, (2 + 3) * 4)"),
        binary(
            "in",
            ident("x"),
            Term::node(
                functor::LIST,
                vec![int(1), binary("*", binary("+", int(2), int(3)), int(4))]
            )
        )
    );
}

// ============================================================================
// Multi-word operators
// ============================================================================

#[test]
fn test_not_in_negates_membership() {
    assert_eq!(
        parse("x not in (1, 2)"),
        unary(
            "!",
            binary("in", ident("x"), Term::node(functor::LIST, vec![int(1), int(2)]))
        )
    );
}

#[test]
fn test_is_not_null() {
    assert_eq!(
        parse("x is not null"),
        binary("==", ident("x"), unary("!", Term::literal(AtomicTerm::null())))
    );
}

#[test]
fn test_contains_variants_ignore_case() {
    assert_eq!(parse("tags contains 'a'").child(0), Some(&Term::string("contains")));
    assert_eq!(
        parse("tags CONTAINS ANY ('a', 'b')").child(0),
        Some(&Term::string("contains_any"))
    );
    assert_eq!(
        parse("tags contains All ('a', 'b')").child(0),
        Some(&Term::string("contains_all"))
    );
}

#[test]
fn test_between_bundles_bounds() {
    assert_eq!(
        parse("x between 1 and 10"),
        binary("between", ident("x"), Term::node(functor::LIST, vec![int(1), int(10)]))
    );
}

#[test]
fn test_between_requires_and() {
    assert_matches!(
        QueryLanguage::default().parse_filter("x between 1 or 10"),
        Err(ParseError::Expected { expected, found }) if expected == "and" && found == "or"
    );
}

#[test]
fn test_like_with_escape() {
    let term = parse("name like 'A!_%' escape '!'");
    assert_eq!(
        term.child(2),
        Some(&Term::node(
            functor::LIST,
            vec![
                Term::literal(AtomicTerm::string("A!_%")),
                Term::literal(AtomicTerm::string("!")),
            ]
        ))
    );
}

// ============================================================================
// Language modes
// ============================================================================

#[test]
fn test_strict_language_rejects_unknown_symbols() {
    assert!(QueryLanguage::default().parse_filter("# == 1").is_ok());

    let strict = QueryLanguage::builder().strict(true).build();
    assert_matches!(
        strict.parse_filter("# == 1"),
        Err(ParseError::UnknownToken { token, .. }) if token == "#"
    );
}

#[test]
fn test_trailing_input_is_an_error() {
    assert_matches!(
        QueryLanguage::default().parse_filter("a == 1 b"),
        Err(ParseError::TrailingInput(_))
    );
}

#[test]
fn test_extended_literals_need_extended_language() {
    let err = QueryLanguage::default()
        .parse_statement("insert into 'c' value [1, 2]")
        .unwrap_err();
    assert!(err.is_configuration_error());

    let extended = QueryLanguage::builder().extended(true).build();
    let term = extended.parse_statement("insert into 'c' value { 'a': 1 }").unwrap();
    let value = term.as_node().unwrap().find_attribute(sql::VALUE).unwrap();
    assert_eq!(
        value,
        &Term::node(
            functor::BAG_LITERAL,
            vec![Term::node(
                functor::PAIR,
                vec![Term::literal(AtomicTerm::string("a")), int(1)]
            )]
        )
    );
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_select_shape() {
    let term = statement("select distinct name, age from 'people' p where p.age > 5 group by name");
    let node = term.as_node().unwrap();
    assert_eq!(node.functor(), sql::SELECT);
    assert_eq!(
        node.find_attribute(sql::IS_DISTINCT),
        Some(&Term::atom(AtomicTerm::boolean(true)))
    );
    assert_eq!(node.find_child(sql::FIELD_LIST).unwrap().len(), 2);
    assert_eq!(node.find_attribute(sql::FROM), Some(&Term::string("people")));
    assert_eq!(node.find_attribute(sql::ALIAS), Some(&Term::string("p")));
    assert_eq!(node.find_child(sql::GROUP_BY).unwrap().len(), 1);
}

#[test]
fn test_select_star_has_no_fields() {
    let term = statement("select * from people");
    let node = term.as_node().unwrap();
    assert!(node.find_child(sql::FIELD_LIST).unwrap().is_empty());
    assert!(node.find_child(sql::WHERE).unwrap().is_empty());
}

#[test]
fn test_create_peeks_at_next_word() {
    assert_eq!(statement("create cache 'c'").functor(), sql::CREATE_CACHE);
    assert_eq!(statement("ensure cache 'c'").functor(), sql::CREATE_CACHE);
    assert_eq!(statement("create index on 'c' name").functor(), sql::CREATE_INDEX);
    assert_eq!(statement("drop index 'c' name").functor(), sql::DROP_INDEX);
    assert_eq!(statement("drop cache 'c'").functor(), sql::DROP_CACHE);
    assert!(QueryLanguage::default().parse_statement("create table 'c'").is_err());
}

#[test]
fn test_statement_list() {
    let terms = QueryLanguage::default()
        .parse_statements("create cache c; insert into c key 1 value 'a'; select * from c;")
        .unwrap();
    let functors: Vec<&str> = terms.iter().map(Term::functor).collect();
    assert_eq!(functors, vec![sql::CREATE_CACHE, sql::INSERT, sql::SELECT]);
}

#[test]
fn test_explain_wraps_plan() {
    let term = statement("explain plan for delete from c where x == 1");
    let plan = term.as_node().unwrap().find_attribute(sql::PLAN).unwrap();
    assert_eq!(plan.functor(), sql::DELETE);
}

// ============================================================================
// Term notation
// ============================================================================

#[test]
fn test_term_notation_round_trip() {
    let parsed = parse("a.b == 'x' and c > 10");
    assert_eq!(term::create(&parsed.to_string()).unwrap(), parsed);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_infix_operator_in_prefix_position() {
    assert_matches!(
        QueryLanguage::default().parse_filter("a + * b"),
        Err(ParseError::Unexpected { token, denotation: Denotation::Prefix, .. }) if token == "*"
    );
}

#[test]
fn test_unterminated_field_list() {
    assert_matches!(
        QueryLanguage::default().parse_statement("select a, b"),
        Err(ParseError::UnterminatedList(end)) if end == "from"
    );
}

#[test]
fn test_peek_keywords_follow_language_case() {
    let language = QueryLanguage::builder().ignore_case(false).build();
    assert_eq!(
        language.parse_statement("create cache c").unwrap().functor(),
        sql::CREATE_CACHE
    );
    assert!(language.parse_statement("create CACHE c").is_err());
}
