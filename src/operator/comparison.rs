use crate::{
    error::CompileError,
    extractor::ValueExtractor,
    filter::{Comparison, Filter},
    filter_builder::FilterBuilder,
    term::{Term, functor},
    token::{OpToken, precedence},
    token_table::TokenTable,
};

use super::{BaseOperator, add_aliases};

/// Relational operators. `is` aliases `==`, so `x is not null` arrives as
/// `==` with a negated right operand and compiles to `!=`.
#[derive(Debug, Clone)]
pub struct ComparisonOperator {
    comparison: Comparison,
    aliases: &'static [&'static str],
}

impl ComparisonOperator {
    pub fn new(comparison: Comparison, aliases: &'static [&'static str]) -> Self {
        ComparisonOperator { comparison, aliases }
    }

    pub fn equals() -> Self {
        ComparisonOperator::new(Comparison::Equal, &["=", "is"])
    }

    pub fn not_equals() -> Self {
        ComparisonOperator::new(Comparison::NotEqual, &["<>"])
    }

    pub fn less() -> Self {
        ComparisonOperator::new(Comparison::Less, &[])
    }

    pub fn less_or_equal() -> Self {
        ComparisonOperator::new(Comparison::LessOrEqual, &[])
    }

    pub fn greater() -> Self {
        ComparisonOperator::new(Comparison::Greater, &[])
    }

    pub fn greater_or_equal() -> Self {
        ComparisonOperator::new(Comparison::GreaterOrEqual, &[])
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }
}

/// The operand of `!x` / `not x`, if `term` is such a node.
fn negated_operand(term: &Term) -> Option<&Term> {
    let node = term.as_node()?;
    if node.functor() != functor::UNARY_OPERATOR || node.len() != 2 {
        return None;
    }
    let op = node.child(0)?.as_atom()?.text();
    (op == "!").then(|| node.child(1)).flatten()
}

impl BaseOperator for ComparisonOperator {
    fn symbol(&self) -> &str {
        self.comparison.symbol()
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }

    fn is_conditional(&self) -> bool {
        true
    }

    fn add_to_token_table(&self, table: &mut TokenTable) {
        table.add_token(OpToken::infix(
            self.symbol(),
            precedence::RELATIONAL,
            functor::BINARY_OPERATOR,
        ));
        add_aliases(table, self.symbol(), self.aliases);
    }

    fn make_filter(
        &self,
        left: &Term,
        right: &Term,
        builder: &FilterBuilder<'_>,
    ) -> Result<Filter, CompileError> {
        let (comparison, right) = match (self.comparison, negated_operand(right)) {
            (Comparison::Equal, Some(operand)) => (Comparison::NotEqual, operand),
            _ => (self.comparison, right),
        };

        let left = builder.extractor(left)?;
        let right = builder.extractor(right)?;
        if let (ValueExtractor::Constant(a), ValueExtractor::Constant(b)) = (&left, &right) {
            return Ok(Filter::from_bool(comparison.test(a, b)));
        }
        Ok(Filter::compare(comparison, left, right))
    }
}
