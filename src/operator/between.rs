use crate::{
    error::CompileError,
    extractor::ValueExtractor,
    filter::{Comparison, Filter},
    filter_builder::FilterBuilder,
    term::{Term, functor},
    token::{OpToken, precedence},
    token_table::TokenTable,
};

use super::BaseOperator;

/// `x between low and high`, inclusive on both ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct BetweenOperator;

impl BaseOperator for BetweenOperator {
    fn symbol(&self) -> &str {
        "between"
    }

    fn is_conditional(&self) -> bool {
        true
    }

    fn add_to_token_table(&self, table: &mut TokenTable) {
        table.add_token(OpToken::between(
            self.symbol(),
            precedence::RELATIONAL,
            functor::BINARY_OPERATOR,
        ));
    }

    fn make_filter(
        &self,
        left: &Term,
        right: &Term,
        builder: &FilterBuilder<'_>,
    ) -> Result<Filter, CompileError> {
        let [low, high] = match right.as_node() {
            Some(node) if node.functor() == functor::LIST && node.len() == 2 => {
                [&node.children()[0], &node.children()[1]]
            }
            _ => {
                return Err(CompileError::invalid_operand(
                    self.symbol(),
                    "requires a lower and an upper bound",
                ));
            }
        };

        let value = builder.extractor(left)?;
        let low = builder.extractor(low)?;
        let high = builder.extractor(high)?;

        if let (ValueExtractor::Constant(v), ValueExtractor::Constant(l), ValueExtractor::Constant(h)) =
            (&value, &low, &high)
        {
            return Ok(Filter::from_bool(
                Comparison::GreaterOrEqual.test(v, l) && Comparison::LessOrEqual.test(v, h),
            ));
        }
        Ok(Filter::Between { value, low, high })
    }
}
