use crate::{
    error::CompileError,
    filter::{Filter, LikePattern},
    filter_builder::FilterBuilder,
    term::{Term, functor},
    token::{OpToken, precedence},
    token_table::TokenTable,
    value::Value,
};

use super::BaseOperator;

/// `like` and its case-insensitive twin `ilike`, with optional `escape`.
#[derive(Debug, Clone)]
pub struct LikeOperator {
    ignore_case: bool,
}

impl LikeOperator {
    pub fn like() -> Self {
        LikeOperator { ignore_case: false }
    }

    pub fn ilike() -> Self {
        LikeOperator { ignore_case: true }
    }

    fn string_constant(&self, term: &Term, builder: &FilterBuilder<'_>, what: &str) -> Result<String, CompileError> {
        match builder.constant(term)? {
            Some(Value::String(s)) => Ok(s),
            _ => Err(CompileError::invalid_operand(
                self.symbol(),
                format!("{} must be a string constant", what),
            )),
        }
    }
}

impl BaseOperator for LikeOperator {
    fn symbol(&self) -> &str {
        if self.ignore_case { "ilike" } else { "like" }
    }

    fn is_conditional(&self) -> bool {
        true
    }

    fn add_to_token_table(&self, table: &mut TokenTable) {
        table.add_token(OpToken::like(
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
        let (pattern, escape) = match right.as_node() {
            Some(node) if node.functor() == functor::LIST && node.len() == 2 => {
                (&node.children()[0], Some(&node.children()[1]))
            }
            _ => (right, None),
        };

        let pattern = self.string_constant(pattern, builder, "pattern")?;
        let escape = match escape {
            Some(term) => {
                let text = self.string_constant(term, builder, "escape")?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => {
                        return Err(CompileError::invalid_operand(
                            self.symbol(),
                            "escape must be a single character",
                        ));
                    }
                }
            }
            None => None,
        };

        let pattern = LikePattern::new(&pattern, escape, self.ignore_case)
            .map_err(|e| CompileError::invalid_operand(self.symbol(), e.to_string()))?;
        Ok(Filter::Like {
            value: builder.extractor(left)?,
            pattern,
        })
    }
}
