use crate::{
    error::CompileError,
    filter::{ContainsMode, Filter},
    filter_builder::FilterBuilder,
    term::{Term, functor},
    token::{OpToken, precedence},
    token_table::TokenTable,
};

use super::BaseOperator;

/// `x in (a, b, c)`; a single candidate or a bound array also work.
#[derive(Debug, Clone, Copy, Default)]
pub struct InOperator;

impl BaseOperator for InOperator {
    fn symbol(&self) -> &str {
        "in"
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
    }

    fn make_filter(
        &self,
        left: &Term,
        right: &Term,
        builder: &FilterBuilder<'_>,
    ) -> Result<Filter, CompileError> {
        Ok(Filter::In {
            value: builder.extractor(left)?,
            candidates: builder.extractor(right)?,
        })
    }
}

/// `contains`, `contains all`, `contains any` over collection values.
///
/// Only plain `contains` owns a token; the `all`/`any` forms are folded into
/// the symbol by that token.
#[derive(Debug, Clone)]
pub struct ContainsOperator {
    mode: ContainsMode,
}

impl ContainsOperator {
    pub fn contains() -> Self {
        ContainsOperator { mode: ContainsMode::One }
    }

    pub fn contains_all() -> Self {
        ContainsOperator { mode: ContainsMode::All }
    }

    pub fn contains_any() -> Self {
        ContainsOperator { mode: ContainsMode::Any }
    }
}

impl BaseOperator for ContainsOperator {
    fn symbol(&self) -> &str {
        match self.mode {
            ContainsMode::One => "contains",
            ContainsMode::All => "contains_all",
            ContainsMode::Any => "contains_any",
        }
    }

    fn is_conditional(&self) -> bool {
        true
    }

    fn add_to_token_table(&self, table: &mut TokenTable) {
        if self.mode == ContainsMode::One {
            table.add_token(OpToken::contains(
                self.symbol(),
                precedence::RELATIONAL,
                functor::BINARY_OPERATOR,
            ));
        }
    }

    fn make_filter(
        &self,
        left: &Term,
        right: &Term,
        builder: &FilterBuilder<'_>,
    ) -> Result<Filter, CompileError> {
        Ok(Filter::Contains {
            collection: builder.extractor(left)?,
            mode: self.mode,
            operand: builder.extractor(right)?,
        })
    }
}
