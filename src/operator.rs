//! Operators: the bridge between operator tokens and filters/extractors.
//!
//! Each operator registers its own spelling (and aliases) in a token table and
//! knows how to turn its operand terms into either a [`Filter`] (conditional
//! operators such as `==` or `like`) or a [`ValueExtractor`] (value operators
//! such as `+`).

mod arithmetic;
mod between;
mod collection;
mod comparison;
mod custom;
mod like;
mod logical;

use std::{fmt, sync::Arc};

use crate::{
    error::CompileError,
    extractor::ValueExtractor,
    filter::Filter,
    filter_builder::FilterBuilder,
    term::Term,
    token_table::TokenTable,
};

pub use arithmetic::ArithmeticOperator;
pub use between::BetweenOperator;
pub use collection::{ContainsOperator, InOperator};
pub use comparison::ComparisonOperator;
pub use custom::CustomOperator;
pub use like::LikeOperator;
pub use logical::{LogicalKind, LogicalOperator};

pub trait BaseOperator: Send + Sync + fmt::Debug {
    /// Canonical spelling; binary-operator nodes carry this symbol.
    fn symbol(&self) -> &str;

    /// Alternative spellings that resolve to the same token.
    fn aliases(&self) -> &[&'static str] {
        &[]
    }

    /// Whether the operator produces a filter rather than a value.
    fn is_conditional(&self) -> bool;

    fn add_to_token_table(&self, table: &mut TokenTable);

    fn make_filter(
        &self,
        _left: &Term,
        _right: &Term,
        _builder: &FilterBuilder<'_>,
    ) -> Result<Filter, CompileError> {
        Err(CompileError::invalid_operand(self.symbol(), "does not produce a filter"))
    }

    fn make_extractor(
        &self,
        _left: &Term,
        _right: &Term,
        _builder: &FilterBuilder<'_>,
    ) -> Result<ValueExtractor, CompileError> {
        Err(CompileError::invalid_operand(self.symbol(), "does not produce a value"))
    }
}

/// Registers `aliases` for `symbol`, which must already be in `table`.
fn add_aliases(table: &mut TokenTable, symbol: &str, aliases: &[&str]) {
    for alias in aliases {
        table.alias(alias, symbol);
    }
}

/// The operators every language starts with.
pub fn standard_operators() -> Vec<Arc<dyn BaseOperator>> {
    vec![
        Arc::new(LogicalOperator::new(LogicalKind::And)),
        Arc::new(LogicalOperator::new(LogicalKind::Or)),
        Arc::new(LogicalOperator::new(LogicalKind::Xor)),
        Arc::new(ComparisonOperator::equals()),
        Arc::new(ComparisonOperator::not_equals()),
        Arc::new(ComparisonOperator::less()),
        Arc::new(ComparisonOperator::less_or_equal()),
        Arc::new(ComparisonOperator::greater()),
        Arc::new(ComparisonOperator::greater_or_equal()),
        Arc::new(BetweenOperator),
        Arc::new(LikeOperator::like()),
        Arc::new(LikeOperator::ilike()),
        Arc::new(InOperator),
        Arc::new(ContainsOperator::contains()),
        Arc::new(ContainsOperator::contains_all()),
        Arc::new(ContainsOperator::contains_any()),
        Arc::new(ArithmeticOperator::add()),
        Arc::new(ArithmeticOperator::subtract()),
        Arc::new(ArithmeticOperator::multiply()),
        Arc::new(ArithmeticOperator::divide()),
    ]
}
