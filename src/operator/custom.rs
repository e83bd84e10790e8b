use std::{fmt, sync::Arc};

use crate::{
    error::CompileError,
    filter::Filter,
    filter_builder::FilterBuilder,
    term::{Term, functor},
    token::OpToken,
    token_table::TokenTable,
    value::Value,
};

use super::BaseOperator;

pub type BinaryPredicate = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// User-defined infix predicate registered at language build time.
///
/// ```
/// use cohql::{QueryLanguage, operator::CustomOperator, token::precedence};
///
/// let language = QueryLanguage::builder()
///     .operator(CustomOperator::new("~=", precedence::RELATIONAL, |a, b| {
///         a.as_string().eq_ignore_ascii_case(&b.as_string())
///     }))
///     .build();
/// assert!(language.operator("~=").is_some());
/// ```
#[derive(Clone)]
pub struct CustomOperator {
    symbol: String,
    binding_power: i32,
    predicate: BinaryPredicate,
}

impl CustomOperator {
    pub fn new(
        symbol: impl Into<String>,
        binding_power: i32,
        predicate: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        CustomOperator {
            symbol: symbol.into(),
            binding_power,
            predicate: Arc::new(predicate),
        }
    }
}

impl fmt::Debug for CustomOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOperator")
            .field("symbol", &self.symbol)
            .field("binding_power", &self.binding_power)
            .finish()
    }
}

impl BaseOperator for CustomOperator {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn is_conditional(&self) -> bool {
        true
    }

    fn add_to_token_table(&self, table: &mut TokenTable) {
        table.add_token(OpToken::infix(
            self.symbol.as_str(),
            self.binding_power,
            functor::BINARY_OPERATOR,
        ));
    }

    fn make_filter(
        &self,
        left: &Term,
        right: &Term,
        builder: &FilterBuilder<'_>,
    ) -> Result<Filter, CompileError> {
        let left = builder.extractor(left)?;
        let right = builder.extractor(right)?;
        let predicate = self.predicate.clone();
        let name = format!("{} {} {}", left, self.symbol, right);
        Ok(Filter::custom(name, move |entry| {
            predicate(&left.extract(entry), &right.extract(entry))
        }))
    }
}
