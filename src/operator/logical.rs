use crate::{
    error::CompileError,
    filter::Filter,
    filter_builder::FilterBuilder,
    term::{Term, functor},
    token::{OpToken, precedence},
    token_table::TokenTable,
};

use super::{BaseOperator, add_aliases};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalKind {
    And,
    Or,
    Xor,
}

/// `&&` / `and`, `||` / `or`, `xor` / `^^`.
#[derive(Debug, Clone)]
pub struct LogicalOperator {
    kind: LogicalKind,
}

impl LogicalOperator {
    pub fn new(kind: LogicalKind) -> Self {
        LogicalOperator { kind }
    }

    pub fn kind(&self) -> LogicalKind {
        self.kind
    }

    fn binding_power(&self) -> i32 {
        match self.kind {
            LogicalKind::And => precedence::LOGICAL_BITWISE,
            LogicalKind::Or | LogicalKind::Xor => precedence::LOGICAL,
        }
    }
}

impl BaseOperator for LogicalOperator {
    fn symbol(&self) -> &str {
        match self.kind {
            LogicalKind::And => "&&",
            LogicalKind::Or => "||",
            LogicalKind::Xor => "xor",
        }
    }

    fn aliases(&self) -> &[&'static str] {
        match self.kind {
            LogicalKind::And => &["and"],
            LogicalKind::Or => &["or"],
            LogicalKind::Xor => &["^^"],
        }
    }

    fn is_conditional(&self) -> bool {
        true
    }

    fn add_to_token_table(&self, table: &mut TokenTable) {
        table.add_token(OpToken::infix(
            self.symbol(),
            self.binding_power(),
            functor::BINARY_OPERATOR,
        ));
        add_aliases(table, self.symbol(), self.aliases());
    }

    fn make_filter(
        &self,
        left: &Term,
        right: &Term,
        builder: &FilterBuilder<'_>,
    ) -> Result<Filter, CompileError> {
        let left = builder.condition(left)?;
        let right = builder.condition(right)?;

        Ok(match (self.kind, left, right) {
            (LogicalKind::And, Filter::Never, _) | (LogicalKind::And, _, Filter::Never) => Filter::Never,
            (LogicalKind::And, Filter::Always, f) | (LogicalKind::And, f, Filter::Always) => f,
            (LogicalKind::Or, Filter::Always, _) | (LogicalKind::Or, _, Filter::Always) => Filter::Always,
            (LogicalKind::Or, Filter::Never, f) | (LogicalKind::Or, f, Filter::Never) => f,
            (LogicalKind::And, l, r) => Filter::and(l, r),
            (LogicalKind::Or, l, r) => Filter::or(l, r),
            (LogicalKind::Xor, l, r) => Filter::xor(l, r),
        })
    }
}
