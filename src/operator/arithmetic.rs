use crate::{
    error::CompileError,
    extractor::ValueExtractor,
    filter_builder::FilterBuilder,
    function::fold_arithmetic,
    term::{Term, functor},
    token::{OpToken, precedence},
    token_table::TokenTable,
    value::ArithmeticOp,
};

use super::BaseOperator;

/// `+ - * /`; `+` and `-` double as prefix operators.
#[derive(Debug, Clone)]
pub struct ArithmeticOperator {
    op: ArithmeticOp,
}

impl ArithmeticOperator {
    pub fn add() -> Self {
        ArithmeticOperator { op: ArithmeticOp::Add }
    }

    pub fn subtract() -> Self {
        ArithmeticOperator { op: ArithmeticOp::Subtract }
    }

    pub fn multiply() -> Self {
        ArithmeticOperator { op: ArithmeticOp::Multiply }
    }

    pub fn divide() -> Self {
        ArithmeticOperator { op: ArithmeticOp::Divide }
    }
}

impl BaseOperator for ArithmeticOperator {
    fn symbol(&self) -> &str {
        self.op.symbol()
    }

    fn is_conditional(&self) -> bool {
        false
    }

    fn add_to_token_table(&self, table: &mut TokenTable) {
        let token = match self.op {
            ArithmeticOp::Add | ArithmeticOp::Subtract => OpToken::infix_with_prefix(
                self.symbol(),
                precedence::SUM,
                functor::BINARY_OPERATOR,
                functor::UNARY_OPERATOR,
            ),
            ArithmeticOp::Multiply | ArithmeticOp::Divide => {
                OpToken::infix(self.symbol(), precedence::PRODUCT, functor::BINARY_OPERATOR)
            }
        };
        table.add_token(token);
    }

    fn make_extractor(
        &self,
        left: &Term,
        right: &Term,
        builder: &FilterBuilder<'_>,
    ) -> Result<ValueExtractor, CompileError> {
        let left = builder.extractor(left)?;
        let right = builder.extractor(right)?;
        if let (ValueExtractor::Constant(a), ValueExtractor::Constant(b)) = (&left, &right) {
            return fold_arithmetic(self.op, a, b).map(ValueExtractor::Constant);
        }
        Ok(ValueExtractor::Arithmetic {
            op: self.op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}
