//! CohQL front end.
//!
//! Text is tokenized by the [`lexer`], classified against a [`token_table`]
//! by the [`scanner`] and parsed top-down by operator precedence into a
//! [`term`] tree. A [`FilterBuilder`] compiles that tree into runtime
//! [`Filter`]s and [`ValueExtractor`]s; SQL statements become
//! [`statement`]s executed against an in-memory cache store.
//!
//! ```
//! use cohql::{Entry, QueryLanguage, Value};
//!
//! let language = QueryLanguage::default();
//! let filter = language.filter("name == 'Ann' and age > 21", &[], None).unwrap();
//!
//! let mut person = std::collections::HashMap::new();
//! person.insert("name".to_string(), Value::from("Ann"));
//! person.insert("age".to_string(), Value::Integer(30));
//! assert!(filter.evaluate(&Entry::new(1, Value::Object(person))));
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod filter_builder;
pub mod function;
pub mod helper;
pub mod language;
pub mod lexer;
pub mod operator;
pub mod parser;
pub mod scanner;
pub mod sql;
pub mod statement;
pub mod term;
pub mod token;
pub mod token_table;
pub mod unparse;
pub mod value;

pub use error::{CompileError, ExecutionError, ParseError, Position, QueryError};
pub use extractor::{Entry, ExtractorBuilder, Target, ValueExtractor};
pub use filter::Filter;
pub use filter_builder::{Compiled, FilterBuilder, NamedBindings};
pub use helper::{create_extractor, create_filter};
pub use language::{LanguageBuilder, QueryLanguage};
pub use lexer::Lexer;
pub use parser::OpParser;
pub use statement::{ExecutionContext, Statement, StatementResult};
pub use term::{AtomicTerm, NodeTerm, Term, TermWalker};
pub use unparse::unparse;
pub use value::Value;
