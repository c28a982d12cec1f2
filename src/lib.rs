//! 过滤查询语言
//!
//! `age > 20 AND (name LIKE 'pippo' OR id IN (1,2,3))` 这样的过滤文本会被解析为 [`Query`] 树。
//! 也可以从 [`field`] 开始链式构建，用 [`Query::and`] / [`Query::or`] 组合，
//! 再用 [`Query::definition`] 输出规范文本。
//!
//! ```
//! use filter_query::{field, QueryBuilder};
//!
//! let builder = QueryBuilder::new();
//! let parsed = builder.create_query_filter("age > 20").unwrap().unwrap();
//! let query = parsed.and(field("name").like("pippo"));
//! assert_eq!(query.definition(), "age > 20 AND name LIKE pippo");
//! ```

pub mod ast;
pub mod builder;
pub mod config;
pub mod error;
pub mod lexer;
pub mod operator;
pub mod order;
pub mod parser;
pub mod token;

pub use ast::{
    field, not, BinaryOperator, FieldNameOperand, FieldValueListOperand, FieldValueOperand,
    LogicalOperator, Query, UnaryOperator, VariadicOperator,
};
pub use builder::QueryBuilder;
pub use config::{BuilderConfig, NumericLiterals};
pub use error::{ConfigError, LexError, ParseError, ParseResult, QueryError};
pub use operator::{Arity, OperatorDescriptor, OperatorKind};
pub use order::{QueryOrder, QueryOrderParameter};
pub use parser::parse_filter;
