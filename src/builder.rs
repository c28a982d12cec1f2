//! 对外入口：把过滤文本转换为 [`Query`]，或用 [`QueryBuilder::field`] 开始链式构建

use crate::ast::{FieldNameOperand, Query};
use crate::config::BuilderConfig;
use crate::error::ParseResult;
use crate::parser;

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    config: BuilderConfig,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// 把 `filter` 解析为查询
    ///
    /// `Ok(None)` 表示过滤器为空。格式错误的过滤器返回错误；
    /// 宽松模式下只记录日志，同样返回 `Ok(None)`。
    pub fn create_query_filter(&self, filter: &str) -> ParseResult<Option<Query>> {
        match parser::parse_filter(filter, &self.config) {
            Err(err) if self.config.lenient => {
                tracing::error!(filter, error = %err, "discarding malformed filter");
                Ok(None)
            }
            result => result,
        }
    }

    /// 从字段 `name` 开始链式构建，不经过解析
    pub fn field(&self, name: impl Into<String>) -> FieldNameOperand {
        FieldNameOperand::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    #[test]
    fn test_builder() {
        let builder = QueryBuilder::new();
        let q = builder.create_query_filter("a LIKE pippo AND age < 50").unwrap();
        let q2 = builder
            .create_query_filter("a LIKE pippo AND (age < 50 OR name = mario)")
            .unwrap();
        let q3 = builder.create_query_filter("a LIKE pippo AND (age < 50 OR name = mario");
        assert!(q.is_some());
        assert!(q2.is_some());
        assert!(matches!(q3, Err(ParseError::MissingClosingParenthesis { .. })));
    }

    #[test]
    fn test_lenient_builder_discards_failures() {
        let builder = QueryBuilder::with_config(BuilderConfig::lenient());
        let q3 = builder
            .create_query_filter("a LIKE pippo AND (age < 50 OR name = mario")
            .unwrap();
        assert!(q3.is_none());

        let q = builder.create_query_filter("age > 20").unwrap();
        assert_eq!(q.map(|q| q.definition()), Some("age > 20".to_string()));
    }

    #[test]
    fn test_blank_filter_is_not_an_error() {
        let builder = QueryBuilder::new();
        assert_eq!(builder.create_query_filter("").unwrap(), None);
        assert_eq!(builder.create_query_filter("  ").unwrap(), None);
    }

    #[test]
    fn test_field_operand() {
        let builder = QueryBuilder::new();
        let prova = builder.field("prova");
        assert_eq!(prova.name(), "prova");
        assert_eq!(prova.equal_to("ciao").definition(), "prova = ciao");
        assert_eq!(prova.is_in(["a", "b"]).definition(), "prova IN (a,b)");
    }

    #[test]
    fn test_parsed_filter_merges_with_programmatic_filter() {
        let builder = QueryBuilder::new();
        let user_filter = builder
            .create_query_filter("name LIKE mario OR age < 30")
            .unwrap()
            .unwrap();
        let owned = builder.field("ownerId").equal_to(42).and(user_filter.grouped());
        assert_eq!(owned.definition(), "ownerId = 42 AND (name LIKE mario OR age < 30)");
    }
}
