//! Filter的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   └─ parse_expression(None)                  第一个表达式
//!        fold_expressions()                    把每次的结果作为 `left` 继续解析
//!                                              (每折叠一步计入一层嵌套深度)
//!
//! parse_expression(left)
//!   ├─ 没有left → parse_primary(as_field = true)
//!   └─ 下一个token
//!        ├─ 单词       → parse_operation(left, 单词)
//!        ├─ 符号       → read_symbol_operator() → parse_operation(left, "<>")
//!        └─ ) / 数字 / 结束 → left
//!
//! parse_operation(left, op)
//!   ├─ AND / OR  → right = parse_expression(None)
//!   └─ 其他      → 操作数 = [left, parse_primary(as_field = false)...]
//!
//! parse_primary(as_field)
//!   ├─ "("         → as_field: 分组表达式, 否则: 值列表
//!   ├─ NOT         → Not(parse_expression(None))
//!   ├─ 单词/字符串 → as_field 时为字段名, 否则为值
//!   └─ 数字        → 值
//! ```
//!
//! ## 运算符优先级
//!
//! 运算符之间没有优先级。只由字段组成的 `a AND b AND c` 向右嵌套，
//! 即 `AND(a, AND(b, c))`；完整的比较从左向右折叠：
//! `a = 1 AND b = 2 OR c = 3` 解析为 `OR(AND(a = 1, b = 2), c = 3)`。
//! 需要别的分组时使用括号。
//!
//! ## 示例
//!
//! ```text
//! age > 20
//! name LIKE 'pippo' AND (age < 50 OR name = mario)
//! id IN (1,2,3)
//! NOT (status = closed)
//! ```

use crate::ast::{FieldNameOperand, FieldValueListOperand, FieldValueOperand, Query};
use crate::config::{BuilderConfig, NumericLiterals};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Lexer;
use crate::operator;
use crate::token::{Span, Token, TokenKind};

static EOF: Token<'static> = Token {
    kind: TokenKind::Eof,
    span: Span { start: 0, end: 0 },
};

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
    depth: usize,
    max_depth: usize,
    numeric_literals: NumericLiterals,
}

/// 对 `input` 进行分词和解析，空白输入返回 `Ok(None)`
pub fn parse_filter(input: &str, config: &BuilderConfig) -> ParseResult<Option<Query>> {
    let tokens = Lexer::tokenize(input)?;
    let query = Parser::with_config(&tokens, config).parse()?;
    tracing::debug!(filter = input, "parsed filter");
    Ok(query)
}

impl<'a> Parser<'a> {
    /// `tokens` 应该以 [`TokenKind::Eof`] 结尾，即 [`Lexer::tokenize`] 的输出
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self::with_config(tokens, &BuilderConfig::default())
    }

    pub fn with_config(tokens: &'a [Token<'a>], config: &BuilderConfig) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            max_depth: config.max_depth,
            numeric_literals: config.numeric_literals,
        }
    }

    /// 返回当前token，不推进位置
    fn current(&self) -> &Token<'a> {
        self.tokens.get(self.position).unwrap_or(&EOF)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn unrecognized_here(&self) -> ParseError {
        let token = self.current();
        match token.kind {
            TokenKind::Eof => ParseError::UnexpectedEndOfInput,
            _ => ParseError::unrecognized(token.kind.text(), token.span),
        }
    }

    /// 进入下一层嵌套，超过 `max_depth` 时报错
    fn descend(&mut self) -> ParseResult<()> {
        if self.depth >= self.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// 在更深一层嵌套中执行 `f`
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.descend()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// 解析整个token流，除结束符外没有token时返回 `None`
    pub fn parse(&mut self) -> ParseResult<Option<Query>> {
        if matches!(self.current().kind, TokenKind::Eof) {
            return Ok(None);
        }
        let first = self.parse_expression(None)?;
        self.fold_expressions(first, false).map(Some)
    }

    /// 把 `result` 反复交给 `parse_expression`，直到输入结束（或分组的右括号）
    fn fold_expressions(&mut self, result: Query, in_group: bool) -> ParseResult<Query> {
        let outer = self.depth;
        let folded = self.fold_steps(result, in_group);
        self.depth = outer;
        folded
    }

    fn fold_steps(&mut self, mut result: Query, in_group: bool) -> ParseResult<Query> {
        loop {
            match self.current().kind {
                TokenKind::Eof => break,
                TokenKind::RParen if in_group => break,
                _ => {}
            }
            // 每折叠一步，树就向左加深一层
            self.descend()?;
            let start = self.position;
            result = self.parse_expression(Some(result))?;
            if self.position == start {
                // 完整表达式之后的token无法使用
                return Err(self.unrecognized_here());
            }
        }
        Ok(result)
    }

    fn parse_expression(&mut self, left: Option<Query>) -> ParseResult<Query> {
        let left = match left {
            Some(left) => left,
            None => self.parse_primary(true)?,
        };

        let token = self.current().clone();
        match token.kind {
            TokenKind::Word(word) => {
                self.advance();
                self.parse_operation(left, word, token.span)
            }
            TokenKind::Number { .. } | TokenKind::RParen | TokenKind::Eof => Ok(left),
            _ => {
                let (symbol, span) = self.read_symbol_operator()?;
                self.parse_operation(left, &symbol, span)
            }
        }
    }

    /// 把相邻的符号token（例如 `<` `>`）拼成一个运算符
    fn read_symbol_operator(&mut self) -> ParseResult<(String, Span)> {
        let mut symbol = String::new();
        let mut span = self.current().span;
        while let TokenKind::Symbol(c) = self.current().kind {
            let next = self.current().span;
            if !symbol.is_empty() && next.start != span.end {
                break;
            }
            symbol.push(c);
            span.end = next.end;
            self.advance();
        }
        if symbol.is_empty() {
            return Err(self.unrecognized_here());
        }
        Ok((symbol, span))
    }

    /// 构建运算符 `token` 的节点，运算符已经被调用者消费
    fn parse_operation(&mut self, left: Query, token: &str, span: Span) -> ParseResult<Query> {
        let Some(descriptor) = operator::lookup(token) else {
            return Err(ParseError::unknown_operator(token, span));
        };

        if descriptor.needs_subexpression {
            let right = self.nested(|p| p.parse_expression(None))?;
            return Ok(Query::operation(descriptor.kind, vec![left, right])?);
        }

        let count = descriptor.arity.min();
        let mut operands = Vec::with_capacity(count);
        operands.push(left);
        for _ in 1..count {
            operands.push(self.parse_primary(false)?);
        }
        Ok(Query::operation(descriptor.kind, operands)?)
    }

    /// 解析最小单元：分组、前缀表达式、字段或值
    fn parse_primary(&mut self, as_field: bool) -> ParseResult<Query> {
        let token = self.current().clone();
        let node = match token.kind {
            TokenKind::LParen => return self.parse_parenthesis(as_field),
            TokenKind::Word(word) => {
                if let Some(descriptor) = operator::lookup_prefix(word) {
                    self.advance();
                    return self.nested(|p| {
                        let operand = p.parse_expression(None)?;
                        Ok(Query::operation(descriptor.kind, vec![operand])?)
                    });
                }
                Self::operand(word, as_field)
            }
            TokenKind::Quoted { value, .. } => Self::operand(value, as_field),
            TokenKind::Number { text, value } => Query::FieldValue(FieldValueOperand::new(
                self.numeric_literals.render(text, value),
            )),
            _ => return Err(self.unrecognized_here()),
        };
        self.advance();
        Ok(node)
    }

    fn operand(text: &str, as_field: bool) -> Query {
        if as_field {
            Query::FieldName(FieldNameOperand::new(text))
        } else {
            Query::FieldValue(FieldValueOperand::new(text))
        }
    }

    /// 解析 `( ... )`。期望字段时内容是嵌套表达式，期望值时是逗号分隔的值列表
    fn parse_parenthesis(&mut self, as_field: bool) -> ParseResult<Query> {
        let open = self.current().span;
        self.advance(); // 消费 '('

        let inner = self.nested(|p| {
            if as_field {
                let first = p.parse_expression(None)?;
                let inner = p.fold_expressions(first, true)?;
                Ok(Query::Parenthesis(Box::new(inner)))
            } else {
                p.parse_value_list()
            }
        })?;

        if !matches!(self.current().kind, TokenKind::RParen) {
            return Err(ParseError::MissingClosingParenthesis { span: open });
        }
        self.advance(); // 消费 ')'
        Ok(inner)
    }

    fn parse_value_list(&mut self) -> ParseResult<Query> {
        let mut values = Vec::new();
        loop {
            let token = self.current().clone();
            match token.kind {
                TokenKind::RParen | TokenKind::Eof => break,
                TokenKind::Comma => {}
                TokenKind::Word(text) | TokenKind::Quoted { value: text, .. } => {
                    values.push(FieldValueOperand::new(text));
                }
                TokenKind::Number { text, value } => {
                    values.push(FieldValueOperand::new(self.numeric_literals.render(text, value)));
                }
                _ => return Err(self.unrecognized_here()),
            }
            self.advance();
        }
        Ok(Query::ValueList(FieldValueListOperand::new(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{field, BinaryOperator, LogicalOperator};

    fn parse_string(input: &str) -> ParseResult<Option<Query>> {
        parse_filter(input, &BuilderConfig::default())
    }

    fn parse_ok(input: &str) -> Query {
        parse_string(input).unwrap().unwrap()
    }

    #[test]
    fn test_simple_comparison() {
        let query = parse_ok("age > 20");
        assert_eq!(query, field("age").greater_than(20));
    }

    #[test]
    fn test_every_comparison_operator() {
        let cases = [
            ("a = b", BinaryOperator::Eq),
            ("a <> b", BinaryOperator::NotEq),
            ("a > b", BinaryOperator::Gt),
            ("a >= b", BinaryOperator::Gte),
            ("a < b", BinaryOperator::Lt),
            ("a <= b", BinaryOperator::Lte),
            ("a LIKE b", BinaryOperator::Like),
            ("a<>b", BinaryOperator::NotEq),
        ];
        for (input, expected) in cases {
            match parse_ok(input) {
                Query::Binary { op, left, right } => {
                    assert_eq!(op, expected, "{input}");
                    assert_eq!(*left, Query::FieldName(FieldNameOperand::new("a")));
                    assert_eq!(*right, Query::FieldValue(FieldValueOperand::new("b")));
                }
                other => panic!("Expected comparison for {input}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_logical_with_comparisons() {
        let query = parse_ok("a LIKE pippo AND age < 50");
        assert_eq!(
            query,
            field("a").like("pippo").and(field("age").lower_than(50))
        );
        assert_eq!(query.definition(), "a LIKE pippo AND age < 50");
    }

    #[test]
    fn test_nested_parenthesis() {
        let query = parse_ok("a LIKE pippo AND (age < 50 OR name = mario)");
        let expected = field("a").like("pippo").and(
            field("age")
                .lower_than(50)
                .or(field("name").equal_to("mario"))
                .grouped(),
        );
        assert_eq!(query, expected);
        assert_eq!(query.definition(), "a LIKE pippo AND (age < 50 OR name = mario)");
    }

    #[test]
    fn test_missing_closing_parenthesis() {
        let err = parse_string("a LIKE pippo AND (age < 50 OR name = mario").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingClosingParenthesis {
                span: Span::new(17, 18)
            }
        );

        let err = parse_string("id IN (1, 2").unwrap_err();
        assert!(matches!(err, ParseError::MissingClosingParenthesis { .. }));
    }

    #[test]
    fn test_in_clause() {
        let query = parse_ok("id IN (1,2,3)");
        assert_eq!(query, field("id").is_in([1, 2, 3]));
        assert_eq!(query.definition(), "id IN (1,2,3)");

        let query = parse_ok("name IN ('mario rossi', luigi)");
        assert_eq!(query.definition(), "name IN ('mario rossi',luigi)");
    }

    #[test]
    fn test_in_clause_empty_and_single_value() {
        assert_eq!(parse_ok("id IN ()").definition(), "id IN ()");
        assert_eq!(parse_ok("id IN 5").definition(), "id IN (5)");
    }

    #[test]
    fn test_in_clause_rejects_operators_in_list() {
        let err = parse_string("id IN (1, =, 2)").unwrap_err();
        assert_eq!(err, ParseError::unrecognized("=", Span::new(10, 11)));
    }

    #[test]
    fn test_bare_fields_nest_to_the_right() {
        match parse_ok("a AND b AND c") {
            Query::Logical { op, left, right } => {
                assert_eq!(op, LogicalOperator::And);
                assert_eq!(*left, Query::FieldName(FieldNameOperand::new("a")));
                assert!(matches!(*right, Query::Logical { op: LogicalOperator::And, .. }));
            }
            other => panic!("Expected AND, got {other:?}"),
        }
    }

    #[test]
    fn test_comparisons_fold_left_to_right() {
        let query = parse_ok("a = 1 AND b = 2 OR c = 3");
        let expected = field("a")
            .equal_to(1)
            .and(field("b").equal_to(2))
            .or(field("c").equal_to(3));
        assert_eq!(query, expected);
    }

    #[test]
    fn test_associative_shapes_have_same_terms() {
        let flat = parse_ok("a AND b AND c");
        let grouped = parse_ok("(a AND b) AND c");
        assert_ne!(flat, grouped);

        let terms = |q: &Query| -> Vec<String> {
            q.logical_terms(LogicalOperator::And)
                .into_iter()
                .map(Query::definition)
                .collect()
        };
        assert_eq!(terms(&flat), vec!["a", "b", "c"]);
        assert_eq!(terms(&flat), terms(&grouped));
    }

    #[test]
    fn test_not_prefix() {
        let query = parse_ok("NOT (uniqueField = a)");
        assert_eq!(query.definition(), "NOT (uniqueField = a)");
        assert!(matches!(query, Query::Unary { .. }));

        let query = parse_ok("NOT status = closed");
        assert_eq!(query, field("status").equal_to("closed").not());
    }

    #[test]
    fn test_not_inside_parenthesis() {
        let query = parse_ok("a = 1 AND (NOT b = 2)");
        assert_eq!(query.definition(), "a = 1 AND (NOT (b = 2))");
    }

    #[test]
    fn test_quoted_strings() {
        let query = parse_ok(r#"name = 'mario rossi' OR nick = "AND""#);
        assert_eq!(
            query,
            field("name")
                .equal_to("mario rossi")
                .or(field("nick").equal_to("AND"))
        );
        assert_eq!(query.definition(), "name = 'mario rossi' OR nick = 'AND'");
    }

    #[test]
    fn test_unquoted_word_values() {
        let query = parse_ok("email = mario.rossi@example.com AND born >= 1990-01-31");
        assert_eq!(
            query.definition(),
            "email = mario.rossi@example.com AND born >= 1990-01-31"
        );
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(parse_ok("age > 20").definition(), "age > 20");

        let config = BuilderConfig {
            numeric_literals: NumericLiterals::Normalized,
            ..BuilderConfig::default()
        };
        let query = parse_filter("age > 20 AND id IN (1, 2.5)", &config)
            .unwrap()
            .unwrap();
        assert_eq!(query.definition(), "age > 20.0 AND id IN (1.0,2.5)");
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(parse_string("").unwrap(), None);
        assert_eq!(parse_string("   \t\n").unwrap(), None);
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse_string("age ~ 20").unwrap_err();
        assert_eq!(err, ParseError::unknown_operator("~", Span::new(4, 5)));

        let err = parse_string("age like 20").unwrap_err();
        assert_eq!(err, ParseError::unknown_operator("like", Span::new(4, 8)));

        let err = parse_string("a = b c = d").unwrap_err();
        assert_eq!(err, ParseError::unknown_operator("c", Span::new(6, 7)));
    }

    #[test]
    fn test_separated_symbols_do_not_join() {
        let err = parse_string("age > = 20").unwrap_err();
        assert_eq!(err, ParseError::unrecognized("=", Span::new(6, 7)));
    }

    #[test]
    fn test_unrecognized_tokens() {
        assert_eq!(
            parse_string("= 5").unwrap_err(),
            ParseError::unrecognized("=", Span::new(0, 1))
        );
        assert_eq!(
            parse_string("a = 1)").unwrap_err(),
            ParseError::unrecognized(")", Span::new(5, 6))
        );
        assert_eq!(
            parse_string("a = 1 2").unwrap_err(),
            ParseError::unrecognized("2", Span::new(6, 7))
        );
        assert_eq!(
            parse_string("()").unwrap_err(),
            ParseError::unrecognized(")", Span::new(1, 2))
        );
        assert_eq!(
            parse_string("a = 1, b").unwrap_err(),
            ParseError::unrecognized(",", Span::new(5, 6))
        );
    }

    #[test]
    fn test_unexpected_end() {
        assert_eq!(parse_string("a =").unwrap_err(), ParseError::UnexpectedEndOfInput);
        assert_eq!(parse_string("a = 1 AND").unwrap_err(), ParseError::UnexpectedEndOfInput);
        assert_eq!(parse_string("NOT").unwrap_err(), ParseError::UnexpectedEndOfInput);
    }

    #[test]
    fn test_lex_errors_are_reported() {
        let err = parse_string("name = 'mario").unwrap_err();
        assert!(matches!(err, ParseError::Lex(_)));
    }

    #[test]
    fn test_depth_limit() {
        let config = BuilderConfig {
            max_depth: 4,
            ..BuilderConfig::default()
        };
        assert_eq!(
            parse_filter("(((((a = 1)))))", &config).unwrap_err(),
            ParseError::NestingTooDeep { limit: 4 }
        );
        assert!(parse_filter("((((a = 1))))", &config).is_ok());

        let deep = format!("{}a = 1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            parse_string(&deep).unwrap_err(),
            ParseError::NestingTooDeep { limit: 256 }
        );
    }

    fn chain(terms: usize) -> String {
        (0..terms)
            .map(|i| format!("f{i} = {i}"))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    #[test]
    fn test_folded_chain_counts_toward_depth() {
        let config = BuilderConfig {
            max_depth: 4,
            ..BuilderConfig::default()
        };
        assert!(parse_filter(&chain(4), &config).is_ok());
        assert_eq!(
            parse_filter(&chain(5), &config).unwrap_err(),
            ParseError::NestingTooDeep { limit: 4 }
        );
    }

    #[test]
    fn test_long_flat_chain_is_rejected_not_overflowed() {
        assert_eq!(
            parse_string(&chain(10_000)).unwrap_err(),
            ParseError::NestingTooDeep { limit: 256 }
        );

        let input = chain(200);
        assert_eq!(parse_ok(&input).definition(), input);
    }

    #[test]
    fn test_chains_render_as_written() {
        let inputs = [
            "a = 1 OR b = 2 OR c = 3 OR d = 4",
            "a = 1 AND b = 2 AND c = 3",
            "a = 1 AND b = 2 OR c = 3",
            "a AND b AND c",
            "x AND y = 2 OR z",
            "a = 1 AND x OR y",
        ];
        for input in inputs {
            assert_eq!(parse_ok(input).definition(), input);
        }
    }

    #[test]
    fn test_definition_round_trip_is_stable() {
        let inputs = [
            "a LIKE pippo AND age < 50",
            "a LIKE pippo AND (age < 50 OR name = mario)",
            "a = 1 AND b = 2 OR c = 3",
            "a AND b AND c",
            "NOT a = 1 AND b = 2",
            "x = 1 AND NOT y = 2 OR z = 3",
            "name = 'mario rossi' AND id IN (1, 2,3)",
            "NOT (NOT (a = 1))",
            "id IN ('a b', \"it's\", c)",
            "(a = 1 AND (b = 2)) OR c = 3",
            "(x AND y) AND z",
        ];
        for input in inputs {
            let first = parse_ok(input).definition();
            let second = parse_ok(&first).definition();
            assert_eq!(first, second, "{input}");
        }
    }
}
