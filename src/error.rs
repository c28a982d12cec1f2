//! 词法分析、语法分析和构建查询的错误类型

use crate::operator::Arity;
use crate::token::Span;

/// 解析操作专用的Result类型
pub type ParseResult<T> = Result<T, ParseError>;

/// 词法分析器无法识别的字符序列
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string starting with {quote} at {span}")]
    UnterminatedString { quote: char, span: Span },
}

/// 用操作数列表构建查询节点失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("operator {operator} expects {expected} operand(s), got {found}")]
    ArityMismatch {
        operator: &'static str,
        expected: Arity,
        found: usize,
    },
}

/// 中止一次解析的错误，不做错误恢复，也没有部分结果
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unrecognized token '{token}' at {span}")]
    UnrecognizedToken { token: String, span: Span },

    #[error("unexpected end of filter")]
    UnexpectedEndOfInput,

    /// `span` 指向没有闭合的左括号
    #[error(") expected to close parenthesis opened at {span}")]
    MissingClosingParenthesis { span: Span },

    #[error("unknown operator '{operator}' at {span}")]
    UnknownOperator { operator: String, span: Span },

    #[error("cannot build operator node: {0}")]
    OperatorInstantiation(#[from] QueryError),

    #[error("filter nests deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

impl ParseError {
    pub fn unrecognized(token: impl Into<String>, span: Span) -> Self {
        ParseError::UnrecognizedToken {
            token: token.into(),
            span,
        }
    }

    pub fn unknown_operator(operator: impl Into<String>, span: Span) -> Self {
        ParseError::UnknownOperator {
            operator: operator.into(),
            span,
        }
    }

    /// 错误在源文本中的位置（如果有）
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Lex(LexError::UnterminatedString { span, .. })
            | ParseError::UnrecognizedToken { span, .. }
            | ParseError::MissingClosingParenthesis { span }
            | ParseError::UnknownOperator { span, .. } => Some(*span),
            ParseError::UnexpectedEndOfInput
            | ParseError::OperatorInstantiation(_)
            | ParseError::NestingTooDeep { .. } => None,
        }
    }
}

/// 加载 [`BuilderConfig`](crate::config::BuilderConfig) 时的错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}
