//! Filter语言的token定义

use std::fmt;

/// token是语言的最小单元，包含类型和位置
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// token的类型
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    /// 连续的单词字符：标识符、关键字、日期、邮箱、路径
    Word(&'a str),
    /// `"` 或 `'` 之间的文本，不含引号
    Quoted { delimiter: char, value: &'a str },
    /// 可以读作小数的单词，`text` 是原始写法
    Number { text: &'a str, value: f64 },

    // 标点符号
    LParen, // (
    RParen, // )
    Comma,  // ,
    /// 其他单个非单词字符，例如 `<`、`=`、`>`
    Symbol(char),

    Eof,
}

impl TokenKind<'_> {
    /// token对应的源文本，用于错误信息和查找运算符
    pub fn text(&self) -> String {
        match self {
            TokenKind::Word(w) => (*w).to_string(),
            TokenKind::Quoted { delimiter, value } => format!("{delimiter}{value}{delimiter}"),
            TokenKind::Number { text, .. } => (*text).to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Symbol(c) => c.to_string(),
            TokenKind::Eof => "<eof>".to_string(),
        }
    }
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// 源文本中的一个区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// 起始字节偏移
    pub start: usize,
    /// 结束字节偏移
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
