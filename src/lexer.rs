//! Filter的词法分析器
//!
//! 字母、数字和 `. - @ / _` 是单词字符，所以标识符、小数、日期、邮箱和路径都不需要引号。
//! 小于等于ASCII空格的字符都是空白。`"` 和 `'` 包围字符串，其他字符各自成为一个符号token。

use crate::error::LexError;
use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
    /// 已经报告过输入结束或错误
    finished: bool,
}

/// `c` 能否出现在不加引号的单词中
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '@' | '/' | '_') || c >= '\u{a0}'
}

fn is_whitespace(c: char) -> bool {
    c <= ' '
}

/// 以数字开头（前面可以有负号或小数点）且整个单词能解析为浮点数时，单词就是数字
fn as_number(word: &str) -> Option<f64> {
    let mut chars = word.chars();
    let first = chars.next()?;
    let starts_numeric = match first {
        '0'..='9' => true,
        '-' | '.' => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    };
    if !starts_numeric {
        return None;
    }
    word.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: 0,
            finished: false,
        }
    }

    /// 对整个输入分词，返回的列表总是以一个 [`TokenKind::Eof`] 结尾
    pub fn tokenize(input: &'a str) -> Result<Vec<Token<'a>>, LexError> {
        let mut tokens = Lexer::new(input).collect::<Result<Vec<_>, _>>()?;
        let end = input.len();
        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(end, end),
        });
        tracing::trace!(count = tokens.len(), "tokenized filter");
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if is_whitespace(c) {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 读取引号包围的字符串
    /// 注意：开始的引号已经被调用者消费
    fn read_quoted(&mut self, start: usize, delimiter: char) -> Result<Token<'a>, LexError> {
        let content_start = self.position;
        loop {
            match self.bump() {
                Some(c) if c == delimiter => break,
                Some(_) => {}
                None => {
                    return Err(LexError::UnterminatedString {
                        quote: delimiter,
                        span: Span::new(start, self.position),
                    });
                }
            }
        }
        let value = &self.input[content_start..self.position - delimiter.len_utf8()];
        Ok(Token {
            kind: TokenKind::Quoted { delimiter, value },
            span: Span::new(start, self.position),
        })
    }

    /// 读取单词，第一个字符已经被消费
    fn read_word(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if is_word_char(c) {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.input[start..self.position];
        let kind = match as_number(text) {
            Some(value) => TokenKind::Number { text, value },
            None => TokenKind::Word(text),
        };
        Token {
            kind,
            span: Span::new(start, self.position),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.bump() else {
            self.finished = true;
            return None;
        };

        let single = |kind| Token {
            kind,
            span: Span::new(start, start + c.len_utf8()),
        };

        let token = match c {
            '(' => Ok(single(TokenKind::LParen)),
            ')' => Ok(single(TokenKind::RParen)),
            ',' => Ok(single(TokenKind::Comma)),
            '"' | '\'' => self.read_quoted(start, c),
            c if is_word_char(c) => Ok(self.read_word(start)),
            c => Ok(single(TokenKind::Symbol(c))),
        };
        if token.is_err() {
            self.finished = true;
        }
        Some(token)
    }
}
