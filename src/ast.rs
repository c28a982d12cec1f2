//! 查询树：由语法分析器或链式构建API生成

use std::fmt;

use serde::Serialize;

use crate::error::QueryError;
use crate::lexer::is_word_char;
use crate::operator::{self, OperatorKind};

/// 过滤表达式的节点
///
/// 节点是不可变的值：[`Query::and`] 等组合方法会消费输入并返回新的树。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// 字段引用，例如 `age`
    FieldName(FieldNameOperand),
    /// 标量字面值，例如 `20` 或 `'mario'`
    FieldValue(FieldValueOperand),
    /// 文本中 `IN` 右侧的值列表：`(1,2,3)`
    ValueList(FieldValueListOperand),
    /// 显式的括号分组
    Parenthesis(Box<Query>),
    Unary {
        op: UnaryOperator,
        operand: Box<Query>,
    },
    /// 比较运算，`left` 通常是字段，`right` 通常是值
    Binary {
        op: BinaryOperator,
        left: Box<Query>,
        right: Box<Query>,
    },
    /// 一个字段后跟任意多个值，或者跟一个值列表
    Variadic {
        op: VariadicOperator,
        field: Box<Query>,
        values: Vec<Query>,
    },
    Logical {
        op: LogicalOperator,
        left: Box<Query>,
        right: Box<Query>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOperator {
    Not,
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Eq,    // =
    NotEq, // <>
    Gt,    // >
    Gte,   // >=
    Lt,    // <
    Lte,   // <=
    Like,  // LIKE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VariadicOperator {
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl UnaryOperator {
    pub fn kind(self) -> OperatorKind {
        match self {
            UnaryOperator::Not => OperatorKind::Not,
        }
    }
}

impl BinaryOperator {
    pub fn kind(self) -> OperatorKind {
        match self {
            BinaryOperator::Eq => OperatorKind::EqualTo,
            BinaryOperator::NotEq => OperatorKind::NotEqualTo,
            BinaryOperator::Gt => OperatorKind::GreaterThan,
            BinaryOperator::Gte => OperatorKind::GreaterOrEqualThan,
            BinaryOperator::Lt => OperatorKind::LowerThan,
            BinaryOperator::Lte => OperatorKind::LowerOrEqualThan,
            BinaryOperator::Like => OperatorKind::Like,
        }
    }

    fn from_kind(kind: OperatorKind) -> Option<Self> {
        let op = match kind {
            OperatorKind::EqualTo => BinaryOperator::Eq,
            OperatorKind::NotEqualTo => BinaryOperator::NotEq,
            OperatorKind::GreaterThan => BinaryOperator::Gt,
            OperatorKind::GreaterOrEqualThan => BinaryOperator::Gte,
            OperatorKind::LowerThan => BinaryOperator::Lt,
            OperatorKind::LowerOrEqualThan => BinaryOperator::Lte,
            OperatorKind::Like => BinaryOperator::Like,
            _ => return None,
        };
        Some(op)
    }
}

impl VariadicOperator {
    pub fn kind(self) -> OperatorKind {
        match self {
            VariadicOperator::In => OperatorKind::In,
        }
    }
}

impl LogicalOperator {
    pub fn kind(self) -> OperatorKind {
        match self {
            LogicalOperator::And => OperatorKind::And,
            LogicalOperator::Or => OperatorKind::Or,
        }
    }

    fn from_kind(kind: OperatorKind) -> Option<Self> {
        match kind {
            OperatorKind::And => Some(LogicalOperator::And),
            OperatorKind::Or => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

macro_rules! display_as_token {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.kind().token())
            }
        }
    )*};
}

display_as_token!(UnaryOperator, BinaryOperator, VariadicOperator, LogicalOperator);

/// 字段引用，链式构建API的入口：
///
/// ```
/// use filter_query::field;
///
/// let query = field("age").greater_than(20).and(field("name").like("pippo"));
/// assert_eq!(query.definition(), "age > 20 AND name LIKE pippo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldNameOperand {
    name: String,
}

impl FieldNameOperand {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn compare(&self, op: BinaryOperator, value: impl fmt::Display) -> Query {
        Query::Binary {
            op,
            left: Box::new(Query::FieldName(self.clone())),
            right: Box::new(Query::FieldValue(FieldValueOperand::from_display(value))),
        }
    }

    pub fn equal_to(&self, value: impl fmt::Display) -> Query {
        self.compare(BinaryOperator::Eq, value)
    }

    pub fn not_equal_to(&self, value: impl fmt::Display) -> Query {
        self.compare(BinaryOperator::NotEq, value)
    }

    pub fn like(&self, value: impl fmt::Display) -> Query {
        self.compare(BinaryOperator::Like, value)
    }

    pub fn greater_than(&self, value: impl fmt::Display) -> Query {
        self.compare(BinaryOperator::Gt, value)
    }

    pub fn greater_or_equal_than(&self, value: impl fmt::Display) -> Query {
        self.compare(BinaryOperator::Gte, value)
    }

    pub fn lower_than(&self, value: impl fmt::Display) -> Query {
        self.compare(BinaryOperator::Lt, value)
    }

    pub fn lower_or_equal_than(&self, value: impl fmt::Display) -> Query {
        self.compare(BinaryOperator::Lte, value)
    }

    /// 对集合构建 `IN`，值保持迭代顺序
    pub fn is_in<I>(&self, values: I) -> Query
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let list = values
            .into_iter()
            .map(FieldValueOperand::from_display)
            .collect();
        Query::Variadic {
            op: VariadicOperator::In,
            field: Box::new(Query::FieldName(self.clone())),
            values: vec![Query::ValueList(FieldValueListOperand::new(list))],
        }
    }
}

/// 字面值，以文本形式保存
///
/// 引号内没有转义机制：同时包含 `'` 和 `"` 的值仍会输出，但输出的定义无法被重新解析。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldValueOperand {
    value: String,
}

impl FieldValueOperand {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn from_display(value: impl fmt::Display) -> Self {
        Self::new(value.to_string())
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct FieldValueListOperand {
    values: Vec<FieldValueOperand>,
}

impl FieldValueListOperand {
    pub fn new(values: Vec<FieldValueOperand>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[FieldValueOperand] {
        &self.values
    }
}

/// 链式构建API的入口
pub fn field(name: impl Into<String>) -> FieldNameOperand {
    FieldNameOperand::new(name)
}

/// 对 `query` 取反
pub fn not(query: Query) -> Query {
    query.not()
}

impl Query {
    /// 用操作数构建 `kind` 对应的节点，并按运算符的元数检查操作数个数
    pub fn operation(kind: OperatorKind, operands: Vec<Query>) -> Result<Query, QueryError> {
        let descriptor = kind.descriptor();
        let found = operands.len();
        let mismatch = || QueryError::ArityMismatch {
            operator: descriptor.token,
            expected: descriptor.arity,
            found,
        };
        if !descriptor.arity.accepts(found) {
            return Err(mismatch());
        }

        let mut operands = operands.into_iter();
        let mut next = || operands.next().map(Box::new).ok_or_else(mismatch);

        let node = match kind {
            OperatorKind::Not => Query::Unary {
                op: UnaryOperator::Not,
                operand: next()?,
            },
            OperatorKind::In => {
                let field = next()?;
                Query::Variadic {
                    op: VariadicOperator::In,
                    field,
                    values: operands.collect(),
                }
            }
            kind => {
                let (left, right) = (next()?, next()?);
                match (LogicalOperator::from_kind(kind), BinaryOperator::from_kind(kind)) {
                    (Some(op), _) => Query::Logical { op, left, right },
                    (None, Some(op)) => Query::Binary { op, left, right },
                    (None, None) => return Err(mismatch()),
                }
            }
        };
        Ok(node)
    }

    pub fn and(self, other: Query) -> Query {
        self.combine(LogicalOperator::And, other)
    }

    pub fn or(self, other: Query) -> Query {
        self.combine(LogicalOperator::Or, other)
    }

    fn combine(self, op: LogicalOperator, other: Query) -> Query {
        Query::Logical {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Query {
        Query::Unary {
            op: UnaryOperator::Not,
            operand: Box::new(self),
        }
    }

    pub fn grouped(self) -> Query {
        Query::Parenthesis(Box::new(self))
    }

    /// 节点的运算符，叶子节点和括号分组返回 `None`
    pub fn operator_kind(&self) -> Option<OperatorKind> {
        match self {
            Query::FieldName(_)
            | Query::FieldValue(_)
            | Query::ValueList(_)
            | Query::Parenthesis(_) => None,
            Query::Unary { op, .. } => Some(op.kind()),
            Query::Binary { op, .. } => Some(op.kind()),
            Query::Variadic { op, .. } => Some(op.kind()),
            Query::Logical { op, .. } => Some(op.kind()),
        }
    }

    /// 按操作数顺序返回直接子节点
    pub fn operands(&self) -> Vec<&Query> {
        match self {
            Query::FieldName(_) | Query::FieldValue(_) | Query::ValueList(_) => Vec::new(),
            Query::Parenthesis(inner) => vec![inner.as_ref()],
            Query::Unary { operand, .. } => vec![operand.as_ref()],
            Query::Binary { left, right, .. } | Query::Logical { left, right, .. } => {
                vec![left.as_ref(), right.as_ref()]
            }
            Query::Variadic { field, values, .. } => {
                std::iter::once(field.as_ref()).chain(values).collect()
            }
        }
    }

    /// 把 `op` 连接的链展开成各个项，会穿过括号
    ///
    /// `a AND b AND c` 和 `(a AND b) AND c` 的树形不同，但项相同。
    pub fn logical_terms(&self, op: LogicalOperator) -> Vec<&Query> {
        let mut terms = Vec::new();
        self.collect_terms(op, &mut terms);
        terms
    }

    fn collect_terms<'q>(&'q self, wanted: LogicalOperator, terms: &mut Vec<&'q Query>) {
        match self {
            Query::Logical { op, left, right } if *op == wanted => {
                left.collect_terms(wanted, terms);
                right.collect_terms(wanted, terms);
            }
            Query::Parenthesis(inner) if matches!(**inner, Query::Logical { op, .. } if op == wanted) => {
                inner.collect_terms(wanted, terms);
            }
            other => terms.push(other),
        }
    }

    /// 节点的规范文本
    pub fn definition(&self) -> String {
        self.to_string()
    }
}

/// 能被重新分词为单个单词或数字时直接输出，否则加引号
fn write_atom(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let bare = !text.is_empty()
        && text.chars().all(is_word_char)
        && operator::lookup(text).is_none();
    if bare {
        f.write_str(text)
    } else if text.contains('\'') {
        write!(f, "\"{text}\"")
    } else {
        write!(f, "'{text}'")
    }
}

// 没有运算符优先级，只有重新解析会得到不同的树时才加括号。
// 语法分析器把一个完整的比较从左向右折叠，而以原子、分组或 NOT 结尾的
// 表达式会吞掉紧随其后的运算符。

/// 原子或括号分组，后面跟运算符时会把运算符吞进自己的表达式
fn is_primary(query: &Query) -> bool {
    matches!(
        query,
        Query::FieldName(_) | Query::FieldValue(_) | Query::ValueList(_) | Query::Parenthesis(_)
    )
}

/// 输出的文本是否以完整的比较结尾，即后面的运算符会开始新的一步折叠
fn ends_with_comparison(query: &Query) -> bool {
    match query {
        Query::Binary { .. } | Query::Variadic { .. } => true,
        Query::Logical { right, .. } => !right_needs_group(right) && ends_with_comparison(right),
        _ => false,
    }
}

fn left_needs_group(left: &Query) -> bool {
    match left {
        Query::Unary { .. } => true,
        Query::Logical { .. } => !ends_with_comparison(left),
        _ => false,
    }
}

/// 右侧只有 `b AND c` 这种以原子开头的链才能不加括号，它会被向右嵌套解析回来
fn right_needs_group(right: &Query) -> bool {
    match right {
        Query::Logical { left, .. } => !is_primary(left),
        _ => false,
    }
}

fn write_list<'q>(f: &mut fmt::Formatter<'_>, items: impl IntoIterator<Item = &'q Query>) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::FieldName(name) => write_atom(f, name.name()),
            Query::FieldValue(value) => write_atom(f, value.value()),
            Query::ValueList(list) => {
                for (i, value) in list.values().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_atom(f, value.value())?;
                }
                Ok(())
            }
            Query::Parenthesis(inner) => write!(f, "({inner})"),
            Query::Unary { op, operand } => match operand.as_ref() {
                Query::Parenthesis(_) => write!(f, "{op} {operand}"),
                _ => write!(f, "{op} ({operand})"),
            },
            Query::Binary { op, left, right } => write!(f, "{left} {op} {right}"),
            Query::Variadic { op, field, values } => {
                write!(f, "{field} {op} (")?;
                write_list(f, values)?;
                f.write_str(")")
            }
            Query::Logical { op, left, right } => {
                if left_needs_group(left) {
                    write!(f, "({left})")?;
                } else {
                    write!(f, "{left}")?;
                }
                if right_needs_group(right) {
                    write!(f, " {op} ({right})")
                } else {
                    write!(f, " {op} {right}")
                }
            }
        }
    }
}

impl From<FieldNameOperand> for Query {
    fn from(operand: FieldNameOperand) -> Self {
        Query::FieldName(operand)
    }
}

impl From<FieldValueOperand> for Query {
    fn from(operand: FieldValueOperand) -> Self {
        Query::FieldValue(operand)
    }
}

impl From<FieldValueListOperand> for Query {
    fn from(operand: FieldValueListOperand) -> Self {
        Query::ValueList(operand)
    }
}
