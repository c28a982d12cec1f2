//! 运算符注册表
//!
//! 固定且有序的运算符表。语法分析器按精确（区分大小写）的写法查找，第一个匹配的条目生效。

use std::fmt;

use serde::Serialize;

/// 所有运算符种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperatorKind {
    And,
    EqualTo,
    GreaterOrEqualThan,
    GreaterThan,
    In,
    Like,
    LowerOrEqualThan,
    LowerThan,
    NotEqualTo,
    Not,
    Or,
}

/// 运算符绑定的操作数个数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    /// 语法分析器为该运算符读取的操作数个数
    pub fn min(self) -> usize {
        match self {
            Arity::Exactly(n) | Arity::AtLeast(n) => n,
        }
    }

    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorDescriptor {
    pub kind: OperatorKind,
    /// 在过滤文本中的写法
    pub token: &'static str,
    /// 可读的名称
    pub name: &'static str,
    pub arity: Arity,
    /// 右操作数是完整的子表达式，而不是单个值
    pub needs_subexpression: bool,
    /// 可以出现在字段之前，作为前缀
    pub is_prefix: bool,
}

const fn binary(kind: OperatorKind, token: &'static str, name: &'static str) -> OperatorDescriptor {
    OperatorDescriptor {
        kind,
        token,
        name,
        arity: Arity::Exactly(2),
        needs_subexpression: false,
        is_prefix: false,
    }
}

const fn logical(kind: OperatorKind, token: &'static str, name: &'static str) -> OperatorDescriptor {
    OperatorDescriptor {
        needs_subexpression: true,
        ..binary(kind, token, name)
    }
}

/// 注册顺序就是查找顺序
pub static OPERATORS: [OperatorDescriptor; 11] = [
    logical(OperatorKind::And, "AND", "And (AND)"),
    binary(OperatorKind::EqualTo, "=", "EqualTo (=)"),
    binary(OperatorKind::GreaterOrEqualThan, ">=", "GreaterOrEqualThan (>=)"),
    binary(OperatorKind::GreaterThan, ">", "GreaterThan (>)"),
    OperatorDescriptor {
        arity: Arity::AtLeast(2),
        ..binary(OperatorKind::In, "IN", "In (IN)")
    },
    binary(OperatorKind::Like, "LIKE", "Like (LIKE)"),
    binary(OperatorKind::LowerOrEqualThan, "<=", "LowerOrEqualThan (<=)"),
    binary(OperatorKind::LowerThan, "<", "LowerThan (<)"),
    binary(OperatorKind::NotEqualTo, "<>", "NotEqualTo (<>)"),
    OperatorDescriptor {
        kind: OperatorKind::Not,
        token: "NOT",
        name: "Not (NOT)",
        arity: Arity::Exactly(1),
        needs_subexpression: false,
        is_prefix: true,
    },
    logical(OperatorKind::Or, "OR", "Or (OR)"),
];

/// 查找写法与 `token` 完全一致的运算符
pub fn lookup(token: &str) -> Option<&'static OperatorDescriptor> {
    OPERATORS.iter().find(|op| op.token == token)
}

/// 只在 `token` 是前缀运算符时返回
pub fn lookup_prefix(token: &str) -> Option<&'static OperatorDescriptor> {
    lookup(token).filter(|op| op.is_prefix)
}

impl OperatorKind {
    pub fn descriptor(self) -> &'static OperatorDescriptor {
        // 每个种类在注册表中恰好有一个条目
        match OPERATORS.iter().find(|op| op.kind == self) {
            Some(op) => op,
            None => unreachable!("operator {self:?} missing from registry"),
        }
    }

    pub fn token(self) -> &'static str {
        self.descriptor().token
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
