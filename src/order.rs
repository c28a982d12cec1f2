//! 查询的排序参数，与过滤树无关

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// 一个排序键，名称和方向都相同时两个参数相等
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryOrderParameter {
    pub name: String,
    pub asc: bool,
}

impl QueryOrderParameter {
    pub fn new(name: impl Into<String>, asc: bool) -> Self {
        Self {
            name: name.into(),
            asc,
        }
    }
}

/// 有序且不重复的排序键列表，第一个是主排序键
///
/// 同一字段可以升序和降序各出现一次，只去掉完全相同的重复项。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOrder {
    orders: IndexSet<QueryOrderParameter>,
}

impl QueryOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加排序键，(名称, 方向) 完全相同的已存在时忽略
    pub fn add_order_field(&mut self, name: impl Into<String>, asc: bool) -> &mut Self {
        self.orders.insert(QueryOrderParameter::new(name, asc));
        self
    }

    /// 按插入顺序返回排序键的快照
    pub fn parameters_list(&self) -> Vec<QueryOrderParameter> {
        self.orders.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryOrderParameter> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
