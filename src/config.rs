//! 配置模块，负责从JSON文件加载构建器配置

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 数字token如何转换为值文本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericLiterals {
    /// 保持原样：`20` 仍是 `20`
    #[default]
    Verbatim,
    /// 输出解析后的浮点数：`20` 变成 `20.0`
    Normalized,
}

impl NumericLiterals {
    pub fn render(self, text: &str, value: f64) -> String {
        match self {
            NumericLiterals::Verbatim => text.to_string(),
            NumericLiterals::Normalized => format!("{value:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// 记录格式错误的过滤器并当作"没有过滤器"，而不是返回解析错误
    pub lenient: bool,
    /// 最大嵌套深度：括号、`NOT`、`AND`/`OR` 的右侧以及每一步从左折叠的比较都计一层
    pub max_depth: usize,
    pub numeric_literals: NumericLiterals,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            lenient: false,
            max_depth: 256,
            numeric_literals: NumericLiterals::Verbatim,
        }
    }
}

impl BuilderConfig {
    /// 从JSON文件加载配置，缺少的键使用默认值
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        // 读取文件内容
        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// 宽松模式：解析失败只记录日志，不返回错误
    pub fn lenient() -> Self {
        Self {
            lenient: true,
            ..Self::default()
        }
    }
}
