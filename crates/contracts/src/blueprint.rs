//! RegistryBlueprint - Config Loader 输出
//!
//! 描述注册表运行配置：重复键策略、片段目录、sink 挂载时机、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::DuplicateKeyPolicy;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的注册表配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 注册表设置
    #[serde(default)]
    pub registry: RegistrySettings,

    /// 输出路由配置
    pub sinks: Vec<SinkConfig>,
}

/// 注册表设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// 批次内重复键处理策略
    #[serde(default)]
    pub duplicate_keys: DuplicateKeyPolicy,

    /// 片段目录 (e.g., "target/doc/type.impl")
    #[serde(default)]
    pub fragments_dir: Option<PathBuf>,

    /// 在提交多少个片段后挂载 sink (None = 全部提交后)
    #[serde(default)]
    pub attach_after: Option<usize>,
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 内存文档索引
    Index,
    /// tracing 日志摘要
    Log,
    /// JSON Lines 文件
    File,
}
