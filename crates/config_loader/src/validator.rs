//! 配置校验模块
//!
//! 校验规则：
//! - 至少配置一个 sink
//! - sink 名称非空且唯一
//! - file sink 的 path 参数非空

use std::collections::HashSet;

use contracts::{RegistryBlueprint, RegistryError, SinkType};

/// 校验 RegistryBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RegistryBlueprint) -> Result<(), RegistryError> {
    validate_sink_presence(blueprint)?;
    validate_sink_names(blueprint)?;
    validate_sink_params(blueprint)?;
    Ok(())
}

/// 校验 sink 数量
fn validate_sink_presence(blueprint: &RegistryBlueprint) -> Result<(), RegistryError> {
    if blueprint.sinks.is_empty() {
        return Err(RegistryError::config_validation(
            "sinks",
            "at least one sink must be configured",
        ));
    }
    Ok(())
}

/// 校验 sink 名称非空且唯一
fn validate_sink_names(blueprint: &RegistryBlueprint) -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(RegistryError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(RegistryError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

/// 校验类型特定参数
fn validate_sink_params(blueprint: &RegistryBlueprint) -> Result<(), RegistryError> {
    for sink in &blueprint.sinks {
        if sink.sink_type == SinkType::File {
            if let Some(path) = sink.params.get("path") {
                if path.trim().is_empty() {
                    return Err(RegistryError::config_validation(
                        format!("sinks[{}].params.path", sink.name),
                        "file sink path cannot be empty",
                    ));
                }
            }
        }
    }
    Ok(())
}
