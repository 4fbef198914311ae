//! Ingestion 错误类型

use std::path::PathBuf;

use contracts::RegistryError;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 无法从扩展名判断片段格式
    #[error("unsupported fragment format: {path}")]
    UnsupportedFormat {
        /// 片段路径
        path: PathBuf,
    },

    /// 片段内容无法解码
    #[error("failed to decode fragment '{fragment}': {message}")]
    Decode {
        /// 片段名
        fragment: String,
        /// 错误消息
        message: String,
    },

    /// 批次不合法 (Reject 策略)
    #[error(transparent)]
    Batch(#[from] RegistryError),

    /// 读取片段失败
    #[error("failed to read fragment {path}: {source}")]
    Io {
        /// 片段路径
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestionError {
    pub fn decode(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            fragment: fragment.into(),
            message: message.into(),
        }
    }
}

/// Ingestion 错误统一折叠为 `MalformedBatch` / `Io`
impl From<IngestionError> for RegistryError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Batch(inner) => inner,
            IngestionError::Io { source, .. } => RegistryError::Io(source),
            IngestionError::Decode { fragment, message } => {
                RegistryError::malformed_batch(fragment, message)
            }
            IngestionError::UnsupportedFormat { path } => RegistryError::malformed_batch(
                path.display().to_string(),
                "unsupported fragment format",
            ),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
