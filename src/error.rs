use std::fmt;

pub use crate::extract::{ExtractError, RepairError};

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 生成式服务调用错误
    Service(ServiceError),
    /// 结构化响应提取错误
    Extraction(ExtractError),
    /// 前置条件不满足
    Precondition(PreconditionError),
    /// 历史记录存储错误
    History(HistoryError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Service(e) => write!(f, "服务错误: {}", e),
            AppError::Extraction(e) => write!(f, "响应解析错误: {}", e),
            AppError::Precondition(e) => write!(f, "操作条件不满足: {}", e),
            AppError::History(e) => write!(f, "历史记录错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Service(e) => Some(e),
            AppError::Extraction(e) => Some(e),
            AppError::Precondition(e) => Some(e),
            AppError::History(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 生成式服务错误
///
/// 服务层只把原始文本交给上层，所有失败都在这里分类。
#[derive(Debug, Clone)]
pub enum ServiceError {
    /// 网络 / HTTP 层面失败
    TransportFailure {
        status: Option<u16>,
        message: String,
    },
    /// 服务端返回了应用级错误，消息原样透传
    ServiceRejected {
        status: Option<u16>,
        message: String,
    },
    /// 返回内容为空
    EmptyContent {
        model: String,
    },
}

impl ServiceError {
    /// HTTP 状态码（如果有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::TransportFailure { status, .. }
            | ServiceError::ServiceRejected { status, .. } => *status,
            ServiceError::EmptyContent { .. } => None,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::TransportFailure { status, message } => match status {
                Some(code) => write!(f, "服务调用失败 (HTTP {}): {}", code, message),
                None => write!(f, "服务调用失败: {}", message),
            },
            ServiceError::ServiceRejected { status, message } => match status {
                Some(code) => write!(f, "服务拒绝请求 (HTTP {}): {}", code, message),
                None => write!(f, "服务拒绝请求: {}", message),
            },
            ServiceError::EmptyContent { model } => {
                write!(f, "服务返回内容为空 (模型: {})", model)
            }
        }
    }
}

impl std::error::Error for ServiceError {}

/// 前置条件错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// 尚未生成参考答案
    NoSolutionSet,
    /// 题目文本和题目图片都为空
    EmptyStatement,
    /// 学生姓名为空
    EmptyStudentName,
    /// 没有提交任何图片
    NoImages,
    /// 索引超出范围
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    /// 批改记录没有保存原始图片
    NoSourceImages {
        index: usize,
    },
    /// 还没有任何批改结果
    NoResults,
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreconditionError::NoSolutionSet => write!(f, "请先生成参考答案"),
            PreconditionError::EmptyStatement => write!(f, "请输入题目文本或上传题目图片"),
            PreconditionError::EmptyStudentName => write!(f, "学生姓名不能为空"),
            PreconditionError::NoImages => write!(f, "请至少上传一张作业图片"),
            PreconditionError::IndexOutOfRange { index, len } => {
                write!(f, "索引 {} 超出范围 (共 {} 条批改记录)", index, len)
            }
            PreconditionError::NoSourceImages { index } => {
                write!(f, "第 {} 条批改记录没有原始图片，无法重新分析", index)
            }
            PreconditionError::NoResults => write!(f, "还没有任何批改结果"),
        }
    }
}

impl std::error::Error for PreconditionError {}

/// 历史记录存储错误
#[derive(Debug)]
pub enum HistoryError {
    /// 读取存储文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入存储文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 存储内容无法解析
    Corrupted {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::ReadFailed { path, source } => {
                write!(f, "读取历史文件失败 ({}): {}", path, source)
            }
            HistoryError::WriteFailed { path, source } => {
                write!(f, "写入历史文件失败 ({}): {}", path, source)
            }
            HistoryError::Corrupted { source } => write!(f, "历史记录内容损坏: {}", source),
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HistoryError::ReadFailed { source, .. }
            | HistoryError::WriteFailed { source, .. }
            | HistoryError::Corrupted { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件读取失败
    FileReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 未知的服务提供方
    UnknownProvider {
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileReadFailed { path, source } => {
                write!(f, "读取配置文件失败 ({}): {}", path, source)
            }
            ConfigError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
            ConfigError::UnknownProvider { value } => {
                write!(f, "未知的服务提供方: '{}' (可选: openai / gemini)", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FileReadFailed { source, .. }
            | ConfigError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            ConfigError::UnknownProvider { .. } => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::Extraction(err)
    }
}

impl From<PreconditionError> for AppError {
    fn from(err: PreconditionError) -> Self {
        AppError::Precondition(err)
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        AppError::History(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建历史文件读取错误
    pub fn history_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::History(HistoryError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建历史内容损坏错误
    pub fn history_corrupted(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::History(HistoryError::Corrupted {
            source: Box::new(source),
        })
    }

    /// 创建历史文件写入错误
    pub fn history_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::History(HistoryError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否为可提示用户"缩短输入后重试"的解析错误
    pub fn is_extraction(&self) -> bool {
        matches!(self, AppError::Extraction(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
