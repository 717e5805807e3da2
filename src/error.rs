use std::fmt;

use crate::models::api::FieldError;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 表单校验失败（客户端，未发出任何请求）
    Validation(Vec<String>),
    /// 向导流程错误（前置条件不满足）
    Workflow(WorkflowError),
    /// API 调用错误
    Api(ApiError),
    /// 文件上传错误
    Upload(UploadError),
    /// 文件操作错误
    File(FileError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "校验失败: {}", errors.join("; ")),
            AppError::Workflow(e) => write!(f, "流程错误: {}", e),
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::Upload(e) => write!(f, "上传错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Workflow(e) => Some(e),
            AppError::Api(e) => Some(e),
            AppError::Upload(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Validation(_) | AppError::Other(_) => None,
        }
    }
}

/// 向导流程错误
///
/// 这些错误都在发出网络请求之前被检测出来。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// 没有正在创建的课程
    NoActiveCourse,
    /// 课程尚未保存到后端
    CourseNotSaved,
    /// 找不到章节
    ChapterNotFound,
    /// 章节尚未保存到后端
    ChapterNotSaved { title: String },
    /// 找不到模块
    ModuleNotFound,
    /// 模块尚未保存到后端
    ModuleNotSaved { title: String },
    /// 课程没有任何章节
    NoChapters,
    /// 存在未保存的章节
    UnsavedChapters { titles: Vec<String> },
    /// 存在未保存的模块
    UnsavedModules { titles: Vec<String> },
    /// 存在没有模块的章节
    ChaptersWithoutModules { titles: Vec<String> },
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::NoActiveCourse => write!(f, "No course is being created"),
            WorkflowError::CourseNotSaved => {
                write!(f, "Please save the course before adding content")
            }
            WorkflowError::ChapterNotFound => write!(f, "Chapter not found"),
            WorkflowError::ChapterNotSaved { title } => {
                write!(f, "Chapter \"{}\" has not been saved yet", title)
            }
            WorkflowError::ModuleNotFound => write!(f, "Module not found"),
            WorkflowError::ModuleNotSaved { title } => {
                write!(f, "Module \"{}\" has not been saved yet", title)
            }
            WorkflowError::NoChapters => write!(f, "Please add at least one chapter"),
            WorkflowError::UnsavedChapters { titles } => {
                write!(f, "Please save these chapters first: {}", titles.join(", "))
            }
            WorkflowError::UnsavedModules { titles } => {
                write!(f, "Please save these modules first: {}", titles.join(", "))
            }
            WorkflowError::ChaptersWithoutModules { titles } => {
                write!(
                    f,
                    "Each chapter needs at least one module. Missing modules in: {}",
                    titles.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for WorkflowError {}

/// API 调用错误
#[derive(Debug)]
pub enum ApiError {
    /// 网络请求失败
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 401：会话失效
    Unauthorized { endpoint: String },
    /// 403：无权限
    Forbidden {
        endpoint: String,
        message: Option<String>,
    },
    /// 404：资源不存在
    NotFound {
        endpoint: String,
        message: Option<String>,
    },
    /// 429：请求频率限制
    RateLimited {
        endpoint: String,
        retry_after: Option<u64>,
    },
    /// 后端字段级校验失败
    ServerValidation {
        endpoint: String,
        message: Option<String>,
        errors: Vec<FieldError>,
    },
    /// API 返回错误响应
    BadResponse {
        endpoint: String,
        status: Option<u16>,
        message: Option<String>,
    },
    /// API 返回空结果
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    JsonParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::RequestFailed { endpoint, source } => {
                write!(f, "API请求失败 ({}): {}", endpoint, source)
            }
            ApiError::Unauthorized { endpoint } => write!(f, "未授权 ({})", endpoint),
            ApiError::Forbidden { endpoint, message } => {
                write!(f, "无权限 ({}): {:?}", endpoint, message)
            }
            ApiError::NotFound { endpoint, message } => {
                write!(f, "资源不存在 ({}): {:?}", endpoint, message)
            }
            ApiError::RateLimited {
                endpoint,
                retry_after,
            } => {
                write!(
                    f,
                    "API请求频率限制 ({}), 建议等待: {:?}秒",
                    endpoint, retry_after
                )
            }
            ApiError::ServerValidation {
                endpoint, errors, ..
            } => {
                write!(f, "后端校验失败 ({}): {} 个字段错误", endpoint, errors.len())
            }
            ApiError::BadResponse {
                endpoint,
                status,
                message,
            } => {
                write!(
                    f,
                    "API返回错误响应 ({}): status={:?}, message={:?}",
                    endpoint, status, message
                )
            }
            ApiError::EmptyResponse { endpoint } => {
                write!(f, "API返回空结果: {}", endpoint)
            }
            ApiError::JsonParseFailed { source } => {
                write!(f, "JSON解析失败: {}", source)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::RequestFailed { source, .. } | ApiError::JsonParseFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 文件上传错误
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("读取文件失败 ({file}): {source}")]
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("传输失败 ({file}): {source}")]
    Transfer {
        file: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("上传被拒绝 ({file}): status={status}, message={message:?}")]
    Rejected {
        file: String,
        status: u16,
        message: Option<String>,
    },
    #[error("上传响应缺少 url ({file})")]
    MissingUrl { file: String },
}

impl UploadError {
    pub fn file(&self) -> &str {
        match self {
            UploadError::Read { file, .. }
            | UploadError::Transfer { file, .. }
            | UploadError::Rejected { file, .. }
            | UploadError::MissingUrl { file } => file,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound { path: String },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. } | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::NotFound { .. } => None,
        }
    }
}

// ========== 面向用户的错误分类 ==========

/// 错误分类，决定提示文案和副作用（例如 401 强制登出）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    Validation,
    Network,
}

impl AppError {
    /// 错误所属分类
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Validation(_) | AppError::Workflow(_) => ErrorCategory::Validation,
            AppError::Api(api) => match api {
                ApiError::Unauthorized { .. } => ErrorCategory::Unauthorized,
                ApiError::Forbidden { .. } => ErrorCategory::Forbidden,
                ApiError::NotFound { .. } => ErrorCategory::NotFound,
                ApiError::RateLimited { .. } => ErrorCategory::RateLimited,
                ApiError::ServerValidation { .. } => ErrorCategory::Validation,
                _ => ErrorCategory::Network,
            },
            AppError::Upload(_) | AppError::File(_) | AppError::Other(_) => ErrorCategory::Network,
        }
    }

    /// 面向用户的提示文案
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(errors) => errors.join("\n"),
            AppError::Workflow(e) => e.to_string(),
            AppError::Api(api) => match api {
                ApiError::Unauthorized { .. } => {
                    "Your session has expired. Please log in again.".to_string()
                }
                ApiError::Forbidden { message, .. } => message
                    .clone()
                    .unwrap_or_else(|| "You don't have permission to do that.".to_string()),
                ApiError::NotFound { message, .. } => message
                    .clone()
                    .unwrap_or_else(|| "The requested resource was not found.".to_string()),
                ApiError::RateLimited {
                    retry_after: Some(secs),
                    ..
                } => format!("Too many requests. Please try again in {} seconds.", secs),
                ApiError::RateLimited { .. } => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerValidation {
                    message, errors, ..
                } => {
                    if errors.is_empty() {
                        message
                            .clone()
                            .unwrap_or_else(|| "Validation failed.".to_string())
                    } else {
                        errors
                            .iter()
                            .map(|e| e.message.as_str())
                            .collect::<Vec<_>>()
                            .join("\n")
                    }
                }
                ApiError::BadResponse {
                    message: Some(message),
                    ..
                } if !message.is_empty() => message.clone(),
                _ => FALLBACK_MESSAGE.to_string(),
            },
            AppError::Upload(e) => format!("Failed to upload {}. Please try again.", e.file()),
            AppError::File(_) | AppError::Other(_) => FALLBACK_MESSAGE.to_string(),
        }
    }

    /// 是否为 404
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

const FALLBACK_MESSAGE: &str = "Something went wrong. Please check your connection and try again.";

// ========== 从常见错误类型转换 ==========

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        AppError::Workflow(err)
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Api(err)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::Upload(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
