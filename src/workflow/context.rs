//! 向导上下文
//!
//! 步骤表单共享的依赖：API、上传、提示、跳转、会话。
//! 所有错误都在这里被转换成提示，不会继续向上传播。

use std::sync::Arc;

use tracing::{error, warn};

use crate::clients::{CourseApi, HttpCourseClient, HttpUploader, SessionHandler, TokenManager, Uploader};
use crate::config::Config;
use crate::error::{AppError, AppResult, ErrorCategory};
use crate::services::{Destination, LogNotifier, Navigator, Notifier, Toast, UploadService};

/// 步骤执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T = ()> {
    /// 执行成功
    Completed(T),
    /// 客户端校验未通过，没有发出任何请求
    Blocked { message: String },
    /// 上传或请求失败
    Failed {
        category: ErrorCategory,
        message: String,
    },
}

impl<T> StepOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            StepOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// 被阻止视为校验错误
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            StepOutcome::Completed(_) => None,
            StepOutcome::Blocked { .. } => Some(ErrorCategory::Validation),
            StepOutcome::Failed { category, .. } => Some(*category),
        }
    }

    /// 失败或被阻止时的提示文本
    pub fn message(&self) -> Option<&str> {
        match self {
            StepOutcome::Completed(_) => None,
            StepOutcome::Blocked { message } | StepOutcome::Failed { message, .. } => {
                Some(message)
            }
        }
    }
}

/// 向导上下文
#[derive(Clone)]
pub struct WizardContext {
    pub config: Config,
    pub api: Arc<dyn CourseApi>,
    pub uploads: UploadService,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
    pub session: Arc<dyn SessionHandler>,
}

impl WizardContext {
    pub fn new(
        config: Config,
        api: Arc<dyn CourseApi>,
        uploader: Arc<dyn Uploader>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        session: Arc<dyn SessionHandler>,
    ) -> Self {
        Self {
            config,
            api,
            uploads: UploadService::new(uploader),
            notifier,
            navigator,
            session,
        }
    }

    /// 使用 HTTP 客户端和日志提示构建上下文
    pub fn from_config(config: Config) -> AppResult<Self> {
        let tokens = Arc::new(TokenManager::new(config.api_token.clone()));
        let api = Arc::new(HttpCourseClient::new(&config, tokens.clone())?);
        let uploader = Arc::new(HttpUploader::new(&config, tokens.clone())?);

        Ok(Self::new(
            config,
            api,
            uploader,
            Arc::new(LogNotifier),
            Arc::new(LogNotifier),
            tokens,
        ))
    }

    pub fn notify_success(&self, message: impl Into<String>) {
        self.notifier.notify(Toast::success(message));
    }

    /// 把错误转换成提示，并返回对应的结果
    pub fn fail<T>(&self, action: &str, err: AppError) -> StepOutcome<T> {
        self.fail_with_message(action, err, None)
    }

    /// 同 `fail`，但可以替换提示文本
    pub fn fail_with_message<T>(
        &self,
        action: &str,
        err: AppError,
        message: Option<String>,
    ) -> StepOutcome<T> {
        let category = err.category();
        let client_side = matches!(err, AppError::Validation(_) | AppError::Workflow(_));
        let message = message.unwrap_or_else(|| err.user_message());

        if client_side {
            warn!("⚠️ {} 被阻止: {}", action, err);
        } else {
            error!("❌ {} 失败: {}", action, err);
        }

        if category == ErrorCategory::Unauthorized {
            self.session.logout();
            self.navigator.redirect(Destination::Login);
        }

        self.notifier.notify(Toast::error(message.clone()));

        if client_side {
            StepOutcome::Blocked { message }
        } else {
            StepOutcome::Failed { category, message }
        }
    }
}
