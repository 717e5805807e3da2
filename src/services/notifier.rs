//! 用户提示与页面跳转
//!
//! 步骤表单不直接操作界面，只通过这两个接口发出提示和跳转请求。

use std::fmt;

use tracing::{error, info, warn};

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

/// 非阻塞提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}

/// 跳转目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Login,
    MyCourses,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Login => f.write_str("/login"),
            Destination::MyCourses => f.write_str("/dashboard/my-courses"),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

pub trait Navigator: Send + Sync {
    fn redirect(&self, destination: Destination);
}

/// 把提示写进日志的实现，命令行模式下使用
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => info!("✅ {}", toast.message),
            ToastKind::Info => info!("💡 {}", toast.message),
            ToastKind::Error => error!("❌ {}", toast.message),
        }
    }
}

impl Navigator for LogNotifier {
    fn redirect(&self, destination: Destination) {
        warn!("↪ 跳转到 {}", destination);
    }
}
