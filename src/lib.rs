//! # Course Creation
//!
//! 课程创建向导：课程信息 → 章节 → 模块 → 提交审核
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure / Clients）
//! - `infrastructure/` - `TaskGroup`，按名称并行执行一组任务
//! - `clients/` - 课程 API、文件上传、会话令牌
//!
//! ### ② 业务能力层（Services）
//! - `UploadService` - 并行上传并汇报每个文件的进度
//! - `ProgressBoard` - 上传进度面板
//! - `Notifier` / `Navigator` - 用户提示与页面跳转
//! - `LibraryService` - 我的课程 / 我的购买
//!
//! ### ③ 流程层（Workflow）
//! - `store/` - `CreationStore`，向导的唯一数据源
//! - `workflow/` - 四个步骤表单，错误在步骤边界转换为提示
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_publisher` - 批量发布课程清单，管理并发
//! - `orchestrator/course_publisher` - 按向导顺序发布单门课程
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ErrorCategory};
pub use orchestrator::{App, PublishSummary};
pub use store::{CreationStore, WizardStep};
pub use workflow::{
    ChapterStep, CourseForm, CourseStep, ModuleForm, ModuleStep, ReviewStep, StepOutcome,
    WizardContext,
};
