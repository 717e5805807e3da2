//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_publisher` - 批量课程发布器
//! - 加载课程清单（Vec<CourseManifest>）
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `course_publisher` - 单门课程发布器
//! - 按向导顺序执行 课程 → 章节 → 模块 → 审核
//! - 输出单门课程的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_publisher (处理 Vec<CourseManifest>)
//!     ↓
//! course_publisher (处理单个 CourseManifest)
//!     ↓
//! workflow (CourseStep / ChapterStep / ModuleStep / ReviewStep)
//!     ↓
//! services (上传、进度、提示)
//!     ↓
//! clients + infrastructure (HTTP 客户端、TaskGroup)
//! ```

pub mod batch_publisher;
pub mod course_publisher;

pub use batch_publisher::{App, PublishSummary};
pub use course_publisher::{publish_course, PublishStats};
