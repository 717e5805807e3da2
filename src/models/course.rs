use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 本地 ID，只在客户端使用，从不发送给后端
pub type LocalId = Uuid;

/// 实体标识
///
/// `Pending` 表示只存在于本地，`Persisted` 表示后端已分配 ID。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EntityId {
    Pending {
        local_id: LocalId,
    },
    Persisted {
        local_id: LocalId,
        backend_id: String,
    },
}

impl EntityId {
    /// 新建一个本地实体
    pub fn pending() -> Self {
        EntityId::Pending {
            local_id: Uuid::new_v4(),
        }
    }

    /// 新建一个已由后端保存的实体
    pub fn persisted(backend_id: impl Into<String>) -> Self {
        EntityId::Persisted {
            local_id: Uuid::new_v4(),
            backend_id: backend_id.into(),
        }
    }

    pub fn local_id(&self) -> LocalId {
        match self {
            EntityId::Pending { local_id } | EntityId::Persisted { local_id, .. } => *local_id,
        }
    }

    pub fn backend_id(&self) -> Option<&str> {
        match self {
            EntityId::Pending { .. } => None,
            EntityId::Persisted { backend_id, .. } => Some(backend_id),
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, EntityId::Persisted { .. })
    }

    /// 记录后端分配的 ID，保留本地 ID
    pub fn persist(&mut self, backend_id: impl Into<String>) {
        *self = EntityId::Persisted {
            local_id: self.local_id(),
            backend_id: backend_id.into(),
        };
    }
}

/// 课程难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    AllLevels,
}

/// 课程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    #[default]
    Draft,
    PendingReview,
    Published,
    Rejected,
}

/// 模块类型，由主文件的 MIME 类型决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Video,
    #[default]
    Document,
}

impl ModuleType {
    pub fn from_mime(content_type: &str) -> Self {
        if content_type.trim().to_ascii_lowercase().starts_with("video/") {
            ModuleType::Video
        } else {
            ModuleType::Document
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMetadata {
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, alias = "learning_outcomes")]
    pub learning_outcomes: Vec<String>,
    #[serde(default, alias = "target_audience")]
    pub target_audience: Vec<String>,
}

/// 课程的可编辑字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDetails {
    pub title: String,
    #[serde(default = "default_course_type")]
    pub course_type: String,
    pub short_description: String,
    pub description: String,
    #[serde(default)]
    pub level: CourseLevel,
    #[serde(default = "default_language")]
    pub language: String,
    pub price: f64,
    #[serde(default)]
    pub token_to_pay_with: Vec<String>,
    /// 访问期限（天），`None` 表示永久
    #[serde(default)]
    pub access_duration: Option<u32>,
    #[serde(default)]
    pub affiliate_percentage: f64,
    #[serde(default)]
    pub available_quantity: Option<u32>,
    #[serde(default)]
    pub metadata: CourseMetadata,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub preview_video_url: Option<String>,
}

fn default_course_type() -> String {
    "course".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

impl Default for CourseDetails {
    fn default() -> Self {
        Self {
            title: String::new(),
            course_type: default_course_type(),
            short_description: String::new(),
            description: String::new(),
            level: CourseLevel::default(),
            language: default_language(),
            price: 0.0,
            token_to_pay_with: Vec::new(),
            access_duration: None,
            affiliate_percentage: 0.0,
            available_quantity: None,
            metadata: CourseMetadata::default(),
            category_ids: Vec::new(),
            thumbnail_url: None,
            preview_video_url: None,
        }
    }
}

impl CourseDetails {
    /// 去掉文本首尾空白，丢弃空的列表项
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.short_description = self.short_description.trim().to_string();
        self.description = self.description.trim().to_string();
        self.metadata.requirements = non_blank(self.metadata.requirements);
        self.metadata.learning_outcomes = non_blank(self.metadata.learning_outcomes);
        self.metadata.target_audience = non_blank(self.metadata.target_audience);
        self
    }
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// 课程字段的部分更新
#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub course_type: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub level: Option<CourseLevel>,
    pub language: Option<String>,
    pub price: Option<f64>,
    pub token_to_pay_with: Option<Vec<String>>,
    pub access_duration: Option<Option<u32>>,
    pub affiliate_percentage: Option<f64>,
    pub available_quantity: Option<Option<u32>>,
    pub metadata: Option<CourseMetadata>,
    pub category_ids: Option<Vec<String>>,
    pub thumbnail_url: Option<String>,
    pub preview_video_url: Option<String>,
    pub status: Option<CourseStatus>,
}

impl CoursePatch {
    /// 用完整字段构造补丁（所有字段都覆盖）
    pub fn from_details(details: CourseDetails) -> Self {
        Self {
            title: Some(details.title),
            course_type: Some(details.course_type),
            short_description: Some(details.short_description),
            description: Some(details.description),
            level: Some(details.level),
            language: Some(details.language),
            price: Some(details.price),
            token_to_pay_with: Some(details.token_to_pay_with),
            access_duration: Some(details.access_duration),
            affiliate_percentage: Some(details.affiliate_percentage),
            available_quantity: Some(details.available_quantity),
            metadata: Some(details.metadata),
            category_ids: Some(details.category_ids),
            thumbnail_url: details.thumbnail_url,
            preview_video_url: details.preview_video_url,
            status: None,
        }
    }

    pub fn apply(self, details: &mut CourseDetails) {
        if let Some(v) = self.title {
            details.title = v;
        }
        if let Some(v) = self.course_type {
            details.course_type = v;
        }
        if let Some(v) = self.short_description {
            details.short_description = v;
        }
        if let Some(v) = self.description {
            details.description = v;
        }
        if let Some(v) = self.level {
            details.level = v;
        }
        if let Some(v) = self.language {
            details.language = v;
        }
        if let Some(v) = self.price {
            details.price = v;
        }
        if let Some(v) = self.token_to_pay_with {
            details.token_to_pay_with = v;
        }
        if let Some(v) = self.access_duration {
            details.access_duration = v;
        }
        if let Some(v) = self.affiliate_percentage {
            details.affiliate_percentage = v;
        }
        if let Some(v) = self.available_quantity {
            details.available_quantity = v;
        }
        if let Some(v) = self.metadata {
            details.metadata = v;
        }
        if let Some(v) = self.category_ids {
            details.category_ids = v;
        }
        if let Some(v) = self.thumbnail_url {
            details.thumbnail_url = Some(v);
        }
        if let Some(v) = self.preview_video_url {
            details.preview_video_url = Some(v);
        }
    }
}

/// 正在创建的课程草稿
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDraft {
    pub id: EntityId,
    pub details: CourseDetails,
    pub status: CourseStatus,
    pub chapters: Vec<Chapter>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseDraft {
    pub fn new(id: EntityId, details: CourseDetails) -> Self {
        let now = Utc::now();
        Self {
            id,
            details,
            status: CourseStatus::Draft,
            chapters: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn module_count(&self) -> usize {
        self.chapters.iter().map(|c| c.modules.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterFields {
    pub title: String,
    pub description: String,
}

impl ChapterFields {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// 章节，`order` 从 1 开始且连续
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub modules: Vec<Module>,
}

impl Chapter {
    /// 总时长（分钟）
    pub fn total_duration(&self) -> u64 {
        self.modules.iter().map(|m| u64::from(m.duration)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleFields {
    pub title: String,
    pub description: String,
    pub module_type: ModuleType,
    /// 时长（分钟）
    pub duration: u32,
    pub is_preview: bool,
    pub main_file_url: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default)]
pub struct ModulePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub module_type: Option<ModuleType>,
    pub duration: Option<u32>,
    pub is_preview: Option<bool>,
    pub main_file_url: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
}

/// 模块，`order` 在所属章节内从 1 开始且连续
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub module_type: ModuleType,
    pub order: u32,
    pub duration: u32,
    pub is_preview: bool,
    pub main_file_url: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_keeps_local_id() {
        let mut id = EntityId::pending();
        let local = id.local_id();
        assert!(!id.is_saved());
        assert_eq!(id.backend_id(), None);

        id.persist("course-42");
        assert!(id.is_saved());
        assert_eq!(id.local_id(), local);
        assert_eq!(id.backend_id(), Some("course-42"));
    }

    #[test]
    fn test_module_type_from_mime() {
        assert_eq!(ModuleType::from_mime("video/mp4"), ModuleType::Video);
        assert_eq!(ModuleType::from_mime("VIDEO/quicktime"), ModuleType::Video);
        assert_eq!(ModuleType::from_mime("application/pdf"), ModuleType::Document);
        assert_eq!(ModuleType::from_mime(""), ModuleType::Document);
    }

    #[test]
    fn test_normalized_trims_text_and_drops_blank_items() {
        let mut details = CourseDetails {
            title: "  Async Rust ".into(),
            description: "\tHands-on course\n".into(),
            ..Default::default()
        };
        details.metadata.learning_outcomes =
            vec![" Use tokio ".into(), "   ".into(), "Test services".into()];

        let details = details.normalized();
        assert_eq!(details.title, "Async Rust");
        assert_eq!(details.description, "Hands-on course");
        assert_eq!(
            details.metadata.learning_outcomes,
            vec!["Use tokio".to_string(), "Test services".to_string()]
        );

        let chapter = ChapterFields {
            title: " Intro ".into(),
            description: "Basics ".into(),
        }
        .normalized();
        assert_eq!(chapter.title, "Intro");
        assert_eq!(chapter.description, "Basics");
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut details = CourseDetails {
            title: "Rust 101".to_string(),
            price: 10.0,
            ..Default::default()
        };
        CoursePatch {
            price: Some(25.0),
            ..Default::default()
        }
        .apply(&mut details);
        assert_eq!(details.title, "Rust 101");
        assert_eq!(details.price, 25.0);
    }
}
