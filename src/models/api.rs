//! 课程 API 的请求/响应结构
//!
//! 后端统一使用 `{ success, data?, message, errors? }` 信封，字段为 camelCase。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::course::{
    Attachment, ChapterFields, CourseDetails, CourseLevel, CourseMetadata, CourseStatus,
    ModuleFields, ModuleType,
};

/// 响应信封
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<FieldError>>,
}

/// 字段级校验错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub course_type: String,
    pub short_description: String,
    pub description: String,
    pub level: CourseLevel,
    pub language: String,
    pub price: f64,
    pub token_to_pay_with: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_duration: Option<u32>,
    pub affiliate_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<u32>,
    pub metadata: CourseMetadata,
    pub category_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_video: Option<String>,
}

impl From<&CourseDetails> for CourseRequest {
    fn from(details: &CourseDetails) -> Self {
        Self {
            title: details.title.clone(),
            course_type: details.course_type.clone(),
            short_description: details.short_description.clone(),
            description: details.description.clone(),
            level: details.level,
            language: details.language.clone(),
            price: details.price,
            token_to_pay_with: details.token_to_pay_with.clone(),
            access_duration: details.access_duration,
            affiliate_percentage: details.affiliate_percentage,
            available_quantity: details.available_quantity,
            metadata: details.metadata.clone(),
            category_ids: details.category_ids.clone(),
            thumbnail: details.thumbnail_url.clone(),
            preview_video: details.preview_video_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: Option<CourseStatus>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub preview_video: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRequest {
    pub title: String,
    pub description: String,
    pub order: u32,
}

impl ChapterRequest {
    pub fn new(fields: &ChapterFields, order: u32) -> Self {
        Self {
            title: fields.title.clone(),
            description: fields.description.clone(),
            order,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResponse {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRequest {
    pub chapter_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub order: u32,
    pub duration: u32,
    pub is_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_file_url: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl ModuleRequest {
    pub fn new(chapter_id: impl Into<String>, fields: &ModuleFields, order: u32) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            module_type: fields.module_type,
            order,
            duration: fields.duration,
            is_preview: fields.is_preview,
            main_file_url: fields.main_file_url.clone(),
            attachments: fields.attachments.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResponse {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub chapter_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub module_type: ModuleType,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub is_preview: bool,
    #[serde(default)]
    pub main_file_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl From<ModuleResponse> for ModuleFields {
    fn from(resp: ModuleResponse) -> Self {
        Self {
            title: resp.title,
            description: resp.description,
            module_type: resp.module_type,
            duration: resp.duration,
            is_preview: resp.is_preview,
            main_file_url: resp.main_file_url,
            attachments: resp.attachments,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitForReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    #[serde(default)]
    pub status: Option<CourseStatus>,
}

/// "我的课程"列表项
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: Option<CourseStatus>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub total_sales: Option<u64>,
}

/// "我的购买"列表项
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSummary {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub course: Option<CourseSummary>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// 上传接口返回的数据
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_request_from_normalized_details() {
        let details = CourseDetails {
            title: "  Rust for Web  ".to_string(),
            metadata: CourseMetadata {
                learning_outcomes: vec!["Ownership".into(), "  ".into(), "Traits".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let req = CourseRequest::from(&details.normalized());
        assert_eq!(req.title, "Rust for Web");
        assert_eq!(req.metadata.learning_outcomes, vec!["Ownership", "Traits"]);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "course");
        assert!(json.get("tokenToPayWith").is_some());
        assert!(json.get("thumbnail").is_none());
    }

    #[test]
    fn test_envelope_with_field_errors() {
        let raw = r#"{
            "success": false,
            "message": "Validation failed",
            "errors": [{"field": "title", "message": "Title is required"}]
        }"#;
        let env: ApiEnvelope<CourseResponse> = serde_json::from_str(raw).unwrap();
        assert!(!env.success);
        assert!(env.data.is_none());
        assert_eq!(env.errors.unwrap()[0].field, "title");
    }

    #[test]
    fn test_course_response_accepts_mongo_id() {
        let raw = r#"{"_id": "abc123", "title": "Rust", "status": "draft"}"#;
        let course: CourseResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(course.id, "abc123");
        assert_eq!(course.status, Some(CourseStatus::Draft));
    }
}
