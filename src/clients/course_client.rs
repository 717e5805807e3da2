/// 课程 API 客户端
///
/// 封装所有与课程后端相关的调用逻辑
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::clients::session::TokenManager;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::api::{
    ApiEnvelope, ChapterRequest, ChapterResponse, CourseRequest, CourseResponse, CourseSummary,
    ModuleRequest, ModuleResponse, PurchaseSummary, ReviewSubmission, SubmitForReviewRequest,
};

/// 课程后端接口
#[async_trait]
pub trait CourseApi: Send + Sync {
    async fn create_course(&self, request: &CourseRequest) -> AppResult<CourseResponse>;

    async fn update_course(
        &self,
        course_id: &str,
        request: &CourseRequest,
    ) -> AppResult<CourseResponse>;

    async fn create_chapter(
        &self,
        course_id: &str,
        request: &ChapterRequest,
    ) -> AppResult<ChapterResponse>;

    async fn update_chapter(
        &self,
        course_id: &str,
        chapter_id: &str,
        request: &ChapterRequest,
    ) -> AppResult<ChapterResponse>;

    async fn delete_chapter(&self, course_id: &str, chapter_id: &str) -> AppResult<()>;

    async fn list_chapters(&self, course_id: &str) -> AppResult<Vec<ChapterResponse>>;

    async fn create_module(
        &self,
        course_id: &str,
        request: &ModuleRequest,
    ) -> AppResult<ModuleResponse>;

    async fn update_module(
        &self,
        course_id: &str,
        module_id: &str,
        request: &ModuleRequest,
    ) -> AppResult<ModuleResponse>;

    async fn delete_module(&self, course_id: &str, module_id: &str) -> AppResult<()>;

    async fn list_modules(&self, course_id: &str) -> AppResult<Vec<ModuleResponse>>;

    async fn submit_for_review(
        &self,
        course_id: &str,
        request: &SubmitForReviewRequest,
    ) -> AppResult<ReviewSubmission>;

    async fn my_purchases(&self) -> AppResult<Vec<PurchaseSummary>>;

    async fn my_courses(&self) -> AppResult<Vec<CourseSummary>>;
}

/// 基于 reqwest 的课程 API 客户端
pub struct HttpCourseClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenManager>,
}

impl HttpCourseClient {
    /// 创建新的课程客户端
    pub fn new(config: &Config, tokens: Arc<TokenManager>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, endpoint))
            .header("Accept", "application/json");
        match self.tokens.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// 发送请求并返回信封中的 data（可能为空）
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> AppResult<Option<T>> {
        debug!("{} {}", method, endpoint);

        let mut builder = self.request(method, endpoint);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status().as_u16();
        let retry_after = retry_after_secs(response.headers());

        let text = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let result = parse_response(endpoint, status, retry_after, &text);
        if let Err(e) = &result {
            warn!("⚠️ {} 请求失败: {}", endpoint, e);
        }
        result
    }

    /// 发送请求，data 必须存在
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> AppResult<T> {
        self.execute(method, endpoint, body)
            .await?
            .ok_or_else(|| {
                AppError::Api(ApiError::EmptyResponse {
                    endpoint: endpoint.to_string(),
                })
            })
    }
}

fn to_body<T: Serialize>(value: &T) -> AppResult<Option<Value>> {
    Ok(Some(serde_json::to_value(value)?))
}

#[async_trait]
impl CourseApi for HttpCourseClient {
    async fn create_course(&self, request: &CourseRequest) -> AppResult<CourseResponse> {
        self.send(Method::POST, "/api/courses", to_body(request)?).await
    }

    async fn update_course(
        &self,
        course_id: &str,
        request: &CourseRequest,
    ) -> AppResult<CourseResponse> {
        let endpoint = format!("/api/courses/{}", course_id);
        self.send(Method::PUT, &endpoint, to_body(request)?).await
    }

    async fn create_chapter(
        &self,
        course_id: &str,
        request: &ChapterRequest,
    ) -> AppResult<ChapterResponse> {
        let endpoint = format!("/api/courses/{}/chapters", course_id);
        self.send(Method::POST, &endpoint, to_body(request)?).await
    }

    async fn update_chapter(
        &self,
        course_id: &str,
        chapter_id: &str,
        request: &ChapterRequest,
    ) -> AppResult<ChapterResponse> {
        let endpoint = format!("/api/courses/{}/chapters/{}", course_id, chapter_id);
        self.send(Method::PUT, &endpoint, to_body(request)?).await
    }

    async fn delete_chapter(&self, course_id: &str, chapter_id: &str) -> AppResult<()> {
        let endpoint = format!("/api/courses/{}/chapters/{}", course_id, chapter_id);
        self.execute::<Value>(Method::DELETE, &endpoint, None).await?;
        Ok(())
    }

    async fn list_chapters(&self, course_id: &str) -> AppResult<Vec<ChapterResponse>> {
        let endpoint = format!("/api/courses/{}/chapters", course_id);
        Ok(self
            .execute(Method::GET, &endpoint, None)
            .await?
            .unwrap_or_default())
    }

    async fn create_module(
        &self,
        course_id: &str,
        request: &ModuleRequest,
    ) -> AppResult<ModuleResponse> {
        let endpoint = format!("/api/courses/{}/modules", course_id);
        self.send(Method::POST, &endpoint, to_body(request)?).await
    }

    async fn update_module(
        &self,
        course_id: &str,
        module_id: &str,
        request: &ModuleRequest,
    ) -> AppResult<ModuleResponse> {
        let endpoint = format!("/api/courses/{}/modules/{}", course_id, module_id);
        self.send(Method::PUT, &endpoint, to_body(request)?).await
    }

    async fn delete_module(&self, course_id: &str, module_id: &str) -> AppResult<()> {
        let endpoint = format!("/api/courses/{}/modules/{}", course_id, module_id);
        self.execute::<Value>(Method::DELETE, &endpoint, None).await?;
        Ok(())
    }

    async fn list_modules(&self, course_id: &str) -> AppResult<Vec<ModuleResponse>> {
        let endpoint = format!("/api/courses/{}/modules", course_id);
        Ok(self
            .execute(Method::GET, &endpoint, None)
            .await?
            .unwrap_or_default())
    }

    async fn submit_for_review(
        &self,
        course_id: &str,
        request: &SubmitForReviewRequest,
    ) -> AppResult<ReviewSubmission> {
        let endpoint = format!("/api/courses/{}/submit", course_id);
        Ok(self
            .execute(Method::POST, &endpoint, to_body(request)?)
            .await?
            .unwrap_or_default())
    }

    async fn my_purchases(&self) -> AppResult<Vec<PurchaseSummary>> {
        Ok(self
            .execute(Method::GET, "/api/courses/my-purchases", None)
            .await?
            .unwrap_or_default())
    }

    async fn my_courses(&self) -> AppResult<Vec<CourseSummary>> {
        Ok(self
            .execute(Method::GET, "/api/courses/my-courses", None)
            .await?
            .unwrap_or_default())
    }
}

// ========== 响应解析 ==========

/// 根据状态码和信封内容把响应归类为数据或错误
pub fn parse_response<T: DeserializeOwned>(
    endpoint: &str,
    status: u16,
    retry_after: Option<u64>,
    body: &str,
) -> AppResult<Option<T>> {
    let envelope: Option<ApiEnvelope<Value>> = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str(body).ok()
    };

    let message = envelope.as_ref().and_then(|e| e.message.clone());
    let field_errors = envelope
        .as_ref()
        .and_then(|e| e.errors.clone())
        .unwrap_or_default();

    if let Some(error) = status_error(endpoint, status, retry_after, message.clone()) {
        return Err(AppError::Api(error));
    }

    let endpoint = endpoint.to_string();
    let error = match status {
        400 | 422 if !field_errors.is_empty() => Some(ApiError::ServerValidation {
            endpoint,
            message,
            errors: field_errors,
        }),
        200..=299 => match &envelope {
            None if body.trim().is_empty() => return Ok(None),
            None => Some(ApiError::BadResponse {
                endpoint,
                status: Some(status),
                message: Some("响应不是合法的 JSON".to_string()),
            }),
            Some(env) if env.success => None,
            Some(_) if !field_errors.is_empty() => Some(ApiError::ServerValidation {
                endpoint,
                message,
                errors: field_errors,
            }),
            Some(_) if is_rate_limited(message.as_deref()) => Some(ApiError::RateLimited {
                retry_after: message.as_deref().and_then(retry_hint_seconds),
                endpoint,
            }),
            Some(_) => Some(ApiError::BadResponse {
                endpoint,
                status: Some(status),
                message,
            }),
        },
        _ => Some(ApiError::BadResponse {
            endpoint,
            status: Some(status),
            message,
        }),
    };

    if let Some(error) = error {
        return Err(AppError::Api(error));
    }

    match envelope.and_then(|e| e.data) {
        None | Some(Value::Null) => Ok(None),
        Some(data) => Ok(Some(serde_json::from_value(data)?)),
    }
}

/// 有专门分类的状态码（401/403/404/429），其他状态返回 None
///
/// 上传接口和课程接口共用这套映射
pub(crate) fn status_error(
    endpoint: &str,
    status: u16,
    retry_after: Option<u64>,
    message: Option<String>,
) -> Option<ApiError> {
    let endpoint = endpoint.to_string();
    match status {
        401 => Some(ApiError::Unauthorized { endpoint }),
        403 => Some(ApiError::Forbidden { endpoint, message }),
        404 => Some(ApiError::NotFound { endpoint, message }),
        429 => Some(ApiError::RateLimited {
            retry_after: retry_after.or_else(|| message.as_deref().and_then(retry_hint_seconds)),
            endpoint,
        }),
        _ => None,
    }
}

/// 读取 Retry-After 头（秒）
pub(crate) fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// 检查是否是频率限制错误
fn is_rate_limited(message: Option<&str>) -> bool {
    message
        .map(|m| {
            let lower = m.to_ascii_lowercase();
            lower.contains("too many requests") || lower.contains("rate limit")
        })
        .unwrap_or(false)
}

/// 从提示文本中提取 "retry in N seconds" 的秒数
fn retry_hint_seconds(message: &str) -> Option<u64> {
    let re = Regex::new(r"(?i)(\d+)\s*(?:s\b|sec|second)").ok()?;
    re.captures(message)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_success_returns_data() {
        let body = r#"{"success": true, "message": "ok", "data": {"id": "c1", "title": "Rust"}}"#;
        let course: Option<CourseResponse> = parse_response("/api/courses", 201, None, body).unwrap();
        assert_eq!(course.unwrap().id, "c1");
    }

    #[test]
    fn test_success_without_data() {
        let body = r#"{"success": true, "message": "deleted"}"#;
        let data: Option<Value> = parse_response("/api/x", 200, None, body).unwrap();
        assert!(data.is_none());
        let empty: Option<Value> = parse_response("/api/x", 204, None, "").unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn test_status_codes_map_to_categories() {
        let r: AppResult<Option<Value>> = parse_response("/a", 401, None, "");
        assert_matches!(r, Err(AppError::Api(ApiError::Unauthorized { .. })));

        let r: AppResult<Option<Value>> =
            parse_response("/a", 403, None, r#"{"success":false,"message":"Not your course"}"#);
        assert_matches!(
            r,
            Err(AppError::Api(ApiError::Forbidden { message: Some(m), .. })) if m == "Not your course"
        );

        let r: AppResult<Option<Value>> =
            parse_response("/a", 404, None, r#"{"success":false,"message":"Course not found"}"#);
        assert_matches!(r, Err(AppError::Api(ApiError::NotFound { .. })));

        let r: AppResult<Option<Value>> = parse_response("/a", 500, None, "<html>oops</html>");
        assert_matches!(
            r,
            Err(AppError::Api(ApiError::BadResponse { status: Some(500), .. }))
        );
    }

    #[test]
    fn test_rate_limit_uses_header_then_message() {
        let r: AppResult<Option<Value>> = parse_response("/a", 429, Some(12), "");
        assert_matches!(
            r,
            Err(AppError::Api(ApiError::RateLimited { retry_after: Some(12), .. }))
        );

        let body = r#"{"success":false,"message":"Too many requests, retry in 30 seconds"}"#;
        let r: AppResult<Option<Value>> = parse_response("/a", 429, None, body);
        assert_matches!(
            r,
            Err(AppError::Api(ApiError::RateLimited { retry_after: Some(30), .. }))
        );

        let r: AppResult<Option<Value>> = parse_response("/a", 200, None, body);
        assert_matches!(r, Err(AppError::Api(ApiError::RateLimited { .. })));
    }

    #[test]
    fn test_field_errors_become_server_validation() {
        let body = r#"{
            "success": false,
            "message": "Validation failed",
            "errors": [{"field": "learningOutcomes", "message": "At least 3 learning outcomes are required"}]
        }"#;
        let r: AppResult<Option<Value>> = parse_response("/api/courses", 400, None, body);
        assert_matches!(
            r,
            Err(AppError::Api(ApiError::ServerValidation { ref errors, .. })) if errors.len() == 1
        );
    }

    #[test]
    fn test_unsuccessful_envelope_on_200() {
        let body = r#"{"success": false, "message": "Course is locked"}"#;
        let r: AppResult<Option<Value>> = parse_response("/a", 200, None, body);
        let err = r.unwrap_err();
        assert_eq!(err.user_message(), "Course is locked");
    }
}
