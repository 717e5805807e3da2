//! 集成测试共用的内存实现
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use course_creation::clients::{CourseApi, ProgressCallback, SessionHandler, Uploader};
use course_creation::error::{ApiError, AppError, AppResult, UploadError};
use course_creation::models::api::{
    ChapterRequest, ChapterResponse, CourseRequest, CourseResponse, CourseSummary, ModuleRequest,
    ModuleResponse, PurchaseSummary, ReviewSubmission, SubmitForReviewRequest,
};
use course_creation::models::course::{CourseDetails, CourseMetadata, CourseStatus};
use course_creation::models::upload::{FileSource, UploadBucket, UploadProgress, UploadedFile};
use course_creation::services::{Destination, Navigator, Notifier, Toast, ToastKind};
use course_creation::{Config, WizardContext};

/// 生成一个错误，每次调用都得到新的实例
pub type ErrorFactory = fn() -> AppError;

pub fn not_found() -> AppError {
    ApiError::NotFound {
        endpoint: "/api/courses".to_string(),
        message: None,
    }
    .into()
}

pub fn unauthorized() -> AppError {
    ApiError::Unauthorized {
        endpoint: "/api/courses".to_string(),
    }
    .into()
}

pub fn rate_limited() -> AppError {
    ApiError::RateLimited {
        endpoint: "/api/courses".to_string(),
        retry_after: Some(30),
    }
    .into()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

// ========== 课程 API ==========

#[derive(Default)]
pub struct FakeCourseApi {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, ErrorFactory>>,
    next_id: AtomicUsize,
    pub course_requests: Mutex<Vec<CourseRequest>>,
    pub chapter_requests: Mutex<Vec<ChapterRequest>>,
    pub module_requests: Mutex<Vec<ModuleRequest>>,
    pub review_requests: Mutex<Vec<SubmitForReviewRequest>>,
    chapters: Mutex<Vec<ChapterResponse>>,
    modules: Mutex<Vec<ModuleResponse>>,
    pub my_courses: Mutex<Vec<CourseSummary>>,
    pub my_purchases: Mutex<Vec<PurchaseSummary>>,
}

impl FakeCourseApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让某个操作一直失败
    pub fn fail(&self, operation: &'static str, error: ErrorFactory) {
        lock(&self.failures).insert(operation, error);
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == operation).count()
    }

    fn record(&self, operation: &'static str) -> AppResult<()> {
        lock(&self.calls).push(operation.to_string());
        match lock(&self.failures).get(operation) {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl CourseApi for FakeCourseApi {
    async fn create_course(&self, request: &CourseRequest) -> AppResult<CourseResponse> {
        self.record("create_course")?;
        lock(&self.course_requests).push(request.clone());
        Ok(CourseResponse {
            id: self.next_id("course"),
            title: request.title.clone(),
            status: Some(CourseStatus::Draft),
            thumbnail: request.thumbnail.clone(),
            preview_video: request.preview_video.clone(),
        })
    }

    async fn update_course(
        &self,
        course_id: &str,
        request: &CourseRequest,
    ) -> AppResult<CourseResponse> {
        self.record("update_course")?;
        lock(&self.course_requests).push(request.clone());
        Ok(CourseResponse {
            id: course_id.to_string(),
            title: request.title.clone(),
            status: None,
            thumbnail: request.thumbnail.clone(),
            preview_video: request.preview_video.clone(),
        })
    }

    async fn create_chapter(
        &self,
        _course_id: &str,
        request: &ChapterRequest,
    ) -> AppResult<ChapterResponse> {
        self.record("create_chapter")?;
        lock(&self.chapter_requests).push(request.clone());
        let response = ChapterResponse {
            id: self.next_id("chapter"),
            title: request.title.clone(),
            description: request.description.clone(),
            order: request.order,
        };
        lock(&self.chapters).push(response.clone());
        Ok(response)
    }

    async fn update_chapter(
        &self,
        _course_id: &str,
        chapter_id: &str,
        request: &ChapterRequest,
    ) -> AppResult<ChapterResponse> {
        self.record("update_chapter")?;
        lock(&self.chapter_requests).push(request.clone());
        Ok(ChapterResponse {
            id: chapter_id.to_string(),
            title: request.title.clone(),
            description: request.description.clone(),
            order: request.order,
        })
    }

    async fn delete_chapter(&self, _course_id: &str, chapter_id: &str) -> AppResult<()> {
        self.record("delete_chapter")?;
        lock(&self.chapters).retain(|c| c.id != chapter_id);
        Ok(())
    }

    async fn list_chapters(&self, _course_id: &str) -> AppResult<Vec<ChapterResponse>> {
        self.record("list_chapters")?;
        Ok(lock(&self.chapters).clone())
    }

    async fn create_module(
        &self,
        _course_id: &str,
        request: &ModuleRequest,
    ) -> AppResult<ModuleResponse> {
        self.record("create_module")?;
        lock(&self.module_requests).push(request.clone());
        let response = ModuleResponse {
            id: self.next_id("module"),
            chapter_id: Some(request.chapter_id.clone()),
            title: request.title.clone(),
            description: request.description.clone(),
            module_type: request.module_type,
            order: request.order,
            duration: request.duration,
            is_preview: request.is_preview,
            main_file_url: request.main_file_url.clone(),
            attachments: request.attachments.clone(),
        };
        lock(&self.modules).push(response.clone());
        Ok(response)
    }

    async fn update_module(
        &self,
        _course_id: &str,
        module_id: &str,
        request: &ModuleRequest,
    ) -> AppResult<ModuleResponse> {
        self.record("update_module")?;
        lock(&self.module_requests).push(request.clone());
        Ok(ModuleResponse {
            id: module_id.to_string(),
            chapter_id: Some(request.chapter_id.clone()),
            title: request.title.clone(),
            description: request.description.clone(),
            module_type: request.module_type,
            order: request.order,
            duration: request.duration,
            is_preview: request.is_preview,
            main_file_url: request.main_file_url.clone(),
            attachments: request.attachments.clone(),
        })
    }

    async fn delete_module(&self, _course_id: &str, module_id: &str) -> AppResult<()> {
        self.record("delete_module")?;
        lock(&self.modules).retain(|m| m.id != module_id);
        Ok(())
    }

    async fn list_modules(&self, _course_id: &str) -> AppResult<Vec<ModuleResponse>> {
        self.record("list_modules")?;
        Ok(lock(&self.modules).clone())
    }

    async fn submit_for_review(
        &self,
        _course_id: &str,
        request: &SubmitForReviewRequest,
    ) -> AppResult<ReviewSubmission> {
        self.record("submit_for_review")?;
        lock(&self.review_requests).push(request.clone());
        Ok(ReviewSubmission {
            status: Some(CourseStatus::PendingReview),
        })
    }

    async fn my_purchases(&self) -> AppResult<Vec<PurchaseSummary>> {
        self.record("my_purchases")?;
        Ok(lock(&self.my_purchases).clone())
    }

    async fn my_courses(&self) -> AppResult<Vec<CourseSummary>> {
        self.record("my_courses")?;
        Ok(lock(&self.my_courses).clone())
    }
}

// ========== 上传 ==========

#[derive(Default)]
pub struct FakeUploader {
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<Vec<String>>,
    /// 按完成顺序记录 (文件名, 存储桶)
    pub completed: Mutex<Vec<(String, UploadBucket)>>,
}

impl FakeUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(&self, file_name: &str, delay: Duration) {
        lock(&self.delays).insert(file_name.to_string(), delay);
    }

    pub fn fail_on(&self, file_name: &str) {
        lock(&self.failing).push(file_name.to_string());
    }

    pub fn completed(&self) -> Vec<(String, UploadBucket)> {
        lock(&self.completed).clone()
    }

    pub fn url_for(bucket: UploadBucket, file_name: &str) -> String {
        format!("https://cdn.test/{}/{}", bucket, file_name)
    }
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(
        &self,
        file: &FileSource,
        bucket: UploadBucket,
        on_progress: ProgressCallback,
    ) -> AppResult<UploadedFile> {
        on_progress(UploadProgress::new(0, file.size));

        let delay = lock(&self.delays).get(&file.file_name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if lock(&self.failing).contains(&file.file_name) {
            return Err(UploadError::Rejected {
                file: file.file_name.clone(),
                status: 500,
                message: None,
            }
            .into());
        }

        on_progress(UploadProgress::finished(file.size));
        lock(&self.completed).push((file.file_name.clone(), bucket));
        Ok(UploadedFile {
            file_name: file.file_name.clone(),
            url: Self::url_for(bucket, &file.file_name),
        })
    }
}

// ========== 提示、跳转、会话 ==========

#[derive(Default)]
pub struct RecordingUi {
    toasts: Mutex<Vec<Toast>>,
    redirects: Mutex<Vec<Destination>>,
}

impl RecordingUi {
    pub fn toasts(&self) -> Vec<Toast> {
        lock(&self.toasts).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter(|t| t.kind == ToastKind::Error)
            .map(|t| t.message)
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter(|t| t.kind == ToastKind::Success)
            .map(|t| t.message)
            .collect()
    }

    pub fn redirects(&self) -> Vec<Destination> {
        lock(&self.redirects).clone()
    }
}

impl Notifier for RecordingUi {
    fn notify(&self, toast: Toast) {
        lock(&self.toasts).push(toast);
    }
}

impl Navigator for RecordingUi {
    fn redirect(&self, destination: Destination) {
        lock(&self.redirects).push(destination);
    }
}

#[derive(Default)]
pub struct RecordingSession {
    logouts: AtomicUsize,
}

impl RecordingSession {
    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

impl SessionHandler for RecordingSession {
    fn logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
    }
}

// ========== 组装 ==========

pub struct Harness {
    pub ctx: WizardContext,
    pub api: Arc<FakeCourseApi>,
    pub uploader: Arc<FakeUploader>,
    pub ui: Arc<RecordingUi>,
    pub session: Arc<RecordingSession>,
}

pub fn test_config() -> Config {
    Config {
        review_reset_delay_ms: 0,
        ..Config::default()
    }
}

pub fn harness() -> Harness {
    let api = Arc::new(FakeCourseApi::new());
    let uploader = Arc::new(FakeUploader::new());
    let ui = Arc::new(RecordingUi::default());
    let session = Arc::new(RecordingSession::default());

    let ctx = WizardContext::new(
        test_config(),
        api.clone(),
        uploader.clone(),
        ui.clone(),
        ui.clone(),
        session.clone(),
    );

    Harness {
        ctx,
        api,
        uploader,
        ui,
        session,
    }
}

// ========== 测试数据 ==========

pub fn valid_details() -> CourseDetails {
    CourseDetails {
        title: "Async Rust in Practice".to_string(),
        short_description: "Build fast and reliable network services".to_string(),
        description: "Futures, tasks, runtimes and everything in between, with real projects."
            .to_string(),
        price: 49.0,
        token_to_pay_with: vec!["USDC".to_string()],
        affiliate_percentage: 10.0,
        metadata: CourseMetadata {
            learning_outcomes: vec![
                "Write async code".to_string(),
                "Pick a runtime".to_string(),
                "Debug deadlocks".to_string(),
            ],
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn image(name: &str) -> FileSource {
    FileSource::from_bytes(name, vec![0u8; 2048])
}

pub fn video(name: &str) -> FileSource {
    FileSource::from_bytes(name, vec![0u8; 8192])
}

pub fn document(name: &str) -> FileSource {
    FileSource::from_bytes(name, vec![0u8; 512])
}
