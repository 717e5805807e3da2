//! 第一步：课程基本信息
//!
//! 校验表单 → 并行上传封面和预览视频 → 创建课程 → 写入状态容器 → 进入章节步骤。
//! 任何一步失败都不会修改状态容器，用户停留在当前步骤。

use tracing::info;

use crate::error::{AppError, AppResult, WorkflowError};
use crate::infrastructure::TaskResults;
use crate::models::api::{CourseRequest, CourseResponse};
use crate::models::course::{CourseDetails, CoursePatch, EntityId, LocalId};
use crate::models::upload::{FileSource, UploadBucket, UploadedFile};
use crate::services::{ProgressBoard, UploadRequest};
use crate::store::{CreationStore, WizardStep};
use crate::workflow::context::{StepOutcome, WizardContext};
use crate::workflow::validation::{validate_course, validate_preview_video};

pub const THUMBNAIL_TASK: &str = "thumbnail";
pub const PREVIEW_VIDEO_TASK: &str = "previewVideo";

/// 课程表单
#[derive(Debug, Clone, Default)]
pub struct CourseForm {
    pub details: CourseDetails,
    pub thumbnail: Option<FileSource>,
    pub preview_video: Option<FileSource>,
}

impl CourseForm {
    pub fn new(details: CourseDetails) -> Self {
        Self {
            details,
            ..Default::default()
        }
    }

    pub fn with_thumbnail(mut self, file: FileSource) -> Self {
        self.thumbnail = Some(file);
        self
    }

    pub fn with_preview_video(mut self, file: FileSource) -> Self {
        self.preview_video = Some(file);
        self
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = validate_course(&self.details, self.thumbnail.as_ref());
        errors.extend(validate_preview_video(self.preview_video.as_ref()));
        errors
    }

    fn upload_requests(&self) -> Vec<UploadRequest> {
        let mut requests = Vec::new();
        if let Some(file) = &self.thumbnail {
            requests.push(UploadRequest::new(
                THUMBNAIL_TASK,
                file.clone(),
                UploadBucket::Thumbnails,
            ));
        }
        if let Some(file) = &self.preview_video {
            requests.push(UploadRequest::new(
                PREVIEW_VIDEO_TASK,
                file.clone(),
                UploadBucket::Videos,
            ));
        }
        requests
    }
}

/// 把上传结果写回课程字段，未上传的保留原值
fn apply_uploads(details: &mut CourseDetails, mut uploads: TaskResults<UploadedFile>) {
    if let Some(file) = uploads.take(THUMBNAIL_TASK) {
        details.thumbnail_url = Some(file.url);
    }
    if let Some(file) = uploads.take(PREVIEW_VIDEO_TASK) {
        details.preview_video_url = Some(file.url);
    }
}

/// 用后端返回的地址覆盖本地字段
fn apply_response(details: &mut CourseDetails, response: &CourseResponse) {
    if let Some(url) = &response.thumbnail {
        details.thumbnail_url = Some(url.clone());
    }
    if let Some(url) = &response.preview_video {
        details.preview_video_url = Some(url.clone());
    }
}

pub struct CourseStep {
    ctx: WizardContext,
}

impl CourseStep {
    pub fn new(ctx: WizardContext) -> Self {
        Self { ctx }
    }

    /// 创建课程
    pub async fn submit(&self, store: &mut CreationStore, form: CourseForm) -> StepOutcome<LocalId> {
        let board = ProgressBoard::new();
        self.submit_with_progress(store, form, &board).await
    }

    /// 创建课程，上传进度写入给定面板
    pub async fn submit_with_progress(
        &self,
        store: &mut CreationStore,
        form: CourseForm,
        board: &ProgressBoard,
    ) -> StepOutcome<LocalId> {
        let (details, response) = match self.create(form, board).await {
            Ok(created) => created,
            Err(e) => return self.ctx.fail("创建课程", e),
        };

        info!("✓ 课程已创建: {} ({})", details.title, response.id);

        let local_id = store.create_course(EntityId::persisted(response.id.clone()), details);
        if let Some(status) = response.status {
            store.update_course(CoursePatch {
                status: Some(status),
                ..Default::default()
            });
        }
        store.set_current_step(WizardStep::Chapters);

        self.ctx.notify_success("Course created successfully");
        StepOutcome::Completed(local_id)
    }

    async fn create(
        &self,
        form: CourseForm,
        board: &ProgressBoard,
    ) -> AppResult<(CourseDetails, CourseResponse)> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let uploads = self
            .ctx
            .uploads
            .upload_all(form.upload_requests(), board)
            .await?;

        let mut details = form.details.normalized();
        apply_uploads(&mut details, uploads);

        let response = self
            .ctx
            .api
            .create_course(&CourseRequest::from(&details))
            .await?;
        apply_response(&mut details, &response);

        Ok((details, response))
    }

    /// 修改已保存的课程，只在提供了新文件时重新上传
    pub async fn update(
        &self,
        store: &mut CreationStore,
        form: CourseForm,
        board: &ProgressBoard,
    ) -> StepOutcome {
        let patch = match self.save_changes(store, form, board).await {
            Ok(patch) => patch,
            Err(e) => return self.ctx.fail("更新课程", e),
        };

        store.update_course(patch);
        self.ctx.notify_success("Course updated successfully");
        StepOutcome::Completed(())
    }

    async fn save_changes(
        &self,
        store: &CreationStore,
        mut form: CourseForm,
        board: &ProgressBoard,
    ) -> AppResult<CoursePatch> {
        let course = store
            .current_course()
            .ok_or(AppError::Workflow(WorkflowError::NoActiveCourse))?;
        let course_id = course
            .id
            .backend_id()
            .ok_or(AppError::Workflow(WorkflowError::CourseNotSaved))?
            .to_string();

        if form.details.thumbnail_url.is_none() {
            form.details.thumbnail_url = course.details.thumbnail_url.clone();
        }
        if form.details.preview_video_url.is_none() {
            form.details.preview_video_url = course.details.preview_video_url.clone();
        }

        let errors = form.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let uploads = self
            .ctx
            .uploads
            .upload_all(form.upload_requests(), board)
            .await?;

        let mut details = form.details.normalized();
        apply_uploads(&mut details, uploads);

        let response = self
            .ctx
            .api
            .update_course(&course_id, &CourseRequest::from(&details))
            .await?;
        apply_response(&mut details, &response);

        info!("✓ 课程已更新: {}", course_id);

        let mut patch = CoursePatch::from_details(details);
        patch.status = response.status;
        Ok(patch)
    }
}
