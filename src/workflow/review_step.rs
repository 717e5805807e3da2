//! 第四步：预览并提交审核

use tracing::info;

use crate::error::{AppError, AppResult, WorkflowError};
use crate::models::api::SubmitForReviewRequest;
use crate::models::course::{CoursePatch, CourseStatus, ModuleType};
use crate::services::Destination;
use crate::store::CreationStore;
use crate::workflow::context::{StepOutcome, WizardContext};

/// 课程内容统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReviewSummary {
    pub chapter_count: usize,
    pub module_count: usize,
    pub preview_count: usize,
    pub video_count: usize,
    pub document_count: usize,
    /// 总时长（分钟）
    pub total_duration: u64,
}

impl ReviewSummary {
    pub fn from_store(store: &CreationStore) -> Self {
        let mut summary = Self {
            chapter_count: store.chapters().len(),
            ..Default::default()
        };
        for module in store.chapters().iter().flat_map(|c| c.modules.iter()) {
            summary.module_count += 1;
            summary.total_duration += u64::from(module.duration);
            if module.is_preview {
                summary.preview_count += 1;
            }
            match module.module_type {
                ModuleType::Video => summary.video_count += 1,
                ModuleType::Document => summary.document_count += 1,
            }
        }
        summary
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.total_duration)
    }
}

/// 分钟数格式化为 "1h 05m" / "45m"
pub fn format_duration(minutes: u64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours == 0 {
        format!("{}m", rest)
    } else {
        format!("{}h {:02}m", hours, rest)
    }
}

pub struct ReviewStep {
    ctx: WizardContext,
}

impl ReviewStep {
    pub fn new(ctx: WizardContext) -> Self {
        Self { ctx }
    }

    pub fn summary(&self, store: &CreationStore) -> ReviewSummary {
        ReviewSummary::from_store(store)
    }

    /// 提交审核，成功后等待片刻、清空草稿并跳转到"我的课程"
    pub async fn submit(&self, store: &mut CreationStore, note: Option<String>) -> StepOutcome {
        let status = match self.post_submit(store, note).await {
            Ok(status) => status,
            Err(e) => return self.ctx.fail("提交审核", e),
        };

        info!("✓ 课程已提交审核");

        self.ctx.notify_success("Course submitted for review");
        store.update_course(CoursePatch {
            status: Some(status),
            ..Default::default()
        });

        tokio::time::sleep(self.ctx.config.review_reset_delay()).await;

        store.reset_creation();
        self.ctx.navigator.redirect(Destination::MyCourses);
        StepOutcome::Completed(())
    }

    async fn post_submit(
        &self,
        store: &CreationStore,
        note: Option<String>,
    ) -> AppResult<CourseStatus> {
        let course_id = ready_for_review(store)?;
        let request = SubmitForReviewRequest {
            note: note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        };
        let submission = self.ctx.api.submit_for_review(&course_id, &request).await?;
        Ok(submission.status.unwrap_or(CourseStatus::PendingReview))
    }
}

/// 提交前的检查，返回课程的后端 ID
fn ready_for_review(store: &CreationStore) -> AppResult<String> {
    if store.current_course().is_none() {
        return Err(WorkflowError::NoActiveCourse.into());
    }
    let course_id = store
        .course_backend_id()
        .ok_or(AppError::Workflow(WorkflowError::CourseNotSaved))?
        .to_string();
    if store.chapters().is_empty() {
        return Err(WorkflowError::NoChapters.into());
    }
    let empty = store.chapters_without_modules();
    if !empty.is_empty() {
        return Err(WorkflowError::ChaptersWithoutModules { titles: empty }.into());
    }
    let unsaved = store.unsaved_chapters();
    if !unsaved.is_empty() {
        return Err(WorkflowError::UnsavedChapters { titles: unsaved }.into());
    }
    let unsaved = store.unsaved_modules();
    if !unsaved.is_empty() {
        return Err(WorkflowError::UnsavedModules { titles: unsaved }.into());
    }
    Ok(course_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::course::{ChapterFields, CourseDetails, EntityId, ModuleFields};

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(65), "1h 05m");
        assert_eq!(format_duration(600), "10h 00m");
    }

    #[test]
    fn test_summary_counts() {
        let mut store = CreationStore::new();
        store.create_course(EntityId::persisted("c1"), CourseDetails::default());
        let ch = store
            .add_chapter(
                EntityId::persisted("ch1"),
                ChapterFields {
                    title: "Intro".into(),
                    description: "Start".into(),
                },
            )
            .unwrap();
        store.add_chapter(EntityId::persisted("ch2"), ChapterFields::default());
        store.add_module(
            ch,
            EntityId::persisted("m1"),
            ModuleFields {
                title: "Welcome".into(),
                module_type: ModuleType::Video,
                duration: 30,
                is_preview: true,
                ..Default::default()
            },
        );
        store.add_module(
            ch,
            EntityId::persisted("m2"),
            ModuleFields {
                title: "Notes".into(),
                duration: 15,
                ..Default::default()
            },
        );

        let summary = ReviewSummary::from_store(&store);
        assert_eq!(summary.chapter_count, 2);
        assert_eq!(summary.module_count, 2);
        assert_eq!(summary.preview_count, 1);
        assert_eq!(summary.video_count, 1);
        assert_eq!(summary.document_count, 1);
        assert_eq!(summary.total_duration, 45);
        assert_eq!(summary.formatted_duration(), "45m");

        let err = ready_for_review(&store).unwrap_err();
        assert!(err.to_string().contains("Missing modules in: "));
    }
}
