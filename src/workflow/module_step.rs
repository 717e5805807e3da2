//! 第三步：模块
//!
//! 模块只能挂在已保存的章节下。模块类型以主文件的 MIME 类型为准，
//! 主文件和附件并行上传，全部成功后才创建模块。

use tracing::info;

use crate::error::{AppError, AppResult, WorkflowError};
use crate::infrastructure::TaskResults;
use crate::models::api::{ModuleRequest, ModuleResponse};
use crate::models::course::{Attachment, EntityId, LocalId, ModuleFields, ModulePatch, ModuleType};
use crate::models::upload::{FileSource, UploadBucket, UploadedFile};
use crate::services::{ProgressBoard, UploadRequest};
use crate::store::{CreationStore, WizardStep};
use crate::workflow::context::{StepOutcome, WizardContext};
use crate::workflow::validation::validate_module;

pub const MAIN_FILE_TASK: &str = "mainFile";

pub fn attachment_task(index: usize) -> String {
    format!("attachment-{}", index)
}

/// 模块表单
#[derive(Debug, Clone, Default)]
pub struct ModuleForm {
    pub title: String,
    pub description: String,
    /// 时长（分钟）
    pub duration: i64,
    pub is_preview: bool,
    pub main_file: Option<FileSource>,
    pub attachments: Vec<FileSource>,
}

impl ModuleForm {
    fn validate(&self, max_attachments: usize, existing_main_file: bool) -> Vec<String> {
        validate_module(
            &self.title,
            self.duration,
            self.main_file.is_some() || existing_main_file,
            self.attachments.len(),
            max_attachments,
        )
    }

    /// 主文件的类型，没有主文件时为 `None`
    pub fn detected_type(&self) -> Option<ModuleType> {
        self.main_file
            .as_ref()
            .map(|file| ModuleType::from_mime(&file.content_type))
    }

    fn upload_requests(&self) -> Vec<UploadRequest> {
        let mut requests = Vec::with_capacity(self.attachments.len() + 1);
        if let Some(file) = &self.main_file {
            let bucket = match self.detected_type() {
                Some(ModuleType::Video) => UploadBucket::Videos,
                _ => UploadBucket::Documents,
            };
            requests.push(UploadRequest::new(MAIN_FILE_TASK, file.clone(), bucket));
        }
        for (index, file) in self.attachments.iter().enumerate() {
            requests.push(UploadRequest::new(
                attachment_task(index),
                file.clone(),
                UploadBucket::Attachments,
            ));
        }
        requests
    }

    /// 组装模块字段，附件保持表单中的顺序
    fn into_fields(self, mut uploads: TaskResults<UploadedFile>) -> ModuleFields {
        let module_type = self.detected_type().unwrap_or_default();
        let main_file_url = uploads.take(MAIN_FILE_TASK).map(|f| f.url);
        let attachments = (0..self.attachments.len())
            .filter_map(|index| uploads.take(&attachment_task(index)))
            .map(|f| Attachment {
                name: f.file_name,
                url: f.url,
            })
            .collect();

        ModuleFields {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            module_type,
            duration: self.duration.max(0) as u32,
            is_preview: self.is_preview,
            main_file_url,
            attachments,
        }
    }
}

pub struct ModuleStep {
    ctx: WizardContext,
}

impl ModuleStep {
    pub fn new(ctx: WizardContext) -> Self {
        Self { ctx }
    }

    /// 在章节下创建模块
    pub async fn create(
        &self,
        store: &mut CreationStore,
        chapter_id: LocalId,
        form: ModuleForm,
    ) -> StepOutcome<LocalId> {
        let board = ProgressBoard::new();
        self.create_with_progress(store, chapter_id, form, &board)
            .await
    }

    pub async fn create_with_progress(
        &self,
        store: &mut CreationStore,
        chapter_id: LocalId,
        form: ModuleForm,
        board: &ProgressBoard,
    ) -> StepOutcome<LocalId> {
        let (fields, response) = match self.post_module(store, chapter_id, form, board).await {
            Ok(created) => created,
            Err(e) => return self.ctx.fail("创建模块", e),
        };

        info!(
            "✓ 模块已创建: {} ({:?}, {})",
            fields.title, fields.module_type, response.id
        );

        match store.add_module(chapter_id, EntityId::persisted(response.id), fields) {
            Some(local_id) => {
                self.ctx.notify_success("Module created successfully");
                StepOutcome::Completed(local_id)
            }
            None => self
                .ctx
                .fail("创建模块", WorkflowError::ChapterNotFound.into()),
        }
    }

    async fn post_module(
        &self,
        store: &CreationStore,
        chapter_id: LocalId,
        form: ModuleForm,
        board: &ProgressBoard,
    ) -> AppResult<(ModuleFields, ModuleResponse)> {
        let (course_id, chapter_backend_id) = saved_ids(store, chapter_id)?;

        let errors = form.validate(self.ctx.config.max_attachments, false);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let uploads = self
            .ctx
            .uploads
            .upload_all(form.upload_requests(), board)
            .await?;
        let fields = form.into_fields(uploads);

        let request = ModuleRequest::new(
            chapter_backend_id,
            &fields,
            store.next_module_order(chapter_id),
        );
        let response = self.ctx.api.create_module(&course_id, &request).await?;
        Ok((fields, response))
    }

    /// 修改模块，没有新主文件时沿用原来的文件和类型
    pub async fn update(
        &self,
        store: &mut CreationStore,
        chapter_id: LocalId,
        module_id: LocalId,
        form: ModuleForm,
        board: &ProgressBoard,
    ) -> StepOutcome {
        let fields = match self
            .put_module(store, chapter_id, module_id, form, board)
            .await
        {
            Ok(fields) => fields,
            Err(e) => return self.ctx.fail("更新模块", e),
        };

        store.update_module(
            chapter_id,
            module_id,
            ModulePatch {
                title: Some(fields.title),
                description: Some(fields.description),
                module_type: Some(fields.module_type),
                duration: Some(fields.duration),
                is_preview: Some(fields.is_preview),
                main_file_url: fields.main_file_url,
                attachments: Some(fields.attachments),
            },
        );
        self.ctx.notify_success("Module updated successfully");
        StepOutcome::Completed(())
    }

    async fn put_module(
        &self,
        store: &CreationStore,
        chapter_id: LocalId,
        module_id: LocalId,
        form: ModuleForm,
        board: &ProgressBoard,
    ) -> AppResult<ModuleFields> {
        let (course_id, chapter_backend_id) = saved_ids(store, chapter_id)?;
        let module = store
            .module(chapter_id, module_id)
            .ok_or(AppError::Workflow(WorkflowError::ModuleNotFound))?;
        let module_backend_id = module
            .id
            .backend_id()
            .ok_or_else(|| WorkflowError::ModuleNotSaved {
                title: module.title.clone(),
            })?
            .to_string();

        let errors = form.validate(
            self.ctx.config.max_attachments,
            module.main_file_url.is_some(),
        );
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let replaces_main_file = form.main_file.is_some();
        let keeps_attachments = form.attachments.is_empty();
        let uploads = self
            .ctx
            .uploads
            .upload_all(form.upload_requests(), board)
            .await?;
        let mut fields = form.into_fields(uploads);

        if !replaces_main_file {
            fields.module_type = module.module_type;
            fields.main_file_url = module.main_file_url.clone();
        }
        if keeps_attachments {
            fields.attachments = module.attachments.clone();
        }

        let request = ModuleRequest::new(chapter_backend_id, &fields, module.order);
        self.ctx
            .api
            .update_module(&course_id, &module_backend_id, &request)
            .await?;

        info!("✓ 模块已更新: {}", module_backend_id);
        Ok(fields)
    }

    /// 删除模块，未保存的模块只在本地删除
    pub async fn delete(
        &self,
        store: &mut CreationStore,
        chapter_id: LocalId,
        module_id: LocalId,
    ) -> StepOutcome {
        let result: AppResult<()> = async {
            let module = store
                .module(chapter_id, module_id)
                .ok_or(AppError::Workflow(WorkflowError::ModuleNotFound))?;
            let Some(backend_id) = module.id.backend_id() else {
                return Ok(());
            };
            let course_id = store
                .course_backend_id()
                .ok_or(AppError::Workflow(WorkflowError::CourseNotSaved))?;
            self.ctx.api.delete_module(course_id, backend_id).await
        }
        .await;

        if let Err(e) = result {
            return self.ctx.fail("删除模块", e);
        }

        store.delete_module(chapter_id, module_id);
        self.ctx.notify_success("Module deleted");
        StepOutcome::Completed(())
    }

    /// 进入审核步骤：每个章节至少一个模块，且全部已保存
    pub fn continue_to_review(&self, store: &mut CreationStore) -> StepOutcome {
        let check = || -> AppResult<()> {
            if store.current_course().is_none() {
                return Err(WorkflowError::NoActiveCourse.into());
            }
            if store.chapters().is_empty() {
                return Err(WorkflowError::NoChapters.into());
            }
            let empty = store.chapters_without_modules();
            if !empty.is_empty() {
                return Err(WorkflowError::ChaptersWithoutModules { titles: empty }.into());
            }
            let unsaved = store.unsaved_modules();
            if !unsaved.is_empty() {
                return Err(WorkflowError::UnsavedModules { titles: unsaved }.into());
            }
            Ok(())
        };

        if let Err(e) = check() {
            return self.ctx.fail("进入审核步骤", e);
        }

        store.set_current_step(WizardStep::Review);
        StepOutcome::Completed(())
    }
}

/// 课程和章节的后端 ID，章节未保存时不发出任何请求
fn saved_ids(store: &CreationStore, chapter_id: LocalId) -> AppResult<(String, String)> {
    let course_id = store
        .course_backend_id()
        .ok_or(AppError::Workflow(WorkflowError::CourseNotSaved))?
        .to_string();
    let chapter = store
        .chapter(chapter_id)
        .ok_or(AppError::Workflow(WorkflowError::ChapterNotFound))?;
    let chapter_backend_id = chapter
        .id
        .backend_id()
        .ok_or_else(|| WorkflowError::ChapterNotSaved {
            title: chapter.title.clone(),
        })?
        .to_string();
    Ok((course_id, chapter_backend_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_type_follows_main_file() {
        let mut form = ModuleForm::default();
        assert_eq!(form.detected_type(), None);

        form.main_file = Some(FileSource::from_bytes("intro.mp4", vec![0; 4]));
        assert_eq!(form.detected_type(), Some(ModuleType::Video));

        form.main_file = Some(FileSource::from_bytes("slides.pdf", vec![0; 4]));
        assert_eq!(form.detected_type(), Some(ModuleType::Document));
    }

    #[test]
    fn test_upload_requests_use_stable_names() {
        let form = ModuleForm {
            main_file: Some(FileSource::from_bytes("intro.mp4", vec![0; 4])),
            attachments: vec![
                FileSource::from_bytes("a.pdf", vec![1]),
                FileSource::from_bytes("b.zip", vec![2]),
            ],
            ..Default::default()
        };
        let requests = form.upload_requests();
        let names: Vec<_> = requests.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["mainFile", "attachment-0", "attachment-1"]);
        assert_eq!(requests[0].bucket, UploadBucket::Videos);
        assert_eq!(requests[2].bucket, UploadBucket::Attachments);
    }
}
