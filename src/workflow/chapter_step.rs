//! 第二步：章节
//!
//! 章节只能挂在已保存的课程下，创建成功后以已保存状态追加到状态容器。

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{AppError, AppResult, WorkflowError};
use crate::models::api::{ChapterRequest, ChapterResponse, ModuleResponse};
use crate::models::course::{Chapter, ChapterFields, ChapterPatch, EntityId, LocalId, Module};
use crate::store::{CreationStore, WizardStep};
use crate::workflow::context::{StepOutcome, WizardContext};
use crate::workflow::validation::validate_chapter;

pub const COURSE_NOT_FOUND_MESSAGE: &str = "Course not found. Please create the course again.";

fn course_id(store: &CreationStore) -> AppResult<String> {
    if store.current_course().is_none() {
        return Err(WorkflowError::NoActiveCourse.into());
    }
    store
        .course_backend_id()
        .map(str::to_string)
        .ok_or_else(|| WorkflowError::CourseNotSaved.into())
}

fn saved_chapter_id(store: &CreationStore, chapter_id: LocalId) -> AppResult<String> {
    let chapter = store
        .chapter(chapter_id)
        .ok_or(AppError::Workflow(WorkflowError::ChapterNotFound))?;
    chapter
        .id
        .backend_id()
        .map(str::to_string)
        .ok_or_else(|| {
            WorkflowError::ChapterNotSaved {
                title: chapter.title.clone(),
            }
            .into()
        })
}

pub struct ChapterStep {
    ctx: WizardContext,
}

impl ChapterStep {
    pub fn new(ctx: WizardContext) -> Self {
        Self { ctx }
    }

    /// 创建章节，序号为当前章节数 + 1
    pub async fn create(
        &self,
        store: &mut CreationStore,
        fields: ChapterFields,
    ) -> StepOutcome<LocalId> {
        let fields = fields.normalized();
        let response = match self.post_chapter(store, &fields).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                store.set_current_step(WizardStep::Course);
                return self.ctx.fail_with_message(
                    "创建章节",
                    e,
                    Some(COURSE_NOT_FOUND_MESSAGE.to_string()),
                );
            }
            Err(e) => return self.ctx.fail("创建章节", e),
        };

        info!("✓ 章节已创建: {} ({})", fields.title, response.id);

        match store.add_chapter(EntityId::persisted(response.id), fields) {
            Some(local_id) => {
                self.ctx.notify_success("Chapter created successfully");
                StepOutcome::Completed(local_id)
            }
            None => self
                .ctx
                .fail("创建章节", WorkflowError::NoActiveCourse.into()),
        }
    }

    async fn post_chapter(
        &self,
        store: &CreationStore,
        fields: &ChapterFields,
    ) -> AppResult<ChapterResponse> {
        let course_id = course_id(store)?;

        let errors = validate_chapter(fields);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let request = ChapterRequest::new(fields, store.next_chapter_order());
        self.ctx.api.create_chapter(&course_id, &request).await
    }

    /// 修改章节标题和描述
    pub async fn update(
        &self,
        store: &mut CreationStore,
        chapter_id: LocalId,
        fields: ChapterFields,
    ) -> StepOutcome {
        let fields = fields.normalized();
        let result: AppResult<ChapterResponse> = async {
            let course_id = course_id(store)?;
            let backend_id = saved_chapter_id(store, chapter_id)?;

            let errors = validate_chapter(&fields);
            if !errors.is_empty() {
                return Err(AppError::Validation(errors));
            }

            let order = store.chapter(chapter_id).map(|c| c.order).unwrap_or(1);
            let request = ChapterRequest::new(&fields, order);
            self.ctx
                .api
                .update_chapter(&course_id, &backend_id, &request)
                .await
        }
        .await;

        if let Err(e) = result {
            return self.ctx.fail("更新章节", e);
        }

        store.update_chapter(
            chapter_id,
            ChapterPatch {
                title: Some(fields.title),
                description: Some(fields.description),
            },
        );
        self.ctx.notify_success("Chapter updated successfully");
        StepOutcome::Completed(())
    }

    /// 删除章节，未保存的章节只在本地删除
    pub async fn delete(&self, store: &mut CreationStore, chapter_id: LocalId) -> StepOutcome {
        let result: AppResult<()> = async {
            let chapter = store
                .chapter(chapter_id)
                .ok_or(AppError::Workflow(WorkflowError::ChapterNotFound))?;
            let Some(backend_id) = chapter.id.backend_id() else {
                return Ok(());
            };
            let course_id = course_id(store)?;
            self.ctx.api.delete_chapter(&course_id, backend_id).await
        }
        .await;

        if let Err(e) = result {
            return self.ctx.fail("删除章节", e);
        }

        store.delete_chapter(chapter_id);
        self.ctx.notify_success("Chapter deleted");
        StepOutcome::Completed(())
    }

    /// 从后端重新拉取章节和模块，已知实体保留本地 ID
    pub async fn refresh(&self, store: &mut CreationStore) -> StepOutcome<usize> {
        let result: AppResult<(Vec<ChapterResponse>, Vec<ModuleResponse>)> = async {
            let course_id = course_id(store)?;
            tokio::try_join!(
                self.ctx.api.list_chapters(&course_id),
                self.ctx.api.list_modules(&course_id),
            )
        }
        .await;

        let (chapters, modules) = match result {
            Ok(lists) => lists,
            Err(e) => return self.ctx.fail("刷新章节", e),
        };

        debug!("刷新: {} 个章节, {} 个模块", chapters.len(), modules.len());

        let rebuilt = rebuild_chapters(store, chapters, modules);
        let count = rebuilt.len();
        store.replace_chapters(rebuilt);
        StepOutcome::Completed(count)
    }

    /// 进入模块步骤：至少一个章节，且全部已保存
    pub fn continue_to_modules(&self, store: &mut CreationStore) -> StepOutcome {
        let check = || -> AppResult<()> {
            course_id(store)?;
            if store.chapters().is_empty() {
                return Err(WorkflowError::NoChapters.into());
            }
            let unsaved = store.unsaved_chapters();
            if !unsaved.is_empty() {
                return Err(WorkflowError::UnsavedChapters { titles: unsaved }.into());
            }
            Ok(())
        };

        if let Err(e) = check() {
            return self.ctx.fail("进入模块步骤", e);
        }

        store.set_current_step(WizardStep::Modules);
        StepOutcome::Completed(())
    }
}

/// 用后端列表重建章节树
fn rebuild_chapters(
    store: &CreationStore,
    chapters: Vec<ChapterResponse>,
    modules: Vec<ModuleResponse>,
) -> Vec<Chapter> {
    let mut by_chapter: HashMap<String, Vec<ModuleResponse>> = HashMap::new();
    for module in modules {
        if let Some(chapter_id) = module.chapter_id.clone() {
            by_chapter.entry(chapter_id).or_default().push(module);
        }
    }

    chapters
        .into_iter()
        .map(|resp| {
            let existing = store.chapter_by_backend_id(&resp.id);
            let local_id = existing
                .map(|c| c.id.local_id())
                .unwrap_or_else(LocalId::new_v4);

            let modules = by_chapter
                .remove(&resp.id)
                .unwrap_or_default()
                .into_iter()
                .map(|m| {
                    let module_local_id = existing
                        .and_then(|c| {
                            c.modules
                                .iter()
                                .find(|known| known.id.backend_id() == Some(m.id.as_str()))
                        })
                        .map(|known| known.id.local_id())
                        .unwrap_or_else(LocalId::new_v4);
                    Module {
                        id: EntityId::Persisted {
                            local_id: module_local_id,
                            backend_id: m.id,
                        },
                        title: m.title,
                        description: m.description,
                        module_type: m.module_type,
                        order: m.order,
                        duration: m.duration,
                        is_preview: m.is_preview,
                        main_file_url: m.main_file_url,
                        attachments: m.attachments,
                    }
                })
                .collect();

            Chapter {
                id: EntityId::Persisted {
                    local_id,
                    backend_id: resp.id,
                },
                title: resp.title,
                description: resp.description,
                order: resp.order,
                modules,
            }
        })
        .collect()
}
