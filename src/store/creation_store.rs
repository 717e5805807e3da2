//! 课程创建状态容器
//!
//! 向导的唯一数据源：正在创建的课程草稿、章节、模块，以及当前步骤。
//! 所有操作都是同步的内存修改，不发出任何网络请求；没有课程时所有操作都是空操作。

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::course::{
    Chapter, ChapterFields, ChapterPatch, CourseDetails, CourseDraft, CoursePatch, EntityId,
    LocalId, Module, ModuleFields, ModulePatch,
};

/// 向导步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    #[default]
    Course,
    Chapters,
    Modules,
    Review,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::Course => "course",
            WizardStep::Chapters => "chapters",
            WizardStep::Modules => "modules",
            WizardStep::Review => "review",
        };
        f.write_str(name)
    }
}

/// 课程创建状态
#[derive(Debug, Clone, Default)]
pub struct CreationStore {
    current_step: WizardStep,
    current_course: Option<CourseDraft>,
}

impl CreationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    /// 切换步骤，不做任何校验
    pub fn set_current_step(&mut self, step: WizardStep) {
        self.current_step = step;
    }

    pub fn current_course(&self) -> Option<&CourseDraft> {
        self.current_course.as_ref()
    }

    /// 已保存课程的后端 ID
    pub fn course_backend_id(&self) -> Option<&str> {
        self.current_course.as_ref().and_then(|c| c.id.backend_id())
    }

    pub fn chapters(&self) -> &[Chapter] {
        self.current_course
            .as_ref()
            .map(|c| c.chapters.as_slice())
            .unwrap_or(&[])
    }

    // ========== 课程 ==========

    /// 开始一门新课程，替换现有草稿
    pub fn create_course(&mut self, id: EntityId, details: CourseDetails) -> LocalId {
        let draft = CourseDraft::new(id, details);
        let local_id = draft.id.local_id();
        self.current_course = Some(draft);
        local_id
    }

    /// 合并部分字段并更新 `updated_at`
    pub fn update_course(&mut self, mut patch: CoursePatch) {
        let Some(course) = self.current_course.as_mut() else {
            return;
        };
        if let Some(status) = patch.status.take() {
            course.status = status;
        }
        patch.apply(&mut course.details);
        course.updated_at = Utc::now();
    }

    /// 记录课程的后端 ID
    pub fn mark_course_persisted(&mut self, backend_id: impl Into<String>) {
        if let Some(course) = self.current_course.as_mut() {
            course.id.persist(backend_id);
            course.updated_at = Utc::now();
        }
    }

    // ========== 章节 ==========

    pub fn chapter(&self, local_id: LocalId) -> Option<&Chapter> {
        self.chapters().iter().find(|c| c.id.local_id() == local_id)
    }

    pub fn chapter_by_backend_id(&self, backend_id: &str) -> Option<&Chapter> {
        self.chapters()
            .iter()
            .find(|c| c.id.backend_id() == Some(backend_id))
    }

    /// 下一个章节的序号
    pub fn next_chapter_order(&self) -> u32 {
        self.chapters().len() as u32 + 1
    }

    /// 追加章节到末尾，返回本地 ID
    pub fn add_chapter(&mut self, id: EntityId, fields: ChapterFields) -> Option<LocalId> {
        let course = self.current_course.as_mut()?;
        let local_id = id.local_id();
        course.chapters.push(Chapter {
            id,
            title: fields.title,
            description: fields.description,
            order: course.chapters.len() as u32 + 1,
            modules: Vec::new(),
        });
        course.updated_at = Utc::now();
        Some(local_id)
    }

    pub fn update_chapter(&mut self, local_id: LocalId, patch: ChapterPatch) {
        let Some(chapter) = self.chapter_mut(local_id) else {
            return;
        };
        if let Some(title) = patch.title {
            chapter.title = title;
        }
        if let Some(description) = patch.description {
            chapter.description = description;
        }
    }

    pub fn mark_chapter_persisted(&mut self, local_id: LocalId, backend_id: impl Into<String>) {
        if let Some(chapter) = self.chapter_mut(local_id) {
            chapter.id.persist(backend_id);
        }
    }

    /// 删除章节并重新编号
    pub fn delete_chapter(&mut self, local_id: LocalId) {
        let Some(course) = self.current_course.as_mut() else {
            return;
        };
        let before = course.chapters.len();
        course.chapters.retain(|c| c.id.local_id() != local_id);
        if course.chapters.len() != before {
            renumber_chapters(&mut course.chapters);
            course.updated_at = Utc::now();
        }
    }

    /// 用后端数据替换整个章节列表
    pub fn replace_chapters(&mut self, chapters: Vec<Chapter>) {
        let Some(course) = self.current_course.as_mut() else {
            return;
        };
        course.chapters = chapters;
        course.chapters.sort_by_key(|c| c.order);
        renumber_chapters(&mut course.chapters);
        for chapter in course.chapters.iter_mut() {
            chapter.modules.sort_by_key(|m| m.order);
            renumber_modules(&mut chapter.modules);
        }
        course.updated_at = Utc::now();
    }

    /// 尚未保存的章节标题
    pub fn unsaved_chapters(&self) -> Vec<String> {
        self.chapters()
            .iter()
            .filter(|c| !c.id.is_saved())
            .map(|c| c.title.clone())
            .collect()
    }

    /// 没有任何模块的章节标题
    pub fn chapters_without_modules(&self) -> Vec<String> {
        self.chapters()
            .iter()
            .filter(|c| c.modules.is_empty())
            .map(|c| c.title.clone())
            .collect()
    }

    /// 尚未保存的模块标题
    pub fn unsaved_modules(&self) -> Vec<String> {
        self.chapters()
            .iter()
            .flat_map(|c| c.modules.iter())
            .filter(|m| !m.id.is_saved())
            .map(|m| m.title.clone())
            .collect()
    }

    // ========== 模块 ==========

    pub fn module(&self, chapter_id: LocalId, module_id: LocalId) -> Option<&Module> {
        self.chapter(chapter_id)?
            .modules
            .iter()
            .find(|m| m.id.local_id() == module_id)
    }

    pub fn next_module_order(&self, chapter_id: LocalId) -> u32 {
        self.chapter(chapter_id)
            .map(|c| c.modules.len() as u32 + 1)
            .unwrap_or(1)
    }

    /// 在章节末尾追加模块，返回本地 ID
    pub fn add_module(
        &mut self,
        chapter_id: LocalId,
        id: EntityId,
        fields: ModuleFields,
    ) -> Option<LocalId> {
        let chapter = self.chapter_mut(chapter_id)?;
        let local_id = id.local_id();
        chapter.modules.push(Module {
            id,
            title: fields.title,
            description: fields.description,
            module_type: fields.module_type,
            order: chapter.modules.len() as u32 + 1,
            duration: fields.duration,
            is_preview: fields.is_preview,
            main_file_url: fields.main_file_url,
            attachments: fields.attachments,
        });
        self.touch();
        Some(local_id)
    }

    pub fn update_module(&mut self, chapter_id: LocalId, module_id: LocalId, patch: ModulePatch) {
        let Some(module) = self.module_mut(chapter_id, module_id) else {
            return;
        };
        if let Some(v) = patch.title {
            module.title = v;
        }
        if let Some(v) = patch.description {
            module.description = v;
        }
        if let Some(v) = patch.module_type {
            module.module_type = v;
        }
        if let Some(v) = patch.duration {
            module.duration = v;
        }
        if let Some(v) = patch.is_preview {
            module.is_preview = v;
        }
        if let Some(v) = patch.main_file_url {
            module.main_file_url = Some(v);
        }
        if let Some(v) = patch.attachments {
            module.attachments = v;
        }
    }

    pub fn mark_module_persisted(
        &mut self,
        chapter_id: LocalId,
        module_id: LocalId,
        backend_id: impl Into<String>,
    ) {
        if let Some(module) = self.module_mut(chapter_id, module_id) {
            module.id.persist(backend_id);
        }
    }

    /// 删除模块并重新编号
    pub fn delete_module(&mut self, chapter_id: LocalId, module_id: LocalId) {
        let Some(chapter) = self.chapter_mut(chapter_id) else {
            return;
        };
        let before = chapter.modules.len();
        chapter.modules.retain(|m| m.id.local_id() != module_id);
        if chapter.modules.len() != before {
            renumber_modules(&mut chapter.modules);
            self.touch();
        }
    }

    // ========== 重置 ==========

    /// 丢弃草稿并回到第一步
    pub fn reset_creation(&mut self) {
        self.current_course = None;
        self.current_step = WizardStep::Course;
    }

    // ========== 内部辅助 ==========

    fn chapter_mut(&mut self, local_id: LocalId) -> Option<&mut Chapter> {
        self.current_course
            .as_mut()?
            .chapters
            .iter_mut()
            .find(|c| c.id.local_id() == local_id)
    }

    fn module_mut(&mut self, chapter_id: LocalId, module_id: LocalId) -> Option<&mut Module> {
        self.chapter_mut(chapter_id)?
            .modules
            .iter_mut()
            .find(|m| m.id.local_id() == module_id)
    }

    fn touch(&mut self) {
        if let Some(course) = self.current_course.as_mut() {
            course.updated_at = Utc::now();
        }
    }
}

fn renumber_chapters(chapters: &mut [Chapter]) {
    for (index, chapter) in chapters.iter_mut().enumerate() {
        chapter.order = index as u32 + 1;
    }
}

fn renumber_modules(modules: &mut [Module]) {
    for (index, module) in modules.iter_mut().enumerate() {
        module.order = index as u32 + 1;
    }
}
