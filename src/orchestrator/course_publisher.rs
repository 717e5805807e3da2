//! 单门课程发布器 - 编排层
//!
//! ## 职责
//!
//! 按向导顺序把一份课程清单发布到后端：
//!
//! 1. **课程信息**：上传封面和预览视频，创建课程
//! 2. **章节**：逐个创建章节
//! 3. **模块**：逐个上传文件并创建模块
//! 4. **提交审核**：检查完整性后提交
//!
//! 任何一步失败都会停止该课程的发布，已保存到后端的部分保留为草稿。

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::models::course::{ChapterFields, LocalId};
use crate::models::loaders::{CourseManifest, ManifestModule};
use crate::models::upload::FileSource;
use crate::services::ProgressBoard;
use crate::store::CreationStore;
use crate::utils::truncate_text;
use crate::workflow::{
    ChapterStep, CourseForm, CourseStep, ModuleForm, ModuleStep, ReviewStep, StepOutcome,
    WizardContext,
};

/// 单门课程的发布统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishStats {
    pub chapters: usize,
    pub modules: usize,
}

/// 把步骤结果转换为 `Result`，失败时带上提示文本
fn completed<T>(outcome: StepOutcome<T>, what: &str) -> Result<T> {
    match outcome {
        StepOutcome::Completed(value) => Ok(value),
        StepOutcome::Blocked { message } => Err(anyhow!("{}被阻止: {}", what, message)),
        StepOutcome::Failed { category, message } => {
            Err(anyhow!("{}失败 ({:?}): {}", what, category, message))
        }
    }
}

/// 发布单门课程
///
/// # 参数
/// - `ctx`: 向导上下文
/// - `manifest`: 课程清单
/// - `course_index`: 课程序号（用于日志）
pub async fn publish_course(
    ctx: &WizardContext,
    manifest: CourseManifest,
    course_index: usize,
) -> Result<PublishStats> {
    log_course_start(course_index, &manifest);

    let mut store = CreationStore::new();
    let board = ProgressBoard::new();
    let mut stats = PublishStats::default();

    // ========== 第一步：课程信息 ==========
    let mut form = CourseForm::new(manifest.course.clone())
        .with_thumbnail(load_file(&manifest, &manifest.thumbnail).await?);
    if let Some(preview) = &manifest.preview_video {
        form = form.with_preview_video(load_file(&manifest, preview).await?);
    }

    let course_step = CourseStep::new(ctx.clone());
    completed(
        course_step
            .submit_with_progress(&mut store, form, &board)
            .await,
        "创建课程",
    )?;
    log_board(ctx, course_index, &board);
    info!(
        "[课程 {}] ✓ 课程已保存: {}",
        course_index,
        store.course_backend_id().unwrap_or_default()
    );

    // ========== 第二步：章节 ==========
    let chapter_step = ChapterStep::new(ctx.clone());
    let mut chapter_ids: Vec<LocalId> = Vec::with_capacity(manifest.chapters.len());
    for chapter in &manifest.chapters {
        let fields = ChapterFields {
            title: chapter.title.clone(),
            description: chapter.description.clone(),
        };
        let local_id = completed(
            chapter_step.create(&mut store, fields).await,
            &format!("创建章节 \"{}\"", chapter.title),
        )?;
        chapter_ids.push(local_id);
        stats.chapters += 1;
    }
    completed(chapter_step.continue_to_modules(&mut store), "进入模块步骤")?;

    // ========== 第三步：模块 ==========
    let module_step = ModuleStep::new(ctx.clone());
    for (chapter, chapter_id) in manifest.chapters.iter().zip(chapter_ids) {
        for module in &chapter.modules {
            board.clear();
            let form = module_form(&manifest, module).await?;
            completed(
                module_step
                    .create_with_progress(&mut store, chapter_id, form, &board)
                    .await,
                &format!("创建模块 \"{}\"", module.title),
            )?;
            log_board(ctx, course_index, &board);
            stats.modules += 1;
        }
    }
    completed(module_step.continue_to_review(&mut store), "进入审核步骤")?;

    // ========== 第四步：提交审核 ==========
    let review_step = ReviewStep::new(ctx.clone());
    let summary = review_step.summary(&store);
    info!(
        "[课程 {}] 📋 {} 个章节, {} 个模块 ({} 个可试看), 总时长 {}",
        course_index,
        summary.chapter_count,
        summary.module_count,
        summary.preview_count,
        summary.formatted_duration()
    );

    completed(
        review_step
            .submit(&mut store, manifest.review_note.clone())
            .await,
        "提交审核",
    )?;

    log_course_complete(course_index, &stats);
    Ok(stats)
}

/// 读取清单中引用的文件
async fn load_file(manifest: &CourseManifest, relative: &str) -> Result<FileSource> {
    let path = manifest.resolve(relative);
    FileSource::from_path(&path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))
}

async fn module_form(manifest: &CourseManifest, module: &ManifestModule) -> Result<ModuleForm> {
    let main_file = load_file(manifest, &module.file).await?;
    let mut attachments = Vec::with_capacity(module.attachments.len());
    for attachment in &module.attachments {
        attachments.push(load_file(manifest, attachment).await?);
    }

    Ok(ModuleForm {
        title: module.title.clone(),
        description: module.description.clone(),
        duration: module.duration,
        is_preview: module.is_preview,
        main_file: Some(main_file),
        attachments,
    })
}

// ========== 日志辅助函数 ==========

fn log_course_start(course_index: usize, manifest: &CourseManifest) {
    let module_count: usize = manifest.chapters.iter().map(|c| c.modules.len()).sum();
    info!("[课程 {}] 开始发布", course_index);
    info!("[课程 {}] 清单: {}", course_index, manifest.display_name());
    info!(
        "[课程 {}] 标题: {}",
        course_index,
        truncate_text(&manifest.course.title, 40)
    );
    info!(
        "[课程 {}] 章节: {}, 模块: {}",
        course_index,
        manifest.chapters.len(),
        module_count
    );
}

fn log_board(ctx: &WizardContext, course_index: usize, board: &ProgressBoard) {
    for line in board.status_lines() {
        if ctx.config.verbose_logging {
            info!("[课程 {}] 📤 {}", course_index, line);
        } else {
            debug!("[课程 {}] {}", course_index, line);
        }
    }
}

fn log_course_complete(course_index: usize, stats: &PublishStats) {
    info!(
        "[课程 {}] 统计: 章节 {}, 模块 {}",
        course_index, stats.chapters, stats.modules
    );
    info!("\n[课程 {}] ✅ 课程已提交审核\n", course_index);
}
