use crate::models::course::CourseDetails;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 课程清单：一门课程及其章节、模块的完整描述
///
/// 文件路径均相对于清单文件所在目录。
#[derive(Debug, Clone, Deserialize)]
pub struct CourseManifest {
    pub course: CourseDetails,
    /// 封面图路径
    pub thumbnail: String,
    /// 预览视频路径（可选）
    #[serde(default)]
    pub preview_video: Option<String>,
    #[serde(default)]
    pub chapters: Vec<ManifestChapter>,
    /// 提交审核时附带的备注
    #[serde(default)]
    pub review_note: Option<String>,
    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestChapter {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub modules: Vec<ManifestModule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestModule {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 时长（分钟）
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub is_preview: bool,
    /// 主文件路径
    pub file: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl CourseManifest {
    /// 将清单中的相对路径解析为绝对路径
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let path = Path::new(relative);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.file_path.as_deref().and_then(Path::parent) {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    /// 用于日志显示的名称
    pub fn display_name(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.course.title.clone())
    }
}

/// 从 TOML 文件加载课程清单
pub async fn load_course_manifest(toml_file_path: &Path) -> Result<CourseManifest> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let mut manifest = parse_course_manifest(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    manifest.file_path = Some(toml_file_path.to_path_buf());

    Ok(manifest)
}

/// 解析 TOML 文本
pub fn parse_course_manifest(content: &str) -> Result<CourseManifest> {
    Ok(toml::from_str(content)?)
}

/// 从文件夹中加载所有课程清单
pub async fn load_all_manifests(folder_path: &str) -> Result<Vec<CourseManifest>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut manifests = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_course_manifest(&path).await {
            Ok(manifest) => {
                let module_count: usize = manifest.chapters.iter().map(|c| c.modules.len()).sum();
                tracing::info!(
                    "成功加载 {} 个章节, {} 个模块",
                    manifest.chapters.len(),
                    module_count
                );
                manifests.push(manifest);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(manifests)
}
