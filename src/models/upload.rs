use std::fmt;
use std::path::{Path, PathBuf};

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, FileError};

/// 按扩展名推断 MIME 类型（小写扩展名）
static MIME_BY_EXTENSION: phf::Map<&'static str, &'static str> = phf_map! {
    "mp4" => "video/mp4",
    "m4v" => "video/x-m4v",
    "mov" => "video/quicktime",
    "webm" => "video/webm",
    "mkv" => "video/x-matroska",
    "avi" => "video/x-msvideo",
    "pdf" => "application/pdf",
    "doc" => "application/msword",
    "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "ppt" => "application/vnd.ms-powerpoint",
    "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "txt" => "text/plain",
    "md" => "text/markdown",
    "zip" => "application/zip",
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "svg" => "image/svg+xml",
};

const DEFAULT_MIME: &str = "application/octet-stream";

/// 根据文件名推断 MIME 类型
pub fn guess_mime(file_name: &str) -> &'static str {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| MIME_BY_EXTENSION.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(DEFAULT_MIME)
}

/// 上传目标存储桶
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadBucket {
    Thumbnails,
    Videos,
    Documents,
    Attachments,
}

impl UploadBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadBucket::Thumbnails => "thumbnails",
            UploadBucket::Videos => "videos",
            UploadBucket::Documents => "documents",
            UploadBucket::Attachments => "attachments",
        }
    }
}

impl fmt::Display for UploadBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文件内容来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// 磁盘文件，上传时按块流式读取
    Path(PathBuf),
    /// 内存中的数据
    Memory(Vec<u8>),
}

/// 待上传的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub content: FileContent,
}

impl FileSource {
    /// 从磁盘文件创建，MIME 类型按扩展名推断
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AppError::File(FileError::NotFound {
                    path: path.display().to_string(),
                }),
                _ => AppError::file_read_failed(path.display().to_string(), e),
            })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            content_type: guess_mime(&file_name).to_string(),
            file_name,
            size: metadata.len(),
            content: FileContent::Path(path.to_path_buf()),
        })
    }

    /// 从内存数据创建
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            content_type: guess_mime(&file_name).to_string(),
            size: bytes.len() as u64,
            file_name,
            content: FileContent::Memory(bytes),
        }
    }

    /// 覆盖推断出的 MIME 类型
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn is_video(&self) -> bool {
        self.content_type.to_ascii_lowercase().starts_with("video/")
    }

    pub fn is_image(&self) -> bool {
        self.content_type.to_ascii_lowercase().starts_with("image/")
    }
}

/// 单个文件的传输进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
    pub percentage: u8,
}

impl UploadProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            ((loaded.min(total) * 100) / total) as u8
        };
        Self {
            loaded,
            total,
            percentage,
        }
    }

    /// 上传结束时的进度，空文件也记为 100%
    pub fn finished(total: u64) -> Self {
        Self {
            loaded: total,
            total,
            percentage: 100,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percentage == 100
    }
}

/// 上传完成后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub url: String,
}
