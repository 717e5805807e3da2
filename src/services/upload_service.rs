//! 上传服务 - 业务能力层
//!
//! 把若干文件并行上传，每个文件的进度写入同一个进度面板。

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::upload_client::Uploader;
use crate::error::AppResult;
use crate::infrastructure::{TaskGroup, TaskResults};
use crate::models::upload::{FileSource, UploadBucket, UploadedFile};
use crate::services::upload_progress::ProgressBoard;

/// 一次上传任务
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// 任务名，也是结果和进度的索引
    pub name: String,
    pub file: FileSource,
    pub bucket: UploadBucket,
}

impl UploadRequest {
    pub fn new(name: impl Into<String>, file: FileSource, bucket: UploadBucket) -> Self {
        Self {
            name: name.into(),
            file,
            bucket,
        }
    }
}

/// 上传服务
#[derive(Clone)]
pub struct UploadService {
    uploader: Arc<dyn Uploader>,
}

impl UploadService {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self { uploader }
    }

    /// 并行上传所有文件，任意一个失败则整体失败
    pub async fn upload_all(
        &self,
        requests: Vec<UploadRequest>,
        board: &ProgressBoard,
    ) -> AppResult<TaskResults<UploadedFile>> {
        info!("📤 开始上传 {} 个文件", requests.len());

        let mut group = TaskGroup::new();
        for request in requests {
            let uploader = self.uploader.clone();
            let reporter = board.reporter(request.name.clone());
            group.add(request.name.clone(), async move {
                let result = uploader
                    .upload(&request.file, request.bucket, reporter)
                    .await;
                if let Err(e) = &result {
                    warn!("⚠️ {} 上传失败: {}", request.file.file_name, e);
                }
                result
            });
        }

        let results = group.join().await?;
        info!("✓ {} 个文件全部上传完成", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, UploadError};
    use crate::models::upload::UploadProgress;
    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok, block_on};

    use crate::clients::upload_client::ProgressCallback;

    /// 立即完成的上传，文件名以 "bad" 开头时失败
    struct InstantUploader;

    #[async_trait]
    impl Uploader for InstantUploader {
        async fn upload(
            &self,
            file: &FileSource,
            bucket: UploadBucket,
            on_progress: ProgressCallback,
        ) -> AppResult<UploadedFile> {
            if file.file_name.starts_with("bad") {
                return Err(AppError::Upload(UploadError::MissingUrl {
                    file: file.file_name.clone(),
                }));
            }
            on_progress(UploadProgress::finished(file.size));
            Ok(UploadedFile {
                file_name: file.file_name.clone(),
                url: format!("https://cdn/{}/{}", bucket, file.file_name),
            })
        }
    }

    fn service() -> UploadService {
        UploadService::new(Arc::new(InstantUploader))
    }

    #[test]
    fn test_results_and_progress_are_keyed_by_name() {
        let board = ProgressBoard::new();
        let requests = vec![
            UploadRequest::new(
                "thumbnail",
                FileSource::from_bytes("cover.png", vec![1; 10]),
                UploadBucket::Thumbnails,
            ),
            UploadRequest::new(
                "previewVideo",
                FileSource::from_bytes("trailer.mp4", vec![1; 40]),
                UploadBucket::Videos,
            ),
        ];

        let results = assert_ok!(block_on(service().upload_all(requests, &board)));
        assert_eq!(
            results.get("previewVideo").map(|f| f.url.as_str()),
            Some("https://cdn/videos/trailer.mp4")
        );
        assert_eq!(board.overall(), UploadProgress::new(50, 50));
    }

    #[test]
    fn test_one_failure_fails_the_batch() {
        let board = ProgressBoard::new();
        let requests = vec![
            UploadRequest::new(
                "mainFile",
                FileSource::from_bytes("lesson.mp4", vec![1; 4]),
                UploadBucket::Videos,
            ),
            UploadRequest::new(
                "attachment-0",
                FileSource::from_bytes("bad.pdf", vec![1; 4]),
                UploadBucket::Attachments,
            ),
        ];

        assert_err!(block_on(service().upload_all(requests, &board)));
    }

    #[test]
    fn test_empty_batch_succeeds() {
        let results = assert_ok!(block_on(service().upload_all(Vec::new(), &ProgressBoard::new())));
        assert!(results.is_empty());
    }
}
