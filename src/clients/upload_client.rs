/// 文件上传客户端
///
/// 以分块流的方式发送 multipart 请求，每发送一块回调一次进度。
/// 不做重试或断点续传，失败后需要从头重新上传。
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::clients::course_client::{retry_after_secs, status_error};
use crate::clients::session::TokenManager;
use crate::config::Config;
use crate::error::{AppError, AppResult, UploadError};
use crate::models::api::{ApiEnvelope, UploadResponse};
use crate::models::upload::{FileContent, FileSource, UploadBucket, UploadProgress, UploadedFile};

/// 进度回调
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// `Body::wrap_stream` 要求流同时满足 Send + Sync
type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, io::Error>> + Send + Sync>>;

/// 上传能力
#[async_trait]
pub trait Uploader: Send + Sync {
    /// 上传单个文件到指定存储桶，返回可长期访问的 URL
    async fn upload(
        &self,
        file: &FileSource,
        bucket: UploadBucket,
        on_progress: ProgressCallback,
    ) -> AppResult<UploadedFile>;
}

/// 基于 reqwest 的上传客户端
pub struct HttpUploader {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenManager>,
    chunk_size: usize,
}

impl HttpUploader {
    pub fn new(config: &Config, tokens: Arc<TokenManager>) -> AppResult<Self> {
        // 大文件上传不设整体超时，只限制连接建立时间
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
            chunk_size: config.upload_chunk_size.max(1),
        })
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(
        &self,
        file: &FileSource,
        bucket: UploadBucket,
        on_progress: ProgressCallback,
    ) -> AppResult<UploadedFile> {
        let endpoint = format!("/api/upload/{}", bucket);
        let total = file.size;
        debug!("上传 {} ({} 字节) → {}", file.file_name, total, endpoint);

        on_progress(UploadProgress::new(0, total));

        let chunks = chunk_stream(file, self.chunk_size).await?;
        let loaded = Arc::new(AtomicU64::new(0));
        let callback = on_progress.clone();
        let tracked = chunks.map(move |chunk| {
            if let Ok(bytes) = &chunk {
                let now = loaded.fetch_add(bytes.len() as u64, Ordering::Relaxed)
                    + bytes.len() as u64;
                callback(UploadProgress::new(now, total));
            }
            chunk
        });

        let part = Part::stream_with_length(Body::wrap_stream(tracked), total)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| transfer_failed(file, e))?;
        let form = Form::new()
            .text("bucket", bucket.as_str())
            .part("file", part);

        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .multipart(form);
        if let Some(token) = self.tokens.token() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transfer_failed(file, e))?;
        let status = response.status();
        let retry_after = retry_after_secs(response.headers());
        let text = response.text().await.map_err(|e| transfer_failed(file, e))?;

        if !status.is_success() {
            return Err(rejection(file, &endpoint, status.as_u16(), retry_after, &text));
        }

        let url = parse_upload_url(&text).ok_or_else(|| UploadError::MissingUrl {
            file: file.file_name.clone(),
        })?;

        on_progress(UploadProgress::finished(total));
        info!("✓ 上传完成: {}", file.file_name);

        Ok(UploadedFile {
            file_name: file.file_name.clone(),
            url,
        })
    }
}

/// 非 2xx 响应：401/403/404/429 按课程接口的规则分类，其余记为上传被拒绝
fn rejection(
    file: &FileSource,
    endpoint: &str,
    status: u16,
    retry_after: Option<u64>,
    body: &str,
) -> AppError {
    let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .and_then(|e| e.message);

    match status_error(endpoint, status, retry_after, message.clone()) {
        Some(error) => error.into(),
        None => UploadError::Rejected {
            file: file.file_name.clone(),
            status,
            message,
        }
        .into(),
    }
}

fn transfer_failed(file: &FileSource, source: reqwest::Error) -> AppError {
    UploadError::Transfer {
        file: file.file_name.clone(),
        source,
    }
    .into()
}

/// 从响应体中取出 url，兼容信封和裸对象两种格式
fn parse_upload_url(body: &str) -> Option<String> {
    if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<UploadResponse>>(body) {
        if let Some(data) = envelope.data {
            return Some(data.url);
        }
    }
    serde_json::from_str::<UploadResponse>(body)
        .ok()
        .map(|r| r.url)
}

/// 把文件内容切成定长块
async fn chunk_stream(file: &FileSource, chunk_size: usize) -> AppResult<ChunkStream> {
    match &file.content {
        FileContent::Memory(bytes) => {
            let chunks: Vec<Result<Vec<u8>, io::Error>> =
                bytes.chunks(chunk_size).map(|c| Ok(c.to_vec())).collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
        FileContent::Path(path) => {
            let handle = tokio::fs::File::open(path)
                .await
                .map_err(|source| UploadError::Read {
                    file: file.file_name.clone(),
                    source,
                })?;
            let chunks = stream::try_unfold(handle, move |mut handle| async move {
                let mut buf = vec![0u8; chunk_size];
                let n = handle.read(&mut buf).await?;
                if n == 0 {
                    return Ok(None);
                }
                buf.truncate(n);
                Ok::<_, io::Error>(Some((buf, handle)))
            });
            Ok(Box::pin(chunks))
        }
    }
}
