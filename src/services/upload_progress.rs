//! 上传进度汇总 - 业务能力层
//!
//! 记录每个文件的传输进度并生成可读的状态文本，纯展示用途。

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::clients::upload_client::ProgressCallback;
use crate::models::upload::UploadProgress;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 进度对应的状态文本
pub fn status_message(progress: &UploadProgress) -> String {
    match progress.percentage {
        100 => "Finalizing upload...".to_string(),
        _ if progress.loaded == 0 => "Preparing upload...".to_string(),
        90..=99 => "Almost there...".to_string(),
        _ => format!(
            "Uploading... ({:.1}MB of {:.1}MB)",
            progress.loaded as f64 / BYTES_PER_MB,
            progress.total as f64 / BYTES_PER_MB
        ),
    }
}

/// 进度面板：按文件名记录进度，可在多个上传任务间共享
#[derive(Debug, Clone, Default)]
pub struct ProgressBoard {
    entries: Arc<Mutex<BTreeMap<String, UploadProgress>>>,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某个文件生成进度回调
    pub fn reporter(&self, name: impl Into<String>) -> ProgressCallback {
        let name = name.into();
        let entries = self.entries.clone();
        Arc::new(move |progress: UploadProgress| {
            let mut guard = match entries.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.insert(name.clone(), progress);
        })
    }

    pub fn get(&self, name: &str) -> Option<UploadProgress> {
        self.lock().get(name).copied()
    }

    /// 所有文件进度的快照
    pub fn snapshot(&self) -> Vec<(String, UploadProgress)> {
        self.lock()
            .iter()
            .map(|(name, progress)| (name.clone(), *progress))
            .collect()
    }

    /// 合并后的总体进度
    pub fn overall(&self) -> UploadProgress {
        let (loaded, total) = self
            .lock()
            .values()
            .fold((0u64, 0u64), |(l, t), p| (l + p.loaded, t + p.total));
        UploadProgress::new(loaded, total)
    }

    /// 每个文件一行状态文本
    pub fn status_lines(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|(name, progress)| format!("{}: {}", name, status_message(progress)))
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, UploadProgress>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_status_message_stages() {
        assert_eq!(
            status_message(&UploadProgress::new(0, 5 * MB)),
            "Preparing upload..."
        );
        assert_eq!(
            status_message(&UploadProgress::new(2 * MB + MB / 10, 5 * MB)),
            "Uploading... (2.1MB of 5.0MB)"
        );
        assert_eq!(
            status_message(&UploadProgress::new(46 * MB / 10, 5 * MB)),
            "Almost there..."
        );
        assert_eq!(
            status_message(&UploadProgress::new(5 * MB, 5 * MB)),
            "Finalizing upload..."
        );
    }

    #[test]
    fn test_empty_file_reaches_final_stage() {
        let board = ProgressBoard::new();
        let report = board.reporter("notes.txt");

        report(UploadProgress::new(0, 0));
        assert_eq!(board.status_lines(), vec!["notes.txt: Preparing upload..."]);

        report(UploadProgress::finished(0));
        assert_eq!(board.status_lines(), vec!["notes.txt: Finalizing upload..."]);
        assert!(board.get("notes.txt").unwrap().is_complete());
    }

    #[test]
    fn test_board_tracks_each_file() {
        let board = ProgressBoard::new();
        let thumb = board.reporter("thumbnail");
        let video = board.reporter("previewVideo");

        thumb(UploadProgress::new(100, 100));
        video(UploadProgress::new(25, 300));

        assert_eq!(board.get("thumbnail").unwrap().percentage, 100);
        assert_eq!(board.get("previewVideo").unwrap().percentage, 8);
        assert_eq!(board.overall(), UploadProgress::new(125, 400));
        assert_eq!(board.snapshot().len(), 2);
        assert!(board.status_lines()[0].starts_with("previewVideo: Uploading..."));

        board.clear();
        assert!(board.snapshot().is_empty());
    }
}
