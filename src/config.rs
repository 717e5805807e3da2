use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 课程 API 根地址
    pub api_base_url: String,
    /// 访问令牌（Bearer）
    pub api_token: Option<String>,
    /// 单个请求超时（秒）
    pub request_timeout_secs: u64,
    /// 每个模块允许的最大附件数
    pub max_attachments: usize,
    /// 提交审核成功后清空草稿前的等待时间（毫秒）
    pub review_reset_delay_ms: u64,
    /// 上传分块大小（字节）
    pub upload_chunk_size: usize,
    /// 课程清单（TOML）存放目录
    pub manifest_folder: String,
    /// 同时发布的课程数量
    pub max_concurrent_courses: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            api_token: None,
            request_timeout_secs: 60,
            max_attachments: 10,
            review_reset_delay_ms: 2000,
            upload_chunk_size: 64 * 1024,
            manifest_folder: "course_manifests".to_string(),
            max_concurrent_courses: 4,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("COURSE_API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: std::env::var("COURSE_API_TOKEN").ok().or(default.api_token),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            max_attachments: std::env::var("MAX_ATTACHMENTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attachments),
            review_reset_delay_ms: std::env::var("REVIEW_RESET_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.review_reset_delay_ms),
            upload_chunk_size: std::env::var("UPLOAD_CHUNK_SIZE").ok().and_then(|v| v.parse().ok()).filter(|v: &usize| *v > 0).unwrap_or(default.upload_chunk_size),
            manifest_folder: std::env::var("MANIFEST_FOLDER").unwrap_or(default.manifest_folder),
            max_concurrent_courses: std::env::var("MAX_CONCURRENT_COURSES").ok().and_then(|v| v.parse().ok()).filter(|v: &usize| *v > 0).unwrap_or(default.max_concurrent_courses),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn review_reset_delay(&self) -> Duration {
        Duration::from_millis(self.review_reset_delay_ms)
    }
}
