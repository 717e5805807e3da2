//! 批量课程发布器 - 编排层
//!
//! ## 职责
//!
//! 本模块是命令行程序的入口，负责批量发布课程清单。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：构建 HTTP 客户端和向导上下文
//! 2. **批量加载**：扫描并加载所有课程清单（`Vec<CourseManifest>`）
//! 3. **并发控制**：使用 Semaphore 限制同时发布的课程数
//! 4. **分批处理**：每批完成后再开始下一批
//! 5. **全局统计**：汇总所有课程的发布结果

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::loaders::{load_all_manifests, CourseManifest};
use crate::orchestrator::course_publisher;
use crate::utils::logging::{
    log_batch_complete, log_batch_start, log_manifests_loaded, log_startup, print_final_stats,
};
use crate::workflow::WizardContext;

/// 应用主结构
pub struct App {
    config: Config,
    ctx: WizardContext,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config.api_base_url, config.max_concurrent_courses);

        let ctx = WizardContext::from_config(config.clone())?;
        Ok(Self { config, ctx })
    }

    /// 使用已有的上下文（测试中注入内存实现）
    pub fn with_context(ctx: WizardContext) -> Self {
        Self {
            config: ctx.config.clone(),
            ctx,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<PublishSummary> {
        let manifests = self.load_manifests().await?;

        if manifests.is_empty() {
            warn!("⚠️ 没有找到待发布的课程清单，程序结束");
            return Ok(PublishSummary::default());
        }

        log_manifests_loaded(manifests.len(), self.max_concurrent());

        let summary = self.publish_all(manifests).await?;
        print_final_stats(summary.success, summary.failed, summary.total);

        Ok(summary)
    }

    async fn load_manifests(&self) -> Result<Vec<CourseManifest>> {
        info!("\n📁 正在扫描课程清单: {}", self.config.manifest_folder);
        load_all_manifests(&self.config.manifest_folder).await
    }

    fn max_concurrent(&self) -> usize {
        self.config.max_concurrent_courses.max(1)
    }

    /// 发布所有课程
    pub async fn publish_all(&self, manifests: Vec<CourseManifest>) -> Result<PublishSummary> {
        let batch_size = self.max_concurrent();
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total = manifests.len();
        let total_batches = total.div_ceil(batch_size);
        let mut summary = PublishSummary {
            total,
            ..Default::default()
        };

        for (batch_index, batch) in manifests.chunks(batch_size).enumerate() {
            let batch_start = batch_index * batch_size;
            let batch_num = batch_index + 1;

            log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total,
            );

            let result = self
                .publish_batch(batch, batch_start, semaphore.clone())
                .await?;

            summary.success += result.success;
            summary.failed += result.failed;
            summary.modules += result.modules;

            log_batch_complete(batch_num, result.success, result.success + result.failed);
        }

        Ok(summary)
    }

    /// 处理单个批次
    async fn publish_batch(
        &self,
        batch: &[CourseManifest],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<PublishSummary> {
        let mut handles = Vec::with_capacity(batch.len());

        for (idx, manifest) in batch.iter().enumerate() {
            let course_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let ctx = self.ctx.clone();
            let manifest = manifest.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result = course_publisher::publish_course(&ctx, manifest, course_index).await;
                if let Err(e) = &result {
                    error!("[课程 {}] ❌ 发布失败: {:#}", course_index, e);
                }
                result
            });
            handles.push((course_index, handle));
        }

        let mut result = PublishSummary::default();
        for (course_index, handle) in handles {
            match handle.await {
                Ok(Ok(stats)) => {
                    result.success += 1;
                    result.modules += stats.modules;
                }
                Ok(Err(_)) => result.failed += 1,
                Err(e) => {
                    error!("[课程 {}] 任务执行失败: {}", course_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 发布统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub modules: usize,
}
