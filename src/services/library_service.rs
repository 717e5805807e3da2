//! 我的课程 / 我的购买
use std::sync::Arc;

use tracing::info;

use crate::clients::course_client::CourseApi;
use crate::error::AppResult;
use crate::models::api::{CourseSummary, PurchaseSummary};
use crate::models::course::CourseStatus;

pub struct LibraryService {
    api: Arc<dyn CourseApi>,
}

impl LibraryService {
    pub fn new(api: Arc<dyn CourseApi>) -> Self {
        Self { api }
    }

    pub async fn my_courses(&self) -> AppResult<Vec<CourseSummary>> {
        let courses = self.api.my_courses().await?;
        info!("📚 共 {} 门自建课程", courses.len());
        Ok(courses)
    }

    /// 按状态筛选自建课程
    pub async fn my_courses_with_status(
        &self,
        status: CourseStatus,
    ) -> AppResult<Vec<CourseSummary>> {
        Ok(self
            .my_courses()
            .await?
            .into_iter()
            .filter(|c| c.status == Some(status))
            .collect())
    }

    pub async fn my_purchases(&self) -> AppResult<Vec<PurchaseSummary>> {
        let purchases = self.api.my_purchases().await?;
        info!("🛒 共 {} 条购买记录", purchases.len());
        Ok(purchases)
    }

    /// 仍在有效期内的购买
    pub async fn active_purchases(&self) -> AppResult<Vec<PurchaseSummary>> {
        let now = chrono::Utc::now();
        Ok(self
            .my_purchases()
            .await?
            .into_iter()
            .filter(|p| p.expires_at.map(|at| at > now).unwrap_or(true))
            .collect())
    }
}
